use crate::shared::*;

/// Item sprites shipped with the base game. Keys double as item ids.
const ITEM_TEXTURES: &[&str] = &[
    // ── Consumables ────────────────────────────────────────────
    "potion_01a",
    "potion_02a",
    "elixir_01a",
    "herb_01a",
    "bread_01a",
    // ── Equipment ──────────────────────────────────────────────
    "sword_01a",
    "shield_01a",
    "helmet_01a",
    "pickaxe_01a",
    "bow_01a",
    // ── Materials ──────────────────────────────────────────────
    "wood_01a",
    "stone_01a",
    "copper_ore_01a",
    "iron_ore_01a",
    "gem_01a",
    "coin_01a",
    // ── Crafted outputs ────────────────────────────────────────
    // Higher tiers ship with later content packs.
    "iron_bar_01a",
    "copper_bar_01a",
    "plank_01a",
    "crafted_item_01a",
];

pub fn populate_textures(registry: &mut TextureRegistry) {
    for key in ITEM_TEXTURES {
        registry.insert(*key);
    }
}
