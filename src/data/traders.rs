use crate::shared::*;

/// Populate the TraderRegistry with the NPCs that barter.
///
/// Traders:
///   blacksmith: equipment and bars, settles locally
///   alchemist: consumables, settles through the transaction pipeline
///   peddler: odds and ends, settles locally
pub fn populate_traders(registry: &mut TraderRegistry) {
    registry.insert(TraderDef {
        id: "blacksmith".into(),
        name: "Blacksmith".into(),
        catalog: vec![
            ItemStack::new("sword_01a", "weapon", 1),
            ItemStack::new("shield_01a", "armor", 1),
            ItemStack::new("helmet_01a", "armor", 1),
            ItemStack::new("pickaxe_01a", "tool", 1),
            ItemStack::new("iron_bar_01a", "material", 3),
        ],
        on_chain: false,
    });

    registry.insert(TraderDef {
        id: "alchemist".into(),
        name: "Alchemist".into(),
        catalog: vec![
            ItemStack::new("potion_01a", "potion", 3),
            ItemStack::new("potion_02a", "potion", 2),
            ItemStack::new("elixir_01a", "potion", 1),
            ItemStack::new("herb_01a", "material", 5),
        ],
        on_chain: true,
    });

    registry.insert(TraderDef {
        id: "peddler".into(),
        name: "Peddler".into(),
        catalog: vec![
            ItemStack::new("bread_01a", "food", 4),
            ItemStack::new("bow_01a", "weapon", 1),
            ItemStack::new("gem_01a", "gem", 1),
            ItemStack::new("coin_01a", "currency", 25),
        ],
        on_chain: false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::populate_textures;

    #[test]
    fn test_every_catalog_item_has_a_texture() {
        let mut traders = TraderRegistry::default();
        let mut textures = TextureRegistry::default();
        populate_traders(&mut traders);
        populate_textures(&mut textures);

        for trader in traders.traders.values() {
            assert!(trader.catalog.len() >= 2, "{} can't fill a counter-offer", trader.id);
            for stack in &trader.catalog {
                assert!(textures.exists(&stack.item_id), "missing texture {}", stack.item_id);
            }
        }
    }
}
