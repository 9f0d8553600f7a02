//! The single shaped recipe: a plus sign on the 3×3 grid.
//!
//! ```text
//!  . X .
//!  X X X
//!  . X .
//! ```
//!
//! Only the five plus positions are checked. Corners may hold anything.

use crate::shared::*;

/// Grid indices that must be filled, row-major.
pub const PLUS_PATTERN: [usize; 5] = [1, 3, 4, 5, 7];

/// Candidate outputs, best first. The first one the renderer has a
/// texture for wins.
pub const RESULT_PREFERENCE: &[&str] = &[
    "mythril_bar_01a",
    "gold_bar_01a",
    "iron_bar_01a",
    "copper_bar_01a",
    "plank_01a",
    "crafted_item_01a",
];

/// Item type stamped on anything the bench produces.
pub const CRAFTED_ITEM_TYPE: &str = "crafted";

/// Returns the output item id when the plus shape is filled and at least
/// one candidate output has a loaded texture.
pub fn matches_recipe(grid: &SlotContainer, textures: &TextureRegistry) -> Option<ItemId> {
    let shaped = PLUS_PATTERN.iter().all(|&index| !grid.is_empty(index));
    if !shaped {
        return None;
    }
    RESULT_PREFERENCE
        .iter()
        .find(|key| textures.exists(key))
        .map(|key| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(indices: &[usize]) -> SlotContainer {
        let mut grid = SlotContainer::new(ContainerKey::CraftingGrid);
        for &i in indices {
            grid.set(i, Some(ItemStack::new("wood_01a", "material", 1)));
        }
        grid
    }

    fn textures(keys: &[&str]) -> TextureRegistry {
        let mut registry = TextureRegistry::default();
        for key in keys {
            registry.insert(*key);
        }
        registry
    }

    #[test]
    fn test_plus_shape_produces_best_available_result() {
        let grid = grid_with(&PLUS_PATTERN);
        let reg = textures(&["plank_01a", "gold_bar_01a"]);
        assert_eq!(matches_recipe(&grid, &reg), Some("gold_bar_01a".to_string()));
    }

    #[test]
    fn test_falls_back_down_the_preference_list() {
        let grid = grid_with(&PLUS_PATTERN);
        let reg = textures(&["crafted_item_01a"]);
        assert_eq!(matches_recipe(&grid, &reg), Some("crafted_item_01a".to_string()));
    }

    #[test]
    fn test_missing_arm_does_not_match() {
        let grid = grid_with(&[1, 3, 4, 5]);
        let reg = textures(RESULT_PREFERENCE);
        assert_eq!(matches_recipe(&grid, &reg), None);
    }

    #[test]
    fn test_corners_are_ignored() {
        let reg = textures(&["iron_bar_01a"]);
        let full = grid_with(&[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(matches_recipe(&full, &reg), Some("iron_bar_01a".to_string()));

        let corners_only = grid_with(&[0, 2, 6, 8]);
        assert_eq!(matches_recipe(&corners_only, &reg), None);
    }

    #[test]
    fn test_no_loaded_texture_means_no_result() {
        let grid = grid_with(&PLUS_PATTERN);
        let reg = textures(&["potion_01a"]);
        assert_eq!(matches_recipe(&grid, &reg), None);
    }

    #[test]
    fn test_mixed_items_still_match() {
        let mut grid = grid_with(&PLUS_PATTERN);
        grid.set(4, Some(ItemStack::new("gem_01a", "gem", 3)));
        let reg = textures(&["plank_01a"]);
        assert_eq!(matches_recipe(&grid, &reg), Some("plank_01a".to_string()));
    }
}
