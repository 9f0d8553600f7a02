//! Shared components, resources, events, and states for the item-management
//! subsystem.
//!
//! This is the type contract. Every domain plugin imports from here.
//! Domains talk to each other through the events and resources below.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    Crafting,
    Trading,
}

/// Frame ordering for everything that touches slot contents.
///
/// `Interact` mutates containers and the cursor in response to input,
/// `React` recomputes derived state from the resulting `SlotChangedEvent`s.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotSystems {
    Interact,
    React,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const MAX_STACK_SIZE: u8 = 99;

pub const HOTBAR_SLOTS: usize = 8;
pub const BACKPACK_SLOTS: usize = 25; // 5×5
pub const CRAFTING_GRID_SLOTS: usize = 9; // 3×3
pub const CRAFTING_RESULT_SLOTS: usize = 1;
pub const TRADE_OFFER_SLOTS: usize = 5;
pub const MARKET_GRID_SLOTS: usize = 30; // 5×6

// ═══════════════════════════════════════════════════════════════════════
// ITEMS
// ═══════════════════════════════════════════════════════════════════════

/// Texture-key style identifier, e.g. `potion_01a`.
pub type ItemId = String;

pub type NpcId = String;

/// A stack of identical items. Empty slots are `None`, never a zero count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: ItemId,
    pub item_type: String,
    pub count: u8,
}

impl ItemStack {
    /// Builds a stack, clamping `count` into `1..=MAX_STACK_SIZE`.
    pub fn new(item_id: impl Into<ItemId>, item_type: impl Into<String>, count: u8) -> Self {
        Self {
            item_id: item_id.into(),
            item_type: item_type.into(),
            count: count.clamp(1, MAX_STACK_SIZE),
        }
    }

    pub fn same_item(&self, other: &ItemStack) -> bool {
        self.item_id == other.item_id
    }

    /// Units that can still be added before hitting the stack ceiling.
    pub fn room(&self) -> u8 {
        MAX_STACK_SIZE.saturating_sub(self.count)
    }

    pub fn is_full(&self) -> bool {
        self.count >= MAX_STACK_SIZE
    }

    /// Copy of this stack with a different count.
    pub fn with_count(&self, count: u8) -> ItemStack {
        ItemStack {
            item_id: self.item_id.clone(),
            item_type: self.item_type.clone(),
            count,
        }
    }

    /// Removes `amount` units into a new stack. `amount` must be in `1..count`.
    pub fn split_off(&mut self, amount: u8) -> ItemStack {
        debug_assert!(amount > 0 && amount < self.count);
        self.count -= amount;
        self.with_count(amount)
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{}", self.item_id, self.count)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONTAINERS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKey {
    Hotbar,
    Backpack,
    CraftingGrid,
    CraftingResult,
    TradeOffer,
    TradeCounterOffer,
    MarketGrid,
}

impl ContainerKey {
    pub const ALL: [ContainerKey; 7] = [
        ContainerKey::Hotbar,
        ContainerKey::Backpack,
        ContainerKey::CraftingGrid,
        ContainerKey::CraftingResult,
        ContainerKey::TradeOffer,
        ContainerKey::TradeCounterOffer,
        ContainerKey::MarketGrid,
    ];

    pub fn capacity(self) -> usize {
        match self {
            ContainerKey::Hotbar => HOTBAR_SLOTS,
            ContainerKey::Backpack => BACKPACK_SLOTS,
            ContainerKey::CraftingGrid => CRAFTING_GRID_SLOTS,
            ContainerKey::CraftingResult => CRAFTING_RESULT_SLOTS,
            ContainerKey::TradeOffer | ContainerKey::TradeCounterOffer => TRADE_OFFER_SLOTS,
            ContainerKey::MarketGrid => MARKET_GRID_SLOTS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerKey::Hotbar => "hotbar",
            ContainerKey::Backpack => "backpack",
            ContainerKey::CraftingGrid => "crafting-grid",
            ContainerKey::CraftingResult => "crafting-result",
            ContainerKey::TradeOffer => "trade-offer",
            ContainerKey::TradeCounterOffer => "trade-counter-offer",
            ContainerKey::MarketGrid => "market-grid",
        }
    }

    fn position(self) -> usize {
        match self {
            ContainerKey::Hotbar => 0,
            ContainerKey::Backpack => 1,
            ContainerKey::CraftingGrid => 2,
            ContainerKey::CraftingResult => 3,
            ContainerKey::TradeOffer => 4,
            ContainerKey::TradeCounterOffer => 5,
            ContainerKey::MarketGrid => 6,
        }
    }

    /// Whether pointer clicks on this container go through the interaction
    /// protocol at all. The crafting result has its own pickup rule and the
    /// counterparty's offer is read-only.
    pub fn accepts_protocol(self) -> bool {
        !matches!(
            self,
            ContainerKey::CraftingResult | ContainerKey::TradeCounterOffer
        )
    }

    /// Containers whose contents count as the player's own items.
    pub fn player_owned(self) -> bool {
        self.accepts_protocol()
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a slot. Slots never move, only their contents change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub container: ContainerKey,
    pub index: usize,
}

impl SlotRef {
    pub fn new(container: ContainerKey, index: usize) -> Self {
        Self { container, index }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.container, self.index)
    }
}

/// Outcome of a best-effort insertion into the first empty slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    Inserted { index: usize },
    /// No empty slot was available; the stack is handed back to the caller.
    Overflow(ItemStack),
}

/// Fixed-length ordered array of optional stacks. Pure storage; business
/// rules live in the interaction protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotContainer {
    pub key: ContainerKey,
    slots: Vec<Option<ItemStack>>,
}

impl SlotContainer {
    pub fn new(key: ContainerKey) -> Self {
        Self {
            key,
            slots: vec![None; key.capacity()],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Panics when `index` is out of bounds.
    pub fn get(&self, index: usize) -> Option<&ItemStack> {
        self.slots[index].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Option<ItemStack> {
        &mut self.slots[index]
    }

    pub fn set(&mut self, index: usize, stack: Option<ItemStack>) {
        self.slots[index] = stack;
    }

    pub fn take(&mut self, index: usize) -> Option<ItemStack> {
        self.slots[index].take()
    }

    pub fn is_empty(&self, index: usize) -> bool {
        self.slots[index].is_none()
    }

    pub fn is_all_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn slot_ref(&self, index: usize) -> SlotRef {
        SlotRef::new(self.key, index)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ItemStack>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    /// Non-empty stacks in slot order.
    pub fn stacks(&self) -> Vec<ItemStack> {
        self.slots.iter().flatten().cloned().collect()
    }

    /// Empties every slot, returning the indices that held something.
    pub fn clear(&mut self) -> Vec<usize> {
        let mut cleared = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                cleared.push(index);
            }
        }
        cleared
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Puts `stack` into the first empty slot, or hands it back.
    pub fn insert_first_empty(&mut self, stack: ItemStack) -> InsertResult {
        match self.first_empty() {
            Some(index) => {
                self.slots[index] = Some(stack);
                InsertResult::Inserted { index }
            }
            None => InsertResult::Overflow(stack),
        }
    }

    pub fn count(&self, item_id: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.count as u32)
            .sum()
    }
}

/// Every slot container, created once per game entry.
#[derive(Resource, Debug, Clone)]
pub struct SlotContainers {
    containers: Vec<SlotContainer>,
}

impl Default for SlotContainers {
    fn default() -> Self {
        Self {
            containers: ContainerKey::ALL.iter().map(|&k| SlotContainer::new(k)).collect(),
        }
    }
}

impl SlotContainers {
    pub fn get(&self, key: ContainerKey) -> &SlotContainer {
        &self.containers[key.position()]
    }

    pub fn get_mut(&mut self, key: ContainerKey) -> &mut SlotContainer {
        &mut self.containers[key.position()]
    }

    pub fn stack(&self, slot: SlotRef) -> Option<&ItemStack> {
        self.get(slot.container).get(slot.index)
    }

    /// Idempotent "set slot contents" used by external flows. A zero count
    /// clears the slot, larger counts are clamped to the stack ceiling.
    pub fn add_item(
        &mut self,
        container: ContainerKey,
        index: usize,
        item_id: &str,
        item_type: &str,
        count: u8,
    ) -> Option<ItemStack> {
        let stack = (count > 0).then(|| ItemStack::new(item_id, item_type, count));
        self.get_mut(container).set(index, stack.clone());
        stack
    }

    pub fn add_item_to_backpack(
        &mut self,
        index: usize,
        item_id: &str,
        item_type: &str,
        count: u8,
    ) -> Option<ItemStack> {
        self.add_item(ContainerKey::Backpack, index, item_id, item_type, count)
    }

    /// Total units of `item_id` across player-owned containers.
    pub fn total(&self, item_id: &str) -> u32 {
        self.containers
            .iter()
            .filter(|c| c.key.player_owned())
            .map(|c| c.count(item_id))
            .sum()
    }

    /// Resets every container to empty without reallocating.
    pub fn clear_all(&mut self) {
        for container in &mut self.containers {
            container.clear();
        }
    }
}

/// Containers that temporarily refuse protocol operations (e.g. the
/// player's trade offer once locked).
///
/// The trade offer starts locked: it only opens while a trade is being
/// negotiated.
#[derive(Resource, Debug, Clone)]
pub struct ContainerLocks {
    locked: Vec<ContainerKey>,
}

impl Default for ContainerLocks {
    fn default() -> Self {
        Self {
            locked: vec![ContainerKey::TradeOffer],
        }
    }
}

impl ContainerLocks {
    pub fn lock(&mut self, key: ContainerKey) {
        if !self.locked.contains(&key) {
            self.locked.push(key);
        }
    }

    pub fn unlock(&mut self, key: ContainerKey) {
        self.locked.retain(|k| *k != key);
    }

    pub fn is_locked(&self, key: ContainerKey) -> bool {
        self.locked.contains(&key)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HELD-ITEM CURSOR
// ═══════════════════════════════════════════════════════════════════════

/// The single "item in hand". At most one stack is ever held.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldItem {
    stack: Option<ItemStack>,
}

impl HeldItem {
    pub fn is_empty(&self) -> bool {
        self.stack.is_none()
    }

    pub fn stack(&self) -> Option<&ItemStack> {
        self.stack.as_ref()
    }

    pub fn count(&self) -> u8 {
        self.stack.as_ref().map_or(0, |s| s.count)
    }

    pub fn take(&mut self) -> Option<ItemStack> {
        self.stack.take()
    }

    /// Replaces the held stack, returning whatever was held before.
    pub fn replace(&mut self, stack: Option<ItemStack>) -> Option<ItemStack> {
        std::mem::replace(&mut self.stack, stack)
    }

    /// Removes `amount` units from the held stack; the cursor empties when
    /// the count reaches zero. Returns the removed units.
    pub fn take_units(&mut self, amount: u8) -> Option<ItemStack> {
        let held = self.stack.as_mut()?;
        if amount == 0 {
            return None;
        }
        if amount >= held.count {
            return self.stack.take();
        }
        Some(held.split_off(amount))
    }

    pub(crate) fn stack_mut(&mut self) -> Option<&mut ItemStack> {
        self.stack.as_mut()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// REGISTRIES: populated by the data plugin
// ═══════════════════════════════════════════════════════════════════════

/// Texture keys the rendering engine has loaded. Crafting only offers
/// results it can draw.
#[derive(Resource, Debug, Clone, Default)]
pub struct TextureRegistry {
    keys: HashSet<String>,
}

impl TextureRegistry {
    pub fn insert(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn exists(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// An NPC the player can barter with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderDef {
    pub id: NpcId,
    pub name: String,
    /// Stacks the trader may put into a counter-offer.
    pub catalog: Vec<ItemStack>,
    /// Commits go through the transaction pipeline instead of settling locally.
    pub on_chain: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct TraderRegistry {
    pub traders: HashMap<NpcId, TraderDef>,
}

impl TraderRegistry {
    pub fn insert(&mut self, trader: TraderDef) {
        self.traders.insert(trader.id.clone(), trader);
    }

    pub fn get(&self, id: &str) -> Option<&TraderDef> {
        self.traders.get(id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INPUT
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS: cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// Pointer-down on a slot, delivered by the rendering engine. `time` is the
/// host's monotonic timestamp and drives double-click detection.
#[derive(Event, Debug, Clone)]
pub struct SlotClickEvent {
    pub slot: SlotRef,
    pub button: PointerButton,
    pub time: Duration,
}

/// A slot's contents changed; the renderer redraws it.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SlotChangedEvent {
    pub slot: SlotRef,
    pub stack: Option<ItemStack>,
}

/// The cursor changed; the renderer updates the ghost sprite and count
/// badge, or removes both when `stack` is `None`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HeldItemChangedEvent {
    pub stack: Option<ItemStack>,
}

/// The active hotbar index or its contents changed. Gameplay code uses this
/// to know what is equipped.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SlotSelectedEvent {
    pub index: usize,
    pub stack: Option<ItemStack>,
}

/// Request to make `index` the active hotbar slot.
#[derive(Event, Debug, Clone)]
pub struct SelectHotbarSlotEvent {
    pub index: usize,
}

/// External injection (purchase, quest reward, mint completion). Sets the
/// slot contents directly, bypassing the interaction protocol.
#[derive(Event, Debug, Clone)]
pub struct AddItemEvent {
    pub container: ContainerKey,
    pub index: usize,
    pub item_id: ItemId,
    pub item_type: String,
    pub count: u8,
}

/// Put whatever the cursor holds into the first empty backpack slot.
#[derive(Event, Debug, Clone)]
pub struct StowHeldItemEvent;

/// Toast notification for player feedback.
#[derive(Event, Debug, Clone)]
pub struct ToastEvent {
    pub message: String,
    pub duration_secs: f32,
}

/// Helper used by every domain that mutates slots.
pub fn slot_changed(containers: &SlotContainers, slot: SlotRef) -> SlotChangedEvent {
    SlotChangedEvent {
        slot,
        stack: containers.stack(slot).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion(count: u8) -> ItemStack {
        ItemStack::new("potion_01a", "consumable", count)
    }

    #[test]
    fn test_item_stack_clamps_count() {
        assert_eq!(ItemStack::new("coin_01a", "currency", 0).count, 1);
        assert_eq!(ItemStack::new("coin_01a", "currency", 250).count, MAX_STACK_SIZE);
    }

    #[test]
    fn test_container_capacities() {
        let containers = SlotContainers::default();
        assert_eq!(containers.get(ContainerKey::Hotbar).capacity(), 8);
        assert_eq!(containers.get(ContainerKey::Backpack).capacity(), 25);
        assert_eq!(containers.get(ContainerKey::CraftingGrid).capacity(), 9);
        assert_eq!(containers.get(ContainerKey::CraftingResult).capacity(), 1);
        assert_eq!(containers.get(ContainerKey::TradeOffer).capacity(), 5);
        assert_eq!(containers.get(ContainerKey::TradeCounterOffer).capacity(), 5);
        assert_eq!(containers.get(ContainerKey::MarketGrid).capacity(), 30);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_index_is_a_programming_error() {
        let container = SlotContainer::new(ContainerKey::Hotbar);
        let _ = container.get(HOTBAR_SLOTS);
    }

    #[test]
    fn test_insert_first_empty_skips_occupied_slots() {
        let mut backpack = SlotContainer::new(ContainerKey::Backpack);
        backpack.set(0, Some(potion(3)));
        assert_eq!(
            backpack.insert_first_empty(potion(1)),
            InsertResult::Inserted { index: 1 }
        );
    }

    #[test]
    fn test_insert_first_empty_reports_overflow() {
        let mut offer = SlotContainer::new(ContainerKey::TradeOffer);
        for i in 0..TRADE_OFFER_SLOTS {
            offer.set(i, Some(potion(1)));
        }
        let result = offer.insert_first_empty(potion(7));
        assert_eq!(result, InsertResult::Overflow(potion(7)));
    }

    #[test]
    fn test_add_item_is_idempotent_and_zero_clears() {
        let mut containers = SlotContainers::default();
        containers.add_item(ContainerKey::Hotbar, 2, "seed_01a", "seed", 5);
        containers.add_item(ContainerKey::Hotbar, 2, "seed_01a", "seed", 5);
        assert_eq!(containers.get(ContainerKey::Hotbar).count("seed_01a"), 5);

        containers.add_item(ContainerKey::Hotbar, 2, "seed_01a", "seed", 0);
        assert!(containers.get(ContainerKey::Hotbar).is_empty(2));
    }

    #[test]
    fn test_total_ignores_counterparty_and_result_slots() {
        let mut containers = SlotContainers::default();
        containers.add_item_to_backpack(0, "potion_01a", "consumable", 4);
        containers.add_item(ContainerKey::TradeCounterOffer, 0, "potion_01a", "consumable", 9);
        containers.add_item(ContainerKey::CraftingResult, 0, "potion_01a", "crafted", 1);
        assert_eq!(containers.total("potion_01a"), 4);
    }

    #[test]
    fn test_held_item_take_units_empties_at_zero() {
        let mut held = HeldItem::default();
        held.replace(Some(potion(2)));
        assert_eq!(held.take_units(1), Some(potion(1)));
        assert_eq!(held.count(), 1);
        assert_eq!(held.take_units(1), Some(potion(1)));
        assert!(held.is_empty());
    }

    #[test]
    fn test_container_locks() {
        let mut locks = ContainerLocks::default();
        assert!(locks.is_locked(ContainerKey::TradeOffer));
        assert!(!locks.is_locked(ContainerKey::Backpack));
        locks.lock(ContainerKey::TradeOffer);
        locks.lock(ContainerKey::TradeOffer);
        assert!(locks.is_locked(ContainerKey::TradeOffer));
        locks.unlock(ContainerKey::TradeOffer);
        assert!(!locks.is_locked(ContainerKey::TradeOffer));
    }
}
