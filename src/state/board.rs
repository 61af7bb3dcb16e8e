use std::collections::HashMap;
use thiserror::Error;

use super::data::{Container, ContainerId, ImageSource, Item, ItemId};
use crate::config::TierConfig;

/// Sentinel label of the unsorted tray
pub const TRAY_LABEL: &str = "tray";
const TRAY_COLOR: [u8; 3] = [0x1f, 0x1f, 0x1f];

/// Errors raised by precondition-checked board operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("item {0} does not exist")]
    UnknownItem(ItemId),
    #[error("item {item} is not held by {container}")]
    NotInContainer { item: ItemId, container: ContainerId },
}

/// Frozen view of one tier row, taken for export
#[derive(Debug, Clone)]
pub struct RowSnapshot {
    pub label: String,
    pub color: [u8; 3],
    pub sources: Vec<ImageSource>,
}

/// Frozen view of every tier row (tray excluded)
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub rows: Vec<RowSnapshot>,
}

/// The Board owns every item and the fixed set of containers.
///
/// All ownership changes go through `&mut self` methods, so a caller can
/// never observe an item held by two containers or by none.
#[derive(Debug)]
pub struct Board {
    items: HashMap<ItemId, Item>,
    tray: Container,
    tiers: Vec<Container>,
    next_id: u64,
}

impl Board {
    /// Create an empty board with one row per configured tier
    pub fn new(tiers: &[TierConfig]) -> Self {
        let tiers = tiers
            .iter()
            .enumerate()
            .map(|(index, tier)| Container::new(ContainerId::Tier(index), &tier.label, tier.color))
            .collect();

        Board {
            items: HashMap::new(),
            tray: Container::new(ContainerId::Tray, TRAY_LABEL, TRAY_COLOR),
            tiers,
            next_id: 1,
        }
    }

    pub fn tray(&self) -> &Container {
        &self.tray
    }

    pub fn tiers(&self) -> &[Container] {
        &self.tiers
    }

    /// All containers, tier rows first then the tray
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.tiers.iter().chain(std::iter::once(&self.tray))
    }

    /// Look up a container.
    ///
    /// Panics on an unknown container: the set is fixed at startup, so a bad
    /// id is a defect in the caller.
    pub fn container(&self, id: ContainerId) -> &Container {
        match id {
            ContainerId::Tray => &self.tray,
            ContainerId::Tier(index) => self
                .tiers
                .get(index)
                .unwrap_or_else(|| panic!("unknown container {}", id)),
        }
    }

    fn container_mut(&mut self, id: ContainerId) -> &mut Container {
        match id {
            ContainerId::Tray => &mut self.tray,
            ContainerId::Tier(index) => self
                .tiers
                .get_mut(index)
                .unwrap_or_else(|| panic!("unknown container {}", id)),
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// The container currently holding `item`
    pub fn owner_of(&self, item: ItemId) -> Option<ContainerId> {
        self.containers()
            .find(|container| container.contains(item))
            .map(|container| container.id)
    }

    /// True if any existing item carries exactly this source
    pub fn contains_source(&self, source: &ImageSource) -> bool {
        self.items.values().any(|item| &item.source == source)
    }

    /// Create a new item and append it to the tray
    pub fn add_item(&mut self, source: ImageSource) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;

        self.items.insert(id, Item { id, source });
        self.tray.items.push(id);
        id
    }

    /// Append `item` to `target`, detaching it from its current container.
    ///
    /// Placing an item into the container that already holds it leaves the
    /// board untouched. Returns whether anything moved.
    pub fn place_item(&mut self, item: ItemId, target: ContainerId) -> Result<bool, BoardError> {
        // Resolve the target first so a bad id panics before any mutation
        self.container(target);

        let owner = self.owner_of(item).ok_or(BoardError::UnknownItem(item))?;
        if owner == target {
            return Ok(false);
        }

        self.container_mut(owner).items.retain(|held| *held != item);
        self.container_mut(target).items.push(item);
        Ok(true)
    }

    /// Detach `item` from `container`, handing ownership to the caller.
    ///
    /// Used by the drag machine, which re-attaches the item with
    /// [`Board::append_item`] within the same transition.
    pub fn remove_item(&mut self, item: ItemId, container: ContainerId) -> Result<Item, BoardError> {
        let holder = self.container_mut(container);
        let position = holder
            .items
            .iter()
            .position(|held| *held == item)
            .ok_or(BoardError::NotInContainer { item, container })?;
        holder.items.remove(position);

        self.items.remove(&item).ok_or(BoardError::UnknownItem(item))
    }

    /// Re-attach a detached item at the end of `target`, keeping its identity
    pub fn append_item(&mut self, item: Item, target: ContainerId) {
        let id = item.id;
        self.container_mut(target).items.push(id);
        self.items.insert(id, item);
    }

    /// Return every item in every tier row to the tray, row by row
    pub fn reset(&mut self) -> usize {
        let mut returned = 0;
        for tier in &mut self.tiers {
            returned += tier.items.len();
            self.tray.items.append(&mut tier.items);
        }
        returned
    }

    /// Capture the tier rows for export
    pub fn snapshot(&self) -> BoardSnapshot {
        let rows = self
            .tiers
            .iter()
            .map(|tier| RowSnapshot {
                label: tier.label.clone(),
                color: tier.color,
                sources: tier
                    .items
                    .iter()
                    .filter_map(|id| self.items.get(id))
                    .map(|item| item.source.clone())
                    .collect(),
            })
            .collect();

        BoardSnapshot { rows }
    }

    /// Every stored item sits in exactly one container, and every
    /// container entry refers to a stored item
    #[cfg(test)]
    pub fn has_exclusive_ownership(&self) -> bool {
        let held: Vec<ItemId> = self
            .containers()
            .flat_map(|container| container.items.iter().copied())
            .collect();

        held.len() == self.items.len()
            && self.items.keys().all(|id| held.iter().filter(|h| *h == id).count() == 1)
    }
}
