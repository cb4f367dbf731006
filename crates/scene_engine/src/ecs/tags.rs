//! Named tag bits and the per-bit entity index
//!
//! A tag is a `u32` bitmask; up to [`MAX_TAGS`] bits can be given names via
//! [`TagRegistry`]. [`TagLists`] keeps, for every bit, the active entities that
//! carry it, in entity-list order.

use std::collections::HashMap;

use thiserror::Error;

use crate::ecs::entity::EntityId;

/// Number of distinct tag bits
pub const MAX_TAGS: usize = 32;

/// A named tag bit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitTag {
    id: usize,
    value: u32,
    name: String,
}

impl BitTag {
    /// Bit index
    pub fn id(&self) -> usize {
        self.id
    }

    /// Single-bit mask
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Name as registered
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Tag registration and lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// Every bit already has a name
    #[error("cannot register tag '{0}': all {MAX_TAGS} tags are in use")]
    Exhausted(String),

    /// The name is already registered
    #[error("tag '{0}' is already registered")]
    Duplicate(String),

    /// No tag with this name
    #[error("no tag named '{0}'")]
    Unknown(String),
}

/// Case-insensitive name to bit mapping
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: Vec<BitTag>,
    by_name: HashMap<String, usize>,
}

impl TagRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next free bit for `name`
    pub fn register(&mut self, name: &str) -> Result<BitTag, TagError> {
        let key = name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(TagError::Duplicate(name.to_string()));
        }
        let id = self.tags.len();
        if id >= MAX_TAGS {
            return Err(TagError::Exhausted(name.to_string()));
        }
        let tag = BitTag { id, value: 1 << id, name: name.to_string() };
        self.tags.push(tag.clone());
        self.by_name.insert(key, id);
        log::debug!("registered tag '{name}' as bit {id}");
        Ok(tag)
    }

    /// Look up a tag by name, ignoring case
    pub fn get(&self, name: &str) -> Result<&BitTag, TagError> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&id| &self.tags[id])
            .ok_or_else(|| TagError::Unknown(name.to_string()))
    }

    /// Look up a tag by bit index
    pub fn by_id(&self, id: usize) -> Option<&BitTag> {
        self.tags.get(id)
    }

    /// Combined mask of the named tags
    pub fn mask(&self, names: &[&str]) -> Result<u32, TagError> {
        names
            .iter()
            .try_fold(0, |mask, name| Ok(mask | self.get(name)?.value))
    }

    /// Number of registered tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tag is registered
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

fn bits(mask: u32) -> impl Iterator<Item = usize> {
    (0..MAX_TAGS).filter(move |bit| mask & (1 << bit) != 0)
}

/// For each tag bit, the active entities carrying it
#[derive(Debug)]
pub struct TagLists {
    lists: [Vec<EntityId>; MAX_TAGS],
    unsorted: u32,
}

impl Default for TagLists {
    fn default() -> Self {
        Self { lists: std::array::from_fn(|_| Vec::new()), unsorted: 0 }
    }
}

impl TagLists {
    /// Create empty lists
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities carrying bit `bit`, in entity-list order as of the last flush
    pub fn get(&self, bit: usize) -> &[EntityId] {
        self.lists.get(bit).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `id` is listed under bit `bit`
    pub fn contains(&self, bit: usize, id: EntityId) -> bool {
        self.get(bit).contains(&id)
    }

    pub(crate) fn entity_added(&mut self, id: EntityId, tag: u32) {
        for bit in bits(tag) {
            self.lists[bit].push(id);
        }
        self.unsorted |= tag;
    }

    pub(crate) fn entity_removed(&mut self, id: EntityId, tag: u32) {
        for bit in bits(tag) {
            self.lists[bit].retain(|&other| other != id);
        }
    }

    pub(crate) fn tag_changed(&mut self, id: EntityId, old: u32, new: u32) {
        self.entity_removed(id, old & !new);
        self.entity_added(id, new & !old);
    }

    pub(crate) fn mark_unsorted(&mut self, tag: u32) {
        self.unsorted |= tag;
    }

    /// Re-sort dirty lists by the entity list's order
    pub(crate) fn update_lists(&mut self, order: &HashMap<EntityId, usize>) {
        for bit in bits(self.unsorted) {
            self.lists[bit].sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
        }
        self.unsorted = 0;
    }

    pub(crate) fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
        self.unsorted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_case_insensitive() {
        let mut registry = TagRegistry::new();
        let player = registry.register("Player").unwrap();
        let solid = registry.register("solid").unwrap();

        assert_eq!(player.value(), 1);
        assert_eq!(solid.value(), 2);
        assert_eq!(registry.get("PLAYER").unwrap().id(), 0);
        assert_eq!(registry.mask(&["player", "Solid"]).unwrap(), 3);
        assert_eq!(registry.register("player"), Err(TagError::Duplicate("player".into())));
        assert!(matches!(registry.get("enemy"), Err(TagError::Unknown(_))));
    }

    #[test]
    fn test_registry_runs_out_of_bits() {
        let mut registry = TagRegistry::new();
        for i in 0..MAX_TAGS {
            registry.register(&format!("tag{i}")).unwrap();
        }
        assert!(matches!(registry.register("one_more"), Err(TagError::Exhausted(_))));
    }

    #[test]
    fn test_tag_change_moves_entity_between_lists() {
        let mut lists = TagLists::new();
        let id = EntityId::new(7);
        lists.entity_added(id, 0b011);

        lists.tag_changed(id, 0b011, 0b110);

        assert!(!lists.contains(0, id));
        assert!(lists.contains(1, id));
        assert!(lists.contains(2, id));
        assert_eq!(lists.get(1).len(), 1);
    }

    #[test]
    fn test_update_lists_follows_entity_order() {
        let mut lists = TagLists::new();
        let (a, b) = (EntityId::new(1), EntityId::new(2));
        lists.entity_added(a, 1);
        lists.entity_added(b, 1);

        let order = HashMap::from([(a, 1), (b, 0)]);
        lists.update_lists(&order);

        assert_eq!(lists.get(0), &[b, a]);
        assert!(lists.get(40).is_empty());
    }
}
