//! Id-based matching shared by the feature and value levels.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::warn;
use vtree_types::{EntityId, Tracked};

/// Current entities split by dirty state.
pub(crate) struct Partition<'a, T> {
    /// Entities tagged `New`, in tree order.
    pub created: Vec<&'a T>,
    /// Every other entity carrying an id. On duplicate ids the first
    /// occurrence wins.
    pub existing: HashMap<&'a EntityId, &'a T>,
}

impl<'a, T> Partition<'a, T> {
    pub fn get(&self, id: &EntityId) -> Option<&'a T> {
        self.existing.get(id).copied()
    }
}

pub(crate) fn partition<T: Tracked>(current: &[T]) -> Partition<'_, T> {
    let mut created = Vec::new();
    let mut existing = HashMap::with_capacity(current.len());

    for entity in current {
        if entity.dirty_state().is_new() {
            created.push(entity);
            continue;
        }
        match entity.entity_id() {
            Some(id) => match existing.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(entity);
                }
                Entry::Occupied(_) => {
                    warn!(kind = T::KIND, id = %id, "duplicate id in current tree, keeping first occurrence");
                }
            },
            None => {
                warn!(kind = T::KIND, "current entity without id cannot be matched, skipped");
            }
        }
    }

    Partition { created, existing }
}

/// Initial entities eligible as update/delete targets: those with an id,
/// each id once, in tree order.
pub(crate) fn targets<T: Tracked>(initial: &[T]) -> Vec<(&EntityId, &T)> {
    let mut seen = HashSet::with_capacity(initial.len());
    let mut out = Vec::with_capacity(initial.len());

    for entity in initial {
        let Some(id) = entity.entity_id() else {
            warn!(kind = T::KIND, "initial entity without id cannot be diffed, skipped");
            continue;
        };
        if !seen.insert(id) {
            warn!(kind = T::KIND, id = %id, "duplicate id in initial tree, keeping first occurrence");
            continue;
        }
        out.push((id, entity));
    }

    out
}
