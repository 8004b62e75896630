//! Value-level diff for one matched feature pair.

use tracing::debug;
use vtree_types::{EntityId, FeatureValue};

use crate::change_set::ValueChanges;
use crate::matching::{partition, targets};

/// Compare the values of a feature present on both sides.
///
/// New values are created, initial values missing from the current tree are
/// deleted, and matched values tagged `Edited` are updated. Index changes
/// alone are not an operation.
pub fn diff_values(
    feature_id: &EntityId,
    current: &[FeatureValue],
    initial: &[FeatureValue],
) -> ValueChanges {
    let mut changes = ValueChanges::new();
    let current = partition(current);

    for value in &current.created {
        debug!(feature = %feature_id, value = ?value.id, "value created");
        changes.create_values.push((*value).clone());
    }

    for (id, _) in targets(initial) {
        match current.get(id) {
            None => {
                debug!(feature = %feature_id, value = %id, "value deleted");
                changes.delete_value_ids.push(id.clone());
            }
            Some(value) if value.dirty_state.is_edited() => {
                debug!(feature = %feature_id, value = %id, "value updated");
                changes.update_values.push(value.clone());
            }
            Some(_) => {}
        }
    }

    changes
}
