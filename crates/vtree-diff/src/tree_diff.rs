//! Feature-level diff: compare two variant trees and produce a change-set.
//!
//! Features and values are matched by id only. Attribute edits are detected
//! through the [`DirtyState`](vtree_types::DirtyState) tag set by the editor,
//! not by comparing content, so reordering is never reported.

use tracing::debug;
use vtree_types::{Feature, VariantSnapshot};

use crate::change_set::ChangeSet;
use crate::matching::{partition, targets};
use crate::value_diff::diff_values;

/// Compare the edited tree against the server snapshot.
///
/// Returns `None` when no create, update, or delete exists at any level.
pub fn diff_features(current: &[Feature], initial: &[Feature]) -> Option<ChangeSet> {
    let mut change_set = ChangeSet::new();
    let current = partition(current);

    for feature in &current.created {
        debug!(feature = ?feature.id, values = feature.values.len(), "feature created");
        change_set.create_features.push((*feature).clone());
    }

    for (id, initial_feature) in targets(initial) {
        let Some(current_feature) = current.get(id) else {
            // Deleting the feature removes its values server-side.
            debug!(feature = %id, "feature deleted");
            change_set.delete_feature_ids.push(id.clone());
            continue;
        };

        let values = diff_values(id, &current_feature.values, &initial_feature.values);
        if !values.is_empty() {
            change_set.values_by_feature_id.insert(id.clone(), values);
        }

        if current_feature.dirty_state.is_edited() {
            debug!(feature = %id, "feature updated");
            change_set.update_features.push(current_feature.clone());
        }
    }

    if change_set.is_empty() {
        debug!("variant tree unchanged");
        None
    } else {
        debug!(operations = change_set.len(), "variant tree changed");
        Some(change_set)
    }
}

/// [`diff_features`] over a snapshot pair.
pub fn diff_snapshot(snapshot: &VariantSnapshot) -> Option<ChangeSet> {
    diff_features(&snapshot.current, &snapshot.initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vtree_types::{Attachment, DirtyState, EntityId, FeatureValue};

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn value(s: &str) -> FeatureValue {
        FeatureValue::new(id(s))
    }

    fn feature(s: &str, values: Vec<FeatureValue>) -> Feature {
        Feature {
            values,
            ..Feature::new(id(s))
        }
    }

    #[test]
    fn empty_trees_no_changes() {
        assert!(diff_features(&[], &[]).is_none());
    }

    #[test]
    fn identical_trees_no_changes() {
        let tree = vec![
            feature("f1", vec![value("v1"), value("v2")]),
            feature("f2", vec![value("v3")]),
        ];
        assert!(diff_features(&tree, &tree).is_none());
        assert!(diff_snapshot(&VariantSnapshot::unchanged(tree)).is_none());
    }

    #[test]
    fn new_feature_created_in_full() {
        let initial = vec![feature("f1", vec![value("v1")])];
        let added = Feature::draft()
            .with_value(FeatureValue::draft())
            .with_value(FeatureValue::draft());
        let current = vec![initial[0].clone(), added.clone()];

        let cs = diff_features(&current, &initial).unwrap();
        assert_eq!(cs.create_features, vec![added.clone()]);
        assert!(cs.update_features.is_empty());
        assert!(cs.delete_feature_ids.is_empty());
        assert!(cs.values_for(added.id.as_ref().unwrap()).is_none());
    }

    #[test]
    fn new_value_under_existing_feature() {
        let initial = vec![feature("f1", vec![value("v1")])];
        let added = FeatureValue::draft().with_index(1);
        let current = vec![feature("f1", vec![value("v1"), added.clone()])];

        let cs = diff_features(&current, &initial).unwrap();
        assert_eq!(cs.values_for(&id("f1")).unwrap().create_values, vec![added]);
        assert!(cs.update_features.is_empty());
        assert!(cs.delete_feature_ids.is_empty());
    }

    #[test]
    fn removed_value_is_deleted() {
        let initial = vec![feature("f1", vec![value("v1"), value("v2")])];
        let current = vec![feature("f1", vec![value("v1")])];

        let cs = diff_features(&current, &initial).unwrap();
        assert_eq!(cs.values_for(&id("f1")).unwrap().delete_value_ids, vec![id("v2")]);
        assert!(cs.delete_feature_ids.is_empty());
    }

    #[test]
    fn feature_deletion_supersedes_value_diff() {
        let initial = vec![
            feature("f1", vec![value("v1")]),
            feature("f2", vec![value("v2"), value("v3")]),
        ];
        let current = vec![feature("f1", vec![value("v1")])];

        let cs = diff_features(&current, &initial).unwrap();
        assert_eq!(cs.delete_feature_ids, vec![id("f2")]);
        assert!(cs.values_by_feature_id.is_empty());
    }

    #[test]
    fn edited_feature_is_updated() {
        let initial = vec![feature("f1", vec![value("v1")])];
        let current = vec![feature("f1", vec![value("v1")])
            .with_state(DirtyState::Edited)
            .with_attribute("name", serde_json::json!("Colour"))];

        let cs = diff_features(&current, &initial).unwrap();
        assert_eq!(cs.update_features.len(), 1);
        assert_eq!(cs.update_features[0].id, Some(id("f1")));
        assert!(cs.values_by_feature_id.is_empty());
    }

    #[test]
    fn edited_feature_with_value_changes() {
        let initial = vec![feature("f1", vec![value("v1"), value("v2")])];
        let current = vec![feature(
            "f1",
            vec![value("v1").with_state(DirtyState::Edited)],
        )
        .with_state(DirtyState::Edited)];

        let cs = diff_features(&current, &initial).unwrap();
        let values = cs.values_for(&id("f1")).unwrap();
        assert_eq!(values.update_values.len(), 1);
        assert_eq!(values.delete_value_ids, vec![id("v2")]);
        assert_eq!(cs.update_features.len(), 1);
        assert_eq!(cs.len(), 3);
    }

    #[test]
    fn idless_initial_feature_is_never_deleted() {
        let initial = vec![Feature::default().with_value(value("v1"))];
        let current = vec![];
        assert!(diff_features(&current, &initial).is_none());
    }

    #[test]
    fn idless_current_feature_is_never_updated() {
        let initial = vec![feature("f1", vec![])];
        let current = vec![
            feature("f1", vec![]),
            Feature::default().with_state(DirtyState::Edited),
        ];
        assert!(diff_features(&current, &initial).is_none());
    }

    #[test]
    fn duplicate_current_feature_first_wins() {
        let initial = vec![feature("f1", vec![value("v1")])];
        let current = vec![
            feature("f1", vec![value("v1")]),
            feature("f1", vec![]).with_state(DirtyState::Edited),
        ];
        // The second f1 is dropped: no update, and v1 is not deleted.
        assert!(diff_features(&current, &initial).is_none());
    }

    #[test]
    fn duplicate_initial_feature_deleted_once() {
        let initial = vec![feature("f1", vec![]), feature("f1", vec![])];
        let cs = diff_features(&[], &initial).unwrap();
        assert_eq!(cs.delete_feature_ids, vec![id("f1")]);
    }

    #[test]
    fn edited_value_with_new_attachment_scenario() {
        let initial = vec![feature(
            "f1",
            vec![value("v1").with_views(vec![Attachment::reference("url1")])],
        )];
        let v1 = value("v1").with_state(DirtyState::Edited).with_views(vec![
            Attachment::reference("url1"),
            Attachment::binary(b"binaryA".to_vec()),
        ]);
        let current = vec![feature("f1", vec![v1.clone()])];

        let cs = diff_features(&current, &initial).unwrap();
        assert_eq!(cs.values_for(&id("f1")).unwrap().update_values, vec![v1]);
        assert!(cs.update_features.is_empty());
        assert_eq!(cs.summary().attachments, 1);
    }

    #[test]
    fn delete_ids_only_come_from_initial_tree() {
        let initial = vec![feature("f1", vec![])];
        let current = vec![feature("f2", vec![]).with_state(DirtyState::Edited)];

        let cs = diff_features(&current, &initial).unwrap();
        assert_eq!(cs.delete_feature_ids, vec![id("f1")]);
        assert!(cs.update_features.is_empty());
    }

    fn arb_tree() -> impl Strategy<Value = Vec<Feature>> {
        proptest::collection::btree_map(
            "[a-z0-9]{1,8}",
            proptest::collection::btree_set("[a-z0-9.]{1,8}", 0..6),
            0..6,
        )
        .prop_map(|features| {
            features
                .into_iter()
                .map(|(fid, vids)| {
                    let values = vids
                        .into_iter()
                        .enumerate()
                        .map(|(i, vid)| value(&vid).with_index(i as u32))
                        .collect();
                    feature(&fid, values)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_diff_of_unchanged_tree_is_none(tree in arb_tree()) {
            prop_assert!(diff_features(&tree, &tree).is_none());
        }

        #[test]
        fn prop_removing_every_feature_deletes_each_once(tree in arb_tree()) {
            let result = diff_features(&[], &tree);
            prop_assert_eq!(result.is_none(), tree.is_empty());
            if let Some(cs) = result {
                prop_assert_eq!(cs.delete_feature_ids.len(), tree.len());
                prop_assert!(cs.values_by_feature_id.is_empty());
            }
        }
    }
}
