//! Change-set produced by the differencer.
//!
//! A [`ChangeSet`] is only ever constructed non-empty: "nothing changed" is
//! represented by `None` at the call site, never by an empty value.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use vtree_types::{EntityId, Feature, FeatureValue};

/// Create/update/delete operations for the values of one existing feature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValueChanges {
    pub create_values: Vec<FeatureValue>,
    pub update_values: Vec<FeatureValue>,
    pub delete_value_ids: Vec<EntityId>,
}

impl ValueChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no value operations.
    pub fn is_empty(&self) -> bool {
        self.create_values.is_empty()
            && self.update_values.is_empty()
            && self.delete_value_ids.is_empty()
    }

    /// Number of value operations.
    pub fn len(&self) -> usize {
        self.create_values.len() + self.update_values.len() + self.delete_value_ids.len()
    }
}

/// The result of comparing an edited variant tree with the server snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Ids present in the initial tree and absent from the current tree.
    pub delete_feature_ids: Vec<EntityId>,
    /// New features, sent in full including their values.
    pub create_features: Vec<Feature>,
    /// Existing features whose own attributes were edited.
    pub update_features: Vec<Feature>,
    /// Value-level operations keyed by the owning feature id.
    pub values_by_feature_id: BTreeMap<EntityId, ValueChanges>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no operation is recorded at any level.
    pub fn is_empty(&self) -> bool {
        self.delete_feature_ids.is_empty()
            && self.create_features.is_empty()
            && self.update_features.is_empty()
            && self.values_by_feature_id.values().all(ValueChanges::is_empty)
    }

    /// Total number of operations across both levels.
    pub fn len(&self) -> usize {
        self.delete_feature_ids.len()
            + self.create_features.len()
            + self.update_features.len()
            + self
                .values_by_feature_id
                .values()
                .map(ValueChanges::len)
                .sum::<usize>()
    }

    /// Value operations recorded for `feature_id`.
    pub fn values_for(&self, feature_id: &EntityId) -> Option<&ValueChanges> {
        self.values_by_feature_id.get(feature_id)
    }

    /// Number of binary attachments waiting to be lifted out of the values
    /// this change-set sends.
    pub fn pending_attachments(&self) -> usize {
        let created = self
            .create_features
            .iter()
            .flat_map(|f| &f.values)
            .map(FeatureValue::binary_count);
        let touched = self
            .values_by_feature_id
            .values()
            .flat_map(|c| c.create_values.iter().chain(&c.update_values))
            .map(FeatureValue::binary_count);
        created.chain(touched).sum()
    }

    pub fn summary(&self) -> ChangeSummary {
        let values = self.values_by_feature_id.values();
        ChangeSummary {
            features_created: self.create_features.len(),
            features_updated: self.update_features.len(),
            features_deleted: self.delete_feature_ids.len(),
            values_created: values.clone().map(|c| c.create_values.len()).sum(),
            values_updated: values.clone().map(|c| c.update_values.len()).sum(),
            values_deleted: values.map(|c| c.delete_value_ids.len()).sum(),
            attachments: self.pending_attachments(),
        }
    }
}

/// Per-kind operation counts, for logs and CLI output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub features_created: usize,
    pub features_updated: usize,
    pub features_deleted: usize,
    pub values_created: usize,
    pub values_updated: usize,
    pub values_deleted: usize,
    pub attachments: usize,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "features +{} ~{} -{}, values +{} ~{} -{}, {} new attachment(s)",
            self.features_created,
            self.features_updated,
            self.features_deleted,
            self.values_created,
            self.values_updated,
            self.values_deleted,
            self.attachments,
        )
    }
}
