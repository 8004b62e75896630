//! Wire shapes of the update document.
//!
//! Empty lists and maps are omitted rather than sent empty, so the receiver
//! can tell "no change" from "explicit empty". Attachment fields hold only
//! strings: pre-existing references or placeholder keys naming a binary part.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vtree_types::{Attributes, EntityId, Feature};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub icon: Vec<String>,
    #[serde(default)]
    pub views: Vec<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl ValueDto {
    /// Every attachment string, icon first.
    pub fn attachment_refs(&self) -> impl Iterator<Item = &str> {
        self.icon.iter().chain(&self.views).map(String::as_str)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ValueDto>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl FeatureDto {
    /// The feature's own attributes, as sent for an update. Value changes
    /// travel separately under `values`.
    pub fn attributes_of(feature: &Feature) -> Self {
        Self {
            id: feature.id.clone(),
            values: Vec::new(),
            attributes: feature.attributes.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChangesDto {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create_values: Vec<ValueDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update_values: Vec<ValueDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete_values_id: Vec<EntityId>,
}

/// A change-set whose attachment fields have been lifted to strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChangeSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete_features_id: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update_features: Vec<FeatureDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create_features: Vec<FeatureDto>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<EntityId, ValueChangesDto>,
}

impl WireChangeSet {
    /// Every value DTO that may carry placeholder keys.
    pub fn sent_values(&self) -> impl Iterator<Item = &ValueDto> {
        let created = self.create_features.iter().flat_map(|f| &f.values);
        let touched = self
            .values
            .values()
            .flat_map(|c| c.create_values.iter().chain(&c.update_values));
        created.chain(touched)
    }
}

/// The JSON document sent under the document field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDocument {
    pub product_id: String,
    #[serde(flatten)]
    pub changes: WireChangeSet,
}
