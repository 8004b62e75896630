//! Features and their values as edited by the dashboard.
//!
//! Both levels carry an optional [`EntityId`], a [`DirtyState`] tag, and a
//! free-form attribute map that the engine passes through untouched.

use serde::{Deserialize, Serialize};

use crate::attachment::{Attachment, AttachmentField};
use crate::identity::{deserialize_optional_id, EntityId};

/// Free-form attributes (name, color code, price delta...) flattened into
/// the entity's JSON object.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Editing tag set by the UI and consumed read-only by the differencer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtyState {
    /// Not touched since the snapshot was loaded.
    #[default]
    Unchanged,
    /// Existing entity whose own attributes were modified.
    Edited,
    /// Created during this editing session.
    New,
}

impl DirtyState {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    pub fn is_edited(&self) -> bool {
        matches!(self, Self::Edited)
    }
}

/// Common view over features and values used by the differencer.
pub trait Tracked {
    /// Entity kind, for log messages.
    const KIND: &'static str;

    fn entity_id(&self) -> Option<&EntityId>;

    fn dirty_state(&self) -> DirtyState;
}

/// One concrete option under a feature (e.g. "Red").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureValue {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<EntityId>,
    /// Display order within the owning feature.
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub icon: Vec<Attachment>,
    #[serde(default)]
    pub views: Vec<Attachment>,
    #[serde(default)]
    pub dirty_state: DirtyState,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl FeatureValue {
    pub fn new(id: EntityId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// A value created in the editor, carrying a fresh draft id.
    pub fn draft() -> Self {
        Self::new(EntityId::draft()).with_state(DirtyState::New)
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn with_state(mut self, state: DirtyState) -> Self {
        self.dirty_state = state;
        self
    }

    pub fn with_icon(mut self, icon: Vec<Attachment>) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_views(mut self, views: Vec<Attachment>) -> Self {
        self.views = views;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn field(&self, field: AttachmentField) -> &[Attachment] {
        match field {
            AttachmentField::Icon => &self.icon,
            AttachmentField::Views => &self.views,
        }
    }

    /// Number of not-yet-uploaded attachments across both fields.
    pub fn binary_count(&self) -> usize {
        AttachmentField::ALL
            .iter()
            .flat_map(|f| self.field(*f))
            .filter(|a| a.is_binary())
            .count()
    }
}

/// A variant axis of a product (e.g. "Color").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub values: Vec<FeatureValue>,
    #[serde(default)]
    pub dirty_state: DirtyState,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(id: EntityId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// A feature created in the editor, carrying a fresh draft id.
    pub fn draft() -> Self {
        Self::new(EntityId::draft()).with_state(DirtyState::New)
    }

    pub fn with_state(mut self, state: DirtyState) -> Self {
        self.dirty_state = state;
        self
    }

    pub fn with_value(mut self, value: FeatureValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// First value carrying `id`.
    pub fn value(&self, id: &EntityId) -> Option<&FeatureValue> {
        self.values.iter().find(|v| v.id.as_ref() == Some(id))
    }
}

impl Tracked for Feature {
    const KIND: &'static str = "feature";

    fn entity_id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn dirty_state(&self) -> DirtyState {
        self.dirty_state
    }
}

impl Tracked for FeatureValue {
    const KIND: &'static str = "value";

    fn entity_id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    fn dirty_state(&self) -> DirtyState {
        self.dirty_state
    }
}
