use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TypeError;

/// Prefix carried by client-minted ids of entities the server has not seen.
pub const DRAFT_PREFIX: &str = "draft.";

/// Characters removed by [`EntityId::key_safe`]. `:` separates the id from
/// the field name inside a placeholder key, `.` is not accepted by the
/// receiving multipart parser.
pub const KEY_SEPARATORS: &[char] = &['.', ':'];

/// Identifier of a feature or a value.
///
/// Persisted ids are assigned by the server and are opaque. Draft ids are
/// minted by the editing surface for entities that do not exist server-side
/// yet, so that attachments added to a new value can still be keyed
/// deterministically. An `EntityId` is never empty.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Mint a fresh time-ordered draft id (UUID v7).
    pub fn draft() -> Self {
        Self(format!("{DRAFT_PREFIX}{}", uuid::Uuid::now_v7().simple()))
    }

    /// Returns `true` if this id was minted client-side.
    pub fn is_draft(&self) -> bool {
        self.0.starts_with(DRAFT_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id with separator characters stripped, safe to embed in a
    /// multipart field name.
    pub fn key_safe(&self) -> String {
        self.0.chars().filter(|c| !KEY_SEPARATORS.contains(c)).collect()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntityId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Deserialize an optional id, treating `null`, a missing key, and blank
/// strings as "no id". The dashboard sends `""` for entities it has not
/// assigned an id to.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| EntityId::new(s).ok()))
}
