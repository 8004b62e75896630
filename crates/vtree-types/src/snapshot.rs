use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::variant::Feature;

/// The pair of variant trees handed to the engine on every save attempt.
///
/// `initial` is the last snapshot received from the server, `current` is the
/// tree as edited, tagged with dirty states. Nothing is retained between
/// save attempts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    #[serde(default)]
    pub current: Vec<Feature>,
    #[serde(default)]
    pub initial: Vec<Feature>,
}

impl VariantSnapshot {
    pub fn new(current: Vec<Feature>, initial: Vec<Feature>) -> Self {
        Self { current, initial }
    }

    /// A snapshot whose edited tree is identical to the server tree.
    pub fn unchanged(tree: Vec<Feature>) -> Self {
        Self {
            current: tree.clone(),
            initial: tree,
        }
    }

    pub fn from_json(json: &str) -> TypeResult<Self> {
        serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> TypeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
