use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PayloadError, PayloadResult};

/// Field name of the JSON update document expected by the storefront API.
pub const DEFAULT_DOCUMENT_FIELD: &str = "multiple_update_features";
pub const DEFAULT_PRODUCT_ID_FIELD: &str = "product_id";
pub const DEFAULT_BOUNDARY: &str = "vtree-variant-boundary";
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 32 * 1024 * 1024;

/// RFC 2046 limit on boundary length.
const MAX_BOUNDARY_LEN: usize = 70;

/// Payload assembly settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Multipart field carrying the JSON update document.
    pub document_field: String,
    /// Multipart field carrying the product id.
    pub product_id_field: String,
    /// Multipart boundary. Fixed so encoded bodies are reproducible.
    pub boundary: String,
    /// Largest accepted binary attachment in bytes, `0` for no limit.
    pub max_attachment_bytes: u64,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            document_field: DEFAULT_DOCUMENT_FIELD.into(),
            product_id_field: DEFAULT_PRODUCT_ID_FIELD.into(),
            boundary: DEFAULT_BOUNDARY.into(),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl PayloadConfig {
    pub fn from_toml_str(s: &str) -> PayloadResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| PayloadError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> PayloadResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> PayloadResult<String> {
        toml::to_string_pretty(self).map_err(|e| PayloadError::Config(e.to_string()))
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn with_max_attachment_bytes(mut self, max: u64) -> Self {
        self.max_attachment_bytes = max;
        self
    }

    /// The attachment size limit, if one is enforced.
    pub fn attachment_limit(&self) -> Option<u64> {
        (self.max_attachment_bytes > 0).then_some(self.max_attachment_bytes)
    }

    pub fn validate(&self) -> PayloadResult<()> {
        if self.document_field.is_empty() || self.product_id_field.is_empty() {
            return Err(PayloadError::Config("field names must not be empty".into()));
        }
        if self.document_field == self.product_id_field {
            return Err(PayloadError::Config(format!(
                "document and product id share the field name {}",
                self.document_field
            )));
        }
        validate_boundary(&self.boundary).map_err(PayloadError::Config)
    }
}

pub(crate) fn validate_boundary(boundary: &str) -> Result<(), String> {
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
        return Err(format!(
            "boundary must be 1..={MAX_BOUNDARY_LEN} characters, got {}",
            boundary.len()
        ));
    }
    if !boundary.chars().all(|c| c.is_ascii_graphic() && c != '"') {
        return Err(format!("boundary contains unsupported characters: {boundary:?}"));
    }
    Ok(())
}
