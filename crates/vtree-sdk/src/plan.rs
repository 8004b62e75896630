use vtree_diff::ChangeSummary;
use vtree_payload::{MultipartCodec, PayloadResult, TransportPayload, UpdateDocument};

/// Result of preparing a save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The edited tree matches the server snapshot; nothing to send.
    NoChanges,
    Ready(SavePlan),
}

impl SaveOutcome {
    pub fn is_no_changes(&self) -> bool {
        matches!(self, Self::NoChanges)
    }

    pub fn plan(&self) -> Option<&SavePlan> {
        match self {
            Self::NoChanges => None,
            Self::Ready(plan) => Some(plan),
        }
    }

    pub fn into_plan(self) -> Option<SavePlan> {
        match self {
            Self::NoChanges => None,
            Self::Ready(plan) => Some(plan),
        }
    }
}

/// A payload ready to be handed to the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavePlan {
    pub product_id: String,
    pub summary: ChangeSummary,
    pub payload: TransportPayload,
    boundary: String,
}

impl SavePlan {
    pub(crate) fn new(
        product_id: String,
        summary: ChangeSummary,
        payload: TransportPayload,
        boundary: String,
    ) -> Self {
        Self {
            product_id,
            summary,
            payload,
            boundary,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `Content-Type` header for [`encode_body`](Self::encode_body).
    pub fn content_type(&self) -> String {
        MultipartCodec::content_type(&self.boundary)
    }

    pub fn encode_body(&self) -> PayloadResult<Vec<u8>> {
        MultipartCodec::encode(&self.payload, &self.boundary)
    }

    pub fn document(&self) -> PayloadResult<UpdateDocument> {
        self.payload.document()
    }

    pub fn attachment_count(&self) -> usize {
        self.payload.binary_parts().count()
    }
}
