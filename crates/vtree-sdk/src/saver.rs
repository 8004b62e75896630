use tracing::{debug, info};
use vtree_diff::diff_snapshot;
use vtree_payload::{assemble, extract_attachments, PayloadConfig};
use vtree_types::VariantSnapshot;

use crate::error::{SdkError, SdkResult};
use crate::plan::{SaveOutcome, SavePlan};

/// Save pipeline for one product's variant tree.
///
/// Holds no state between calls; the same saver may prepare any number of
/// snapshots.
#[derive(Clone, Debug, Default)]
pub struct VariantSaver {
    config: PayloadConfig,
}

impl VariantSaver {
    pub fn new(config: PayloadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PayloadConfig {
        &self.config
    }

    /// Diff `snapshot`, extract attachments, and assemble the payload.
    pub fn prepare(&self, product_id: &str, snapshot: &VariantSnapshot) -> SdkResult<SaveOutcome> {
        if product_id.trim().is_empty() {
            return Err(SdkError::InvalidProductId(product_id.to_string()));
        }
        self.config.validate()?;

        let Some(change_set) = diff_snapshot(snapshot) else {
            info!(product_id, "no variant changes");
            return Ok(SaveOutcome::NoChanges);
        };
        let summary = change_set.summary();
        debug!(product_id, %summary, "variant changes detected");

        let extracted = extract_attachments(&change_set)?;
        let payload = assemble(product_id, extracted, &self.config)?;

        info!(
            product_id,
            parts = payload.len(),
            attachments = payload.binary_parts().count(),
            "save payload prepared"
        );
        Ok(SaveOutcome::Ready(SavePlan::new(
            product_id.to_string(),
            summary,
            payload,
            self.config.boundary.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vtree_payload::PayloadError;
    use vtree_types::{Attachment, DirtyState, EntityId, Feature, FeatureValue};

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn server_tree() -> Vec<Feature> {
        vec![Feature::new(id("f1"))
            .with_attribute("name", json!("Color"))
            .with_value(FeatureValue::new(id("v1")).with_views(vec![Attachment::reference("url1")]))]
    }

    fn edited_snapshot() -> VariantSnapshot {
        let current = vec![Feature::new(id("f1"))
            .with_attribute("name", json!("Color"))
            .with_value(
                FeatureValue::new(id("v1"))
                    .with_state(DirtyState::Edited)
                    .with_views(vec![
                        Attachment::reference("url1"),
                        Attachment::binary(b"binaryA".to_vec()),
                    ]),
            )];
        VariantSnapshot::new(current, server_tree())
    }

    #[test]
    fn unchanged_tree_is_no_changes() {
        let saver = VariantSaver::default();
        let outcome = saver.prepare("p1", &VariantSnapshot::unchanged(server_tree())).unwrap();
        assert!(outcome.is_no_changes());
        assert!(outcome.plan().is_none());
    }

    #[test]
    fn edited_value_produces_plan() {
        let saver = VariantSaver::default();
        let plan = saver.prepare("p42", &edited_snapshot()).unwrap().into_plan().unwrap();

        assert_eq!(plan.product_id, "p42");
        assert_eq!(plan.summary.values_updated, 1);
        assert_eq!(plan.attachment_count(), 1);

        let doc = plan.document().unwrap();
        let update = &doc.changes.values[&id("f1")].update_values[0];
        assert_eq!(update.views, vec!["url1", "v1:views_1"]);
        assert!(plan.payload.verify_references().is_ok());
    }

    #[test]
    fn body_uses_configured_boundary() {
        let saver = VariantSaver::new(PayloadConfig::default().with_boundary("test-boundary"));
        let plan = saver.prepare("p42", &edited_snapshot()).unwrap().into_plan().unwrap();

        assert_eq!(plan.content_type(), "multipart/form-data; boundary=test-boundary");
        let body = plan.encode_body().unwrap();
        assert!(body.starts_with(b"--test-boundary\r\n"));
        assert!(body.ends_with(b"--test-boundary--\r\n"));
    }

    #[test]
    fn deleted_feature_plan_has_no_attachments() {
        let saver = VariantSaver::default();
        let snapshot = VariantSnapshot::new(vec![], server_tree());
        let plan = saver.prepare("p1", &snapshot).unwrap().into_plan().unwrap();
        assert_eq!(plan.summary.features_deleted, 1);
        assert_eq!(plan.attachment_count(), 0);
        assert_eq!(plan.document().unwrap().changes.delete_features_id, vec![id("f1")]);
    }

    #[test]
    fn invalid_config_rejected_before_assembly() {
        let config = PayloadConfig {
            document_field: "product_id".into(),
            ..PayloadConfig::default()
        };
        let err = VariantSaver::new(config).prepare("p1", &edited_snapshot()).unwrap_err();
        assert!(matches!(err, SdkError::Payload(PayloadError::Config(_))));
    }

    #[test]
    fn blank_product_id_rejected() {
        let err = VariantSaver::default().prepare("  ", &edited_snapshot()).unwrap_err();
        assert!(matches!(err, SdkError::InvalidProductId(_)));
    }

    #[test]
    fn attachment_limit_surfaces_as_payload_error() {
        let saver = VariantSaver::new(PayloadConfig::default().with_max_attachment_bytes(3));
        let err = saver.prepare("p1", &edited_snapshot()).unwrap_err();
        assert!(matches!(
            err,
            SdkError::Payload(PayloadError::AttachmentTooLarge { .. })
        ));
    }

    #[test]
    fn snapshot_from_json_end_to_end() {
        let snapshot = VariantSnapshot::from_json(
            r#"{
                "initial": [],
                "current": [{ "dirty_state": "new", "name": "Size", "values": [
                    { "id": "draft.1", "dirty_state": "new", "icon": [{ "data": "0102" }] }
                ] }]
            }"#,
        )
        .unwrap();
        let plan = VariantSaver::default().prepare("p7", &snapshot).unwrap().into_plan().unwrap();
        assert_eq!(plan.summary.features_created, 1);
        let binary = plan.payload.part("draft1:icon_0").unwrap();
        assert_eq!(binary.body_bytes(), &[1u8, 2]);
    }
}
