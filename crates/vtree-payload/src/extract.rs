//! Attachment extraction: lift new binaries out of a change-set.
//!
//! Every value the change-set sends (values of created features, created
//! and updated values of existing features) is converted to its wire form.
//! Existing references pass through; each binary is replaced by a
//! placeholder key `<value_id>:<field>_<position>` and collected as an
//! [`AttachmentPart`]. The input change-set is not modified.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;
use vtree_diff::{ChangeSet, ValueChanges};
use vtree_types::{Attachment, AttachmentField, BinaryAttachment, EntityId, Feature, FeatureValue};

use crate::error::{PayloadError, PayloadResult};
use crate::wire::{FeatureDto, ValueChangesDto, ValueDto, WireChangeSet};

/// A binary attachment waiting to be sent under its placeholder key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentPart {
    pub key: String,
    pub attachment: BinaryAttachment,
}

/// Output of [`extract_attachments`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extracted {
    pub change_set: WireChangeSet,
    /// Binary parts in traversal order.
    pub parts: Vec<AttachmentPart>,
}

/// Placeholder key for the binary at `position` in `field` of value `id`.
pub fn placeholder_key(id: &EntityId, field: AttachmentField, position: usize) -> String {
    format!("{}:{}_{}", id.key_safe(), field.as_str(), position)
}

/// Convert `change_set` to wire form, collecting binary attachments.
///
/// Fails if a binary belongs to a value without id, or if two values map to
/// the same placeholder key.
pub fn extract_attachments(change_set: &ChangeSet) -> PayloadResult<Extracted> {
    let mut lifter = Lifter::default();

    let create_features = change_set
        .create_features
        .iter()
        .map(|f| lifter.feature(f))
        .collect::<PayloadResult<Vec<_>>>()?;

    let update_features = change_set
        .update_features
        .iter()
        .map(FeatureDto::attributes_of)
        .collect();

    let mut values = BTreeMap::new();
    for (feature_id, changes) in &change_set.values_by_feature_id {
        values.insert(feature_id.clone(), lifter.value_changes(changes)?);
    }

    debug!(parts = lifter.parts.len(), "attachments extracted");

    Ok(Extracted {
        change_set: WireChangeSet {
            delete_features_id: change_set.delete_feature_ids.clone(),
            update_features,
            create_features,
            values,
        },
        parts: lifter.parts,
    })
}

#[derive(Default)]
struct Lifter {
    parts: Vec<AttachmentPart>,
    keys: HashSet<String>,
}

impl Lifter {
    fn feature(&mut self, feature: &Feature) -> PayloadResult<FeatureDto> {
        let values = feature
            .values
            .iter()
            .map(|v| self.value(v))
            .collect::<PayloadResult<Vec<_>>>()?;
        Ok(FeatureDto {
            id: feature.id.clone(),
            values,
            attributes: feature.attributes.clone(),
        })
    }

    fn value_changes(&mut self, changes: &ValueChanges) -> PayloadResult<ValueChangesDto> {
        let create_values = changes
            .create_values
            .iter()
            .map(|v| self.value(v))
            .collect::<PayloadResult<Vec<_>>>()?;
        let update_values = changes
            .update_values
            .iter()
            .map(|v| self.value(v))
            .collect::<PayloadResult<Vec<_>>>()?;
        Ok(ValueChangesDto {
            create_values,
            update_values,
            delete_values_id: changes.delete_value_ids.clone(),
        })
    }

    fn value(&mut self, value: &FeatureValue) -> PayloadResult<ValueDto> {
        let id = value.id.as_ref();
        Ok(ValueDto {
            id: value.id.clone(),
            index: value.index,
            icon: self.field(id, AttachmentField::Icon, &value.icon)?,
            views: self.field(id, AttachmentField::Views, &value.views)?,
            attributes: value.attributes.clone(),
        })
    }

    fn field(
        &mut self,
        id: Option<&EntityId>,
        field: AttachmentField,
        entries: &[Attachment],
    ) -> PayloadResult<Vec<String>> {
        entries
            .iter()
            .enumerate()
            .map(|(position, entry)| match entry {
                Attachment::Reference(location) => Ok(location.clone()),
                Attachment::Binary(binary) => {
                    let id = id.ok_or(PayloadError::UnkeyedAttachment { field, position })?;
                    self.lift(placeholder_key(id, field, position), binary)
                }
            })
            .collect()
    }

    fn lift(&mut self, key: String, binary: &BinaryAttachment) -> PayloadResult<String> {
        if !self.keys.insert(key.clone()) {
            return Err(PayloadError::DuplicatePartKey(key));
        }
        debug!(key = %key, bytes = binary.len(), "attachment lifted");
        self.parts.push(AttachmentPart {
            key: key.clone(),
            attachment: binary.clone(),
        });
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtree_diff::diff_features;
    use vtree_types::DirtyState;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn edited(value_id: &str, views: Vec<Attachment>) -> FeatureValue {
        FeatureValue::new(id(value_id))
            .with_state(DirtyState::Edited)
            .with_views(views)
    }

    fn single_update(value: FeatureValue) -> ChangeSet {
        let mut cs = ChangeSet::new();
        cs.values_by_feature_id.insert(
            id("f1"),
            ValueChanges {
                update_values: vec![value],
                ..ValueChanges::default()
            },
        );
        cs
    }

    #[test]
    fn placeholder_key_format() {
        assert_eq!(placeholder_key(&id("abc123"), AttachmentField::Views, 0), "abc123:views_0");
        assert_eq!(placeholder_key(&id("draft.42"), AttachmentField::Icon, 3), "draft42:icon_3");
    }

    #[test]
    fn binary_replaced_by_placeholder() {
        let payload = b"newBinaryPayload".to_vec();
        let cs = single_update(edited(
            "v1",
            vec![Attachment::reference("existingUrl"), Attachment::binary(payload.clone())],
        ));

        let extracted = extract_attachments(&cs).unwrap();
        let dto = &extracted.change_set.values[&id("f1")].update_values[0];
        assert_eq!(dto.views, vec!["existingUrl", "v1:views_1"]);
        assert_eq!(extracted.parts.len(), 1);
        assert_eq!(extracted.parts[0].key, "v1:views_1");
        assert_eq!(extracted.parts[0].attachment.data.as_ref(), payload.as_slice());
    }

    #[test]
    fn input_change_set_is_untouched() {
        let cs = single_update(edited("v1", vec![Attachment::binary(vec![1u8])]));
        let before = cs.clone();
        extract_attachments(&cs).unwrap();
        assert_eq!(cs, before);
        // Extraction is repeatable on the same change-set.
        assert_eq!(extract_attachments(&cs).unwrap(), extract_attachments(&before).unwrap());
    }

    #[test]
    fn references_only_produce_no_parts() {
        let cs = single_update(edited("v1", vec![Attachment::reference("a"), Attachment::reference("b")]));
        let extracted = extract_attachments(&cs).unwrap();
        assert!(extracted.parts.is_empty());
        assert_eq!(extracted.change_set.values[&id("f1")].update_values[0].views, vec!["a", "b"]);
    }

    #[test]
    fn created_feature_values_are_extracted() {
        let value_id = EntityId::draft();
        let feature = Feature::draft().with_value(
            FeatureValue::new(value_id.clone())
                .with_state(DirtyState::New)
                .with_icon(vec![Attachment::binary(vec![9u8])]),
        );
        let cs = diff_features(&[feature], &[]).unwrap();

        let extracted = extract_attachments(&cs).unwrap();
        let expected = format!("{}:icon_0", value_id.key_safe());
        assert_eq!(extracted.change_set.create_features[0].values[0].icon, vec![expected.clone()]);
        assert_eq!(extracted.parts[0].key, expected);
    }

    #[test]
    fn parts_follow_traversal_order() {
        let mut cs = single_update(edited("v2", vec![Attachment::binary(vec![2u8])]));
        cs.values_by_feature_id
            .get_mut(&id("f1"))
            .unwrap()
            .create_values
            .push(
                FeatureValue::new(id("v3"))
                    .with_state(DirtyState::New)
                    .with_icon(vec![Attachment::binary(vec![3u8])])
                    .with_views(vec![Attachment::binary(vec![4u8])]),
            );
        cs.create_features.push(
            Feature::new(id("f9"))
                .with_state(DirtyState::New)
                .with_value(edited("v1", vec![Attachment::binary(vec![1u8])])),
        );

        let keys: Vec<String> = extract_attachments(&cs)
            .unwrap()
            .parts
            .into_iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys, vec!["v1:views_0", "v3:icon_0", "v3:views_0", "v2:views_0"]);
    }

    #[test]
    fn unkeyed_binary_is_an_error() {
        let value = FeatureValue::default()
            .with_state(DirtyState::New)
            .with_views(vec![Attachment::reference("x"), Attachment::binary(vec![1u8])]);
        let cs = diff_features(&[Feature::draft().with_value(value)], &[]).unwrap();

        let err = extract_attachments(&cs).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::UnkeyedAttachment { field: AttachmentField::Views, position: 1 }
        ));
    }

    #[test]
    fn idless_value_with_references_only_is_fine() {
        let value = FeatureValue::default()
            .with_state(DirtyState::New)
            .with_icon(vec![Attachment::reference("x")]);
        let cs = diff_features(&[Feature::draft().with_value(value)], &[]).unwrap();
        assert!(extract_attachments(&cs).unwrap().parts.is_empty());
    }

    #[test]
    fn colliding_keys_are_rejected() {
        let mut cs = single_update(edited("v.1", vec![Attachment::binary(vec![1u8])]));
        cs.values_by_feature_id
            .get_mut(&id("f1"))
            .unwrap()
            .update_values
            .push(edited("v1", vec![Attachment::binary(vec![2u8])]));

        let err = extract_attachments(&cs).unwrap_err();
        assert!(matches!(err, PayloadError::DuplicatePartKey(k) if k == "v1:views_0"));
    }

    #[test]
    fn updated_features_carry_no_values() {
        let mut cs = ChangeSet::new();
        cs.update_features.push(
            Feature::new(id("f1"))
                .with_state(DirtyState::Edited)
                .with_value(edited("v1", vec![Attachment::binary(vec![1u8])])),
        );
        let extracted = extract_attachments(&cs).unwrap();
        assert!(extracted.change_set.update_features[0].values.is_empty());
        assert!(extracted.parts.is_empty());
    }

    #[test]
    fn deletes_pass_through() {
        let mut cs = ChangeSet::new();
        cs.delete_feature_ids.push(id("f7"));
        cs.values_by_feature_id.insert(
            id("f1"),
            ValueChanges {
                delete_value_ids: vec![id("v4")],
                ..ValueChanges::default()
            },
        );
        let wire = extract_attachments(&cs).unwrap().change_set;
        assert_eq!(wire.delete_features_id, vec![id("f7")]);
        assert_eq!(wire.values[&id("f1")].delete_values_id, vec![id("v4")]);
    }
}
