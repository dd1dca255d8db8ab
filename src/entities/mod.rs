// Entity source adapter: named-entity recognition behind a swappable trait.
//
// The EntityTagger trait defines the interface. OnnxEntityTagger implements
// it with a local BERT token-classification model.

pub mod onnx;
pub mod traits;

use crate::censor::{CategorySet, EntitySpan};
use traits::TaggedEntity;

/// Keep the entities whose category is enabled, in tagging order.
///
/// Persons feed PERSON, dates DATE, and locations ADDRESS. Entities the
/// redactor has no category for are dropped.
pub fn entity_spans(entities: &[TaggedEntity], categories: &CategorySet) -> Vec<EntitySpan> {
    entities
        .iter()
        .filter_map(|e| {
            let category = e.label.category()?;
            (categories.contains(category) && !e.text.trim().is_empty())
                .then(|| EntitySpan::new(category, e.text.clone()))
        })
        .collect()
}
