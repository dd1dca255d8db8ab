// Entity tagger trait: the seam between the redactor and the NER model.
//
// The default implementation runs a BERT token-classification model locally
// through ONNX Runtime. Tests plug in dictionary-backed fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::censor::Category;

/// Entity kinds the redactor cares about. Everything else the model emits
/// (organizations, miscellaneous) is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLabel {
    Person,
    Date,
    /// Geo-political entity or location, used as a proxy for addresses.
    Location,
    Other,
}

impl EntityLabel {
    /// Map a model label (without its B-/I- prefix) to an entity kind.
    /// Understands both OntoNotes (`PERSON`, `GPE`, `DATE`) and CoNLL
    /// (`PER`, `LOC`) vocabularies.
    pub fn from_model_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => EntityLabel::Person,
            "DATE" => EntityLabel::Date,
            "GPE" | "LOC" => EntityLabel::Location,
            _ => EntityLabel::Other,
        }
    }

    /// The censor category this label feeds, if any.
    pub fn category(self) -> Option<Category> {
        match self {
            EntityLabel::Person => Some(Category::Person),
            EntityLabel::Date => Some(Category::Date),
            EntityLabel::Location => Some(Category::Address),
            EntityLabel::Other => None,
        }
    }
}

/// An entity found by the model. Offsets are byte offsets into the tagged text.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEntity {
    pub label: EntityLabel,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Trait for named-entity taggers.
#[async_trait]
pub trait EntityTagger: Send + Sync {
    /// Tag every entity in `text`.
    async fn tag(&self, text: &str) -> Result<Vec<TaggedEntity>>;
}
