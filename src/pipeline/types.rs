//! Shared types for the classification pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Category ────────────────────────────────────────────────────────

/// Coarse productivity category assigned by the local router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Unproductive,
    Productive,
}

impl Category {
    /// Both categories, in dataset-label order.
    pub const ALL: [Category; 2] = [Category::Unproductive, Category::Productive];

    /// Map a dataset integer label (0 / 1) to a category.
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(Self::Unproductive),
            1 => Some(Self::Productive),
            _ => None,
        }
    }

    /// Position of this category in `ALL`; also its dataset label.
    pub fn index(self) -> usize {
        match self {
            Self::Unproductive => 0,
            Self::Productive => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unproductive => "Unproductive",
            Self::Productive => "Productive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Training data ───────────────────────────────────────────────────

/// One labeled training email.
#[derive(Debug, Clone)]
pub struct LabeledExample {
    pub text: String,
    pub label: Category,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, label: Category) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

// ── Submission ──────────────────────────────────────────────────────

/// A raw submission as received from the front end.
#[derive(Debug, Clone)]
pub enum RawSubmission {
    /// Email text typed into the form.
    Text(String),
    /// An uploaded file; decoded by extension.
    File { filename: String, bytes: Vec<u8> },
}

// ── Results ─────────────────────────────────────────────────────────

/// Fields produced by the generative model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub sub_category: String,
    pub suggested_reply: String,
}

/// Final response returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    pub main_category: Category,
    pub sub_category: String,
    pub suggested_reply: String,
}

impl ResponsePayload {
    pub fn merge(main_category: Category, enrichment: EnrichmentResult) -> Self {
        Self {
            main_category,
            sub_category: enrichment.sub_category,
            suggested_reply: enrichment.suggested_reply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_to_categories() {
        assert_eq!(Category::from_label(0), Some(Category::Unproductive));
        assert_eq!(Category::from_label(1), Some(Category::Productive));
        assert_eq!(Category::from_label(2), None);
        assert_eq!(Category::from_label(-1), None);
    }

    #[test]
    fn category_index_matches_label() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.index() as i64), Some(category));
        }
    }

    #[test]
    fn payload_serializes_camel_case() {
        let payload = ResponsePayload {
            main_category: Category::Productive,
            sub_category: "Suporte".into(),
            suggested_reply: "Vamos verificar.".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mainCategory"], "Productive");
        assert_eq!(json["subCategory"], "Suporte");
        assert_eq!(json["suggestedReply"], "Vamos verificar.");
    }
}
