//! Loading the labeled training dataset.
//!
//! The file is a JSON array of `{"texto": "...", "label": 0 | 1}` objects,
//! where 0 is Unproductive and 1 is Productive. `text` is accepted as an
//! alias for `texto`.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::RouterError;
use crate::pipeline::types::{Category, LabeledExample};

#[derive(Debug, Deserialize)]
struct RawExample {
    #[serde(alias = "text")]
    texto: String,
    label: i64,
}

/// Read and validate the dataset at `path`.
pub fn load_examples(path: &Path) -> Result<Vec<LabeledExample>, RouterError> {
    if !path.exists() {
        return Err(RouterError::DatasetMissing {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|source| RouterError::DatasetRead {
        path: path.to_path_buf(),
        source,
    })?;

    let examples = parse_examples(&raw)?;
    info!(
        path = %path.display(),
        count = examples.len(),
        "Loaded training dataset"
    );
    Ok(examples)
}

/// Parse dataset JSON into labeled examples.
pub fn parse_examples(raw: &str) -> Result<Vec<LabeledExample>, RouterError> {
    let items: Vec<RawExample> = serde_json::from_str(raw)?;

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let label = Category::from_label(item.label).ok_or(RouterError::InvalidLabel {
                index,
                label: item.label,
            })?;
            Ok(LabeledExample::new(item.texto, label))
        })
        .collect()
}
