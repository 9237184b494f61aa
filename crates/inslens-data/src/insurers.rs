//! Insurer display names.

use crate::{Insurer, Result};
use std::collections::HashMap;
use std::path::Path;

/// Maps insurer codes to display labels, loaded from `{"code": "label"}` JSON.
#[derive(Debug, Clone, Default)]
pub struct InsurerDirectory {
    labels: HashMap<String, String>,
}

impl InsurerDirectory {
    /// Parse a directory from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            labels: serde_json::from_str(json)?,
        })
    }

    /// Load a directory from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Display label. Synthetic rows get generated labels, unknown codes fall
    /// back to the code itself.
    pub fn label(&self, code: &str) -> String {
        if let Some(label) = self.labels.get(code) {
            return label.clone();
        }
        match Insurer::parse(code) {
            Insurer::Total => "Market total".to_string(),
            Insurer::TopN(n) => format!("Top {n}"),
            Insurer::Real(code) => code,
        }
    }

    /// Number of known insurers.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let dir = InsurerDirectory::from_json(r#"{"ins_a": "Alpha Insurance"}"#).unwrap();
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.label("ins_a"), "Alpha Insurance");
        assert_eq!(dir.label("ins_b"), "ins_b");
        assert_eq!(dir.label("top-10"), "Top 10");
        assert_eq!(dir.label("total"), "Market total");
    }
}
