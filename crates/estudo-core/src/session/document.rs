//! Streamed documents without conversational turns.

use crate::artifact::ArtifactCategory;
use serde::{Deserialize, Serialize};

/// A single streamed text blob: lesson content, an exercise solution, a
/// challenge summary or a project spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub id: String,
    pub category: ArtifactCategory,
    /// Human-readable title, also the source of the persisted filename.
    pub source_title: String,
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub finalized: bool,
}

impl GeneratedDocument {
    pub fn streaming(
        id: impl Into<String>,
        category: ArtifactCategory,
        source_title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            source_title: source_title.into(),
            text: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
            finalized: false,
        }
    }
}
