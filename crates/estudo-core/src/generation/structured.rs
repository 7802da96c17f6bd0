//! Typed outputs of one-shot structured generation.

use crate::error::{EstudoError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// What to ask the structured generator for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredPrompt {
    LessonPlan { note_id: String, note_text: String },
    ChallengeAlternatives {
        note_id: String,
        note_text: String,
        count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSection {
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub title: String,
    pub sections: Vec<LessonSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeOption {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeAlternatives {
    pub alternatives: Vec<ChallengeOption>,
}

/// A structured output type that can be parsed from generator JSON.
pub trait StructuredOutput: DeserializeOwned + Sized {
    const NAME: &'static str;

    /// Whether the parsed value carries anything usable.
    fn is_usable(&self) -> bool;

    fn parse(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Err(EstudoError::structured(format!(
                "{}: generator returned nothing",
                Self::NAME
            )));
        }
        let parsed: Self = serde_json::from_value(value)
            .map_err(|e| EstudoError::structured(format!("{}: {}", Self::NAME, e)))?;
        if !parsed.is_usable() {
            return Err(EstudoError::structured(format!(
                "{}: generator returned an empty result",
                Self::NAME
            )));
        }
        Ok(parsed)
    }
}

impl StructuredOutput for LessonPlan {
    const NAME: &'static str = "LessonPlan";

    fn is_usable(&self) -> bool {
        !self.sections.is_empty()
    }
}

impl StructuredOutput for ChallengeAlternatives {
    const NAME: &'static str = "ChallengeAlternatives";

    fn is_usable(&self) -> bool {
        !self.alternatives.is_empty()
    }
}
