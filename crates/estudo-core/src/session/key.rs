//! Session keys and study modes.

use crate::error::{EstudoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KEY_SEPARATOR: &str = "::";

/// The study mode a session runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudyMode {
    /// Simulated technical interview (turn-based conversation).
    Interview,
    /// Lesson generated from the note.
    Lesson,
    /// Exercise workbook with streamed solutions.
    Workbook,
    /// Pick-a-challenge flow followed by a review.
    Challenge,
    /// Project specification drafted from the note.
    ProjectSpec,
    /// Free-form challenge described by the user.
    CustomChallenge,
}

impl StudyMode {
    pub const ALL: [StudyMode; 6] = [
        StudyMode::Interview,
        StudyMode::Lesson,
        StudyMode::Workbook,
        StudyMode::Challenge,
        StudyMode::ProjectSpec,
        StudyMode::CustomChallenge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMode::Interview => "interview",
            StudyMode::Lesson => "lesson",
            StudyMode::Workbook => "workbook",
            StudyMode::Challenge => "challenge",
            StudyMode::ProjectSpec => "project-spec",
            StudyMode::CustomChallenge => "custom-challenge",
        }
    }

    /// Whether a new session starts in `selecting` and must be committed first.
    pub fn requires_selection(&self) -> bool {
        matches!(
            self,
            StudyMode::Interview | StudyMode::Challenge | StudyMode::CustomChallenge
        )
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyMode {
    type Err = EstudoError;

    fn from_str(s: &str) -> Result<Self> {
        StudyMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| EstudoError::not_found("StudyMode", s))
    }
}

/// Identifies one open tab: a `(note_id, mode)` pair.
///
/// Rendered as `"<note_id>::<mode>"`. The note id may itself contain `::`,
/// so parsing splits on the last separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    note_id: String,
    mode: StudyMode,
}

impl SessionKey {
    pub fn new(note_id: impl Into<String>, mode: StudyMode) -> Self {
        Self {
            note_id: note_id.into(),
            mode,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn mode(&self) -> StudyMode {
        self.mode
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.note_id, KEY_SEPARATOR, self.mode)
    }
}

impl FromStr for SessionKey {
    type Err = EstudoError;

    fn from_str(s: &str) -> Result<Self> {
        let (note_id, mode) = s
            .rsplit_once(KEY_SEPARATOR)
            .ok_or_else(|| EstudoError::not_found("SessionKey", s))?;
        if note_id.is_empty() {
            return Err(EstudoError::not_found("SessionKey", s));
        }
        Ok(Self::new(note_id, mode.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trips_through_display() {
        let key = SessionKey::new("Root/Topic/doc.md", StudyMode::ProjectSpec);
        assert_eq!(key.to_string(), "Root/Topic/doc.md::project-spec");
        let parsed: SessionKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_key_parse_keeps_separator_inside_note_id() {
        let parsed: SessionKey = "Root/odd::name.md::lesson".parse().unwrap();
        assert_eq!(parsed.note_id(), "Root/odd::name.md");
        assert_eq!(parsed.mode(), StudyMode::Lesson);
    }

    #[test]
    fn test_key_parse_rejects_unknown_mode() {
        assert!("Root/doc.md::karaoke".parse::<SessionKey>().is_err());
        assert!("no-separator".parse::<SessionKey>().is_err());
    }
}
