//! Destination resolution for persisted artifacts.
//!
//! Note ids are `/`-separated paths whose first segment is the vault root
//! directory name, e.g. `"Root/Topic/definicoes/doc.md"`.

use super::category::ArtifactCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub const NOTE_PATH_SEPARATOR: char = '/';

/// Default cap on the sanitized title part of a filename, in characters.
pub const DEFAULT_MAX_FILENAME_LEN: usize = 50;

const FALLBACK_STEM: &str = "artefato";
const ARTIFACT_EXTENSION: &str = "md";

/// Where an artifact goes, relative to the vault root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    /// Folders between the vault root and `folder_name`.
    pub parent_segments: Vec<String>,
    /// Category folder (`aulas`, `desafios`, ...).
    pub folder_name: String,
}

/// Resolves the destination folder for an artifact derived from `note_id`.
///
/// The filename is dropped first. If the remaining path (root included) is
/// two or more segments deep, the note's own folder (e.g. `definicoes`) is
/// dropped too, so the category folder becomes its sibling. The root segment
/// itself is never part of the result.
pub fn resolve(note_id: &str, category: ArtifactCategory) -> ArtifactLocation {
    let segments: Vec<&str> = note_id
        .split(NOTE_PATH_SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect();

    // [root, folders...]
    let mut dirs: &[&str] = match segments.split_last() {
        Some((_, dirs)) => dirs,
        None => &[],
    };
    if dirs.len() >= 2 {
        dirs = &dirs[..dirs.len() - 1];
    }
    let folders = dirs.get(1..).unwrap_or_default();

    ArtifactLocation {
        parent_segments: folders.iter().map(|s| s.to_string()).collect(),
        folder_name: category.folder_name().to_string(),
    }
}

/// Reduces a title to `[A-Za-z0-9_]`, at most `max_len` characters.
///
/// Diacritics are stripped after NFD normalization, other non-alphanumeric
/// characters are removed and whitespace runs become a single `_`.
pub fn sanitize_title(title: &str, max_len: usize) -> String {
    let cleaned: String = title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let mut stem = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    if stem.len() > max_len {
        // ASCII only at this point, so byte truncation is char-safe.
        stem.truncate(max_len);
        while stem.ends_with('_') {
            stem.pop();
        }
    }
    stem
}

/// Builds the artifact filename for `title`.
///
/// Categories that allow several artifacts per note get a timestamp suffix;
/// singleton categories map one title to one file.
pub fn file_name(
    title: &str,
    category: ArtifactCategory,
    max_len: usize,
    now: DateTime<Utc>,
) -> String {
    let mut stem = sanitize_title(title, max_len);
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }
    if category.allows_multiple() {
        format!(
            "{}_{}.{}",
            stem,
            now.format("%Y%m%d_%H%M%S"),
            ARTIFACT_EXTENSION
        )
    } else {
        format!("{}.{}", stem, ARTIFACT_EXTENSION)
    }
}
