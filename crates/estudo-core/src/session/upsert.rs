//! Streaming upsert: create once, append many times, freeze once.
//!
//! Fragments are applied in the order they are handed in. Nothing here
//! reorders or deduplicates; in-order, exactly-once delivery is the
//! generation source's job.

use super::document::GeneratedDocument;
use super::message::Message;
use crate::error::{EstudoError, Result};

/// An entry that can receive streamed text.
pub trait StreamingEntry {
    fn entry_id(&self) -> &str;
    fn text(&self) -> &str;
    fn append(&mut self, fragment: &str);
    fn is_finalized(&self) -> bool;
    fn finalize(&mut self);
}

impl StreamingEntry for Message {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn append(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn finalize(&mut self) {
        self.finalized = true;
    }
}

impl StreamingEntry for GeneratedDocument {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn append(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn finalize(&mut self) {
        self.finalized = true;
    }
}

/// What a single upsert did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First fragment: a new entry was pushed to the end.
    Inserted,
    /// The fragment was appended to the existing entry.
    Appended,
}

/// Applies `fragment` to the entry identified by `id`.
///
/// The first call for an id pushes `create()` (with the fragment appended)
/// to the end of `entries`; later calls append to that same entry. A
/// fragment for a finalized entry leaves it untouched and returns
/// `LateFragment`.
pub fn upsert_fragment<T, F>(
    entries: &mut Vec<T>,
    id: &str,
    fragment: &str,
    create: F,
) -> Result<UpsertOutcome>
where
    T: StreamingEntry,
    F: FnOnce() -> T,
{
    // Streaming targets are almost always the newest entry.
    if let Some(entry) = entries.iter_mut().rev().find(|e| e.entry_id() == id) {
        if entry.is_finalized() {
            return Err(EstudoError::LateFragment { id: id.to_string() });
        }
        entry.append(fragment);
        return Ok(UpsertOutcome::Appended);
    }

    let mut entry = create();
    debug_assert_eq!(entry.entry_id(), id);
    entry.append(fragment);
    entries.push(entry);
    Ok(UpsertOutcome::Inserted)
}

/// Marks the entry read-only. Returns `false` if no entry has this id.
pub fn finalize_entry<T: StreamingEntry>(entries: &mut [T], id: &str) -> bool {
    match entries.iter_mut().rev().find(|e| e.entry_id() == id) {
        Some(entry) => {
            entry.finalize();
            true
        }
        None => false,
    }
}
