//! Best-effort answer-key extraction from finalized solution text.
//!
//! This depends on the generator's phrasing. A miss yields an empty key,
//! never an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// `Resposta Correta: B`, `**Alternativas Corretas:** A e C`, `Gabarito: D`.
static DECLARED_ANSWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:respostas?\s+corretas?|alternativas?\s+corretas?|gabarito)\**\s*:\s*\**\s*([A-E](?:\s*(?:,|&|\be\b|\band\b)\s*[A-E])*)\b",
    )
    .expect("answer pattern is valid")
});

/// `**A) texto ... ✅ CORRETA`
static MARKED_OPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[\s>*-]*\**\s*([A-E])\)[^\n]*✅\s*\**\s*(?i:correta)")
        .expect("marked option pattern is valid")
});

static OPTION_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-E]").expect("letter pattern is valid"));

/// Extracts the correct option letters, in order of appearance.
///
/// Explicit "Resposta Correta" style declarations win; options marked with
/// `✅ CORRETA` are only consulted when no declaration is present.
pub fn extract_answer_key(text: &str) -> Vec<char> {
    let declared: Vec<char> = DECLARED_ANSWER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .flat_map(|group| {
            OPTION_LETTER
                .find_iter(group.as_str())
                .filter_map(|m| m.as_str().chars().next())
                .collect::<Vec<_>>()
        })
        .collect();

    if !declared.is_empty() {
        return declared;
    }

    MARKED_OPTION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().chars().next())
        .collect()
}
