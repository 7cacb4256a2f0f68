//! Line classification by glyph and keyword heuristics.
//!
//! # Invariants
//! - Checks run in a fixed order and the first match wins:
//!   task glyph, event glyph, emotion keyword/prefix, note fallback.
//! - A leading glyph always outranks keywords anywhere in the line.

use crate::model::entry::EntryKind;
use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) static TASK_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([•·\-Xx/])\s+(.*)$").expect("valid task regex"));
pub(crate) static EVENT_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([O○◯⦿●◉])\s+(.*)$").expect("valid event regex"));
pub(crate) static EMOTION_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:feeling|mood|emotion)\s*:\s*(.*)$").expect("valid emotion prefix regex")
});

/// Words and emoji that mark a line as an emotional state.
pub(crate) const EMOTION_KEYWORDS: &[&str] = &[
    "happy",
    "sad",
    "anxious",
    "grateful",
    "excited",
    "worried",
    "calm",
    "stressed",
    "joyful",
    "frustrated",
    "peaceful",
    "angry",
    "😊",
    "😢",
    "😰",
    "🙏",
    "😃",
    "😟",
    "😌",
    "😤",
    "😡",
];

/// Decides which kind a trimmed line represents.
///
/// Returns `None` for blank lines and for fallback lines shorter than
/// `min_note_chars`.
pub fn classify_line(line: &str, min_note_chars: usize) -> Option<EntryKind> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if TASK_LINE_RE.is_match(line) {
        return Some(EntryKind::Task);
    }
    if EVENT_LINE_RE.is_match(line) {
        return Some(EntryKind::Event);
    }
    if is_emotion_line(line) {
        return Some(EntryKind::Emotion);
    }
    if line.chars().count() >= min_note_chars {
        return Some(EntryKind::Note);
    }
    None
}

fn is_emotion_line(line: &str) -> bool {
    if EMOTION_PREFIX_RE.is_match(line) {
        return true;
    }
    let lowered = line.to_lowercase();
    EMOTION_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::classify_line;
    use crate::model::entry::EntryKind;

    const MIN: usize = 2;

    #[test]
    fn completed_task_glyph_is_task() {
        assert_eq!(classify_line("X buy milk", MIN), Some(EntryKind::Task));
        assert_eq!(classify_line("x buy milk", MIN), Some(EntryKind::Task));
    }

    #[test]
    fn every_task_bullet_is_recognized() {
        for line in ["• a", "· a", "- a", "/ a"] {
            assert_eq!(classify_line(line, MIN), Some(EntryKind::Task), "{line}");
        }
    }

    #[test]
    fn event_glyph_outranks_emotion_keyword() {
        assert_eq!(
            classify_line("O happy hour with team", MIN),
            Some(EntryKind::Event)
        );
        assert_eq!(classify_line("● dentist", MIN), Some(EntryKind::Event));
    }

    #[test]
    fn task_glyph_outranks_emotion_keyword() {
        assert_eq!(classify_line("• call sad friend", MIN), Some(EntryKind::Task));
    }

    #[test]
    fn glyph_without_separator_is_not_a_bullet() {
        assert_eq!(classify_line("Xylophone lesson", MIN), Some(EntryKind::Note));
        assert_eq!(classify_line("Olive oil", MIN), Some(EntryKind::Note));
    }

    #[test]
    fn keywords_and_prefix_mark_emotions() {
        assert_eq!(
            classify_line("feeling grateful today", MIN),
            Some(EntryKind::Emotion)
        );
        assert_eq!(classify_line("Mood: meh", MIN), Some(EntryKind::Emotion));
        assert_eq!(classify_line("long day 😤", MIN), Some(EntryKind::Emotion));
    }

    #[test]
    fn short_fallback_lines_are_noise() {
        assert_eq!(classify_line("~", MIN), None);
        assert_eq!(classify_line("   ", MIN), None);
        assert_eq!(classify_line("ok", MIN), Some(EntryKind::Note));
    }
}
