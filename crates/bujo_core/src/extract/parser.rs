//! Kind-specific field parsers.
//!
//! # Responsibility
//! - Strip leading glyphs and derive symbol, status, event date and emotion tag
//!   from a line that has already been classified.
//!
//! # Invariants
//! - A parser returns `None` (skip the line) when stripped content is empty.
//! - Date parsing failures leave the date empty; they are never errors.

use super::classifier::{EMOTION_PREFIX_RE, EVENT_LINE_RE, TASK_LINE_RE};
use crate::model::entry::{EntryDetails, EntryKind, ScheduleStatus, TaskStatus};
use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b").expect("valid date regex")
});
static NOTE_DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-–—]\s*(.*)$").expect("valid note dash regex"));

/// Canonical emotion tags produced by keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmotionType {
    Happy,
    Sad,
    Anxious,
    Grateful,
    Calm,
    Stressed,
    Other,
}

impl EmotionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Anxious => "anxious",
            Self::Grateful => "grateful",
            Self::Calm => "calm",
            Self::Stressed => "stressed",
            Self::Other => "other",
        }
    }
}

/// Checked in order; the first group with a matching keyword decides the tag.
const EMOTION_LEXICON: &[(EmotionType, &[&str])] = &[
    (EmotionType::Happy, &["happy", "joyful", "😊", "😃"]),
    (EmotionType::Sad, &["sad", "😢"]),
    (EmotionType::Anxious, &["anxious", "worried", "😰", "😟"]),
    (EmotionType::Grateful, &["grateful", "🙏"]),
    (EmotionType::Calm, &["calm", "peaceful", "😌"]),
    (
        EmotionType::Stressed,
        &["stressed", "frustrated", "angry", "😤", "😡"],
    ),
];

/// Fields recovered from one classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFields {
    pub content: String,
    pub symbol: Option<String>,
    pub details: EntryDetails,
}

/// Dispatches to the parser for `kind`.
pub fn parse_line(kind: EntryKind, line: &str) -> Option<ParsedFields> {
    match kind {
        EntryKind::Task => parse_task(line),
        EntryKind::Event => parse_event(line),
        EntryKind::Note => parse_note(line),
        EntryKind::Emotion => parse_emotion(line),
    }
}

pub fn parse_task(line: &str) -> Option<ParsedFields> {
    let caps = TASK_LINE_RE.captures(line.trim())?;
    let glyph = caps.get(1)?.as_str();
    let content = caps.get(2).map_or("", |m| m.as_str()).trim();
    if content.is_empty() {
        return None;
    }

    let (symbol, status) = match glyph {
        "X" | "x" => ("X", TaskStatus::Completed),
        "/" => ("/", TaskStatus::InProgress),
        _ => ("•", TaskStatus::Todo),
    };

    Some(ParsedFields {
        content: content.to_string(),
        symbol: Some(symbol.to_string()),
        details: EntryDetails::Task { status },
    })
}

pub fn parse_event(line: &str) -> Option<ParsedFields> {
    let caps = EVENT_LINE_RE.captures(line.trim())?;
    let glyph = caps.get(1)?.as_str();
    let content = caps.get(2).map_or("", |m| m.as_str()).trim();
    if content.is_empty() {
        return None;
    }

    let (symbol, status) = match glyph {
        "⦿" | "●" | "◉" => ("⦿", ScheduleStatus::Completed),
        _ => ("O", ScheduleStatus::Scheduled),
    };

    Some(ParsedFields {
        content: content.to_string(),
        symbol: Some(symbol.to_string()),
        details: EntryDetails::Event {
            status,
            event_date: extract_date(content),
        },
    })
}

pub fn parse_note(line: &str) -> Option<ParsedFields> {
    let line = line.trim();
    let (content, symbol) = match NOTE_DASH_RE.captures(line) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()).trim(),
            Some("-".to_string()),
        ),
        None => (line, None),
    };
    if content.is_empty() {
        return None;
    }

    Some(ParsedFields {
        content: content.to_string(),
        symbol,
        details: EntryDetails::Note {
            status: ScheduleStatus::Scheduled,
        },
    })
}

pub fn parse_emotion(line: &str) -> Option<ParsedFields> {
    let line = line.trim();
    let content = match EMOTION_PREFIX_RE.captures(line) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim(),
        None => line,
    };
    if content.is_empty() {
        return None;
    }

    Some(ParsedFields {
        content: content.to_string(),
        symbol: None,
        details: EntryDetails::Emotion {
            status: ScheduleStatus::Scheduled,
            emotion_type: Some(emotion_type_for(line).as_str().to_string()),
        },
    })
}

/// Finds the first `D/M/YY` or `D-M-YYYY` token in `content`.
///
/// Two-digit years are read as 20YY. An impossible calendar date in the first
/// token yields `None`; later tokens are not consulted.
pub fn extract_date(content: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(content)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year_token = caps.get(3)?.as_str();
    let mut year: i32 = year_token.parse().ok()?;
    if year_token.len() == 2 {
        year += 2000;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day);
    if date.is_none() {
        debug!(
            "event=date_parse module=extract status=skip reason=invalid_calendar_date year={} month={} day={}",
            year, month, day
        );
    }
    date
}

/// Maps the first matching lexicon keyword to its canonical tag.
pub fn emotion_type_for(content: &str) -> EmotionType {
    let lowered = content.to_lowercase();
    EMOTION_LEXICON
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map_or(EmotionType::Other, |(tag, _)| *tag)
}

#[cfg(test)]
mod tests {
    use super::{
        emotion_type_for, extract_date, parse_emotion, parse_event, parse_note, parse_task,
        EmotionType,
    };
    use crate::model::entry::{EntryDetails, ScheduleStatus, TaskStatus};
    use chrono::NaiveDate;

    #[test]
    fn task_glyphs_map_to_status_and_symbol() {
        let cases = [
            ("• buy milk", "•", TaskStatus::Todo),
            ("· buy milk", "•", TaskStatus::Todo),
            ("- buy milk", "•", TaskStatus::Todo),
            ("/ buy milk", "/", TaskStatus::InProgress),
            ("X buy milk", "X", TaskStatus::Completed),
            ("x buy milk", "X", TaskStatus::Completed),
        ];
        for (line, symbol, status) in cases {
            let parsed = parse_task(line).unwrap();
            assert_eq!(parsed.content, "buy milk");
            assert_eq!(parsed.symbol.as_deref(), Some(symbol));
            assert_eq!(parsed.details, EntryDetails::Task { status });
        }
    }

    #[test]
    fn event_glyphs_normalize_to_two_symbols() {
        let open = parse_event("◯ standup").unwrap();
        assert_eq!(open.symbol.as_deref(), Some("O"));
        let filled = parse_event("◉ standup").unwrap();
        assert_eq!(filled.symbol.as_deref(), Some("⦿"));
        assert!(matches!(
            filled.details,
            EntryDetails::Event {
                status: ScheduleStatus::Completed,
                ..
            }
        ));
    }

    #[test]
    fn event_date_is_taken_from_content() {
        let parsed = parse_event("O Dentist 15/03/24").unwrap();
        assert_eq!(parsed.content, "Dentist 15/03/24");
        assert_eq!(
            parsed.details,
            EntryDetails::Event {
                status: ScheduleStatus::Scheduled,
                event_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            }
        );
    }

    #[test]
    fn date_extraction_handles_formats_and_garbage() {
        assert_eq!(
            extract_date("Dentist 15/03/24"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            extract_date("trip 1-2-2026 then 5/5/27"),
            NaiveDate::from_ymd_opt(2026, 2, 1)
        );
        assert_eq!(extract_date("Dentist tomorrow"), None);
        assert_eq!(extract_date("party 31/02/24"), None);
        assert_eq!(extract_date("code 1/2/123"), None);
    }

    #[test]
    fn note_strips_dash_family_prefix() {
        let parsed = parse_note("— remember the umbrella").unwrap();
        assert_eq!(parsed.content, "remember the umbrella");
        assert_eq!(parsed.symbol.as_deref(), Some("-"));

        let plain = parse_note("weather was grey").unwrap();
        assert_eq!(plain.content, "weather was grey");
        assert_eq!(plain.symbol, None);

        assert!(parse_note("—").is_none());
    }

    #[test]
    fn emotion_prefix_is_stripped_and_type_detected() {
        let parsed = parse_emotion("Feeling: grateful for friends").unwrap();
        assert_eq!(parsed.content, "grateful for friends");
        assert_eq!(
            parsed.details,
            EntryDetails::Emotion {
                status: ScheduleStatus::Scheduled,
                emotion_type: Some("grateful".to_string()),
            }
        );
        assert!(parse_emotion("mood:").is_none());
    }

    #[test]
    fn lexicon_order_decides_ties_and_defaults_to_other() {
        assert_eq!(emotion_type_for("happy but worried"), EmotionType::Happy);
        assert_eq!(emotion_type_for("so angry 😡"), EmotionType::Stressed);
        assert_eq!(emotion_type_for("excited!"), EmotionType::Other);
    }
}
