//! Manual entry request shape and its normalization helpers.

use super::{ServiceError, ServiceResult};
use crate::model::entry::{EntryType, UnknownEntryType, HABIT_TAG};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Minimum trimmed length of a user-supplied title.
pub const MIN_TITLE_CHARS: usize = 2;

/// Separator between title and notes inside stored content.
pub const TITLE_NOTES_SEPARATOR: &str = " - ";

const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

/// Caller input for creating or updating a manual entry.
///
/// On update every field is optional; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryRequest {
    /// `task|note|event|habit|emotion`, case-insensitive.
    pub kind: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
    /// `YYYY-MM-DD`; only events keep it.
    pub date: Option<String>,
    /// The first tag becomes the emotion tag of emotion entries.
    pub tags: Vec<String>,
}

impl EntryRequest {
    pub fn new(kind: &str, title: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn entry_type(&self) -> Result<Option<EntryType>, UnknownEntryType> {
        self.kind.as_deref().map(str::parse::<EntryType>).transpose()
    }

    pub(crate) fn event_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_request_date)
    }

    /// First non-blank tag, lowercased. The habit marker is reserved.
    pub(crate) fn emotion_tag(&self) -> ServiceResult<Option<String>> {
        let tag = self
            .tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .find(|tag| !tag.is_empty());
        if tag.as_deref() == Some(HABIT_TAG) {
            return Err(ServiceError::Validation(format!(
                "tag `{HABIT_TAG}` is reserved; use kind `habit` instead"
            )));
        }
        Ok(tag)
    }
}

/// Trims `title` and enforces the minimum length.
pub(crate) fn validate_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(ServiceError::Validation(format!(
            "title must have at least {MIN_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Joins title and notes into stored content.
pub(crate) fn compose_content(title: &str, notes: Option<&str>) -> String {
    match notes.map(str::trim).filter(|notes| !notes.is_empty()) {
        Some(notes) => format!("{title}{TITLE_NOTES_SEPARATOR}{notes}"),
        None => title.to_string(),
    }
}

/// Parses a `YYYY-MM-DD` date; unparseable input is dropped.
pub(crate) fn parse_request_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, REQUEST_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            debug!("event=request_date_parse module=service status=skip reason=invalid_date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{compose_content, parse_request_date, validate_title, EntryRequest};
    use crate::model::entry::EntryType;
    use crate::service::ServiceError;
    use chrono::NaiveDate;

    #[test]
    fn content_joins_title_and_notes() {
        assert_eq!(compose_content("Pay rent", Some(" due friday ")), "Pay rent - due friday");
        assert_eq!(compose_content("Pay rent", Some("  ")), "Pay rent");
        assert_eq!(compose_content("Pay rent", None), "Pay rent");
    }

    #[test]
    fn title_needs_two_characters() {
        assert_eq!(validate_title("  ok ").unwrap(), "ok");
        assert!(validate_title(" x ").is_err());
    }

    #[test]
    fn request_accessors_normalize_fields() {
        let mut request = EntryRequest::new(" HABIT ", "Stretch");
        request.tags = vec!["  ".to_string(), "Grateful".to_string()];
        request.date = Some("2024-13-40".to_string());

        assert_eq!(request.entry_type().unwrap(), Some(EntryType::Habit));
        assert_eq!(request.emotion_tag().unwrap().as_deref(), Some("grateful"));
        assert_eq!(request.event_date(), None);
        assert_eq!(
            parse_request_date("2024-12-25"),
            NaiveDate::from_ymd_opt(2024, 12, 25)
        );
    }

    #[test]
    fn habit_marker_is_not_a_user_tag() {
        let mut request = EntryRequest::new("emotion", "Long day");
        request.tags = vec![" Habit ".to_string(), "tired".to_string()];

        assert!(matches!(
            request.emotion_tag(),
            Err(ServiceError::Validation(_))
        ));
    }
}
