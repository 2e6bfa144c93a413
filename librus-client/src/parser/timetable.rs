//! Timetable extraction

use super::sanitize;
use crate::error::{AuthorizationError, LibrusError};
use crate::model::LessonUnit;
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use scraper::{ElementRef, Html, Selector};
use std::cell::OnceCell;

/// Heading the portal shows instead of a timetable when the session is not valid
const ACCESS_DENIED: &str = "Brak dostępu";

/// Separator between teacher and classroom in a lesson cell
const CLASSROOM_SEPARATOR: &str = " s. ";

/// Parser for weekly timetable pages with cached selectors
#[derive(Clone, Debug)]
pub struct TimetableParser {
    heading_selector: OnceCell<Selector>,
    entry_selector: OnceCell<Selector>,
    text_selector: OnceCell<Selector>,
    info_selector: OnceCell<Selector>,
}

impl TimetableParser {
    /// Create a new parser with uninitialized caches
    pub fn new() -> Self {
        Self {
            heading_selector: OnceCell::new(),
            entry_selector: OnceCell::new(),
            text_selector: OnceCell::new(),
            info_selector: OnceCell::new(),
        }
    }

    fn heading_selector(&self) -> &Selector {
        self.heading_selector
            .get_or_init(|| Selector::parse("h2").unwrap())
    }

    fn entry_selector(&self) -> &Selector {
        self.entry_selector
            .get_or_init(|| Selector::parse("td#timetableEntryBox").unwrap())
    }

    fn text_selector(&self) -> &Selector {
        self.text_selector
            .get_or_init(|| Selector::parse("div.text").unwrap())
    }

    fn info_selector(&self) -> &Selector {
        self.info_selector
            .get_or_init(|| Selector::parse("div.plan-lekcji-info").unwrap())
    }

    /// Extract every lesson of a timetable page, in no particular order
    ///
    /// Cells without a text block are empty slots and are skipped.
    pub fn extract_week(&self, html: &str) -> Result<Vec<LessonUnit>, LibrusError> {
        let document = Html::parse_document(html);

        if self.is_access_denied(&document) {
            tracing::warn!("Timetable page reports access denied");
            return Err(AuthorizationError::AccessDenied.into());
        }

        document
            .select(self.entry_selector())
            .filter_map(|entry| {
                let text = entry.select(self.text_selector()).next()?;
                Some(self.parse_entry(entry, text))
            })
            .collect()
    }

    /// Whether any `h2` reads exactly "Brak dostępu" once surrounding
    /// whitespace is trimmed
    ///
    /// Neither the heading's position nor its padding is fixed across portal
    /// layouts, so every `h2` is checked. Longer headings that merely start
    /// with the phrase do not count.
    fn is_access_denied(&self, document: &Html) -> bool {
        document
            .select(self.heading_selector())
            .any(|heading| heading.text().collect::<String>().trim() == ACCESS_DENIED)
    }

    fn parse_entry(&self, entry: ElementRef<'_>, text: ElementRef<'_>) -> Result<LessonUnit, LibrusError> {
        let attr = |name: &str| {
            entry.value().attr(name).ok_or_else(|| {
                LibrusError::HtmlParse(format!("timetable entry lacks {name}"))
            })
        };

        let day = attr("data-date")?;
        let day = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| LibrusError::HtmlParse(format!("invalid lesson date {day:?}: {e}")))?;
        let from = parse_time(attr("data-time_from")?)?;
        let to = parse_time(attr("data-time_to")?)?;

        // Both ends are times of day, so a lesson never crosses midnight
        let duration = to - from;
        if duration <= TimeDelta::zero() {
            return Err(LibrusError::HtmlParse(format!(
                "lesson on {day} ends at {to} before it starts at {from}"
            )));
        }

        let (name, teacher, classroom) = split_text(text)?;

        let info = entry
            .select(self.info_selector())
            .next()
            .map(|element| sanitize(&element.text().collect::<String>()))
            .filter(|info| !info.is_empty());

        Ok(LessonUnit {
            name,
            teacher,
            classroom,
            info,
            start: day.and_time(from),
            duration,
        })
    }
}

impl Default for TimetableParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, LibrusError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| LibrusError::HtmlParse(format!("invalid lesson time {value:?}: {e}")))
}

/// Split a lesson's text block into (name, teacher, classroom)
///
/// The block holds the lesson name and a `"- Teacher s. Classroom"` line,
/// padded by a varying number of whitespace-only text nodes. Those are
/// dropped first; exactly two content nodes must remain.
fn split_text(text: ElementRef<'_>) -> Result<(String, String, String), LibrusError> {
    let nodes: Vec<String> = text
        .text()
        .map(sanitize)
        .filter(|node| !node.is_empty())
        .collect();

    let [name, details] = nodes.as_slice() else {
        return Err(LibrusError::HtmlParse(format!(
            "expected lesson name and teacher, found {} text nodes",
            nodes.len()
        )));
    };

    let (teacher, classroom) = details
        .split_once(CLASSROOM_SEPARATOR)
        .unwrap_or((details.as_str(), ""));

    let teacher = sanitize(strip_artifact(teacher));
    if teacher.is_empty() {
        return Err(LibrusError::HtmlParse(format!(
            "lesson {name} has no teacher"
        )));
    }

    Ok((name.clone(), teacher, classroom.trim().to_string()))
}

/// Drop the leading dash the portal puts before the teacher's name
fn strip_artifact(teacher: &str) -> &str {
    let mut chars = teacher.chars();
    match chars.next() {
        Some(first) if !first.is_alphanumeric() => chars.as_str(),
        _ => teacher,
    }
}
