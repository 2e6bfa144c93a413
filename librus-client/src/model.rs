//! Records extracted from portal pages

use crate::error::WeekParseError;
use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Position of a message listing page among all pages (both 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageInfo {
    /// Index of the page the portal actually returned
    pub current: usize,
    /// Index of the last page
    pub max_page: usize,
}

impl PageInfo {
    /// Total number of pages
    pub fn page_count(&self) -> usize {
        self.max_page + 1
    }

    /// Whether this is the last page
    pub fn is_last(&self) -> bool {
        self.current == self.max_page
    }
}

/// One row of the message listing
///
/// Carries enough to fetch the full message later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageBrief {
    /// Message id
    pub id: String,
    /// Message title
    pub title: String,
    /// Sender alias followed by the full name in parentheses, e.g. `admin (John Doe)`
    pub sender: String,
    /// When the message was sent (portal local time)
    pub sent: NaiveDateTime,
    /// Whether the message has an attachment
    pub has_attachment: bool,
    /// Whether the message was already read
    pub is_read: bool,
}

impl MessageBrief {
    /// The full name between parentheses in [`MessageBrief::sender`], if any
    pub fn sender_name(&self) -> Option<&str> {
        let open = self.sender.find('(')?;
        let close = self.sender.rfind(')')?;
        (open < close).then(|| self.sender[open + 1..close].trim())
    }
}

/// A calendar week, Monday through Sunday
///
/// Canonical string form is `YYYY-MM-DD_YYYY-MM-DD`, the format the portal
/// expects when asked for a timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Week {
    monday: NaiveDate,
}

impl Week {
    /// The week containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday();
        Self {
            monday: date - Days::new(u64::from(offset)),
        }
    }

    /// The week containing today's local date
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    /// Monday 00:00
    pub fn start(&self) -> NaiveDateTime {
        self.monday.and_time(NaiveTime::MIN)
    }

    /// Sunday 00:00, six days after [`Week::start`]
    pub fn end(&self) -> NaiveDateTime {
        self.start() + Days::new(6)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.monday
    }

    pub fn last_day(&self) -> NaiveDate {
        self.monday + Days::new(6)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.first_day()..=self.last_day()).contains(&date)
    }

    pub fn next(&self) -> Self {
        Self {
            monday: self.monday + Days::new(7),
        }
    }

    pub fn previous(&self) -> Self {
        Self {
            monday: self.monday - Days::new(7),
        }
    }
}

impl From<NaiveDate> for Week {
    fn from(date: NaiveDate) -> Self {
        Self::containing(date)
    }
}

impl From<NaiveDateTime> for Week {
    fn from(timestamp: NaiveDateTime) -> Self {
        Self::containing(timestamp.date())
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}",
            self.first_day().format(DATE_FORMAT),
            self.last_day().format(DATE_FORMAT)
        )
    }
}

/// Accepts a single `YYYY-MM-DD` date or the canonical `YYYY-MM-DD_YYYY-MM-DD`
///
/// The canonical form must name Monday and Sunday of the same week.
impl FromStr for Week {
    type Err = WeekParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, last) = match s.split_once('_') {
            Some((first, last)) => (first, Some(last)),
            None => (s, None),
        };
        let first = NaiveDate::parse_from_str(first.trim(), DATE_FORMAT)?;
        let week = Self::containing(first);

        if let Some(last) = last {
            let last = NaiveDate::parse_from_str(last.trim(), DATE_FORMAT)?;
            if first != week.first_day() || last != week.last_day() {
                return Err(WeekParseError::NotAWeek(s.to_string()));
            }
        }
        Ok(week)
    }
}

/// A single lesson on the timetable
///
/// Lessons compare, order and hash by `start` alone: two lessons starting at
/// the same moment are equal even if every other field differs.
#[derive(Debug, Clone)]
pub struct LessonUnit {
    pub name: String,
    pub teacher: String,
    pub classroom: String,
    /// Extra marker such as a substitution or cancellation note
    pub info: Option<String>,
    pub start: NaiveDateTime,
    pub duration: TimeDelta,
}

impl LessonUnit {
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }

    /// The week this lesson falls in
    pub fn week(&self) -> Week {
        Week::from(self.start)
    }
}

impl PartialEq for LessonUnit {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
    }
}

impl Eq for LessonUnit {}

impl PartialOrd for LessonUnit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LessonUnit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }
}

impl Hash for LessonUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
    }
}
