//! Output formatting for messages and lessons

use librus_client::{LessonUnit, MessageBrief, PageInfo, Week};

const TIME_FORMAT: &str = "%H:%M";

/// Output formatter for listing and timetable results
pub struct OutputFormatter {
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn print_token(&self, token: &str) {
        if !self.quiet {
            eprintln!("Logged in. Session token:");
        }
        println!("{}", token);
    }

    /// Print one listing page, or every page when `page` is None
    pub fn print_messages(&self, page: Option<PageInfo>, briefs: &[MessageBrief]) {
        for brief in briefs {
            if self.quiet {
                println!("{}", format_brief_quiet(brief));
            } else {
                println!("{}", format_brief(brief));
            }
        }

        if self.quiet {
            return;
        }

        let unread = briefs.iter().filter(|b| !b.is_read).count();
        println!();
        match page {
            Some(info) => println!(
                "Page {} of {}: {} message(s), {} unread",
                info.current + 1,
                info.page_count(),
                briefs.len(),
                unread
            ),
            None => println!("{} message(s), {} unread", briefs.len(), unread),
        }
    }

    /// Print the lessons of a week in chronological order, grouped by day
    pub fn print_lessons(&self, week: Week, lessons: &[LessonUnit]) {
        let mut lessons = lessons.to_vec();
        lessons.sort();

        if self.quiet {
            for lesson in &lessons {
                println!("{}", format_lesson_quiet(lesson));
            }
            return;
        }

        println!("Week {}", week);
        let mut day = None;
        for lesson in &lessons {
            let date = lesson.start.date();
            if day != Some(date) {
                println!();
                println!("{}", date.format("%A %Y-%m-%d"));
                day = Some(date);
            }
            println!("  {}", format_lesson(lesson));
        }

        if lessons.is_empty() {
            println!("No lessons.");
        }
    }
}

/// `2021-01-11 08:00 *@ admin (John Doe): Welcome`
///
/// `*` marks an unread message, `@` one with an attachment.
fn format_brief(brief: &MessageBrief) -> String {
    format!(
        "{} {}{} {}: {}",
        brief.sent.format("%Y-%m-%d %H:%M"),
        if brief.is_read { ' ' } else { '*' },
        if brief.has_attachment { '@' } else { ' ' },
        brief.sender,
        brief.title
    )
}

fn format_brief_quiet(brief: &MessageBrief) -> String {
    format!("{}\t{}", brief.id, brief.title)
}

/// `08:00-08:45 Matematyka (Jan Kowalski, s. 24) [zastępstwo]`
fn format_lesson(lesson: &LessonUnit) -> String {
    let mut line = format!(
        "{}-{} {} ({}",
        lesson.start.format(TIME_FORMAT),
        lesson.end().format(TIME_FORMAT),
        lesson.name,
        lesson.teacher
    );
    if !lesson.classroom.is_empty() {
        line.push_str(&format!(", s. {}", lesson.classroom));
    }
    line.push(')');
    if let Some(info) = &lesson.info {
        line.push_str(&format!(" [{}]", info));
    }
    line
}

fn format_lesson_quiet(lesson: &LessonUnit) -> String {
    format!(
        "{} {}-{} {}",
        lesson.start.format("%Y-%m-%d"),
        lesson.start.format(TIME_FORMAT),
        lesson.end().format(TIME_FORMAT),
        lesson.name
    )
}
