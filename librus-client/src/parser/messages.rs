//! Message listing extraction

use super::sanitize;
use crate::error::LibrusError;
use crate::model::{MessageBrief, PageInfo};
use chrono::NaiveDateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::cell::OnceCell;

const SENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parser for message listing pages with cached regex patterns and selectors
#[derive(Clone, Debug)]
pub struct MessageParser {
    page_number_regex: OnceCell<Regex>,
    pagination_selector: OnceCell<Selector>,
    table_body_selector: OnceCell<Selector>,
    row_selector: OnceCell<Selector>,
    input_selector: OnceCell<Selector>,
    anchor_selector: OnceCell<Selector>,
    image_selector: OnceCell<Selector>,
    sent_selector: OnceCell<Selector>,
}

impl MessageParser {
    /// Create a new parser with uninitialized caches
    pub fn new() -> Self {
        Self {
            page_number_regex: OnceCell::new(),
            pagination_selector: OnceCell::new(),
            table_body_selector: OnceCell::new(),
            row_selector: OnceCell::new(),
            input_selector: OnceCell::new(),
            anchor_selector: OnceCell::new(),
            image_selector: OnceCell::new(),
            sent_selector: OnceCell::new(),
        }
    }

    fn page_number_regex(&self) -> &Regex {
        self.page_number_regex
            .get_or_init(|| Regex::new(r"\d+").unwrap())
    }

    fn pagination_selector(&self) -> &Selector {
        self.pagination_selector
            .get_or_init(|| Selector::parse("div.pagination span").unwrap())
    }

    fn table_body_selector(&self) -> &Selector {
        self.table_body_selector
            .get_or_init(|| Selector::parse("table.decorated.stretch tbody").unwrap())
    }

    fn row_selector(&self) -> &Selector {
        self.row_selector
            .get_or_init(|| Selector::parse("tr").unwrap())
    }

    fn input_selector(&self) -> &Selector {
        self.input_selector
            .get_or_init(|| Selector::parse("input").unwrap())
    }

    fn anchor_selector(&self) -> &Selector {
        self.anchor_selector
            .get_or_init(|| Selector::parse("a").unwrap())
    }

    fn image_selector(&self) -> &Selector {
        self.image_selector
            .get_or_init(|| Selector::parse("img").unwrap())
    }

    fn sent_selector(&self) -> &Selector {
        self.sent_selector
            .get_or_init(|| Selector::parse("td.medium.center").unwrap())
    }

    /// Parse a listing page that was requested as page `requested` (0-based)
    ///
    /// The portal never reports an invalid page; it serves the nearest valid
    /// one instead. A page whose reported index differs from `requested` is
    /// therefore out of bounds.
    pub fn extract_page(&self, html: &str, requested: usize) -> Result<MessagePage<'_>, LibrusError> {
        let document = Html::parse_document(html);
        let info = self.page_info(&document)?;

        if info.current != requested {
            return Err(LibrusError::OutOfBounds {
                requested,
                max_page: info.max_page,
            });
        }

        Ok(MessagePage {
            info,
            document,
            parser: self,
        })
    }

    /// Read "page X of Y" (1-based) from the pagination element
    fn page_info(&self, document: &Html) -> Result<PageInfo, LibrusError> {
        let element = document
            .select(self.pagination_selector())
            .next()
            .ok_or_else(|| LibrusError::HtmlParse("pagination not found".to_string()))?;
        let description = sanitize(&element.text().collect::<String>());

        let numbers: Vec<usize> = self
            .page_number_regex()
            .find_iter(&description)
            .filter_map(|m| m.as_str().parse().ok())
            .take(2)
            .collect();

        match numbers.as_slice() {
            &[current, last] if current >= 1 && current <= last => Ok(PageInfo {
                current: current - 1,
                max_page: last - 1,
            }),
            _ => Err(LibrusError::HtmlParse(format!(
                "unexpected pagination text: {description:?}"
            ))),
        }
    }

    /// Parse one table row; rows without a message id are placeholders
    fn parse_row(&self, row: ElementRef<'_>) -> Result<Option<MessageBrief>, LibrusError> {
        let Some(id) = row
            .select(self.input_selector())
            .find_map(|input| input.value().attr("value"))
        else {
            return Ok(None);
        };

        let mut anchors = row.select(self.anchor_selector());
        let (Some(sender), Some(title)) = (anchors.next(), anchors.next()) else {
            return Err(LibrusError::HtmlParse(format!(
                "message {id} lacks sender or title link"
            )));
        };

        // The portal styles the sender cell only while the message is unread
        let is_read = sender
            .parent()
            .and_then(ElementRef::wrap)
            .is_none_or(|cell| cell.value().attr("style").is_none());

        let has_attachment = row.select(self.image_selector()).next().is_some();

        let sent_text = row
            .select(self.sent_selector())
            .next()
            .map(|cell| sanitize(&cell.text().collect::<String>()))
            .ok_or_else(|| LibrusError::HtmlParse(format!("message {id} lacks a date")))?;
        let sent = NaiveDateTime::parse_from_str(&sent_text, SENT_FORMAT).map_err(|e| {
            LibrusError::HtmlParse(format!("message {id} has invalid date {sent_text:?}: {e}"))
        })?;

        Ok(Some(MessageBrief {
            id: id.to_string(),
            title: sanitize(&title.text().collect::<String>()),
            sender: sanitize(&sender.text().collect::<String>()),
            sent,
            has_attachment,
            is_read,
        }))
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed listing page whose bounds have been checked
#[derive(Debug)]
pub struct MessagePage<'p> {
    info: PageInfo,
    document: Html,
    parser: &'p MessageParser,
}

impl MessagePage<'_> {
    pub fn info(&self) -> PageInfo {
        self.info
    }

    /// Lazily parse the rows of the message table
    ///
    /// Each call starts over from the first row.
    pub fn messages(
        &self,
    ) -> Result<impl Iterator<Item = Result<MessageBrief, LibrusError>> + '_, LibrusError> {
        let body = self
            .document
            .select(self.parser.table_body_selector())
            .next()
            .ok_or_else(|| LibrusError::HtmlParse("message table not found".to_string()))?;

        Ok(body
            .select(self.parser.row_selector())
            .filter_map(move |row| self.parser.parse_row(row).transpose()))
    }
}
