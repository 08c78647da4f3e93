use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tabled::Tabled;

pub const NOT_AVAILABLE: &str = "N/A";

/// One cell of an uploaded export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Build a cell from raw delimited text; blank text is `Missing`.
    pub fn from_text(s: &str) -> Cell {
        if s.trim().is_empty() {
            Cell::Missing
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Textual rendering of the cell, `None` when missing.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Missing => None,
            Cell::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Cell::Number(n) => Some(Cow::Owned(n.to_string())),
            Cell::Date(d) => Some(Cow::Owned(d.format("%Y-%m-%d").to_string())),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::from_text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Cell::Date(d)
    }
}

/// An uploaded table with headers exactly as received.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Validate the tabular shape. Short rows are padded with `Missing`;
    /// a row wider than the header is a structural failure.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<RawTable> {
        if headers.is_empty() && !rows.is_empty() {
            return Err(AnalyticsError::Structure("table has rows but no header".into()));
        }
        let width = headers.len();
        let mut checked = Vec::with_capacity(rows.len());
        for (idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(AnalyticsError::Structure(format!(
                    "row {} has {} fields, header has {}",
                    idx + 1,
                    row.len(),
                    width
                )));
            }
            row.resize(width, Cell::Missing);
            checked.push(row);
        }
        Ok(RawTable { headers, rows: checked })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.headers, self.rows)
    }
}

/// A table whose headers are lower-cased and trimmed.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl NormalizedTable {
    pub(crate) fn from_parts(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        NormalizedTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column carrying `header`.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// All cells of the named column in row order.
    pub fn column<'a>(&'a self, header: &str) -> Option<Vec<&'a Cell>> {
        let idx = self.column_index(header)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct TopPost {
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Impressions")]
    pub impressions: u64,
    #[tabled(rename = "Reactions")]
    pub reactions: u64,
}

/// Fixed-shape performance summary of one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub total_posts: usize,
    pub date_range: String,
    pub avg_impressions: f64,
    pub avg_reactions: f64,
    pub avg_comments: f64,
    pub avg_shares: f64,
    pub total_impressions: u64,
    pub total_reactions: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub engagement_rate: f64,
    pub top_posts: Vec<TopPost>,
    pub best_day: String,
    pub best_content_type: String,
    pub posting_frequency: String,
}

impl Default for AnalyticsRecord {
    fn default() -> Self {
        AnalyticsRecord {
            total_posts: 0,
            date_range: NOT_AVAILABLE.to_string(),
            avg_impressions: 0.0,
            avg_reactions: 0.0,
            avg_comments: 0.0,
            avg_shares: 0.0,
            total_impressions: 0,
            total_reactions: 0,
            total_comments: 0,
            total_shares: 0,
            engagement_rate: 0.0,
            top_posts: Vec::new(),
            best_day: NOT_AVAILABLE.to_string(),
            best_content_type: NOT_AVAILABLE.to_string(),
            posting_frequency: NOT_AVAILABLE.to_string(),
        }
    }
}

/// One metric line of the console summary.
#[derive(Debug, Clone, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}
