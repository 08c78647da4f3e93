//! Chart derivation.
//!
//! Turns the resolved table into renderer-agnostic chart descriptions. Each
//! chart has its own precondition on the resolved fields; a chart whose
//! precondition is unmet is omitted, and a chart that fails to build is
//! logged and skipped without affecting the others.

use crate::error::{AnalyticsError, Result};
use crate::reports::{
    date_column, monthly_counts, numeric_column, text_column, type_means, weekday_means,
    weekday_name, WEEKDAYS,
};
use crate::schema::{CanonicalField, FieldMapping};
use crate::types::NormalizedTable;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    Impressions,
    DayPerformance,
    Engagement,
    ContentType,
    Frequency,
}

impl ChartId {
    /// Prefix used in artifact file names.
    pub fn slug(self) -> &'static str {
        match self {
            ChartId::Impressions => "impressions",
            ChartId::DayPerformance => "day_performance",
            ChartId::Engagement => "engagement",
            ChartId::ContentType => "content_type",
            ChartId::Frequency => "frequency",
        }
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPoint {
    pub label: String,
    /// `None` for a category with no data (drawn as absent).
    pub value: Option<f64>,
    /// Set on the best-performing category.
    pub highlight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    /// Percentage of the whole, 0..=100.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "points", rename_all = "snake_case")]
pub enum Series {
    Time(Vec<TimePoint>),
    Categories(Vec<CategoryPoint>),
    Proportions(Vec<Slice>),
}

impl Series {
    pub fn is_empty(&self) -> bool {
        match self {
            Series::Time(p) => p.is_empty(),
            Series::Categories(p) => p.is_empty(),
            Series::Proportions(p) => p.is_empty(),
        }
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: ChartId,
    pub name: String,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Series,
}

type Deriver = fn(&NormalizedTable, &FieldMapping) -> Option<Result<ChartSpec>>;

const DERIVERS: [(ChartId, Deriver); 5] = [
    (ChartId::Impressions, impression_trend),
    (ChartId::DayPerformance, day_performance),
    (ChartId::Engagement, engagement_distribution),
    (ChartId::ContentType, content_type_performance),
    (ChartId::Frequency, posting_frequency),
];

/// Derive every chart whose precondition holds, in fixed order.
pub fn derive_charts(table: &NormalizedTable, mapping: &FieldMapping) -> Vec<ChartSpec> {
    if table.is_empty() {
        return Vec::new();
    }
    let mut charts = Vec::new();
    for (id, derive) in DERIVERS {
        match derive(table, mapping) {
            None => tracing::debug!(chart = %id, "chart precondition not met"),
            Some(Ok(spec)) if spec.series.is_empty() => {
                tracing::debug!(chart = %id, "chart has no data points")
            }
            Some(Ok(spec)) => charts.push(spec),
            Some(Err(e)) => tracing::warn!(chart = %id, error = %e, "skipping chart"),
        }
    }
    charts
}

fn highlight_max(points: &mut [CategoryPoint]) {
    let max = points
        .iter()
        .filter_map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    for p in points.iter_mut() {
        p.highlight = p.value == Some(max);
    }
}

fn impression_trend(table: &NormalizedTable, mapping: &FieldMapping) -> Option<Result<ChartSpec>> {
    let dates = date_column(table, mapping)?;
    let impressions = numeric_column(table, mapping, CanonicalField::Impressions)?;

    let mut points: Vec<TimePoint> = dates
        .iter()
        .zip(&impressions)
        .filter_map(|(d, v)| d.map(|date| TimePoint { date, value: *v }))
        .collect();
    points.sort_by_key(|p| p.date);

    Some(Ok(ChartSpec {
        id: ChartId::Impressions,
        name: "Impression Trends".into(),
        kind: ChartKind::Line,
        title: "Impression Trends Over Time".into(),
        x_label: "Date".into(),
        y_label: "Impressions".into(),
        series: Series::Time(points),
    }))
}

fn day_performance(table: &NormalizedTable, mapping: &FieldMapping) -> Option<Result<ChartSpec>> {
    let dates = date_column(table, mapping)?;
    let impressions = numeric_column(table, mapping, CanonicalField::Impressions)?;

    let means = weekday_means(&dates, &impressions);
    if means.is_empty() {
        return None;
    }
    let mut points: Vec<CategoryPoint> = WEEKDAYS
        .iter()
        .map(|day| CategoryPoint {
            label: weekday_name(*day).to_string(),
            value: means.get(&day.num_days_from_monday()).map(|(_, mean)| *mean),
            highlight: false,
        })
        .collect();
    highlight_max(&mut points);

    Some(Ok(ChartSpec {
        id: ChartId::DayPerformance,
        name: "Day of Week Performance".into(),
        kind: ChartKind::Bar,
        title: "Performance by Day of Week".into(),
        x_label: "Day of Week".into(),
        y_label: "Average Impressions".into(),
        series: Series::Categories(points),
    }))
}

fn engagement_distribution(
    table: &NormalizedTable,
    mapping: &FieldMapping,
) -> Option<Result<ChartSpec>> {
    let parts: Vec<(&str, f64)> = [
        (CanonicalField::Reactions, "Reactions"),
        (CanonicalField::Comments, "Comments"),
        (CanonicalField::Shares, "Shares"),
    ]
    .into_iter()
    .filter_map(|(field, label)| {
        numeric_column(table, mapping, field).map(|v| (label, v.iter().sum::<f64>()))
    })
    .collect();
    if parts.is_empty() {
        return None;
    }

    let total: f64 = parts.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return Some(Err(AnalyticsError::Chart {
            chart: "Engagement Distribution".into(),
            reason: "all engagement totals are zero".into(),
        }));
    }
    let slices = parts
        .into_iter()
        .map(|(label, value)| Slice {
            label: label.to_string(),
            value,
            share: value / total * 100.0,
        })
        .collect();

    Some(Ok(ChartSpec {
        id: ChartId::Engagement,
        name: "Engagement Distribution".into(),
        kind: ChartKind::Pie,
        title: "Engagement Distribution".into(),
        x_label: String::new(),
        y_label: String::new(),
        series: Series::Proportions(slices),
    }))
}

fn content_type_performance(
    table: &NormalizedTable,
    mapping: &FieldMapping,
) -> Option<Result<ChartSpec>> {
    let types = text_column(table, mapping, CanonicalField::Type)?;
    let impressions = numeric_column(table, mapping, CanonicalField::Impressions)?;

    let mut means: Vec<(String, f64)> = type_means(&types, &impressions).into_iter().collect();
    // Ascending by mean; equal means keep their alphabetical order.
    means.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let mut points: Vec<CategoryPoint> = means
        .into_iter()
        .map(|(label, mean)| CategoryPoint {
            label,
            value: Some(mean),
            highlight: false,
        })
        .collect();
    highlight_max(&mut points);

    Some(Ok(ChartSpec {
        id: ChartId::ContentType,
        name: "Content Type Performance".into(),
        kind: ChartKind::HorizontalBar,
        title: "Performance by Content Type".into(),
        x_label: "Average Impressions".into(),
        y_label: "Content Type".into(),
        series: Series::Categories(points),
    }))
}

fn posting_frequency(table: &NormalizedTable, mapping: &FieldMapping) -> Option<Result<ChartSpec>> {
    let dates = date_column(table, mapping)?;
    let points = monthly_counts(&dates)
        .into_iter()
        .map(|(month, count)| CategoryPoint {
            label: month,
            value: Some(count as f64),
            highlight: false,
        })
        .collect();

    Some(Ok(ChartSpec {
        id: ChartId::Frequency,
        name: "Posting Frequency".into(),
        kind: ChartKind::Bar,
        title: "Posting Frequency by Month".into(),
        x_label: "Month".into(),
        y_label: "Number of Posts".into(),
        series: Series::Categories(points),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolve;
    use crate::types::{Cell, RawTable};

    fn build(headers: &[&str], rows: &[&[&str]]) -> (NormalizedTable, FieldMapping) {
        let raw = RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Cell::from(*c)).collect())
                .collect(),
        )
        .unwrap();
        resolve(raw)
    }

    fn ids(charts: &[ChartSpec]) -> Vec<ChartId> {
        charts.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_all_charts_in_fixed_order() {
        let (table, mapping) = build(
            &["Date", "Views", "Likes", "Comments", "Shares", "Type"],
            &[
                &["2024-02-05", "120", "10", "2", "1", "video"],
                &["2024-01-03", "80", "4", "1", "0", "image"],
                &["garbage", "60", "3", "0", "0", "image"],
            ],
        );
        let charts = derive_charts(&table, &mapping);
        assert_eq!(
            ids(&charts),
            vec![
                ChartId::Impressions,
                ChartId::DayPerformance,
                ChartId::Engagement,
                ChartId::ContentType,
                ChartId::Frequency,
            ]
        );

        let Series::Time(trend) = &charts[0].series else { panic!("expected time series") };
        assert_eq!(trend.len(), 2);
        assert!(trend[0].date < trend[1].date);
        assert_eq!(trend[0].value, 80.0);
    }

    #[test]
    fn test_day_performance_has_seven_days() {
        let (table, mapping) = build(&["Date", "Views"], &[&["2024-01-01", "10"], &["2024-01-03", "30"]]);
        let charts = derive_charts(&table, &mapping);
        let spec = charts.iter().find(|c| c.id == ChartId::DayPerformance).unwrap();
        let Series::Categories(points) = &spec.series else { panic!("expected categories") };
        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert_eq!(points[0].value, Some(10.0));
        assert_eq!(points[1].value, None);
        assert!(points[2].highlight);
        assert!(!points[0].highlight);
    }

    #[test]
    fn test_engagement_shares_sum_to_hundred() {
        let (table, mapping) = build(&["Reactions", "Reposts"], &[&["3", "1"], &["5", "1"]]);
        let charts = derive_charts(&table, &mapping);
        assert_eq!(ids(&charts), vec![ChartId::Engagement]);
        let Series::Proportions(slices) = &charts[0].series else { panic!("expected slices") };
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "Reactions");
        assert_eq!(slices[0].value, 8.0);
        assert_eq!(slices[1].label, "Shares");
        let total: f64 = slices.iter().map(|s| s.share).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_engagement_chart_is_skipped_alone() {
        let (table, mapping) = build(&["Date", "Likes"], &[&["2024-01-01", "0"]]);
        let charts = derive_charts(&table, &mapping);
        assert_eq!(ids(&charts), vec![ChartId::Frequency]);
    }

    #[test]
    fn test_content_type_ascending() {
        let (table, mapping) = build(
            &["Post Type", "Impressions"],
            &[&["video", "300"], &["text", "50"], &["image", "100"], &["text", "70"]],
        );
        let charts = derive_charts(&table, &mapping);
        assert_eq!(ids(&charts), vec![ChartId::ContentType]);
        let Series::Categories(points) = &charts[0].series else { panic!("expected categories") };
        let labels: Vec<&str> = points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["text", "image", "video"]);
        assert_eq!(points[0].value, Some(60.0));
        assert!(points[2].highlight);
    }

    #[test]
    fn test_dates_without_valid_values_yield_no_date_charts() {
        let (table, mapping) = build(&["Date", "Views"], &[&["soon", "10"]]);
        assert!(derive_charts(&table, &mapping).is_empty());
    }

    #[test]
    fn test_empty_table_yields_no_charts() {
        let (table, mapping) = build(&["Date", "Views", "Likes", "Type"], &[]);
        assert!(derive_charts(&table, &mapping).is_empty());
    }
}
