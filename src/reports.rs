use crate::schema::{CanonicalField, FieldMapping};
use crate::types::{AnalyticsRecord, Cell, NormalizedTable, TopPost, NOT_AVAILABLE};
use crate::util::{average, coerce_date, coerce_number, round2, truncate_chars};
use chrono::{Datelike, NaiveDate, Weekday};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

const TOP_POSTS: usize = 5;
const TITLE_MAX_CHARS: usize = 100;
const UNTITLED: &str = "Untitled";

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Coerced column of a numeric canonical field, `None` if unresolved.
pub(crate) fn numeric_column(
    table: &NormalizedTable,
    mapping: &FieldMapping,
    field: CanonicalField,
) -> Option<Vec<f64>> {
    let header = mapping.get(field)?;
    let cells = table.column(header)?;
    Some(cells.into_iter().map(coerce_number).collect())
}

/// Coerced date column; invalid cells are `None`.
pub(crate) fn date_column(
    table: &NormalizedTable,
    mapping: &FieldMapping,
) -> Option<Vec<Option<NaiveDate>>> {
    let header = mapping.get(CanonicalField::Date)?;
    let cells = table.column(header)?;
    Some(cells.into_iter().map(coerce_date).collect())
}

/// Trimmed text of a categorical column; missing or blank cells are `None`.
pub(crate) fn text_column(
    table: &NormalizedTable,
    mapping: &FieldMapping,
    field: CanonicalField,
) -> Option<Vec<Option<String>>> {
    let header = mapping.get(field)?;
    let cells = table.column(header)?;
    Some(
        cells
            .into_iter()
            .map(|c| {
                c.as_text()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .collect(),
    )
}

/// Mean impressions per weekday over rows with a valid date.
pub(crate) fn weekday_means(
    dates: &[Option<NaiveDate>],
    impressions: &[f64],
) -> BTreeMap<u32, (Weekday, f64)> {
    let mut acc: BTreeMap<u32, (Weekday, Vec<f64>)> = BTreeMap::new();
    for (date, imp) in dates.iter().zip(impressions) {
        if let Some(d) = date {
            let day = d.weekday();
            acc.entry(day.num_days_from_monday())
                .or_insert_with(|| (day, Vec::new()))
                .1
                .push(*imp);
        }
    }
    acc.into_iter()
        .map(|(k, (day, values))| (k, (day, average(&values))))
        .collect()
}

/// Mean impressions per distinct content type, keyed by type value.
pub(crate) fn type_means(types: &[Option<String>], impressions: &[f64]) -> BTreeMap<String, f64> {
    let mut acc: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (ty, imp) in types.iter().zip(impressions) {
        if let Some(ty) = ty {
            acc.entry(ty.clone()).or_default().push(*imp);
        }
    }
    acc.into_iter().map(|(k, v)| (k, average(&v))).collect()
}

/// First key holding the strict maximum; iteration order breaks ties.
fn argmax<'a, K, I>(items: I) -> Option<K>
where
    I: IntoIterator<Item = (K, &'a f64)>,
{
    let mut best: Option<(K, f64)> = None;
    for (key, value) in items {
        match &best {
            Some((_, current)) if value.partial_cmp(current) != Some(Ordering::Greater) => {}
            _ => best = Some((key, *value)),
        }
    }
    best.map(|(k, _)| k)
}

fn sum_and_mean(values: &[f64]) -> (u64, f64) {
    let sum: f64 = values.iter().sum();
    (sum as u64, round2(average(values)))
}

/// Compute the fixed-shape record. Malformed cells never fail the call.
pub fn generate_record(table: &NormalizedTable, mapping: &FieldMapping) -> AnalyticsRecord {
    let mut record = AnalyticsRecord {
        total_posts: table.len(),
        ..AnalyticsRecord::default()
    };

    let impressions = numeric_column(table, mapping, CanonicalField::Impressions);
    let reactions = numeric_column(table, mapping, CanonicalField::Reactions);

    if let Some(values) = &impressions {
        (record.total_impressions, record.avg_impressions) = sum_and_mean(values);
    }
    if let Some(values) = &reactions {
        (record.total_reactions, record.avg_reactions) = sum_and_mean(values);
    }
    if let Some(values) = numeric_column(table, mapping, CanonicalField::Comments) {
        (record.total_comments, record.avg_comments) = sum_and_mean(&values);
    }
    if let Some(values) = numeric_column(table, mapping, CanonicalField::Shares) {
        (record.total_shares, record.avg_shares) = sum_and_mean(&values);
    }

    record.engagement_rate = engagement_rate(
        record
            .total_reactions
            .saturating_add(record.total_comments)
            .saturating_add(record.total_shares),
        record.total_impressions,
    );

    if let Some(dates) = date_column(table, mapping) {
        record.date_range = date_range(&dates);
        if let Some(imp) = &impressions {
            let means = weekday_means(&dates, imp);
            if let Some(day) = argmax(means.values().map(|(day, mean)| (*day, mean))) {
                record.best_day = weekday_name(day).to_string();
            }
        }
    }

    if let (Some(types), Some(imp)) = (
        text_column(table, mapping, CanonicalField::Type),
        &impressions,
    ) {
        let means = type_means(&types, imp);
        if let Some(ty) = argmax(means.iter().map(|(k, v)| (k.clone(), v))) {
            record.best_content_type = ty;
        }
    }

    if let Some(imp) = &impressions {
        record.top_posts = top_posts(table, mapping, imp, reactions.as_deref());
    }

    tracing::debug!(
        posts = record.total_posts,
        resolved = mapping.len(),
        "aggregated analytics record"
    );
    record
}

pub fn engagement_rate(total_engagement: u64, total_impressions: u64) -> f64 {
    if total_impressions == 0 {
        return 0.0;
    }
    round2(total_engagement as f64 / total_impressions as f64 * 100.0)
}

/// `"<min> to <max>"` over valid dates, `"N/A"` when there are none.
pub fn date_range(dates: &[Option<NaiveDate>]) -> String {
    let mut valid = dates.iter().flatten();
    let Some(first) = valid.next() else {
        return NOT_AVAILABLE.to_string();
    };
    let (min, max) = valid.fold((*first, *first), |(lo, hi), d| (lo.min(*d), hi.max(*d)));
    format!("{} to {}", min.format("%Y-%m-%d"), max.format("%Y-%m-%d"))
}

fn top_posts(
    table: &NormalizedTable,
    mapping: &FieldMapping,
    impressions: &[f64],
    reactions: Option<&[f64]>,
) -> Vec<TopPost> {
    let Some(titles) = mapping.get(CanonicalField::Title).and_then(|h| table.column(h)) else {
        return Vec::new();
    };

    let mut order: Vec<usize> = (0..impressions.len()).collect();
    // Stable sort keeps the original row order between equal impressions.
    order.sort_by(|a, b| {
        impressions[*b]
            .partial_cmp(&impressions[*a])
            .unwrap_or(Ordering::Equal)
    });

    order
        .into_iter()
        .take(TOP_POSTS)
        .map(|idx| TopPost {
            title: title_of(titles[idx]),
            impressions: impressions[idx] as u64,
            reactions: reactions.map(|r| r[idx] as u64).unwrap_or(0),
        })
        .collect()
}

fn title_of(cell: &Cell) -> String {
    match cell.as_text() {
        Some(text) => truncate_chars(&text, TITLE_MAX_CHARS),
        None => UNTITLED.to_string(),
    }
}

/// Group helper shared with the chart deriver: posts per `YYYY-MM`.
pub(crate) fn monthly_counts(dates: &[Option<NaiveDate>]) -> BTreeMap<String, usize> {
    let mut counts: HashMap<(i32, u32), usize> = HashMap::new();
    for d in dates.iter().flatten() {
        *counts.entry((d.year(), d.month())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((y, m), c)| (format!("{:04}-{:02}", y, m), c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::resolve;
    use crate::types::RawTable;

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

    #[test]
    fn test_views_only_with_bad_cell() {
        let (table, mapping) = build(&["Views"], &[&["10"], &["bad"], &["30"]]);
        let record = generate_record(&table, &mapping);
        assert_eq!(record.total_posts, 3);
        assert_eq!(record.total_impressions, 40);
        assert_eq!(record.avg_impressions, 13.33);
        assert_eq!(record.engagement_rate, 0.0);
        assert_eq!(record.date_range, "N/A");
        assert_eq!(record.best_day, "N/A");
        assert!(record.top_posts.is_empty());
    }

    #[test]
    fn test_date_range_skips_missing_dates() {
        let (table, mapping) = build(
            &["Date", "Impressions", "Likes", "Comments", "Title"],
            &[
                &["2024-01-10", "100", "5", "1", "First"],
                &["", "300", "9", "2", "Second"],
                &["2024-01-02", "200", "6", "0", "Third"],
            ],
        );
        let record = generate_record(&table, &mapping);
        assert_eq!(record.total_posts, 3);
        assert_eq!(record.date_range, "2024-01-02 to 2024-01-10");
        assert_eq!(record.total_reactions, 20);
        assert_eq!(record.total_comments, 3);
        assert_eq!(record.total_shares, 0);
        assert_eq!(record.avg_shares, 0.0);
        // (20 + 3) / 600 * 100
        assert_eq!(record.engagement_rate, 3.83);
        // 2024-01-10 is a Wednesday, 2024-01-02 a Tuesday.
        assert_eq!(record.best_day, "Tuesday");
        assert_eq!(
            record.top_posts.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
            vec!["Second", "Third", "First"]
        );
        assert_eq!(record.top_posts[0].reactions, 9);
    }

    #[test]
    fn test_top_posts_limited_and_stable() {
        let rows: Vec<Vec<String>> = (0..7)
            .map(|i| vec![format!("post {i}"), if i % 2 == 0 { "50" } else { "10" }.to_string()])
            .collect();
        let rows_ref: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let rows_slices: Vec<&[&str]> = rows_ref.iter().map(Vec::as_slice).collect();
        let (table, mapping) = build(&["Text", "Impression"], &rows_slices);
        let record = generate_record(&table, &mapping);
        let titles: Vec<&str> = record.top_posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["post 0", "post 2", "post 4", "post 6", "post 1"]);
        assert!(record.top_posts.iter().all(|p| p.reactions == 0));
    }

    #[test]
    fn test_top_posts_title_default_and_truncation() {
        let long = "x".repeat(150);
        let (table, mapping) = build(&["Title", "Views"], &[&[long.as_str(), "5"], &["", "9"]]);
        let record = generate_record(&table, &mapping);
        assert_eq!(record.top_posts[0].title, "Untitled");
        assert_eq!(record.top_posts[1].title.chars().count(), 100);
    }

    #[test]
    fn test_best_content_type_and_tie_break() {
        let (table, mapping) = build(
            &["Format", "Views"],
            &[&["video", "100"], &["image", "100"], &["text", "20"], &["", "999"]],
        );
        let record = generate_record(&table, &mapping);
        assert_eq!(record.best_content_type, "image");
    }

    #[test]
    fn test_best_day_tie_prefers_earlier_weekday() {
        // Sunday and Monday with equal means.
        let (table, mapping) = build(
            &["Date", "Views"],
            &[&["2024-01-07", "40"], &["2024-01-08", "40"]],
        );
        let record = generate_record(&table, &mapping);
        assert_eq!(record.best_day, "Monday");
    }

    #[test]
    fn test_type_without_impressions_is_not_available() {
        let (table, mapping) = build(&["Type", "Likes"], &[&["video", "3"]]);
        let record = generate_record(&table, &mapping);
        assert_eq!(record.best_content_type, "N/A");
        assert_eq!(record.total_reactions, 3);
        assert_eq!(record.avg_reactions, 3.0);
    }

    #[test]
    fn test_empty_table_defaults() {
        let (table, mapping) = build(&["Date", "Views", "Likes", "Title"], &[]);
        let record = generate_record(&table, &mapping);
        assert_eq!(record.total_posts, 0);
        assert_eq!(record.total_impressions, 0);
        assert_eq!(record.avg_impressions, 0.0);
        assert_eq!(record.engagement_rate, 0.0);
        assert!(record.top_posts.is_empty());
        assert_eq!(record.date_range, "N/A");
        assert_eq!(record.best_day, "N/A");
    }

    #[test]
    fn test_engagement_rate_guard() {
        assert_eq!(engagement_rate(10, 0), 0.0);
        assert_eq!(engagement_rate(1, 3), 33.33);
    }

    #[test]
    fn test_huge_engagement_totals_saturate() {
        let (table, mapping) = build(
            &["Views", "Likes", "Comments"],
            &[&["1", "30000000000000000000", "30000000000000000000"]],
        );
        let record = generate_record(&table, &mapping);
        assert_eq!(record.total_reactions, u64::MAX);
        assert_eq!(record.total_comments, u64::MAX);
        assert!(record.engagement_rate.is_finite());
        assert!(record.engagement_rate > 0.0);
    }

    #[test]
    fn test_monthly_counts() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        let counts = monthly_counts(&[d(2024, 2, 1), None, d(2024, 1, 9), d(2024, 2, 20)]);
        assert_eq!(
            counts.into_iter().collect::<Vec<_>>(),
            vec![("2024-01".to_string(), 1), ("2024-02".to_string(), 2)]
        );
    }
}
