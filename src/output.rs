use crate::pipeline::RenderedChart;
use crate::recommend::Recommendations;
use crate::types::{AnalyticsRecord, SummaryRow};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, s)?;
    Ok(())
}

/// Metric/value rows for the console summary.
pub fn summary_rows(record: &AnalyticsRecord) -> Vec<SummaryRow> {
    let row = |metric: &str, value: String| SummaryRow {
        metric: metric.to_string(),
        value,
    };
    vec![
        row("Total Posts", format_int(record.total_posts as u64)),
        row("Date Range", record.date_range.clone()),
        row("Total Impressions", format_int(record.total_impressions)),
        row("Avg Impressions", format_number(record.avg_impressions, 2)),
        row("Total Reactions", format_int(record.total_reactions)),
        row("Avg Reactions", format_number(record.avg_reactions, 2)),
        row("Total Comments", format_int(record.total_comments)),
        row("Avg Comments", format_number(record.avg_comments, 2)),
        row("Total Shares", format_int(record.total_shares)),
        row("Avg Shares", format_number(record.avg_shares, 2)),
        row("Engagement Rate", format!("{}%", format_number(record.engagement_rate, 2))),
        row("Best Day", record.best_day.clone()),
        row("Best Content Type", record.best_content_type.clone()),
        row("Posting Frequency", record.posting_frequency.clone()),
    ]
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match render_table(rows, max_rows) {
        Some(table_str) => println!("{}\n", table_str),
        None => println!("(no rows)\n"),
    }
}

pub fn print_report(record: &AnalyticsRecord, charts: &[RenderedChart]) {
    println!("Performance Summary\n");
    preview_table_rows(&summary_rows(record), usize::MAX);

    println!("Top Posts (by impressions)\n");
    preview_table_rows(&record.top_posts, record.top_posts.len());

    if charts.is_empty() {
        println!("No charts could be generated from this export.\n");
        return;
    }
    println!("Charts:");
    for chart in charts {
        println!("  {}: {}", chart.name, chart.handle);
    }
    println!();
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}:", title);
    for item in items {
        println!("  - {}", item);
    }
    println!();
}

pub fn print_recommendations(rec: &Recommendations) {
    println!("Recommendations\n");
    if !rec.performance_summary.is_empty() {
        println!("{}\n", rec.performance_summary);
    }
    print_list("Strengths", &rec.strengths);
    print_list("Areas for improvement", &rec.areas_for_improvement);
    print_list("Reach", &rec.reach_recommendations);
    print_list("Timing", &rec.timing_recommendations);
    print_list("Content", &rec.content_recommendations);
    print_list("Hook suggestions", &rec.hook_suggestions);
    print_list("What to avoid", &rec.what_to_avoid);
    print_list("Engagement tactics", &rec.engagement_tactics);
    if !rec.next_7_post_ideas.is_empty() {
        println!("Next 7 post ideas:");
        for idea in &rec.next_7_post_ideas {
            println!("  Day {} [{}] {}: {}", idea.day, idea.post_type, idea.topic, idea.hook);
        }
        println!();
    }
    if !rec.growth_forecast.is_empty() {
        println!("Growth forecast: {}\n", rec.growth_forecast);
    }
}
