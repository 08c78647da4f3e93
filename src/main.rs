// Entry point and high-level CLI flow.
//
// - Loads one exported post table and runs the analytics pipeline.
// - Prints the performance summary and the chart artifacts written.
// - Writes the analytics record as JSON.
// - Optionally asks the recommendation service for advice.
use anyhow::{Context, Result};
use clap::Parser;
use social_report::output;
use social_report::pipeline;
use social_report::recommend::{GeminiClient, RecommendationService};
use social_report::render::{ArtifactKey, JsonSpecRenderer};
use social_report::settings::{self, Settings};
use social_report::util;

/// Ask the service for advice. A missing credential is reported but does
/// not fail the run.
fn handle_recommend(settings: &Settings, record: &social_report::AnalyticsRecord) {
    let client = match GeminiClient::from_env() {
        Ok(client) => client.with_model(settings.model.clone()),
        Err(e) => {
            println!("Recommendations unavailable: {}\n", e);
            return;
        }
    };
    match client.recommend(record) {
        Ok(rec) => {
            output::print_recommendations(&rec);
            let path = settings.summary_out.with_file_name("recommendations.json");
            if let Err(e) = output::write_json(&path, &rec) {
                eprintln!("Write error: {}", e);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "recommendation request failed");
            println!("Error generating recommendations. Please try again.\n");
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::parse();
    settings::setup_logging(&settings.log_level);

    tracing::info!("social_report v{} starting", env!("CARGO_PKG_VERSION"));

    let renderer = JsonSpecRenderer::new(&settings.charts_dir);
    let key = ArtifactKey::now(settings.user_id.clone());
    let analysis = pipeline::analyze_file(&settings.input, &key, &renderer)
        .with_context(|| format!("Error processing file {}", settings.input.display()))?;

    println!(
        "Processing export... ({} posts, {} charts)\n",
        util::format_int(analysis.record.total_posts as u64),
        util::format_int(analysis.charts.len() as u64)
    );
    output::print_report(&analysis.record, &analysis.charts);

    if let Err(e) = output::write_json(&settings.summary_out, &analysis.record) {
        eprintln!("Write error: {}", e);
    } else {
        println!("(Summary exported to {})\n", settings.summary_out.display());
    }

    if settings.recommend {
        handle_recommend(&settings, &analysis.record);
    }
    Ok(())
}
