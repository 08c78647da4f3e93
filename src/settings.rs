use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Summarize a social-media post export and derive performance charts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "social_report",
    about = "Summarize a social-media post export and derive performance charts",
    version
)]
pub struct Settings {
    /// Exported post table (.csv, .xlsx, .xls or .ods)
    pub input: PathBuf,

    /// Identifier of the uploading user, used to name chart artifacts
    #[arg(long, env = "SOCIAL_REPORT_USER", default_value = "local")]
    pub user_id: String,

    /// Directory receiving chart artifacts
    #[arg(long, env = "SOCIAL_REPORT_CHARTS_DIR", default_value = "static/charts")]
    pub charts_dir: PathBuf,

    /// Where to write the analytics record as JSON
    #[arg(long, default_value = "summary.json")]
    pub summary_out: PathBuf,

    /// Ask the recommendation service for advice on the summary
    #[arg(long)]
    pub recommend: bool,

    /// Model used for recommendations
    #[arg(long, env = "GEMINI_MODEL", default_value = crate::recommend::DEFAULT_MODEL)]
    pub model: String,

    /// Logging level
    #[arg(long, env = "SOCIAL_REPORT_LOG", default_value = "INFO")]
    pub log_level: String,
}

/// Map a level name (Python-style names accepted) to a filter directive.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr.
pub fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry().with(filter).with(layer).init();
}
