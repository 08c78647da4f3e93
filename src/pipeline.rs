use crate::charts::derive_charts;
use crate::error::{AnalyticsError, Result};
use crate::loader;
use crate::render::{ArtifactKey, ChartHandle, ChartRenderer};
use crate::reports::generate_record;
use crate::schema::resolve;
use crate::types::{AnalyticsRecord, RawTable};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart {
    pub name: String,
    pub handle: ChartHandle,
}

/// What one upload produces for its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutput {
    pub record: AnalyticsRecord,
    pub charts: Vec<RenderedChart>,
}

/// Resolve, aggregate, derive and render one already-parsed table.
///
/// A chart the renderer cannot draw is logged and left out; it never
/// fails the invocation.
pub fn analyze<R: ChartRenderer + ?Sized>(
    table: RawTable,
    key: &ArtifactKey,
    renderer: &R,
) -> AnalysisOutput {
    let (table, mapping) = resolve(table);
    let record = generate_record(&table, &mapping);

    let mut charts = Vec::new();
    for spec in derive_charts(&table, &mapping) {
        match renderer.render(&spec, key) {
            Ok(handle) => charts.push(RenderedChart {
                name: spec.name,
                handle,
            }),
            Err(e) => tracing::warn!(chart = %spec.id, error = %e, "chart rendering failed"),
        }
    }

    tracing::info!(
        posts = record.total_posts,
        charts = charts.len(),
        user = %key.user_id,
        "analysis complete"
    );
    AnalysisOutput { record, charts }
}

/// Load an export from disk and analyze it. Any structural failure is
/// reported once, as `AnalyticsError::Processing`.
pub fn analyze_file<R: ChartRenderer + ?Sized>(
    path: &Path,
    key: &ArtifactKey,
    renderer: &R,
) -> Result<AnalysisOutput> {
    let table = loader::load_path(path).map_err(AnalyticsError::processing)?;
    Ok(analyze(table, key, renderer))
}
