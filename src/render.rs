use crate::charts::ChartSpec;
use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Collision-free naming for one upload's chart artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    pub user_id: String,
    /// `YYYYMMDDHHMMSS`.
    pub timestamp: String,
    /// Disambiguates uploads landing in the same second.
    pub sequence: u64,
}

impl ArtifactKey {
    pub fn new(user_id: impl Into<String>, at: DateTime<Local>) -> Self {
        ArtifactKey {
            user_id: user_id.into(),
            timestamp: at.format("%Y%m%d%H%M%S").to_string(),
            sequence: SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn now(user_id: impl Into<String>) -> Self {
        ArtifactKey::new(user_id, Local::now())
    }

    /// `{chart}_{user}_{timestamp}` with `_{sequence}` appended when non-zero.
    pub fn file_stem(&self, chart: &str) -> String {
        let user = sanitize(&self.user_id);
        if self.sequence == 0 {
            format!("{}_{}_{}", chart, user, self.timestamp)
        } else {
            format!("{}_{}_{}_{}", chart, user, self.timestamp, self.sequence)
        }
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Where a renderer put a chart (file path or URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartHandle(pub String);

impl std::fmt::Display for ChartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draws a chart description and persists it.
pub trait ChartRenderer {
    fn render(&self, spec: &ChartSpec, key: &ArtifactKey) -> Result<ChartHandle>;
}

/// Persists each chart description as pretty JSON for an external drawing
/// step to pick up.
#[derive(Debug, Clone)]
pub struct JsonSpecRenderer {
    dir: PathBuf,
}

impl JsonSpecRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonSpecRenderer { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ChartRenderer for JsonSpecRenderer {
    fn render(&self, spec: &ChartSpec, key: &ArtifactKey) -> Result<ChartHandle> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            AnalyticsError::Render(format!("cannot create {}: {}", self.dir.display(), e))
        })?;
        let path = self.dir.join(format!("{}.json", key.file_stem(spec.id.slug())));
        let body = serde_json::to_string_pretty(spec)?;
        std::fs::write(&path, body)
            .map_err(|e| AnalyticsError::Render(format!("cannot write {}: {}", path.display(), e)))?;
        Ok(ChartHandle(path.to_string_lossy().into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartId, ChartKind, Series, TimePoint};
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn spec() -> ChartSpec {
        ChartSpec {
            id: ChartId::Impressions,
            name: "Impression Trends".into(),
            kind: ChartKind::Line,
            title: "Impression Trends Over Time".into(),
            x_label: "Date".into(),
            y_label: "Impressions".into(),
            series: Series::Time(vec![TimePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: 12.0,
            }]),
        }
    }

    #[test]
    fn test_file_stem_format() {
        let key = ArtifactKey {
            user_id: "42".into(),
            timestamp: "20240101093000".into(),
            sequence: 0,
        };
        assert_eq!(key.file_stem("engagement"), "engagement_42_20240101093000");
        let key = ArtifactKey { sequence: 3, ..key };
        assert_eq!(key.file_stem("frequency"), "frequency_42_20240101093000_3");
    }

    #[test]
    fn test_same_second_keys_do_not_collide() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let a = ArtifactKey::new("7", at);
        let b = ArtifactKey::new("7", at);
        assert_eq!(a.timestamp, "20240501120000");
        assert_ne!(a.file_stem("impressions"), b.file_stem("impressions"));
    }

    #[test]
    fn test_user_id_is_sanitized() {
        let key = ArtifactKey {
            user_id: "../evil user".into(),
            timestamp: "20240101000000".into(),
            sequence: 0,
        };
        assert_eq!(key.file_stem("engagement"), "engagement_---evil-user_20240101000000");
    }

    #[test]
    fn test_json_renderer_writes_spec() {
        let tmp = TempDir::new().expect("tempdir");
        let renderer = JsonSpecRenderer::new(tmp.path().join("charts"));
        let key = ArtifactKey {
            user_id: "9".into(),
            timestamp: "20240101000000".into(),
            sequence: 0,
        };
        let handle = renderer.render(&spec(), &key).expect("render");
        assert!(handle.0.ends_with("impressions_9_20240101000000.json"));

        let written = std::fs::read_to_string(&handle.0).expect("read back");
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["id"], "impressions");
        assert_eq!(value["kind"], "line");
        assert_eq!(value["series"]["type"], "time");
        assert_eq!(value["series"]["points"][0]["date"], "2024-01-01");
    }
}
