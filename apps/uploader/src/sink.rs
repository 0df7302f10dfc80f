//! Report persistence for the command line: one JSON manifest per report.

use std::path::PathBuf;

use serde::Serialize;
use sitereport_upload::{NewReport, ReportSink, SinkFuture};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    id: &'a str,
    created_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    report: &'a NewReport,
}

/// Writes each submitted report to `<dir>/report-<id>.json`.
pub struct ManifestSink {
    dir: PathBuf,
}

impl ManifestSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn manifest_path(&self, report_id: &str) -> PathBuf {
        self.dir.join(format!("report-{report_id}.json"))
    }
}

impl ReportSink for ManifestSink {
    fn create_report<'a>(&'a self, report: NewReport) -> SinkFuture<'a> {
        Box::pin(async move {
            let id = uuid::Uuid::new_v4().to_string();
            let manifest = Manifest {
                id: &id,
                created_at: chrono::Utc::now(),
                report: &report,
            };
            let json = serde_json::to_vec_pretty(&manifest)?;
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(self.manifest_path(&id), json).await?;
            tracing::debug!(report = %id, photos = report.photos.len(), "manifest written");
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(id)
        })
    }
}
