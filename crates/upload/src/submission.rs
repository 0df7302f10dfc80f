//! Report submission: validate, upload, persist, and roll back on failure.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use sitereport_protocol::{ItemSnapshot, PhotoType, UploadStatus};
use tracing::{info, warn};

use crate::error::{SubmitError, SubmitProblem};
use crate::manager::UploadManager;

/// Boxed future returned by [`ReportSink::create_report`].
pub type SinkFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// Who the report is for and where its photos go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub project_id: String,
    /// Storage namespace of the submitting user.
    pub user_namespace: String,
}

/// One photo row of a persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhoto {
    pub url: String,
    pub photo_type: PhotoType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_feedback: Option<String>,
    pub sort_order: u32,
}

/// A report ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub project_id: String,
    pub photos: Vec<NewPhoto>,
}

impl NewReport {
    /// Builds the report from completed items, in their order.
    pub fn from_items(project_id: &str, items: &[ItemSnapshot]) -> Self {
        let photos = items
            .iter()
            .filter(|item| item.status == UploadStatus::Completed)
            .filter_map(|item| {
                let url = item.remote_url.clone()?;
                let comment = item.metadata.comment.trim();
                Some((url, item, comment))
            })
            .enumerate()
            .map(|(order, (url, item, comment))| NewPhoto {
                url,
                photo_type: item.metadata.photo_type,
                title: item.metadata.title.trim().to_string(),
                comment: (!comment.is_empty()).then(|| comment.to_string()),
                customer_feedback: item.metadata.effective_feedback().map(str::to_string),
                sort_order: order as u32,
            })
            .collect();
        Self {
            project_id: project_id.to_string(),
            photos,
        }
    }
}

/// Persists submitted reports and returns the new report id.
pub trait ReportSink: Send + Sync {
    fn create_report<'a>(&'a self, report: NewReport) -> SinkFuture<'a>;
}

/// Collects every reason `manager` cannot be submitted for `project_id`.
pub fn check_submission(manager: &UploadManager, project_id: &str) -> Vec<SubmitProblem> {
    let mut problems = Vec::new();
    if project_id.trim().is_empty() {
        problems.push(SubmitProblem::MissingProject);
    }

    let items = manager.items();
    if items.is_empty() {
        problems.push(SubmitProblem::NoPhotos);
        return problems;
    }

    for (index, item) in items.iter().enumerate() {
        problems.extend(
            item.metadata
                .problems()
                .into_iter()
                .map(|error| SubmitProblem::Photo { index, error }),
        );
    }
    if !manager.can_submit() {
        problems.push(SubmitProblem::NotReady);
    }
    problems
}

/// Submits the photos tracked by `manager` as one report.
///
/// Nothing is uploaded unless the report validates. If any upload fails or
/// the sink rejects the report, every photo uploaded for it is deleted
/// again and returns to `ready`, so a retry uploads it afresh. On success
/// the manager is cleared and the report id returned.
pub async fn submit_report(
    manager: &UploadManager,
    sink: &dyn ReportSink,
    request: &SubmitRequest,
) -> Result<String, SubmitError> {
    let problems = check_submission(manager, &request.project_id);
    if !problems.is_empty() {
        return Err(SubmitError::Validation(problems));
    }

    let items = manager.upload_all(&request.user_namespace).await;
    let failed = items
        .iter()
        .filter(|item| item.status == UploadStatus::Error)
        .count();
    if failed > 0 {
        manager.cleanup_uploaded_photos().await;
        return Err(SubmitError::Upload {
            failed,
            total: items.len(),
        });
    }

    let report = NewReport::from_items(&request.project_id, &items);
    let photos = report.photos.len();
    match sink.create_report(report).await {
        Ok(report_id) => {
            info!(report = %report_id, project = %request.project_id, photos, "report submitted");
            manager.clear();
            Ok(report_id)
        }
        Err(e) => {
            warn!(error = %e, project = %request.project_id, "saving report failed, rolling back uploads");
            manager.cleanup_uploaded_photos().await;
            Err(SubmitError::Persist(e.to_string()))
        }
    }
}
