//! Submission error types.

use sitereport_protocol::MetadataError;

/// Why a report cannot be submitted as it stands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitProblem {
    #[error("no project selected")]
    MissingProject,

    #[error("no photos selected")]
    NoPhotos,

    #[error("photo {}: {error}", .index + 1)]
    Photo { index: usize, error: MetadataError },

    #[error("photos are still being processed or have failed")]
    NotReady,
}

/// Errors produced while submitting a report.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("report is incomplete: {}", join(.0))]
    Validation(Vec<SubmitProblem>),

    #[error("{failed} of {total} photos failed to upload")]
    Upload { failed: usize, total: usize },

    #[error("saving the report failed: {0}")]
    Persist(String),
}

fn join(problems: &[SubmitProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_problems() {
        let err = SubmitError::Validation(vec![
            SubmitProblem::MissingProject,
            SubmitProblem::Photo {
                index: 1,
                error: MetadataError::TitleMissing,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "report is incomplete: no project selected; photo 2: title is required"
        );
    }
}
