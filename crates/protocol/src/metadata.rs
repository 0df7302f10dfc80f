//! User-editable photo metadata and its validation rules.

use serde::{Deserialize, Serialize};

use crate::constants::{COMMENT_MAX_CHARS, FEEDBACK_MAX_CHARS, TITLE_MAX_CHARS};

/// When in the job a photo was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoType {
    Before,
    #[default]
    During,
    After,
    Other,
}

impl PhotoType {
    /// All variants in display order.
    pub const ALL: [PhotoType; 4] = [
        PhotoType::Before,
        PhotoType::During,
        PhotoType::After,
        PhotoType::Other,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            PhotoType::Before => "Before",
            PhotoType::During => "In progress",
            PhotoType::After => "After",
            PhotoType::Other => "Other",
        }
    }

    /// Customer feedback is only collected for finished work.
    pub fn accepts_feedback(self) -> bool {
        self == PhotoType::After
    }
}

impl std::str::FromStr for PhotoType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(PhotoType::Before),
            "during" => Ok(PhotoType::During),
            "after" => Ok(PhotoType::After),
            "other" => Ok(PhotoType::Other),
            other => Err(MetadataError::UnknownPhotoType(other.to_string())),
        }
    }
}

/// A metadata rule violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("title is required")]
    TitleMissing,

    #[error("title must be at most {max} characters (got {len})")]
    TitleTooLong { len: usize, max: usize },

    #[error("comment must be at most {max} characters (got {len})")]
    CommentTooLong { len: usize, max: usize },

    #[error("customer feedback must be at most {max} characters (got {len})")]
    FeedbackTooLong { len: usize, max: usize },

    #[error("unknown photo type: {0}")]
    UnknownPhotoType(String),
}

/// Metadata attached to a photo by the field staff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    pub photo_type: PhotoType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub customer_feedback: String,
}

impl PhotoMetadata {
    /// Checks every rule and returns all violations, in field order.
    pub fn problems(&self) -> Vec<MetadataError> {
        let mut problems = Vec::new();

        let title_len = self.title.trim().chars().count();
        if title_len == 0 {
            problems.push(MetadataError::TitleMissing);
        } else if title_len > TITLE_MAX_CHARS {
            problems.push(MetadataError::TitleTooLong {
                len: title_len,
                max: TITLE_MAX_CHARS,
            });
        }

        let comment_len = self.comment.chars().count();
        if comment_len > COMMENT_MAX_CHARS {
            problems.push(MetadataError::CommentTooLong {
                len: comment_len,
                max: COMMENT_MAX_CHARS,
            });
        }

        let feedback_len = self.customer_feedback.chars().count();
        if feedback_len > FEEDBACK_MAX_CHARS {
            problems.push(MetadataError::FeedbackTooLong {
                len: feedback_len,
                max: FEEDBACK_MAX_CHARS,
            });
        }

        problems
    }

    /// Returns the first violation, if any.
    pub fn validate(&self) -> Result<(), MetadataError> {
        match self.problems().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Customer feedback if the photo type collects it and it is non-empty.
    pub fn effective_feedback(&self) -> Option<&str> {
        let feedback = self.customer_feedback.trim();
        if self.photo_type.accepts_feedback() && !feedback.is_empty() {
            Some(feedback)
        } else {
            None
        }
    }

    /// Merges the fields present in `patch`.
    pub fn apply(&mut self, patch: MetadataPatch) {
        if let Some(photo_type) = patch.photo_type {
            self.photo_type = photo_type;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(comment) = patch.comment {
            self.comment = comment;
        }
        if let Some(feedback) = patch.customer_feedback {
            self.customer_feedback = feedback;
        }
    }
}

/// A partial metadata update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_type: Option<PhotoType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_feedback: Option<String>,
}

impl MetadataPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_photo_type(mut self, photo_type: PhotoType) -> Self {
        self.photo_type = Some(photo_type);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_customer_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.customer_feedback = Some(feedback.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> PhotoMetadata {
        PhotoMetadata {
            title: title.into(),
            ..PhotoMetadata::default()
        }
    }

    #[test]
    fn default_type_is_during() {
        assert_eq!(PhotoMetadata::default().photo_type, PhotoType::During);
    }

    #[test]
    fn photo_type_serialization() {
        assert_eq!(
            serde_json::to_string(&PhotoType::Before).unwrap(),
            "\"before\""
        );
        let t: PhotoType = serde_json::from_str("\"after\"").unwrap();
        assert_eq!(t, PhotoType::After);
        assert_eq!("Other".parse::<PhotoType>().unwrap(), PhotoType::Other);
        assert!("sideways".parse::<PhotoType>().is_err());
    }

    #[test]
    fn title_required() {
        assert_eq!(titled("").validate(), Err(MetadataError::TitleMissing));
        assert_eq!(titled("   ").validate(), Err(MetadataError::TitleMissing));
        assert!(titled("Roof frame").validate().is_ok());
    }

    #[test]
    fn title_length_counts_characters() {
        // 200 multi-byte characters are still within the limit.
        let at_limit = "屋".repeat(TITLE_MAX_CHARS);
        assert!(titled(&at_limit).validate().is_ok());

        let over = "a".repeat(TITLE_MAX_CHARS + 1);
        assert_eq!(
            titled(&over).validate(),
            Err(MetadataError::TitleTooLong {
                len: TITLE_MAX_CHARS + 1,
                max: TITLE_MAX_CHARS
            })
        );
    }

    #[test]
    fn problems_reports_all_fields() {
        let meta = PhotoMetadata {
            photo_type: PhotoType::After,
            title: String::new(),
            comment: "c".repeat(COMMENT_MAX_CHARS + 1),
            customer_feedback: "f".repeat(FEEDBACK_MAX_CHARS + 1),
        };
        let problems = meta.problems();
        assert_eq!(problems.len(), 3);
        assert_eq!(problems[0], MetadataError::TitleMissing);
        assert!(matches!(problems[1], MetadataError::CommentTooLong { .. }));
        assert!(matches!(problems[2], MetadataError::FeedbackTooLong { .. }));
    }

    #[test]
    fn feedback_only_for_after() {
        let mut meta = titled("Done");
        meta.customer_feedback = "Very happy".into();
        assert_eq!(meta.effective_feedback(), None);

        meta.photo_type = PhotoType::After;
        assert_eq!(meta.effective_feedback(), Some("Very happy"));
    }

    #[test]
    fn apply_patch_merges_present_fields() {
        let mut meta = PhotoMetadata {
            photo_type: PhotoType::Before,
            title: "Old".into(),
            comment: "keep me".into(),
            customer_feedback: String::new(),
        };
        meta.apply(MetadataPatch::title("New").with_photo_type(PhotoType::After));
        assert_eq!(meta.title, "New");
        assert_eq!(meta.photo_type, PhotoType::After);
        assert_eq!(meta.comment, "keep me");
    }

    #[test]
    fn patch_omits_absent_fields() {
        let json = serde_json::to_string(&MetadataPatch::title("x")).unwrap();
        assert_eq!(json, r#"{"title":"x"}"#);
    }
}
