/// Outcome of a best-effort transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed<T> {
    /// The transform succeeded.
    Optimized(T),
    /// The transform failed; `original` is the input, unchanged.
    Fallback { original: T, reason: String },
}

impl<T> Processed<T> {
    /// Returns the transformed value or the original, whichever is present.
    pub fn into_inner(self) -> T {
        match self {
            Processed::Optimized(v) => v,
            Processed::Fallback { original, .. } => original,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Processed::Optimized(v) => v,
            Processed::Fallback { original, .. } => original,
        }
    }

    /// `true` if the transform fell back to the original.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Processed::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Processed::Optimized(_) => None,
            Processed::Fallback { reason, .. } => Some(reason),
        }
    }
}
