//! Detector outcomes.

use serde::{Serialize, Serializer};

/// What a detector produced: either a real result, or the detector's safe
/// fallback together with the reason it could not run.
///
/// Serializes as the inner result with an extra `error` field when degraded.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorOutcome<T> {
    /// The detector ran to completion.
    Completed(T),
    /// The detector failed; `fallback` is its documented neutral result.
    Degraded { fallback: T, reason: String },
}

impl<T> DetectorOutcome<T> {
    pub fn degraded(fallback: T, reason: impl Into<String>) -> Self {
        DetectorOutcome::Degraded {
            fallback,
            reason: reason.into(),
        }
    }

    /// The populated or fallback result.
    pub fn result(&self) -> &T {
        match self {
            DetectorOutcome::Completed(result) => result,
            DetectorOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn into_result(self) -> T {
        match self {
            DetectorOutcome::Completed(result) => result,
            DetectorOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    /// Failure reason, if the detector degraded.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            DetectorOutcome::Completed(_) => None,
            DetectorOutcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, DetectorOutcome::Degraded { .. })
    }
}

impl<T: Serialize> Serialize for DetectorOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flat<'a, T> {
            #[serde(flatten)]
            result: &'a T,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        Flat {
            result: self.result(),
            error: self.diagnostic(),
        }
        .serialize(serializer)
    }
}
