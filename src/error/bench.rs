use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use super::{TransportError, ValidationError};

/// Stage of a benchmark run a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Probe,
    Sequential,
    Concurrent,
}

impl Phase {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Probe => "Connectivity",
            Phase::Sequential => "Single-Thread",
            Phase::Concurrent => "Multi-Thread",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
    /// No response was obtained. Raised by the connectivity check and by the
    /// sequential phase, which stops at its first transport failure.
    /// Concurrent transport failures are counted in `UnexpectedStatuses`.
    #[error("{phase}: URL not reachable ({source})")]
    Unreachable {
        phase: Phase,
        #[source]
        source: TransportError,
    },
    #[error("{phase}: status is invalid (Expected: {expected}, Found: {found})")]
    UnexpectedStatus {
        phase: Phase,
        expected: u16,
        found: u16,
    },
    #[error(
        "{}: status is invalid (Expected: {expected}, Found: {}{})",
        Phase::Concurrent,
        join_codes(found),
        format_transport_failures(*transport_failures)
    )]
    UnexpectedStatuses {
        expected: u16,
        found: BTreeSet<u16>,
        transport_failures: u64,
    },
    #[error("Unknown field '{name}'.")]
    UnknownField { name: String },
}

pub type BenchResult<T> = Result<T, BenchError>;

impl BenchError {
    pub(crate) fn invalid<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        BenchError::InvalidConfig(error.into())
    }

    /// Distinct offending status codes carried by this error, if any.
    #[must_use]
    pub fn offending_statuses(&self) -> BTreeSet<u16> {
        match self {
            BenchError::UnexpectedStatus { found, .. } => BTreeSet::from([*found]),
            BenchError::UnexpectedStatuses { found, .. } => found.clone(),
            BenchError::InvalidConfig(_)
            | BenchError::Unreachable { .. }
            | BenchError::UnknownField { .. } => BTreeSet::new(),
        }
    }
}

fn join_codes(codes: &BTreeSet<u16>) -> String {
    if codes.is_empty() {
        return "none".to_owned();
    }
    codes
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_transport_failures(count: u64) -> String {
    if count == 0 {
        String::new()
    } else {
        format!("; {} transfer(s) failed without a response", count)
    }
}
