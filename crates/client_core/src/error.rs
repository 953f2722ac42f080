use std::fmt;

use thiserror::Error;

/// The request a failure belongs to. Its `Display` form prefixes every
/// transport error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchFlags,
    UpdateFlag,
    FetchOrgs,
    FetchDefinitions,
    Health,
}

impl Operation {
    fn context(self) -> &'static str {
        match self {
            Operation::FetchFlags => "Error fetching feature flags",
            Operation::UpdateFlag => "Error updating feature flag",
            Operation::FetchOrgs => "Error fetching organizations",
            Operation::FetchDefinitions => "Error fetching flag definitions",
            Operation::Health => "Error checking flag store health",
        }
    }

    pub(crate) fn failure(self) -> &'static str {
        match self {
            Operation::FetchFlags => "Failed to fetch flags",
            Operation::UpdateFlag => "Failed to update flag",
            Operation::FetchOrgs => "Failed to fetch organizations",
            Operation::FetchDefinitions => "Failed to fetch flag definitions",
            Operation::Health => "Health check failed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// No usable response: connection failure or a malformed body.
    #[error("{operation}: {message}")]
    Network { operation: Operation, message: String },
    /// The store answered with a non-success status.
    #[error("{operation}: {message}")]
    Fetch {
        operation: Operation,
        status: u16,
        message: String,
    },
    /// A caller-side precondition was violated; nothing was sent.
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ClientError::Network { operation, .. } | ClientError::Fetch { operation, .. } => {
                Some(*operation)
            }
            ClientError::Validation(_) => None,
        }
    }
}
