use thiserror::Error;

use crate::server::model::license::LicenseState;

/// Quota ceiling a create or generate request would break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaViolation {
    /// The guild would hold more than `limit` licenses.
    GuildCeiling {
        limit: u64,
        current: u64,
        requested: u64,
    },
    /// A single call asked for more than `limit` licenses.
    PerCommand { limit: u64, requested: u64 },
}

impl std::fmt::Display for QuotaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GuildCeiling {
                limit,
                current,
                requested,
            } => write!(
                f,
                "guild holds {} of {} licenses, {} more requested",
                current, limit, requested
            ),
            Self::PerCommand { limit, requested } => write!(
                f,
                "{} licenses requested, at most {} per command",
                requested, limit
            ),
        }
    }
}

/// License lifecycle and allocation errors.
#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("License `{key}` not found in guild {guild_id}")]
    NotFound { guild_id: i64, key: String },
    #[error("License key `{0}` already exists in this guild")]
    DuplicateKey(String),
    #[error("License `{key}` cannot be {operation} while {state}")]
    InvalidState {
        key: String,
        operation: &'static str,
        state: LicenseState,
    },
    #[error("License `{0}` has already been redeemed")]
    AlreadyRedeemed(String),
    #[error("Template `{0}` has no stock remaining")]
    StockExhausted(String),
    #[error("Template `{name}` has {remaining} license(s) left, {requested} requested")]
    InsufficientStock {
        name: String,
        remaining: u64,
        requested: u64,
    },
    #[error("Template `{0}` was changed by a concurrent request")]
    StockConflict(String),
    #[error("License quota exceeded: {0}")]
    QuotaExceeded(QuotaViolation),
    #[error("Duration must be greater than zero, got {0}ms")]
    InvalidDuration(i64),
    #[error("Amount {0} is not a valid number of licenses")]
    InvalidAmount(u64),
    #[error("Nothing to update for license `{0}`")]
    NothingToUpdate(String),
    #[error("There are no license keys available to export")]
    NothingToExport,
}
