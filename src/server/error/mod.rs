//! Error types for the license engine.
//!
//! Each domain has its own `thiserror` enum (configuration, license lifecycle and allocation,
//! template management, bans and premium, the guild platform). [`Error`] aggregates them with
//! the external library errors so `?` works across layers, and renders caller-facing messages
//! through [`Error::user_message`].

pub mod access;
pub mod config;
pub mod external;
pub mod license;
pub mod retry;
pub mod template;

use thiserror::Error;

use crate::server::error::{
    access::AccessError,
    config::ConfigError,
    external::ExternalError,
    license::{LicenseError, QuotaViolation},
    template::TemplateError,
};

/// Main error type for the license engine.
///
/// # Error Categories
/// - Configuration errors (missing/invalid environment variables)
/// - License errors (state machine, stock allocation, quota ceilings)
/// - Template errors (name, duration, and stock validation)
/// - Access errors (bans and premium grants)
/// - External errors (guild platform failures)
/// - External library errors (database, scheduler, export encoders)
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid environment variables).
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    /// License lifecycle or allocation error.
    #[error(transparent)]
    LicenseError(#[from] LicenseError),
    /// Template management error.
    #[error(transparent)]
    TemplateError(#[from] TemplateError),
    /// Ban or premium management error.
    #[error(transparent)]
    AccessError(#[from] AccessError),
    /// Guild platform error (missing resources, permissions, rate limits).
    #[error(transparent)]
    ExternalError(#[from] ExternalError),
    /// Parse error (failed to parse a value from string or other format).
    #[error("Failed to parse value: {0:?}")]
    ParseError(String),
    /// Internal error indicating a bug in the engine.
    #[error("Internal error in the license engine, this indicates a bug: {0:?}")]
    InternalError(String),
    /// Database error (query failures, connection issues, constraint violations).
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    /// Cron scheduler error (job registration, scheduler startup).
    #[error(transparent)]
    SchedulerError(#[from] tokio_cron_scheduler::JobSchedulerError),
    /// JSON export encoding error.
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    /// CSV export encoding error.
    #[error(transparent)]
    CsvError(#[from] csv::Error),
}

impl Error {
    /// Render the error as an actionable message for the user who invoked the operation.
    ///
    /// Expected outcomes under load (stock conflicts, insufficient stock, quota ceilings) and
    /// platform permission failures get explicit messages. Infrastructure failures are logged
    /// and replaced with a generic message so implementation details never leak.
    pub fn user_message(&self) -> String {
        match self {
            Self::LicenseError(LicenseError::StockConflict(name)) => format!(
                "Another request generated licenses from template `{}` at the same time. \
                 Nothing was created, please try again.",
                name
            ),
            Self::LicenseError(LicenseError::InsufficientStock {
                name,
                remaining,
                requested,
            }) => format!(
                "Template `{}` only has {} license(s) left but {} were requested. \
                 Request {} or fewer, or add stock to the template.",
                name, remaining, requested, remaining
            ),
            Self::LicenseError(LicenseError::StockExhausted(name)) => format!(
                "Template `{}` has no stock left. Add stock to the template to generate more licenses.",
                name
            ),
            Self::LicenseError(LicenseError::QuotaExceeded(violation)) => match violation {
                QuotaViolation::GuildCeiling {
                    limit,
                    current,
                    requested,
                } => format!(
                    "You can only have {} licenses.\n\nYou have {} licenses and tried to create {}, \
                     you can create {} more for now.",
                    limit,
                    current,
                    requested,
                    limit.saturating_sub(*current)
                ),
                QuotaViolation::PerCommand { limit, requested } => format!(
                    "You can only create {} licenses at once, {} were requested.",
                    limit, requested
                ),
            },
            Self::ExternalError(ExternalError::PermissionDenied { capability }) => format!(
                "I am missing the `{}` permission, or the role is above my highest role.",
                capability
            ),
            Self::ExternalError(ExternalError::Transient(_)) => {
                "Discord is not responding right now, please try again shortly.".to_string()
            }
            Self::LicenseError(_)
            | Self::TemplateError(_)
            | Self::AccessError(_)
            | Self::ExternalError(_) => self.to_string(),
            err => {
                tracing::error!("{}", err);
                "Something went wrong, please try again later.".to_string()
            }
        }
    }
}
