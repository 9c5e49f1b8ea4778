use sea_orm::DbErr;

use super::{external::ExternalError, license::LicenseError, Error};

/// Strategy a caller should apply to a failed engine operation.
///
/// The engine itself never retries; this only tells callers which failures are safe to
/// resubmit from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRetryStrategy {
    /// Safe to resubmit the whole operation
    Retry,
    /// Failed permanently
    Fail,
}

impl Error {
    /// Determine error retry strategy based upon application Error type
    pub fn to_retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            // Lost the template compare-and-swap, a fresh snapshot may succeed
            Self::LicenseError(LicenseError::StockConflict(_)) => ErrorRetryStrategy::Retry,
            Self::LicenseError(_) => ErrorRetryStrategy::Fail,

            // Network errors and rate limits
            Self::ExternalError(ExternalError::Transient(_)) => ErrorRetryStrategy::Retry,
            Self::ExternalError(_) => ErrorRetryStrategy::Fail,

            Self::DbErr(db_err) => match db_err {
                // Connection errors - transient, should retry
                DbErr::ConnectionAcquire(_) => ErrorRetryStrategy::Retry,
                DbErr::Conn(_) => ErrorRetryStrategy::Retry,

                // Query, constraint, and conversion errors won't resolve with retry
                _ => ErrorRetryStrategy::Fail,
            },

            Self::ConfigError(_) => ErrorRetryStrategy::Fail,
            Self::TemplateError(_) => ErrorRetryStrategy::Fail,
            Self::AccessError(_) => ErrorRetryStrategy::Fail,
            Self::ParseError(_) => ErrorRetryStrategy::Fail,
            Self::InternalError(_) => ErrorRetryStrategy::Fail,
            Self::SchedulerError(_) => ErrorRetryStrategy::Fail,
            Self::JsonError(_) | Self::CsvError(_) => ErrorRetryStrategy::Fail,
        }
    }
}
