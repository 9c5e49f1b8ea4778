use thiserror::Error;

/// Ban, premium, and license manager errors.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("User {0} is already banned from license commands")]
    AlreadyBanned(i64),
    #[error("User {0} is not banned from license commands")]
    BanNotFound(i64),
    #[error("User {0} already has premium in this guild")]
    PremiumExists(i64),
    #[error("User {0} does not have premium in this guild")]
    PremiumNotFound(i64),
    #[error("Duration must be greater than zero, got {0}ms")]
    InvalidDuration(i64),
    #[error("The role <@&{0}> is already allowed to manage licenses")]
    ManagerExists(i64),
    #[error("The role <@&{0}> is not configured to manage licenses")]
    ManagerNotFound(i64),
}
