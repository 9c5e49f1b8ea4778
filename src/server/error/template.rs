use thiserror::Error;

use crate::server::config::limits::MAX_TEMPLATE_NAME_LENGTH;

/// Template management errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template `{0}` not found")]
    NotFound(String),
    #[error("Template name cannot be empty")]
    NameEmpty,
    #[error("Template name cannot be longer than {} characters", MAX_TEMPLATE_NAME_LENGTH)]
    NameTooLong,
    #[error("A template named `{0}` already exists")]
    NameTaken(String),
    #[error("Template duration must be greater than zero, got {0}ms")]
    InvalidDuration(i64),
    #[error("Template stock must be greater than zero, got {0}")]
    InvalidStock(i32),
    #[error("Stock cannot be set to {stock}, {generated} licenses were already generated")]
    StockBelowGenerated { stock: i32, generated: i32 },
    #[error("Template `{0}` has unlimited stock")]
    UnlimitedStock(String),
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(i32),
    #[error("Nothing to update for template `{0}`")]
    NothingToUpdate(String),
}
