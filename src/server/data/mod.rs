//! Data access layer repositories.
//!
//! Repositories are generic over [`sea_orm::ConnectionTrait`] so the same code runs against a
//! pooled connection or inside a transaction. Every state transition on a license row is a
//! single guarded statement; callers read `rows_affected` to learn whether it applied.

pub mod ban;
pub mod history;
pub mod license;
pub mod manager;
pub mod premium;
pub mod template;
