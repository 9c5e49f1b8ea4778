//! Service layer for the license engine.
//!
//! Services own the business rules and coordinate repositories, the guild platform, and event
//! delivery. Each is a short-lived borrow of shared state built per operation, the way
//! [`crate::server::model::app::AppState`] hands them out.

pub mod allocator;
pub mod ban;
pub mod cooldown;
pub mod gate;
pub mod license;
pub mod manager;
pub mod premium;
pub mod quota;
pub mod template;
