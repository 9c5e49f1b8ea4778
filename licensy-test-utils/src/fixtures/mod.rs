//! Fixture utilities for database records and mock HTTP endpoints.
//!
//! - `ban` - License ban records
//! - `discord` - Guild platform REST endpoints (guilds, members, roles, direct messages)
//! - `license` - License and license history records
//! - `manager` - License manager role records
//! - `premium` - Premium grant records
//! - `template` - License template records

pub mod ban;
pub mod discord;
pub mod license;
pub mod manager;
pub mod premium;
pub mod template;
