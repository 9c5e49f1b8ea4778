//! License engine core modules.
//!
//! This module contains the license lifecycle engine behind the Licensy guild bot: persistence
//! of licenses, templates, bans, premium grants and history, the state machine and stock
//! allocator that mutate them, the guild platform client used for roles and direct messages,
//! and the background reconciler that retires expired records.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod data;
pub mod discord;
pub mod error;
pub mod event;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod startup;
pub mod util;
