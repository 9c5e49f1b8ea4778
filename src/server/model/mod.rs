//! Domain models shared across the engine.

pub mod access;
pub mod app;
pub mod db;
pub mod event;
pub mod export;
pub mod license;
