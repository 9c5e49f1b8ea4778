//! Utility functions shared by services and the reconciler.
//!
//! Time helpers convert between stored epoch milliseconds and database timestamps and render
//! the labels carried by lifecycle events. Key helpers generate license keys.

pub mod key;
pub mod time;
