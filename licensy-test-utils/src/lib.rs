//! Test utilities shared by unit and integration tests.
//!
//! Tests are set up in two phases: a [`TestBuilder`] declares the tables, fixtures, and mock
//! guild platform endpoints a test needs, then `build()` returns a [`TestContext`] holding an
//! in-memory SQLite database and a mockito server standing in for the platform REST API.

pub mod builder;
pub mod constant;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod model;

pub use builder::TestBuilder;
pub use context::TestContext;
pub use error::TestError;

pub mod prelude {
    pub use crate::{
        constant::{
            TEST_AUTHOR_ID, TEST_BOT_TOKEN, TEST_DM_CHANNEL_ID, TEST_GUILD_ID, TEST_REDEEMER_ID,
            TEST_ROLE_ID,
        },
        fixtures::template::TEST_TEMPLATE_DURATION_MS,
        TestBuilder, TestContext, TestError,
    };
}
