//! Identifiers and credentials shared across tests.
//!
//! None of these values are real platform identifiers or credentials.

/// Bot token sent in the `Authorization` header of mocked platform requests.
pub static TEST_BOT_TOKEN: &str = "test_bot_token";

/// Guild every fixture is created in unless a test overrides it.
pub const TEST_GUILD_ID: i64 = 100_000_000_000_000_001;

/// Role granted by fixture licenses and templates.
pub const TEST_ROLE_ID: i64 = 200_000_000_000_000_001;

/// User that created fixture licenses and templates.
pub const TEST_AUTHOR_ID: i64 = 300_000_000_000_000_001;

/// User that redeems fixture licenses.
pub const TEST_REDEEMER_ID: i64 = 300_000_000_000_000_002;

/// Direct message channel returned by the mocked channel creation endpoint.
pub const TEST_DM_CHANNEL_ID: i64 = 400_000_000_000_000_001;
