//! Guild platform HTTP mock endpoint creation utilities.
//!
//! Endpoints mirror the platform REST API paths used by the main crate's client. Missing
//! resources answer with the platform's JSON error body so error classification can be
//! exercised end to end.

use mockito::Mock;
use serde_json::json;

use crate::{constant::TEST_DM_CHANNEL_ID, TestContext};

/// Platform error code for an unknown guild.
pub const UNKNOWN_GUILD: i64 = 10004;
/// Platform error code for an unknown member.
pub const UNKNOWN_MEMBER: i64 = 10007;
/// Platform error code for an unknown role.
pub const UNKNOWN_ROLE: i64 = 10011;
/// Platform error code for a bot lacking permissions.
pub const MISSING_PERMISSIONS: i64 = 50013;
/// Platform error code for a user that does not accept direct messages.
pub const CANNOT_SEND_DM: i64 = 50007;

impl TestContext {
    pub fn discord<'a>(&'a mut self) -> DiscordFixtures<'a> {
        DiscordFixtures { setup: self }
    }
}

pub struct DiscordFixtures<'a> {
    setup: &'a mut TestContext,
}

impl<'a> DiscordFixtures<'a> {
    /// Create a mock GET endpoint at `/guilds/{guild_id}`.
    ///
    /// # Arguments
    /// - `guild_id` - Guild ID for the endpoint path
    /// - `exists` - Whether to answer with the guild or an unknown guild error
    /// - `expected_requests` - Number of times this endpoint should be called
    pub fn create_guild_endpoint(
        &mut self,
        guild_id: i64,
        exists: bool,
        expected_requests: usize,
    ) -> Mock {
        let url = format!("/guilds/{}", guild_id);

        let (status, body) = if exists {
            (200, json!({ "id": guild_id.to_string(), "name": "Test Guild" }))
        } else {
            (404, error_body(UNKNOWN_GUILD, "Unknown Guild"))
        };

        self.setup
            .server
            .mock("GET", url.as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(expected_requests)
            .create()
    }

    /// Create a mock GET endpoint at `/guilds/{guild_id}/members/{user_id}`.
    pub fn create_member_endpoint(
        &mut self,
        guild_id: i64,
        user_id: i64,
        exists: bool,
        expected_requests: usize,
    ) -> Mock {
        let url = format!("/guilds/{}/members/{}", guild_id, user_id);

        let (status, body) = if exists {
            (
                200,
                json!({
                    "user": { "id": user_id.to_string(), "username": "test_member" },
                    "roles": [],
                }),
            )
        } else {
            (404, error_body(UNKNOWN_MEMBER, "Unknown Member"))
        };

        self.setup
            .server
            .mock("GET", url.as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(expected_requests)
            .create()
    }

    /// Create a mock PUT endpoint granting `role_id` to a member.
    pub fn create_role_grant_endpoint(
        &mut self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        expected_requests: usize,
    ) -> Mock {
        let url = format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id);

        self.setup
            .server
            .mock("PUT", url.as_str())
            .with_status(204)
            .expect(expected_requests)
            .create()
    }

    /// Create a mock DELETE endpoint removing `role_id` from a member.
    pub fn create_role_revoke_endpoint(
        &mut self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        expected_requests: usize,
    ) -> Mock {
        let url = format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id);

        self.setup
            .server
            .mock("DELETE", url.as_str())
            .with_status(204)
            .expect(expected_requests)
            .create()
    }

    /// Create a role endpoint that fails with the given platform error.
    ///
    /// # Arguments
    /// - `method` - `PUT` for grants, `DELETE` for removals
    /// - `status` - HTTP status to answer with
    /// - `code` - Platform JSON error code
    pub fn create_role_error_endpoint(
        &mut self,
        method: &str,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        status: usize,
        code: i64,
        expected_requests: usize,
    ) -> Mock {
        let url = format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id);

        self.setup
            .server
            .mock(method, url.as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body(code, "Request failed").to_string())
            .expect(expected_requests)
            .create()
    }

    /// Create the DM channel creation and message send endpoints.
    ///
    /// Returns both mocks, each expected `expected_requests` times.
    pub fn create_direct_message_endpoints(&mut self, expected_requests: usize) -> Vec<Mock> {
        let channel = self
            .setup
            .server
            .mock("POST", "/users/@me/channels")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "id": TEST_DM_CHANNEL_ID.to_string() }).to_string())
            .expect(expected_requests)
            .create();

        let message_url = format!("/channels/{}/messages", TEST_DM_CHANNEL_ID);
        let message = self
            .setup
            .server
            .mock("POST", message_url.as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "id": "1" }).to_string())
            .expect(expected_requests)
            .create();

        vec![channel, message]
    }

    /// Create DM endpoints that reject delivery as if the user blocked direct messages.
    pub fn create_closed_direct_message_endpoints(&mut self, expected_requests: usize) -> Vec<Mock> {
        let message_url = format!("/channels/{}/messages", TEST_DM_CHANNEL_ID);

        let channel = self
            .setup
            .server
            .mock("POST", "/users/@me/channels")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "id": TEST_DM_CHANNEL_ID.to_string() }).to_string())
            .expect(expected_requests)
            .create();

        let message = self
            .setup
            .server
            .mock("POST", message_url.as_str())
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(error_body(CANNOT_SEND_DM, "Cannot send messages to this user").to_string())
            .expect(expected_requests)
            .create();

        vec![channel, message]
    }
}

fn error_body(code: i64, message: &str) -> serde_json::Value {
    json!({ "code": code, "message": message })
}
