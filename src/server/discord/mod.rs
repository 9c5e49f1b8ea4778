//! Guild platform access.
//!
//! The engine only talks to the platform through [`GuildGateway`]: resolving guilds and
//! members, granting and removing roles, and sending direct messages. [`DiscordClient`] is the
//! REST implementation used by the daemon; tests run it against a mock server.

pub mod best_effort;
pub mod client;
pub mod dto;

use async_trait::async_trait;

use crate::server::error::external::ExternalError;

pub use client::DiscordClient;

/// A guild the bot can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: i64,
    pub name: String,
}

/// A member of a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub guild_id: i64,
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<i64>,
}

impl Member {
    pub fn has_role(&self, role_id: i64) -> bool {
        self.roles.contains(&role_id)
    }
}

/// Operations the engine needs from the guild platform.
///
/// Lookups resolve a missing guild or member to `Ok(None)`; every other failure is an
/// [`ExternalError`].
#[async_trait]
pub trait GuildGateway: Send + Sync {
    async fn fetch_guild(&self, guild_id: i64) -> Result<Option<Guild>, ExternalError>;

    async fn fetch_member(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> Result<Option<Member>, ExternalError>;

    /// Grants a role, `reason` is recorded in the guild's audit log
    async fn add_role(
        &self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        reason: &str,
    ) -> Result<(), ExternalError>;

    /// Removes a role, `reason` is recorded in the guild's audit log
    async fn remove_role(
        &self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        reason: &str,
    ) -> Result<(), ExternalError>;

    async fn send_direct_message(&self, user_id: i64, content: &str) -> Result<(), ExternalError>;
}
