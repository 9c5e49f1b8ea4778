//! Platform side effects that must never fail the surrounding operation.
//!
//! Failures are logged at `warn` and reported as `false`.

use crate::server::discord::GuildGateway;

/// Sends a direct message, returning whether it was delivered.
pub async fn notify_member(gateway: &dyn GuildGateway, user_id: i64, content: &str) -> bool {
    match gateway.send_direct_message(user_id, content).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Failed to deliver direct message");
            false
        }
    }
}

/// Removes a role from a member, returning whether the platform accepted the removal.
pub async fn revoke_role(
    gateway: &dyn GuildGateway,
    guild_id: i64,
    user_id: i64,
    role_id: i64,
    reason: &str,
) -> bool {
    match gateway.remove_role(guild_id, user_id, role_id, reason).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(guild_id, user_id, role_id, error = %e, "Failed to remove role");
            false
        }
    }
}
