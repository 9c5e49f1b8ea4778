use sea_orm::DatabaseConnection;

use crate::server::{
    error::Error,
    model::access::{CommandScope, GateDecision},
    service::{
        ban::BanService,
        cooldown::{CooldownCache, CooldownKey},
    },
    util::time::expiry_label,
};

/// A command invocation to admit or reject.
#[derive(Debug, Clone, Copy)]
pub struct CommandCall {
    pub guild_id: i64,
    pub user_id: i64,
    pub command: &'static str,
    pub scope: CommandScope,
    /// Cooldown applied per user, `0` for none
    pub cooldown_ms: i64,
}

/// Admits command invocations based on license bans and per-user cooldowns.
///
/// Bans are checked first for ban-gated scopes, lapsed bans are purged when observed. An
/// admitted call starts its cooldown.
pub struct AccessGate<'a> {
    db: &'a DatabaseConnection,
    cooldowns: &'a CooldownCache,
}

impl<'a> AccessGate<'a> {
    /// Creates a new instance of [`AccessGate`]
    pub fn new(db: &'a DatabaseConnection, cooldowns: &'a CooldownCache) -> Self {
        Self { db, cooldowns }
    }

    pub async fn check(&self, call: CommandCall, now_ms: i64) -> Result<GateDecision, Error> {
        if call.scope.is_ban_gated() {
            let ban = BanService::new(self.db)
                .active_ban(call.guild_id, call.user_id, now_ms)
                .await?;

            if let Some(ban) = ban {
                let until = ban
                    .expires_at
                    .map(|expires_at| format!(" until {}", expiry_label(expires_at)))
                    .unwrap_or_default();
                let reason = ban
                    .reason
                    .map(|reason| format!("\nReason: {}", reason.chars().take(300).collect::<String>()))
                    .unwrap_or_default();

                return Ok(GateDecision::Deny {
                    reason: format!(
                        "You are banned from executing license commands{}{}.",
                        until, reason
                    ),
                });
            }
        }

        if call.cooldown_ms > 0 {
            let key = CooldownKey {
                guild_id: call.guild_id,
                subject_id: call.user_id,
                command: call.command,
            };

            if let Some(remaining) = self.cooldowns.remaining(&key, now_ms) {
                let seconds = (remaining + 999) / 1000;

                return Ok(GateDecision::Deny {
                    reason: format!(
                        "Please wait **{} second(s)** before reusing this command!",
                        seconds
                    ),
                });
            }

            self.cooldowns.start(key, now_ms, call.cooldown_ms);
        }

        Ok(GateDecision::Allow)
    }
}
