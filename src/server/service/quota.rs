use sea_orm::ConnectionTrait;

use crate::server::{
    config::limits::{
        MAX_LICENSES, MAX_LICENSES_PER_COMMAND, MAX_LICENSES_PER_COMMAND_PREMIUM,
        MAX_LICENSES_PREMIUM,
    },
    data::{license::LicenseRepository, premium::PremiumRepository},
    error::{
        license::{LicenseError, QuotaViolation},
        Error,
    },
};

/// License ceilings that apply to a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    /// Licenses the guild may hold in total
    pub max_licenses: u64,
    /// Licenses a single create or generate call may mint
    pub max_per_command: u64,
}

impl QuotaLimits {
    pub fn for_tier(premium: bool) -> Self {
        if premium {
            Self {
                max_licenses: MAX_LICENSES_PREMIUM,
                max_per_command: MAX_LICENSES_PER_COMMAND_PREMIUM,
            }
        } else {
            Self {
                max_licenses: MAX_LICENSES,
                max_per_command: MAX_LICENSES_PER_COMMAND,
            }
        }
    }
}

pub struct QuotaService<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> QuotaService<'a, C> {
    /// Creates a new instance of [`QuotaService`]
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Ceilings for the guild, raised while any premium grant in it is unexpired
    pub async fn limits(&self, guild_id: i64, now_ms: i64) -> Result<QuotaLimits, Error> {
        let premium = PremiumRepository::new(self.db)
            .has_active(guild_id, now_ms)
            .await?;

        Ok(QuotaLimits::for_tier(premium))
    }

    /// Checks that `amount` more licenses fit both ceilings
    ///
    /// The guild ceiling is read-then-check without a conditional write, so concurrent callers
    /// can together overshoot it slightly. Template stock is the only strict bound.
    pub async fn check(&self, guild_id: i64, amount: u64, now_ms: i64) -> Result<(), Error> {
        let limits = self.limits(guild_id, now_ms).await?;

        if amount > limits.max_per_command {
            return Err(LicenseError::QuotaExceeded(QuotaViolation::PerCommand {
                limit: limits.max_per_command,
                requested: amount,
            })
            .into());
        }

        let current = LicenseRepository::new(self.db)
            .count_by_guild(guild_id)
            .await?;

        if current + amount > limits.max_licenses {
            return Err(LicenseError::QuotaExceeded(QuotaViolation::GuildCeiling {
                limit: limits.max_licenses,
                current,
                requested: amount,
            })
            .into());
        }

        Ok(())
    }
}
