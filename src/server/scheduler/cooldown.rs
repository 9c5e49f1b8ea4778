use async_trait::async_trait;

use crate::server::{
    error::Error,
    scheduler::sweep::{ExpirySweep, SweepReport},
    service::cooldown::CooldownCache,
};

/// Drops lapsed command cooldowns from the in-process cache.
pub struct CooldownExpirySweep {
    cooldowns: CooldownCache,
}

impl CooldownExpirySweep {
    pub fn new(cooldowns: CooldownCache) -> Self {
        Self { cooldowns }
    }
}

#[async_trait]
impl ExpirySweep for CooldownExpirySweep {
    fn name(&self) -> &'static str {
        "cooldowns"
    }

    async fn sweep(&self, now_ms: i64) -> Result<SweepReport, Error> {
        let removed = self.cooldowns.purge_expired(now_ms);

        Ok(SweepReport {
            examined: removed,
            retired: removed,
            ..Default::default()
        })
    }
}
