use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::server::{
    data::ban::BanRepository,
    error::Error,
    scheduler::sweep::{ExpirySweep, SweepReport},
};

/// Deletes lapsed license bans. Permanent bans are never swept.
pub struct BanExpirySweep {
    db: DatabaseConnection,
}

impl BanExpirySweep {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpirySweep for BanExpirySweep {
    fn name(&self) -> &'static str {
        "bans"
    }

    async fn sweep(&self, now_ms: i64) -> Result<SweepReport, Error> {
        let result = BanRepository::new(&self.db).delete_inert(now_ms).await?;
        let removed = result.rows_affected as usize;

        Ok(SweepReport {
            examined: removed,
            retired: removed,
            ..Default::default()
        })
    }
}
