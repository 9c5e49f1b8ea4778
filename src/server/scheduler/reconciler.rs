use std::sync::Arc;

use tokio::sync::Mutex;

use crate::server::{
    model::app::AppState,
    scheduler::{
        ban::BanExpirySweep,
        cooldown::CooldownExpirySweep,
        license::LicenseExpirySweep,
        premium::PremiumExpirySweep,
        sweep::{ExpirySweep, SweepReport},
    },
    util::time::now_ms,
};

/// Reports of every sweep that ran in one tick, in run order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub sweeps: Vec<(&'static str, SweepReport)>,
}

impl TickReport {
    pub fn get(&self, name: &str) -> Option<SweepReport> {
        self.sweeps
            .iter()
            .find(|(sweep, _)| *sweep == name)
            .map(|(_, report)| *report)
    }
}

/// Runs every registered sweep, one after another, on each tick.
///
/// Ticks never overlap: a tick that starts while the previous one is still running is skipped.
#[derive(Clone)]
pub struct Reconciler {
    sweeps: Arc<Vec<Arc<dyn ExpirySweep>>>,
    running: Arc<Mutex<()>>,
}

impl Reconciler {
    pub fn new(sweeps: Vec<Arc<dyn ExpirySweep>>) -> Self {
        Self {
            sweeps: Arc::new(sweeps),
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Reconciler over licenses, premium grants, bans, and cooldowns, in that order
    pub fn from_state(state: &AppState) -> Self {
        Self::new(vec![
            Arc::new(LicenseExpirySweep::new(
                state.db.clone(),
                state.discord.clone(),
                state.events.clone(),
            )),
            Arc::new(PremiumExpirySweep::new(
                state.db.clone(),
                state.discord.clone(),
            )),
            Arc::new(BanExpirySweep::new(state.db.clone())),
            Arc::new(CooldownExpirySweep::new(state.cooldowns.clone())),
        ])
    }

    pub async fn tick(&self) -> Option<TickReport> {
        self.tick_at(now_ms()).await
    }

    /// Runs one tick as of `now_ms`, returning `None` when the previous tick is still running
    pub async fn tick_at(&self, now_ms: i64) -> Option<TickReport> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::debug!("Previous reconciler tick still running, skipping");
            return None;
        };

        let mut tick = TickReport::default();

        for sweep in self.sweeps.iter() {
            match sweep.sweep(now_ms).await {
                Ok(report) => {
                    if report.examined > 0 {
                        tracing::info!(
                            sweep = sweep.name(),
                            examined = report.examined,
                            retired = report.retired,
                            orphaned = report.orphaned,
                            failed = report.failed,
                            "Sweep finished"
                        );
                    }
                    tick.sweeps.push((sweep.name(), report));
                }
                Err(e) => {
                    tracing::error!(sweep = sweep.name(), error = %e, "Sweep failed");
                }
            }
        }

        Some(tick)
    }
}
