//! Background reconciliation of expiring records.
//!
//! A single repeated job drives the [`Reconciler`], which runs one [`ExpirySweep`] per
//! time-indexed collection (licenses, premium grants, bans, cooldowns) sequentially within a
//! tick.

use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::server::error::Error;

pub mod ban;
pub mod cooldown;
pub mod license;
pub mod premium;
pub mod reconciler;
pub mod sweep;

pub use reconciler::Reconciler;
pub use sweep::{ExpirySweep, SweepReport};

/// Job scheduler driving the expiration reconciler.
pub struct Scheduler {
    reconciler: Reconciler,
    sched: JobScheduler,
}

impl Scheduler {
    /// Creates a new instance of [`Scheduler`].
    ///
    /// # Returns
    /// - `Ok(Scheduler)` - Successfully created scheduler instance
    /// - `Err(Error)` - Failed to initialize the underlying job scheduler
    pub async fn new(reconciler: Reconciler) -> Result<Self, Error> {
        let sched = JobScheduler::new().await?;
        Ok(Self { reconciler, sched })
    }

    /// Registers the reconciler job and starts the scheduler.
    ///
    /// # Arguments
    /// - `interval` - Time between reconciler ticks
    ///
    /// # Returns
    /// - `Ok(JobScheduler)` - Handle of the running scheduler, used to shut it down
    /// - `Err(Error)` - Failed to register the job or start the scheduler
    pub async fn start(mut self, interval: Duration) -> Result<JobScheduler, Error> {
        self.schedule_reconciler(interval).await?;

        self.sched.start().await?;

        tracing::info!(interval_secs = interval.as_secs(), "Started expiration reconciler");

        Ok(self.sched)
    }

    async fn schedule_reconciler(&mut self, interval: Duration) -> Result<(), Error> {
        let reconciler = self.reconciler.clone();

        self.sched
            .add(Job::new_repeated_async(interval, move |_, _| {
                let reconciler = reconciler.clone();

                Box::pin(async move {
                    match reconciler.tick().await {
                        Some(tick) => tracing::debug!("Reconciler ran {} sweep(s)", tick.sweeps.len()),
                        None => tracing::debug!("Reconciler tick skipped"),
                    }
                })
            })?)
            .await?;

        Ok(())
    }
}
