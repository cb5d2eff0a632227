use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Local, NaiveTime, TimeZone};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::updater::Updater;

/// Fires the [`Updater`] once per day at a configured local wall-clock
/// time. Exits cleanly when `cancel` fires; does not retry within a day
/// on failure - the next tick is the next retry.
pub struct Scheduler {
    updater: Arc<Updater>,
    hour: u32,
    minute: u32,
}

impl Scheduler {
    pub fn new(updater: Arc<Updater>, hour: u32, minute: u32) -> Self {
        Self { updater, hour, minute }
    }

    /// Runs the daily fire loop until `cancel` fires. Returns an error
    /// up front if `hour`/`minute` don't name a real wall-clock time,
    /// rather than panicking once inside the loop.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut next = self.next_fire_after(Local::now())?;
        log::debug!("[ scheduler.run ] next schedule time {next}");

        loop {
            let now = Local::now();
            let sleep_for = (next - now).to_std().unwrap_or(StdDuration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {
                    log::debug!("[ scheduler.run ] update by scheduler");
                    if let Err(err) = self.updater.update(&cancel).await {
                        log::error!("[ scheduler.run ] scheduled update error: {err:?}");
                    }

                    next += Duration::hours(24);
                    log::debug!("[ scheduler.run ] next schedule time {next}");
                }
                _ = cancel.cancelled() => {
                    log::debug!("[ scheduler.run ] scheduler stopped");
                    return Ok(());
                }
            }
        }
    }

    fn next_fire_after(&self, now: chrono::DateTime<Local>) -> Result<chrono::DateTime<Local>> {
        let target_time = NaiveTime::from_hms_opt(self.hour, self.minute, 0).ok_or_else(|| {
            Error::internal(format!(
                "invalid scheduler time {}:{:02}",
                self.hour, self.minute
            ))
        })?;

        let mut next = Local
            .from_local_datetime(&now.date_naive().and_time(target_time))
            .single()
            .unwrap_or(now);

        if now > next {
            next += Duration::hours(24);
        }

        Ok(next)
    }
}
