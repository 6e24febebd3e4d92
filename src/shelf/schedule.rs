//! # Scheduled Tasks
//!
//! Two recurring jobs run beside the request flow:
//!
//! - **Backup**: calls [`BackupJob::backup`] on every configured store.
//! - **Log cycling**: calls [`Logger::cycle_logs`].
//!
//! A failing run is logged once and forgotten. Nothing here returns an error
//! or stops the next run from happening.
//!
//! ## Schedule Syntax
//!
//! | Value | Period |
//! |-------|--------|
//! | `@hourly` | 1 hour |
//! | `@daily`, `@midnight` | 24 hours |
//! | `@weekly` | 7 days |
//! | `@every 90m`, `90m` | 90 minutes (`s`, `m`, `h`, `d` units) |

use crate::error::{Result, ShelfError};
use crate::logging::Logger;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    period: Duration,
}

impl Schedule {
    pub const HOURLY: Schedule = Schedule {
        period: Duration::from_secs(HOUR),
    };
    pub const DAILY: Schedule = Schedule {
        period: Duration::from_secs(DAY),
    };

    /// A zero period is bumped to one second.
    pub fn every(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_secs(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::DAILY
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.period.as_secs();
        if secs % DAY == 0 {
            write!(f, "@every {}d", secs / DAY)
        } else if secs % HOUR == 0 {
            write!(f, "@every {}h", secs / HOUR)
        } else if secs % 60 == 0 {
            write!(f, "@every {}m", secs / 60)
        } else {
            write!(f, "@every {}s", secs)
        }
    }
}

impl FromStr for Schedule {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        let secs = match value.as_str() {
            "@hourly" => HOUR,
            "@daily" | "@midnight" => DAY,
            "@weekly" => 7 * DAY,
            other => {
                let text = other.strip_prefix("@every").unwrap_or(other).trim();
                parse_duration_secs(text)
                    .ok_or_else(|| ShelfError::Config(format!("invalid schedule '{}'", s)))?
            }
        };
        Ok(Schedule::every(Duration::from_secs(secs)))
    }
}

fn parse_duration_secs(text: &str) -> Option<u64> {
    let split = text.find(|c: char| !c.is_ascii_digit())?;
    let (number, unit) = text.split_at(split);
    let n: u64 = number.parse().ok()?;
    let multiplier = match unit.trim() {
        "s" => 1,
        "m" => 60,
        "h" => HOUR,
        "d" => DAY,
        _ => return None,
    };
    match n.checked_mul(multiplier)? {
        0 => None,
        secs => Some(secs),
    }
}

/// Anything that can write a point-in-time copy of itself.
pub trait BackupJob: Send + Sync {
    fn name(&self) -> &str;

    fn backup(&self) -> Result<()>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Back up every job once. Each failure is logged exactly once.
pub fn run_backups(jobs: &[Arc<dyn BackupJob>], logger: &dyn Logger) -> BackupReport {
    let mut report = BackupReport::default();
    for job in jobs {
        match job.backup() {
            Ok(()) => {
                logger.add_log(&format!("Backed up {}", job.name()));
                report.succeeded.push(job.name().to_string());
            }
            Err(e) => {
                logger.add_error_log(&format!("Backup of {} failed: {}", job.name(), e));
                report.failed.push(job.name().to_string());
            }
        }
    }
    report
}

/// Cycle the logs once, logging (not returning) any failure.
pub fn cycle_logs_once(logger: &dyn Logger) -> bool {
    match logger.cycle_logs() {
        Ok(()) => true,
        Err(e) => {
            logger.add_error_log(&format!("Log cycling failed: {}", e));
            false
        }
    }
}

fn ticker(schedule: Schedule) -> time::Interval {
    let period = schedule.period();
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Run the backups every period, starting one period from now.
///
/// Backups do blocking file and database I/O, so each run happens on the
/// blocking pool.
pub fn spawn_backup_task(
    jobs: Vec<Arc<dyn BackupJob>>,
    schedule: Schedule,
    logger: Arc<dyn Logger>,
) -> JoinHandle<()> {
    let jobs: Arc<[Arc<dyn BackupJob>]> = jobs.into();
    tokio::spawn(async move {
        let mut interval = ticker(schedule);
        loop {
            interval.tick().await;
            let run_jobs = Arc::clone(&jobs);
            let run_logger = Arc::clone(&logger);
            let run = tokio::task::spawn_blocking(move || {
                run_backups(&run_jobs, run_logger.as_ref());
            });
            if let Err(e) = run.await {
                logger.add_error_log(&format!("Backup run did not finish: {}", e));
            }
        }
    })
}

pub fn spawn_log_cycle_task(logger: Arc<dyn Logger>, schedule: Schedule) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = ticker(schedule);
        loop {
            interval.tick().await;
            cycle_logs_once(logger.as_ref());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, RequestLog};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        name: String,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingJob {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl BackupJob for CountingJob {
        fn name(&self) -> &str {
            &self.name
        }

        fn backup(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ShelfError::Store("disk full".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct BrokenLogs(MemoryLogger);

    impl Logger for BrokenLogs {
        fn add_log(&self, message: &str) {
            self.0.add_log(message)
        }
        fn add_error_log(&self, message: &str) {
            self.0.add_error_log(message)
        }
        fn add_warning_log(&self, message: &str) {
            self.0.add_warning_log(message)
        }
        fn add_request_log(&self, request: &RequestLog) {
            self.0.add_request_log(request)
        }
        fn cycle_logs(&self) -> Result<()> {
            Err(ShelfError::Store("rename failed".to_string()))
        }
    }

    #[test]
    fn test_parses_named_schedules() {
        assert_eq!("@hourly".parse::<Schedule>().unwrap(), Schedule::HOURLY);
        assert_eq!("@daily".parse::<Schedule>().unwrap(), Schedule::DAILY);
        assert_eq!(
            " @Weekly ".parse::<Schedule>().unwrap().period(),
            Duration::from_secs(7 * DAY)
        );
    }

    #[test]
    fn test_parses_every_forms() {
        assert_eq!(
            "@every 90m".parse::<Schedule>().unwrap().period(),
            Duration::from_secs(90 * 60)
        );
        assert_eq!(
            "30s".parse::<Schedule>().unwrap().period(),
            Duration::from_secs(30)
        );
        assert_eq!("2d".parse::<Schedule>().unwrap().to_string(), "@every 2d");
    }

    #[test]
    fn test_rejects_garbage_and_zero() {
        for bad in ["", "daily", "0h", "@every", "5 weeks", "h5", "-3h"] {
            assert!(bad.parse::<Schedule>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_every_bumps_a_zero_period() {
        assert_eq!(Schedule::every(Duration::ZERO).period(), Duration::from_secs(1));
        assert_eq!(
            Schedule::every(Duration::from_secs(90)).to_string(),
            "@every 90s"
        );
    }

    #[test]
    fn test_failing_backup_is_logged_once_and_others_still_run() {
        let logger = MemoryLogger::new();
        let bad = CountingJob::new("notes", true);
        let good = CountingJob::new("blog_posts", false);
        let jobs: Vec<Arc<dyn BackupJob>> = vec![bad.clone(), good.clone()];

        let report = run_backups(&jobs, &logger);

        assert_eq!(report.failed, vec!["notes"]);
        assert_eq!(report.succeeded, vec!["blog_posts"]);
        assert_eq!(logger.count(LogLevel::Error), 1);
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_log_cycle_is_logged() {
        let logger = BrokenLogs(MemoryLogger::new());
        assert!(!cycle_logs_once(&logger));
        assert_eq!(logger.0.count(LogLevel::Error), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backup_task_keeps_running_after_failures() {
        let logger = Arc::new(MemoryLogger::new());
        let job = CountingJob::new("notes", true);
        let jobs: Vec<Arc<dyn BackupJob>> = vec![job.clone()];
        let handle = spawn_backup_task(jobs, Schedule::DAILY, logger.clone());

        time::sleep(Duration::from_secs(2 * DAY + 1)).await;

        assert_eq!(job.calls.load(Ordering::SeqCst), 2);
        assert_eq!(logger.count(LogLevel::Error), 2);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_backup_task_waits_one_period_before_first_run() {
        let logger = Arc::new(MemoryLogger::new());
        let job = CountingJob::new("notes", false);
        let jobs: Vec<Arc<dyn BackupJob>> = vec![job.clone()];
        let handle = spawn_backup_task(jobs, Schedule::HOURLY, logger);

        time::sleep(Duration::from_secs(HOUR - 1)).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);
        handle.abort();
    }

    struct BlockingJob {
        threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl BackupJob for BlockingJob {
        fn name(&self) -> &str {
            "notes"
        }

        fn backup(&self) -> Result<()> {
            std::thread::sleep(Duration::from_millis(20));
            if let Ok(mut threads) = self.threads.lock() {
                threads.push(std::thread::current().id());
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backups_run_off_the_runtime_thread() {
        let logger = Arc::new(MemoryLogger::new());
        let job = Arc::new(BlockingJob {
            threads: std::sync::Mutex::new(Vec::new()),
        });
        let jobs: Vec<Arc<dyn BackupJob>> = vec![job.clone()];
        let handle = spawn_backup_task(
            jobs,
            Schedule::every(Duration::from_secs(60)),
            logger.clone(),
        );

        time::sleep(Duration::from_secs(3 * 60 + 1)).await;

        let threads = job.threads.lock().unwrap().clone();
        assert_eq!(threads.len(), 3);
        assert!(threads.iter().all(|id| *id != std::thread::current().id()));
        assert_eq!(logger.count(LogLevel::Error), 0);
        assert!(!handle.is_finished());
        handle.abort();
    }
}
