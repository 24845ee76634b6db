//! Session counters and the periodic progress reporter
//!
//! Counters are updated concurrently by task processors and read by the
//! reporter, so every field is atomic. Counts are informational: the
//! frontier stays the source of truth.

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Live counters for one crawler session
#[derive(Debug)]
pub struct SessionStats {
    started: Mutex<Instant>,
    parsed: AtomicU64,
    todo: AtomicI64,
    done: AtomicI64,
    trash: AtomicI64,
}

impl SessionStats {
    /// Creates counters seeded with the current partition sizes
    pub fn new(todo: i64, done: i64, trash: i64) -> Self {
        Self {
            started: Mutex::new(Instant::now()),
            parsed: AtomicU64::new(0),
            todo: AtomicI64::new(todo),
            done: AtomicI64::new(done),
            trash: AtomicI64::new(trash),
        }
    }

    /// Resets the parse rate for a new run
    pub fn begin_run(&self) {
        *self.started.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
        self.parsed.store(0, Ordering::Relaxed);
    }

    pub fn record_parsed(&self) {
        self.parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_todo(&self, n: i64) {
        self.todo.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set_todo(&self, n: i64) {
        self.todo.store(n, Ordering::Relaxed);
    }

    /// A todo URL reached the done partition
    pub fn record_done(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        self.todo.fetch_sub(1, Ordering::Relaxed);
    }

    /// A todo URL reached the trash partition
    pub fn record_trash(&self) {
        self.trash.fetch_add(1, Ordering::Relaxed);
        self.todo.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn parsed(&self) -> u64 {
        self.parsed.load(Ordering::Relaxed)
    }

    pub fn todo(&self) -> i64 {
        self.todo.load(Ordering::Relaxed)
    }

    pub fn done(&self) -> i64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn trash(&self) -> i64 {
        self.trash.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let parsed = self.parsed();
        let seconds = self.elapsed().as_secs_f64();
        let rate = if seconds > 0.0 {
            round_half_away_from_zero(parsed as f64 / seconds)
        } else {
            0
        };

        StatsSnapshot {
            parsed,
            rate,
            todo: self.todo(),
            done: self.done(),
            trash: self.trash(),
        }
    }
}

/// Point-in-time view of the session counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub parsed: u64,
    /// Pages parsed per second since the run started
    pub rate: i64,
    pub todo: i64,
    pub done: i64,
    pub trash: i64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} parsed ({}/s), {} todo, {} done, {} trashed",
            format_thousands(self.parsed as i64),
            format_thousands(self.rate),
            format_thousands(self.todo),
            format_thousands(self.done),
            format_thousands(self.trash)
        )
    }
}

/// Formats an integer with `,` every three digits
///
/// # Example
///
/// ```
/// use crawlbox::crawler::format_thousands;
///
/// assert_eq!(format_thousands(1234567), "1,234,567");
/// assert_eq!(format_thousands(-1234), "-1,234");
/// assert_eq!(format_thousands(999), "999");
/// ```
pub fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Rounds to the nearest integer, halves away from zero
///
/// Values with magnitude below 0.5 round to 0. Non-finite input yields 0.
pub fn round_half_away_from_zero(x: f64) -> i64 {
    if !x.is_finite() || x.abs() < 0.5 {
        return 0;
    }
    x.round() as i64
}

/// Logs a stats line every `interval` until the todo counter reaches zero
pub fn spawn_reporter(stats: Arc<SessionStats>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if stats.todo() == 0 {
                tracing::info!("Finished");
                return;
            }
            tracing::info!("{}", stats.snapshot());
        }
    })
}
