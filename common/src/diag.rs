//! Diagnostic log ring with a bounded-wait writer.
//!
//! Decode failures, decoded messages, brightness changes and statistics
//! reports are pushed here by whichever task produced them and drained to the
//! platform log sink (RTT on the firmware, stdout in the simulator) by a
//! separate low-priority task.
//!
//! Writers never wait on the drain task for long: [`DiagLog::lock_within`]
//! polls the lock until a deadline and gives up with `None`, in which case
//! the entry is discarded and counted.
//!
//! # Usage
//!
//! ```ignore
//! if let Some(mut log) = DIAG.lock_within(&clock, config.lock_timeout_ms) {
//!     log.push(LogEntry::format(LogLevel::Warn, clock.now_ms(), format_args!("bad pgn {}", pgn)));
//! }
//! ```

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use heapless::String;

use crate::clock::{Clock, elapsed_ms};
use crate::config::{
    DEBUG_DISPLAY_BRIGHTNESS, DEBUG_ERROR, DEBUG_N2K_MESSAGES, DEBUG_N2K_STATISTICS,
    DIAG_LOCK_TIMEOUT_MS,
};

/// Maximum number of log entries to keep.
pub const LOG_ENTRIES: usize = 32;

/// Maximum characters per log message.
pub const LOG_MSG_LEN: usize = 96;

/// Log severity level.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Single-character prefix for this level.
    pub const fn prefix(self) -> char {
        match self {
            Self::Trace => 'T',
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

/// Which diagnostic categories are written, and how long a writer may wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagConfig {
    /// Bound on the lock wait before a write is skipped (ms).
    pub lock_timeout_ms: u32,
    /// Decode failures.
    pub log_errors: bool,
    /// Every decoded message.
    pub log_messages: bool,
    /// Backlight duty changes.
    pub log_brightness: bool,
    /// Periodic statistics report.
    pub log_statistics: bool,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DIAG_LOCK_TIMEOUT_MS,
            log_errors: DEBUG_ERROR,
            log_messages: DEBUG_N2K_MESSAGES,
            log_brightness: DEBUG_DISPLAY_BRIGHTNESS,
            log_statistics: DEBUG_N2K_STATISTICS,
        }
    }
}

/// A single log entry with level, message, and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Message, truncated to `LOG_MSG_LEN` bytes on a char boundary.
    pub message: String<LOG_MSG_LEN>,
    /// Milliseconds since boot.
    pub timestamp_ms: u32,
}

/// `fmt::Write` adapter that silently stops at capacity.
struct Truncating<'a>(&'a mut String<LOG_MSG_LEN>);

impl Write for Truncating<'_> {
    fn write_str(
        &mut self,
        s: &str,
    ) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

impl LogEntry {
    /// Create an entry from a plain message.
    pub fn new(
        level: LogLevel,
        timestamp_ms: u32,
        message: &str,
    ) -> Self {
        Self::format(level, timestamp_ms, format_args!("{message}"))
    }

    /// Create an entry from format arguments.
    pub fn format(
        level: LogLevel,
        timestamp_ms: u32,
        args: fmt::Arguments<'_>,
    ) -> Self {
        let mut message = String::new();
        let _ = Truncating(&mut message).write_fmt(args);
        Self {
            level,
            message,
            timestamp_ms,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[{:>8}] {} {}", self.timestamp_ms, self.level.prefix(), self.message)
    }
}

/// Circular buffer of log entries. The oldest entry is overwritten when full.
pub struct LogBuffer {
    entries: [Option<LogEntry>; LOG_ENTRIES],
    head: usize, // Next write position
    count: usize,
    overwritten: u32,
}

impl LogBuffer {
    /// Create a new empty log buffer.
    pub const fn new() -> Self {
        Self {
            entries: [const { None }; LOG_ENTRIES],
            head: 0,
            count: 0,
            overwritten: 0,
        }
    }

    /// Push a new entry, dropping the oldest if full.
    pub fn push(
        &mut self,
        entry: LogEntry,
    ) {
        self.entries[self.head] = Some(entry);
        self.head = (self.head + 1) % LOG_ENTRIES;
        if self.count < LOG_ENTRIES {
            self.count += 1;
        } else {
            self.overwritten = self.overwritten.saturating_add(1);
        }
    }

    /// Remove and return the oldest entry.
    pub fn pop(&mut self) -> Option<LogEntry> {
        if self.count == 0 {
            return None;
        }
        let tail = (self.head + LOG_ENTRIES - self.count) % LOG_ENTRIES;
        self.count -= 1;
        self.entries[tail].take()
    }

    #[inline]
    pub const fn len(&self) -> usize { self.count }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.count == 0 }

    /// Entries lost to ring overflow since boot.
    #[inline]
    pub const fn overwritten(&self) -> u32 { self.overwritten }
}

impl Default for LogBuffer {
    fn default() -> Self { Self::new() }
}

/// Shared diagnostic stream.
pub struct DiagLog<M: RawMutex> {
    buffer: Mutex<M, LogBuffer>,
    dropped: AtomicU32,
}

impl<M: RawMutex> DiagLog<M> {
    pub const fn new() -> Self {
        Self {
            buffer: Mutex::new(LogBuffer::new()),
            dropped: AtomicU32::new(0),
        }
    }

    /// Acquire the ring, polling until `bound_ms` has elapsed on `clock`.
    ///
    /// Returns `None` (and counts a dropped write) if the lock stayed busy.
    pub fn lock_within<C: Clock>(
        &self,
        clock: &C,
        bound_ms: u32,
    ) -> Option<MutexGuard<'_, M, LogBuffer>> {
        let start = clock.now_ms();
        loop {
            if let Ok(guard) = self.buffer.try_lock() {
                return Some(guard);
            }
            if elapsed_ms(clock.now_ms(), start) >= bound_ms {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            core::hint::spin_loop();
        }
    }

    /// Format and push one entry. Returns `false` if the write was skipped.
    pub fn write<C: Clock>(
        &self,
        clock: &C,
        bound_ms: u32,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> bool {
        let Some(mut log) = self.lock_within(clock, bound_ms) else {
            return false;
        };
        log.push(LogEntry::format(level, clock.now_ms(), args));
        true
    }

    /// Pop every pending entry into `sink`, oldest first.
    ///
    /// Never waits: if a writer holds the lock the drain is retried next
    /// period. Returns the number of entries drained.
    pub fn drain(
        &self,
        mut sink: impl FnMut(&LogEntry),
    ) -> usize {
        let Ok(mut log) = self.buffer.try_lock() else {
            return 0;
        };
        let mut n = 0;
        while let Some(entry) = log.pop() {
            sink(&entry);
            n += 1;
        }
        n
    }

    /// Writes skipped because the lock was busy past the bound.
    pub fn dropped(&self) -> u32 { self.dropped.load(Ordering::Relaxed) }
}

impl<M: RawMutex> Default for DiagLog<M> {
    fn default() -> Self { Self::new() }
}
