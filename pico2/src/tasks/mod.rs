//! Async tasks for the gauge firmware.
//!
//! Core 1 runs the bus side, core 0 the display side:
//! - `decode`: drains the inbox through the dispatcher (core 1)
//! - `demo`: synthetic engine feeding the inbox (core 1, `demo-bus`)
//! - `render`: composes and flushes frames (core 0)
//! - `brightness`: ambient light to backlight (core 0)
//! - `diag`: diagnostic ring drain and statistics report (core 0)
//!
//! The two sides share only [`STORE`], [`DIAG`], [`INBOX`] and the
//! statistics table.

pub mod brightness;
pub mod decode;
#[cfg(feature = "demo-bus")]
pub mod demo;
pub mod diag;
pub mod render;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use gauge_common::clock::Clock;
use gauge_common::config::INBOX_CAPACITY;
use gauge_common::diag::DiagLog;
use gauge_common::n2k::N2kMessage;
use gauge_common::registry::{ENGINE_GAUGE_HANDLERS, MessageRegistry};
use gauge_common::stats::MessageStatistics;
use gauge_common::store::TelemetryStore;

pub use brightness::brightness_task;
pub use decode::decode_task;
#[cfg(feature = "demo-bus")]
pub use demo::demo_bus_task;
pub use diag::{diag_drain_task, stats_report_task};
pub use render::render_task;

/// Number of registered PGN handlers.
pub const HANDLER_COUNT: usize = 4;

/// PGN handler table.
pub static REGISTRY: MessageRegistry<HANDLER_COUNT> = ENGINE_GAUGE_HANDLERS;

/// Latest telemetry, written on core 1 and read on core 0.
pub static STORE: TelemetryStore<CriticalSectionRawMutex> = TelemetryStore::new();

/// Diagnostic ring shared by both cores.
pub static DIAG: DiagLog<CriticalSectionRawMutex> = DiagLog::new();

/// Parsed messages waiting for the decoder.
pub static INBOX: Channel<CriticalSectionRawMutex, N2kMessage, INBOX_CAPACITY> = Channel::new();

/// Statistics type shared by the decode and report tasks.
pub type Statistics = MessageStatistics<HANDLER_COUNT>;

/// Milliseconds since boot from the embassy time driver.
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 { Instant::now().as_millis() as u32 }
}
