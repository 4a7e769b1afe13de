//! Shared core of the NMEA 2000 engine gauge.
//!
//! Everything here is platform-agnostic and used by both the Pico 2 firmware
//! and the desktop simulator:
//!
//! - [`n2k`]: message container, field readers and PGN decoders
//! - [`registry`]: PGN to handler table
//! - [`stats`]: per-PGN receive/failure counters and staleness
//! - [`store`]: latest telemetry snapshot shared between cores
//! - [`dispatch`]: drains the inbox through the registry
//! - [`diag`]: bounded diagnostic log with a lock timeout
//! - [`demo`]: synthetic engine feeding real payloads
//! - [`brightness`]: ambient light to backlight duty
//! - [`canvas`], [`gauge`], [`render`]: frame composition
//! - [`config`], [`colors`], [`units`], [`clock`]: constants and helpers
//!
//! # no_std Compatibility
//!
//! This crate is `no_std`; host tests link `std` for threads and proptest.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod brightness;
pub mod canvas;
pub mod clock;
pub mod colors;
pub mod config;
pub mod demo;
pub mod diag;
pub mod dispatch;
pub mod gauge;
pub mod n2k;
pub mod registry;
pub mod render;
pub mod stats;
pub mod store;
pub mod units;

// Re-export commonly used items
pub use brightness::{AmbientLightSensor, Backlight, BrightnessConfig, BrightnessController, LightLevel};
pub use canvas::{Canvas, Image};
pub use clock::{Clock, elapsed_ms};
pub use demo::DemoEngine;
pub use diag::{DiagConfig, DiagLog, LogLevel};
pub use dispatch::{DispatchConfig, Dispatcher};
pub use n2k::{MessageSource, N2kMessage};
pub use registry::{ENGINE_GAUGE_HANDLERS, MessageRegistry};
pub use render::{Backgrounds, DisplayCommit, FrameInput, GaugeRenderer, RenderConfig};
pub use stats::MessageStatistics;
pub use store::{TelemetrySink, TelemetrySnapshot, TelemetryStore};
