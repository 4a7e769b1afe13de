//! NMEA 2000 Engine Gauge Firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Drives a 240x240 GC9A01 round panel as an engine speed / coolant gauge.
//!
//! # Architecture
//!
//! Two Embassy executors, one per core:
//! - Core 1: decode task (inbox -> dispatcher -> telemetry store), plus the
//!   demo bus source when built with `demo-bus`
//! - Core 0: render task (snapshot -> compose -> DMA flush), brightness
//!   task, diagnostic drain and statistics report
//!
//! The telemetry store is the only state written on one core and read on the
//! other; the renderer takes a copy once per frame and never waits on the
//! decoder.

#![no_std]
#![no_main]
// Crate-level lints (match gauge-common)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod gc9a01;
mod light;
mod tasks;

use defmt::{Debug2Format, error, info};
use embassy_executor::{Executor, Spawner};
use embassy_rp::adc::{self, Adc, Channel as AdcChannel};
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::multicore::{Stack, spawn_core1};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::spi::Spi;
use embassy_time::Duration;
use gauge_common::brightness::BrightnessConfig;
use gauge_common::canvas::Image;
use gauge_common::config::{ENGINE_RAPID_TIMEOUT_MS, FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH, TaskPeriods};
use gauge_common::diag::DiagConfig;
use gauge_common::dispatch::DispatchConfig;
use gauge_common::n2k::PGN_ENGINE_RAPID;
use gauge_common::render::{Backgrounds, GaugeRenderer, RenderConfig, bake_background};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use crate::gc9a01::{Gc9a01, display_spi_config};
use crate::light::{AdcLightSensor, PwmBacklight};
use crate::tasks::{
    INBOX, REGISTRY, Statistics, brightness_task, decode_task, diag_drain_task, render_task,
    stats_report_task,
};

// =============================================================================
// Static Memory
// =============================================================================

static CORE1_STACK: ConstStaticCell<Stack<8192>> = ConstStaticCell::new(Stack::new());
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

static STATS: StaticCell<Statistics> = StaticCell::new();

/// Sprite buffers (~25 KB), kept out of the stack.
static RENDERER: ConstStaticCell<GaugeRenderer> = ConstStaticCell::new(GaugeRenderer::new(RenderConfig::DEFAULT));

/// Baked dial backgrounds (115,200 bytes each).
static BACKGROUND_NORMAL: ConstStaticCell<[u8; FRAME_BYTES]> = ConstStaticCell::new([0; FRAME_BYTES]);
static BACKGROUND_WARNING: ConstStaticCell<[u8; FRAME_BYTES]> = ConstStaticCell::new([0; FRAME_BYTES]);

/// Composition target, flushed by DMA after each frame.
static FRAMEBUFFER: ConstStaticCell<[u8; FRAME_BYTES]> = ConstStaticCell::new([0; FRAME_BYTES]);

#[inline]
fn ms(value: u32) -> Duration { Duration::from_millis(u64::from(value)) }

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Engine gauge starting...");

    let p = embassy_rp::init(Default::default());
    let periods = TaskPeriods::DEFAULT;
    let diag = DiagConfig::default();

    let stats: &'static Statistics =
        STATS.init(Statistics::new(REGISTRY.ids(), PGN_ENGINE_RAPID, ENGINE_RAPID_TIMEOUT_MS));

    // =========================================================================
    // Core 1: bus side
    // =========================================================================

    let inbox = INBOX.receiver();
    #[cfg(feature = "demo-bus")]
    let demo_inbox = INBOX.sender();

    spawn_core1(p.CORE1, CORE1_STACK.take(), move || {
        let executor1 = EXECUTOR1.init(Executor::new());
        executor1.run(|spawner| {
            spawner
                .spawn(decode_task(inbox, stats, DispatchConfig::default(), ms(periods.decode_ms)))
                .unwrap();
            #[cfg(feature = "demo-bus")]
            spawner
                .spawn(tasks::demo_bus_task(demo_inbox, ms(periods.demo_frame_ms)))
                .unwrap();
        })
    });
    info!("Core 1 executor started");

    // =========================================================================
    // Core 0: display side
    // =========================================================================

    // Backlight stays off until the brightness task runs
    let backlight = PwmBacklight::new(Pwm::new_output_b(p.PWM_SLICE4, p.PIN_25, PwmConfig::default()));

    let dc = Output::new(p.PIN_8, Level::Low);
    let cs = Output::new(p.PIN_9, Level::High);
    let rst = Output::new(p.PIN_12, Level::High);
    let spi = Spi::new_txonly(p.SPI1, p.PIN_10, p.PIN_11, p.DMA_CH0, display_spi_config());
    let mut display = Gc9a01::new(spi, dc, cs, rst);
    if let Err(e) = display.init().await {
        error!("Display init failed: {}", Debug2Format(&e));
        panic!("display init failed");
    }
    info!("Display initialized");

    let render_config = RenderConfig::DEFAULT;
    let normal = BACKGROUND_NORMAL.take();
    bake_background(normal, &render_config, false);
    let warning = BACKGROUND_WARNING.take();
    bake_background(warning, &render_config, true);
    let normal: &'static [u8; FRAME_BYTES] = normal;
    let warning: &'static [u8; FRAME_BYTES] = warning;
    let backgrounds = Backgrounds {
        normal: Image::new(normal, SCREEN_WIDTH, SCREEN_HEIGHT),
        warning: Image::new(warning, SCREEN_WIDTH, SCREEN_HEIGHT),
    };

    let renderer = RENDERER.take();
    renderer.bake();
    info!("Backgrounds and needle baked");

    let adc = Adc::new_blocking(p.ADC, adc::Config::default());
    let ldr = AdcChannel::new_pin(p.PIN_26, Pull::None);
    let sensor = AdcLightSensor::new(adc, ldr);

    spawner
        .spawn(render_task(display, renderer, backgrounds, FRAMEBUFFER.take(), stats, ms(periods.render_ms)))
        .unwrap();
    spawner
        .spawn(brightness_task(
            sensor,
            backlight,
            BrightnessConfig::default(),
            diag.log_brightness,
            diag.lock_timeout_ms,
            ms(periods.brightness_ms),
        ))
        .unwrap();
    spawner.spawn(diag_drain_task(ms(periods.diag_drain_ms))).unwrap();
    if diag.log_statistics {
        spawner.spawn(stats_report_task(stats, ms(periods.stats_report_ms))).unwrap();
    }

    info!("Core 0 tasks spawned");
}
