//! NMEA 2000 Engine Gauge Simulator for desktop.
//!
//! Runs the gauge core from `gauge-common` against the synthetic engine and
//! shows the round display in an embedded-graphics-simulator window.
//!
//! Threads mirror the firmware's two cores: a feed thread and a decode
//! thread stand in for the bus side, the main thread renders, runs the
//! brightness loop and drains the diagnostic ring.
//!
//! Keys:
//! - `P`: pause / resume the feed (engine speed goes stale)
//! - `O`: toggle the low oil pressure warning
//! - `I`: switch the transmitted engine instance between 0 and 1
//! - `D` / `L`: darker / lighter ambient light (held keys repeat)
//! - `S`: print message statistics now

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod bus;
mod panel;
mod timing;

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorEvent, Window};
use gauge_common::brightness::{BrightnessConfig, BrightnessController};
use gauge_common::canvas::{Canvas, Image};
use gauge_common::clock::Clock;
use gauge_common::config::{
    ENGINE_RAPID_TIMEOUT_MS,
    FRAME_BYTES,
    INBOX_CAPACITY,
    SCREEN_HEIGHT,
    SCREEN_WIDTH,
    TaskPeriods,
};
use gauge_common::diag::{DiagConfig, DiagLog, LogLevel};
use gauge_common::dispatch::{DispatchConfig, Dispatcher};
use gauge_common::n2k::PGN_ENGINE_RAPID;
use gauge_common::registry::ENGINE_GAUGE_HANDLERS;
use gauge_common::render::{Backgrounds, FrameInput, GaugeRenderer, RenderConfig, bake_background};
use gauge_common::stats::MessageStatistics;
use gauge_common::store::TelemetryStore;

use crate::bus::{ChannelSource, FeedControl, run_decode, run_feed};
use crate::panel::{SimulatedLightSensor, SimulatorPanel};
use crate::timing::{Interval, StdClock, period};

/// Starting ambient reading: ordinary daylight.
const INITIAL_AMBIENT: u16 = 1_000;

/// Ambient change per key press.
const AMBIENT_STEP: i32 = 200;

type Store = TelemetryStore<CriticalSectionRawMutex>;
type Log = DiagLog<CriticalSectionRawMutex>;

fn print_statistics<const N: usize>(
    stats: &MessageStatistics<N>,
    now_ms: u32,
) {
    for summary in stats.summaries(now_ms) {
        println!("[stats] {summary}");
    }
    println!("[stats] engine speed timed out: {}", stats.is_primary_timed_out(now_ms));
}

fn main() {
    let periods = TaskPeriods::DEFAULT;
    let diag_config = DiagConfig::default();
    let clock = StdClock::new();

    let store = Store::new();
    let diag = Log::new();
    let stats = MessageStatistics::new(ENGINE_GAUGE_HANDLERS.ids(), PGN_ENGINE_RAPID, ENGINE_RAPID_TIMEOUT_MS);
    let control = FeedControl::default();
    let (inbox_tx, inbox_rx) = mpsc::sync_channel(INBOX_CAPACITY);

    let render_config = RenderConfig::DEFAULT;
    let mut normal = vec![0u8; FRAME_BYTES];
    bake_background(&mut normal, &render_config, false);
    let mut warning = vec![0u8; FRAME_BYTES];
    bake_background(&mut warning, &render_config, true);
    let backgrounds = Backgrounds {
        normal: Image::new(&normal, SCREEN_WIDTH, SCREEN_HEIGHT),
        warning: Image::new(&warning, SCREEN_WIDTH, SCREEN_HEIGHT),
    };

    let mut renderer = Box::new(GaugeRenderer::new(render_config));
    renderer.bake();
    let mut framebuffer = vec![0u8; FRAME_BYTES];

    let mut panel = SimulatorPanel::new();
    let mut sensor = SimulatedLightSensor::new(INITIAL_AMBIENT);
    let mut brightness = BrightnessController::new(BrightnessConfig::default());

    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    let mut window = Window::new("NMEA 2000 Engine Gauge", &output_settings);
    window.update(panel.display());

    thread::scope(|s| {
        // =====================================================================
        // Bus side
        // =====================================================================

        let feed_control = &control;
        s.spawn(move || run_feed(&inbox_tx, feed_control, period(periods.demo_frame_ms)));

        let (decode_store, decode_diag, decode_stats, decode_control) = (&store, &diag, &stats, &control);
        s.spawn(move || {
            let dispatcher = Dispatcher::new(
                &ENGINE_GAUGE_HANDLERS,
                decode_stats,
                decode_store,
                decode_diag,
                clock,
                DispatchConfig::default(),
            );
            let mut source = ChannelSource(inbox_rx);
            run_decode(&dispatcher, &mut source, decode_control, period(periods.decode_ms));
        });

        // =====================================================================
        // Display side
        // =====================================================================

        let frame_time = period(periods.render_ms);
        let mut brightness_due = Interval::new(period(periods.brightness_ms));
        let mut drain_due = Interval::new(period(periods.diag_drain_ms));
        let mut stats_due = Interval::new(period(periods.stats_report_ms));
        let mut reported_dropped = 0u32;
        let mut was_stale = false;
        let mut first_frame = true;

        'frames: loop {
            let frame_start = Instant::now();

            for ev in window.events() {
                match ev {
                    SimulatorEvent::Quit => break 'frames,
                    SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                        if repeat && keycode != Keycode::D && keycode != Keycode::L {
                            continue;
                        }
                        match keycode {
                            Keycode::P => {
                                let paused = control.toggle_paused();
                                println!("[sim] feed {}", if paused { "paused" } else { "resumed" });
                            }
                            Keycode::O => {
                                let on = control.toggle_low_oil();
                                println!("[sim] low oil pressure {}", if on { "ON" } else { "OFF" });
                            }
                            Keycode::I => println!("[sim] sending engine instance {}", control.toggle_instance()),
                            Keycode::D => sensor.adjust(AMBIENT_STEP),
                            Keycode::L => sensor.adjust(-AMBIENT_STEP),
                            Keycode::S => print_statistics(&stats, clock.now_ms()),
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            // Backlight is set before the first frame is shown
            if first_frame || brightness_due.due(frame_start) {
                let Ok(step) = brightness.step(&mut sensor, &mut panel);
                if step.changed && diag_config.log_brightness {
                    println!("[light] {:?} duty {} (ambient {})", step.level, step.duty, step.effective);
                    diag.write(
                        &clock,
                        diag_config.lock_timeout_ms,
                        LogLevel::Info,
                        format_args!("backlight duty {} at ambient {}", step.duty, step.effective),
                    );
                }
            }
            first_frame = false;

            let input = FrameInput {
                snapshot: store.snapshot(),
                stale: stats.is_primary_timed_out(clock.now_ms()),
            };
            if input.stale != was_stale {
                println!("[render] engine speed {}", if input.stale { "stale" } else { "resumed" });
                was_stale = input.stale;
            }

            let mut canvas = Canvas::new(&mut framebuffer, SCREEN_WIDTH, SCREEN_HEIGHT);
            let Ok(()) = renderer.render(&input, &backgrounds, &mut canvas, &mut panel);
            window.update(panel.display());

            if drain_due.due(frame_start) {
                diag.drain(|entry| println!("{entry}"));
                let dropped = diag.dropped();
                if dropped != reported_dropped {
                    eprintln!("[diag] {} writes skipped on lock timeout", dropped.wrapping_sub(reported_dropped));
                    reported_dropped = dropped;
                }
            }

            if diag_config.log_statistics && stats_due.due(frame_start) {
                print_statistics(&stats, clock.now_ms());
            }

            if let Some(remaining) = frame_time.checked_sub(frame_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        control.request_quit();
    });
}
