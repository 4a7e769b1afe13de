//! Render task: snapshot, compose, flush.

use defmt::{Debug2Format, debug, info, warn};
use embassy_time::{Duration, Instant, Ticker};
use gauge_common::canvas::Canvas;
use gauge_common::clock::Clock;
use gauge_common::config::{FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};
use gauge_common::render::{Backgrounds, FrameInput, GaugeRenderer};

use super::{EmbassyClock, STORE, Statistics};
use crate::gc9a01::Gc9a01;

/// Frames between timing reports.
const PROFILE_EVERY_FRAMES: u32 = 250;

/// Compose one frame per `period` and push it to the panel.
///
/// Reads the store once per frame; the decode side is never waited on.
#[embassy_executor::task]
pub async fn render_task(
    mut display: Gc9a01<'static>,
    renderer: &'static mut GaugeRenderer,
    backgrounds: Backgrounds<'static>,
    frame: &'static mut [u8; FRAME_BYTES],
    stats: &'static Statistics,
    period: Duration,
) {
    info!("Render task started");

    let clock = EmbassyClock;
    let mut ticker = Ticker::every(period);
    let mut was_stale = false;
    let mut frames = 0u32;
    let mut compose_us = 0u32;
    let mut flush_us = 0u32;

    loop {
        let input = FrameInput {
            snapshot: STORE.snapshot(),
            stale: stats.is_primary_timed_out(clock.now_ms()),
        };
        if input.stale != was_stale {
            if input.stale {
                warn!("Engine speed stale, showing no-data state");
            } else {
                info!("Engine speed data resumed");
            }
            was_stale = input.stale;
        }

        let start = Instant::now();
        let mut canvas = Canvas::new(&mut frame[..], SCREEN_WIDTH, SCREEN_HEIGHT);
        renderer.compose(&input, &backgrounds, &mut canvas);
        let composed = Instant::now();
        if let Err(e) = display.flush(canvas.bytes()).await {
            warn!("Frame flush failed: {}", Debug2Format(&e));
        }

        compose_us = compose_us.max((composed - start).as_micros() as u32);
        flush_us = flush_us.max(composed.elapsed().as_micros() as u32);
        frames += 1;
        if frames == PROFILE_EVERY_FRAMES {
            debug!("Frame timing (max of {}): compose {} us, flush {} us", frames, compose_us, flush_us);
            frames = 0;
            compose_us = 0;
            flush_us = 0;
        }

        ticker.next().await;
    }
}
