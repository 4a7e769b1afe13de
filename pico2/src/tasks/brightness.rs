//! Brightness task: ambient light to backlight duty.

use defmt::{Debug2Format, info, warn};
use embassy_time::{Duration, Ticker};
use gauge_common::brightness::{BrightnessConfig, BrightnessController};
use gauge_common::diag::LogLevel;

use super::{DIAG, EmbassyClock};
use crate::light::{AdcLightSensor, PwmBacklight};

#[embassy_executor::task]
pub async fn brightness_task(
    mut sensor: AdcLightSensor<'static>,
    mut backlight: PwmBacklight<'static>,
    config: BrightnessConfig,
    log_changes: bool,
    lock_timeout_ms: u32,
    period: Duration,
) {
    info!("Brightness task started");

    let mut controller = BrightnessController::new(config);
    let mut ticker = Ticker::every(period);

    loop {
        match controller.step(&mut sensor, &mut backlight) {
            Ok(step) if step.changed && log_changes => {
                info!("Backlight {} duty {} (ambient {})", step.level, step.duty, step.effective);
                DIAG.write(
                    &EmbassyClock,
                    lock_timeout_ms,
                    LogLevel::Info,
                    format_args!("backlight duty {} at ambient {}", step.duty, step.effective),
                );
            }
            Ok(_) => {}
            // Previous duty stays applied
            Err(e) => warn!("Light sensor read failed: {}", Debug2Format(&e)),
        }
        ticker.next().await;
    }
}
