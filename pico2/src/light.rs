//! Ambient light sensor (LDR divider on ADC0) and PWM backlight.

use embassy_rp::adc::{self, Adc, Blocking, Channel};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use gauge_common::brightness::{AmbientLightSensor, Backlight};

/// PWM top: one count per duty step.
const PWM_TOP: u16 = 255;

/// LDR divider read with the blocking ADC (a conversion takes ~2 µs).
pub struct AdcLightSensor<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
}

impl<'d> AdcLightSensor<'d> {
    pub fn new(
        adc: Adc<'d, Blocking>,
        channel: Channel<'d>,
    ) -> Self {
        Self { adc, channel }
    }
}

impl AmbientLightSensor for AdcLightSensor<'_> {
    type Error = adc::Error;

    fn read_raw(&mut self) -> Result<u16, Self::Error> { self.adc.blocking_read(&mut self.channel) }
}

/// Backlight on PWM channel B.
pub struct PwmBacklight<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
}

impl<'d> PwmBacklight<'d> {
    /// Wrap `pwm` and start with the backlight off.
    pub fn new(mut pwm: Pwm<'d>) -> Self {
        let mut config = PwmConfig::default();
        config.top = PWM_TOP;
        config.compare_b = 0;
        pwm.set_config(&config);
        Self { pwm, config }
    }
}

impl Backlight for PwmBacklight<'_> {
    fn set_duty(
        &mut self,
        duty: u8,
    ) {
        self.config.compare_b = u16::from(duty);
        self.pwm.set_config(&self.config);
    }
}
