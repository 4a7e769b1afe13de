//! Backlight control from an ambient light sensor.
//!
//! The sensor is an LDR divider: the ADC value rises as it gets darker. Each
//! step averages a burst of reads, ignores changes smaller than the
//! hysteresis band, and maps the result onto three duty levels:
//!
//! ```text
//!   0 ..= 500     bright daylight   duty 253
//!   501 ..= 1500  daylight          duty 120
//!   1501 .. 1900  keep night if already night, else daylight
//!   1900 ..       night             duty 20
//! ```
//!
//! The gap between the daylight and night thresholds keeps dusk from
//! toggling between the two.

use crate::config::{
    ANALOG_VALUE_DAYLIGHT, ANALOG_VALUE_MAX_DAYLIGHT, ANALOG_VALUE_NIGHT, BRIGHTNESS_HYSTERESIS,
    BRIGHTNESS_OUTPUT_DAYLIGHT, BRIGHTNESS_OUTPUT_MAX_DAYLIGHT, BRIGHTNESS_OUTPUT_NIGHT,
    BRIGHTNESS_SAMPLES,
};

// =============================================================================
// Peripheral Traits
// =============================================================================

/// Raw ambient light reading, 0..=4095 with larger meaning darker.
pub trait AmbientLightSensor {
    type Error;

    /// Take one ADC sample.
    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

/// Backlight PWM output.
pub trait Backlight {
    /// Set the duty cycle, 0 (off) to 255 (full).
    fn set_duty(
        &mut self,
        duty: u8,
    );
}

// =============================================================================
// Controller
// =============================================================================

/// Discrete ambient light level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightLevel {
    Night,
    Day,
    BrightDay,
}

/// Thresholds and duties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrightnessConfig {
    /// Reads averaged per step (at least 1).
    pub samples: usize,
    /// Minimum change from the last applied sample that is acted on.
    pub hysteresis: u16,
    pub max_daylight_threshold: u16,
    pub daylight_threshold: u16,
    pub night_threshold: u16,
    pub max_daylight_duty: u8,
    pub daylight_duty: u8,
    pub night_duty: u8,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            samples: BRIGHTNESS_SAMPLES,
            hysteresis: BRIGHTNESS_HYSTERESIS,
            max_daylight_threshold: ANALOG_VALUE_MAX_DAYLIGHT,
            daylight_threshold: ANALOG_VALUE_DAYLIGHT,
            night_threshold: ANALOG_VALUE_NIGHT,
            max_daylight_duty: BRIGHTNESS_OUTPUT_MAX_DAYLIGHT,
            daylight_duty: BRIGHTNESS_OUTPUT_DAYLIGHT,
            night_duty: BRIGHTNESS_OUTPUT_NIGHT,
        }
    }
}

impl BrightnessConfig {
    /// Duty for a light level.
    pub const fn duty(
        &self,
        level: LightLevel,
    ) -> u8 {
        match level {
            LightLevel::Night => self.night_duty,
            LightLevel::Day => self.daylight_duty,
            LightLevel::BrightDay => self.max_daylight_duty,
        }
    }
}

/// Result of one control step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrightnessStep {
    /// Averaged sensor value.
    pub sample: u16,
    /// Value the level was derived from (the held sample inside the band).
    pub effective: u16,
    pub level: LightLevel,
    pub duty: u8,
    /// Duty differs from the previous step (always true on the first).
    pub changed: bool,
}

/// Hysteresis brightness controller.
pub struct BrightnessController {
    config: BrightnessConfig,
    last_sample: Option<u16>,
    level: LightLevel,
    duty: Option<u8>,
}

impl BrightnessController {
    pub const fn new(config: BrightnessConfig) -> Self {
        Self {
            config,
            last_sample: None,
            level: LightLevel::Day,
            duty: None,
        }
    }

    /// Currently applied duty, `None` before the first step.
    pub const fn duty(&self) -> Option<u8> { self.duty }

    pub const fn level(&self) -> LightLevel { self.level }

    pub const fn config(&self) -> &BrightnessConfig { &self.config }

    fn classify(
        &self,
        value: u16,
    ) -> LightLevel {
        let c = &self.config;
        if value >= c.night_threshold {
            LightLevel::Night
        } else if value <= c.max_daylight_threshold {
            LightLevel::BrightDay
        } else if value <= c.daylight_threshold {
            LightLevel::Day
        } else if self.level == LightLevel::Night {
            LightLevel::Night
        } else {
            LightLevel::Day
        }
    }

    /// Feed one averaged sample and compute the duty.
    pub fn update(
        &mut self,
        sample: u16,
    ) -> BrightnessStep {
        let effective = match self.last_sample {
            Some(last) if sample.abs_diff(last) < self.config.hysteresis => last,
            _ => {
                self.last_sample = Some(sample);
                sample
            }
        };
        self.level = self.classify(effective);
        let duty = self.config.duty(self.level);
        let changed = self.duty != Some(duty);
        self.duty = Some(duty);
        BrightnessStep {
            sample,
            effective,
            level: self.level,
            duty,
            changed,
        }
    }

    /// Sample the sensor, update, and write the backlight if the duty changed.
    ///
    /// A sensor error leaves the previous duty applied.
    pub fn step<S, B>(
        &mut self,
        sensor: &mut S,
        backlight: &mut B,
    ) -> Result<BrightnessStep, S::Error>
    where
        S: AmbientLightSensor + ?Sized,
        B: Backlight + ?Sized,
    {
        let sample = average(sensor, self.config.samples)?;
        let step = self.update(sample);
        if step.changed {
            backlight.set_duty(step.duty);
        }
        Ok(step)
    }
}

/// Mean of `count` reads (at least one).
pub fn average<S: AmbientLightSensor + ?Sized>(
    sensor: &mut S,
    count: usize,
) -> Result<u16, S::Error> {
    let count = count.max(1);
    let mut sum: u32 = 0;
    for _ in 0..count {
        sum += u32::from(sensor.read_raw()?);
    }
    Ok((sum / count as u32) as u16)
}
