//! Host stand-ins for the panel, backlight and light sensor.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::SimulatorDisplay;
use gauge_common::brightness::{AmbientLightSensor, Backlight};
use gauge_common::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use gauge_common::render::DisplayCommit;

/// Highest raw reading of the 12-bit ADC.
const ADC_MAX: u16 = 4095;

// =============================================================================
// Panel
// =============================================================================

/// Simulator window backing store with a software backlight.
///
/// Committed frames are scaled by the backlight duty so dimming is visible.
pub struct SimulatorPanel {
    display: SimulatorDisplay<Rgb565>,
    duty: u8,
}

impl SimulatorPanel {
    pub fn new() -> Self {
        Self {
            display: SimulatorDisplay::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)),
            duty: 0,
        }
    }

    pub fn display(&self) -> &SimulatorDisplay<Rgb565> { &self.display }

    pub const fn duty(&self) -> u8 { self.duty }
}

impl Default for SimulatorPanel {
    fn default() -> Self { Self::new() }
}

fn dim(
    color: Rgb565,
    duty: u8,
) -> Rgb565 {
    let scale = |c: u8| (u16::from(c) * u16::from(duty) / 255) as u8;
    Rgb565::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

impl DisplayCommit for SimulatorPanel {
    type Error = Infallible;

    /// Decode the big-endian RGB565 frame into the window buffer.
    fn commit(
        &mut self,
        frame: &[u8],
    ) -> Result<(), Self::Error> {
        let duty = self.duty;
        let area = Rectangle::new(Point::zero(), self.display.size());
        let colors = frame
            .chunks_exact(2)
            .map(|px| dim(Rgb565::from(RawU16::new(u16::from_be_bytes([px[0], px[1]]))), duty));
        self.display.fill_contiguous(&area, colors)
    }
}

impl Backlight for SimulatorPanel {
    fn set_duty(
        &mut self,
        duty: u8,
    ) {
        self.duty = duty;
    }
}

// =============================================================================
// Light Sensor
// =============================================================================

/// Ambient light reading adjusted from the keyboard.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedLightSensor {
    raw: u16,
}

impl SimulatedLightSensor {
    pub const fn new(raw: u16) -> Self { Self { raw } }

    pub const fn raw(&self) -> u16 { self.raw }

    /// Shift the reading by `delta`, clamped to the ADC range.
    pub fn adjust(
        &mut self,
        delta: i32,
    ) {
        self.raw = (i32::from(self.raw) + delta).clamp(0, i32::from(ADC_MAX)) as u16;
    }
}

impl AmbientLightSensor for SimulatedLightSensor {
    type Error = Infallible;

    fn read_raw(&mut self) -> Result<u16, Self::Error> { Ok(self.raw) }
}
