//! Value-to-geometry mappings for the coolant arc and the RPM needle.
//!
//! Two angle conventions meet here:
//!
//! - Arc angles: 0° at 6 o'clock, increasing clockwise (the convention the
//!   dial artwork was laid out in).
//! - Needle angles: 0° at 12 o'clock, increasing clockwise.
//!
//! embedded-graphics measures from 3 o'clock, clockwise; [`draw_ring_arc`]
//! does the conversion.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc, PrimitiveStyleBuilder, StrokeAlignment};

use crate::colors::{COOLANT_CRITICAL, COOLANT_OK, COOLANT_PASSIVE};
use crate::config::{
    CENTER_X, CENTER_Y, COOLANT_ARC_ANGLE_END, COOLANT_ARC_ANGLE_START, COOLANT_ARC_INNER_RADIUS,
    COOLANT_ARC_OUTER_RADIUS, COOLANT_CRITICAL_TEMPERATURE, COOLANT_MAX_TEMPERATURE,
    COOLANT_MIN_TEMPERATURE, COOLANT_PASSIVE_MARGIN, NEEDLE_MAX_ANGLE, NEEDLE_MAX_SPEED,
    NEEDLE_MIN_ANGLE,
};

/// Reduce an angle to `[0, 360)`.
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let r = angle % 360.0;
    if r < 0.0 { r + 360.0 } else { r }
}

// =============================================================================
// Coolant Arc
// =============================================================================

/// Coolant arc geometry, range and colors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcConfig {
    pub min_temp: f32,
    pub max_temp: f32,
    pub critical_temp: f32,
    /// Below `min_temp + passive_margin` the arc is drawn passive.
    pub passive_margin: f32,
    /// Arc angle at `min_temp`.
    pub start_angle: f32,
    /// Arc angle at `max_temp`; smaller than `start_angle` means the sweep
    /// passes through 0°.
    pub end_angle: f32,
    pub inner_radius: u32,
    pub outer_radius: u32,
    pub ok_color: Rgb565,
    pub passive_color: Rgb565,
    pub critical_color: Rgb565,
}

impl Default for ArcConfig {
    fn default() -> Self { Self::DEFAULT }
}

impl ArcConfig {
    /// Configuration from the dial layout constants.
    pub const DEFAULT: Self = Self {
        min_temp: COOLANT_MIN_TEMPERATURE,
        max_temp: COOLANT_MAX_TEMPERATURE,
        critical_temp: COOLANT_CRITICAL_TEMPERATURE,
        passive_margin: COOLANT_PASSIVE_MARGIN,
        start_angle: COOLANT_ARC_ANGLE_START,
        end_angle: COOLANT_ARC_ANGLE_END,
        inner_radius: COOLANT_ARC_INNER_RADIUS,
        outer_radius: COOLANT_ARC_OUTER_RADIUS,
        ok_color: COOLANT_OK,
        passive_color: COOLANT_PASSIVE,
        critical_color: COOLANT_CRITICAL,
    };

    /// Total clockwise sweep from start to end (0, 360].
    pub fn total_sweep(&self) -> f32 {
        let sweep = wrap_degrees(self.end_angle - self.start_angle);
        if sweep == 0.0 { 360.0 } else { sweep }
    }

    /// Clockwise sweep from the start angle for `temp_c`, clamped to range.
    pub fn sweep_for(
        &self,
        temp_c: f32,
    ) -> f32 {
        let t = temp_c.clamp(self.min_temp, self.max_temp);
        (t - self.min_temp) / (self.max_temp - self.min_temp) * self.total_sweep()
    }

    /// Arc angle reached at `temp_c`, in `[0, 360)`.
    pub fn angle_for(
        &self,
        temp_c: f32,
    ) -> f32 {
        wrap_degrees(self.start_angle + self.sweep_for(temp_c))
    }

    /// Arc color for `temp_c`.
    pub fn color_for(
        &self,
        temp_c: f32,
    ) -> Rgb565 {
        if temp_c > self.critical_temp {
            self.critical_color
        } else if temp_c < self.min_temp + self.passive_margin {
            self.passive_color
        } else {
            self.ok_color
        }
    }
}

/// Draw a ring segment between `inner` and `outer` radius around `center`.
///
/// `start` is an arc angle (0° at 6 o'clock), `sweep` is clockwise degrees.
pub fn draw_ring_arc<D>(
    target: &mut D,
    center: Point,
    inner: u32,
    outer: u32,
    start: f32,
    sweep: f32,
    color: Rgb565,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if sweep <= 0.0 || outer <= inner {
        return Ok(());
    }
    let style = PrimitiveStyleBuilder::new()
        .stroke_color(color)
        .stroke_width(outer - inner)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    Arc::with_center(center, outer * 2, (start + 90.0).deg(), sweep.min(360.0).deg())
        .into_styled(style)
        .draw(target)
}

// =============================================================================
// Needle
// =============================================================================

/// RPM needle mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeedleConfig {
    pub max_speed: f32,
    /// Needle angle at 0 rpm.
    pub min_angle: f32,
    /// Needle angle at `max_speed`, may exceed 360.
    pub max_angle: f32,
    /// Dial point the needle rotates about.
    pub pivot: Point,
}

impl Default for NeedleConfig {
    fn default() -> Self { Self::DEFAULT }
}

impl NeedleConfig {
    /// Configuration from the dial layout constants.
    pub const DEFAULT: Self = Self {
        max_speed: NEEDLE_MAX_SPEED,
        min_angle: NEEDLE_MIN_ANGLE,
        max_angle: NEEDLE_MAX_ANGLE,
        pivot: Point::new(CENTER_X, CENTER_Y),
    };

    /// Needle angle for `rpm`, clamped to `[0, max_speed]` and wrapped to
    /// `[0, 360)`.
    pub fn angle_for(
        &self,
        rpm: f32,
    ) -> f32 {
        let s = rpm.clamp(0.0, self.max_speed);
        wrap_degrees(self.min_angle + s / self.max_speed * (self.max_angle - self.min_angle))
    }

    /// Resting angle when there is no data.
    pub fn rest_angle(&self) -> f32 { wrap_degrees(self.min_angle) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(
        a: f32,
        b: f32,
    ) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(386.0), 26.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(-30.0), 330.0);
        assert_eq!(wrap_degrees(123.0), 123.0);
    }

    #[test]
    fn test_arc_endpoints_and_clamping() {
        let c = ArcConfig::default();
        assert!(close(c.total_sweep(), 300.0));
        assert!(close(c.angle_for(30.0), 330.0));
        assert!(close(c.angle_for(2.0), c.angle_for(30.0)));
        assert!(close(c.angle_for(125.0), 270.0));
        assert!(close(c.angle_for(200.0), c.angle_for(125.0)));
    }

    #[test]
    fn test_arc_wraps_through_zero() {
        let c = ArcConfig::default();
        // 30 degrees past the start is exactly the wrap point
        let t = 30.0 + 95.0 * 30.0 / 300.0;
        assert!(close(c.angle_for(t), 0.0) || close(c.angle_for(t), 360.0));
        assert!(close(c.angle_for(30.0 + 95.0 / 2.0), 120.0));
    }

    #[test]
    fn test_arc_colors() {
        let c = ArcConfig::default();
        assert_eq!(c.color_for(20.0), COOLANT_PASSIVE);
        assert_eq!(c.color_for(34.9), COOLANT_PASSIVE);
        assert_eq!(c.color_for(35.0), COOLANT_OK);
        assert_eq!(c.color_for(98.0), COOLANT_OK);
        assert_eq!(c.color_for(98.1), COOLANT_CRITICAL);
    }

    #[test]
    fn test_needle_spot_values() {
        let n = NeedleConfig::default();
        assert!(close(n.angle_for(0.0), 226.0));
        assert!(close(n.angle_for(2000.0), 306.0));
        assert!(close(n.angle_for(4000.0), 26.0));
        assert!(close(n.angle_for(9000.0), 26.0));
        assert!(close(n.angle_for(-5.0), 226.0));
        assert!(close(n.rest_angle(), 226.0));
    }

    #[test]
    fn test_ring_arc_draws_inside_band() {
        let mut buf = [0u8; crate::canvas::buffer_len(64, 64)];
        let mut canvas = crate::canvas::Canvas::new(&mut buf, 64, 64);
        canvas.fill(Rgb565::BLACK);
        let center = Point::new(32, 32);
        // Quarter ring starting at 6 o'clock, sweeping to 9 o'clock
        draw_ring_arc(&mut canvas, center, 20, 28, 0.0, 90.0, Rgb565::WHITE).unwrap();
        // 7 and 8 o'clock, middle of the band
        assert_eq!(canvas.pixel(20, 52), Some(Rgb565::WHITE));
        assert_eq!(canvas.pixel(15, 49), Some(Rgb565::WHITE));
        // 3 o'clock untouched, center untouched
        assert_eq!(canvas.pixel(32 + 24, 32), Some(Rgb565::BLACK));
        assert_eq!(canvas.pixel(32, 32), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_zero_sweep_draws_nothing() {
        let mut buf = [0u8; crate::canvas::buffer_len(16, 16)];
        let mut canvas = crate::canvas::Canvas::new(&mut buf, 16, 16);
        draw_ring_arc(&mut canvas, Point::new(8, 8), 4, 7, 0.0, 0.0, Rgb565::WHITE).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    proptest::proptest! {
        #[test]
        fn test_arc_sweep_monotonic(a in -50.0f32..200.0, b in -50.0f32..200.0) {
            let c = ArcConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            proptest::prop_assert!(c.sweep_for(lo) <= c.sweep_for(hi));
            proptest::prop_assert!(c.sweep_for(hi) <= c.total_sweep());
            proptest::prop_assert!(c.sweep_for(lo) >= 0.0);
        }

        #[test]
        fn test_needle_sweep_linear(rpm in 0.0f32..4000.0) {
            let n = NeedleConfig::default();
            let unwrapped = 226.0 + rpm / 4000.0 * 160.0;
            let diff = wrap_degrees(unwrapped - n.angle_for(rpm));
            proptest::prop_assert!(diff < 0.01 || diff > 359.99);
        }
    }
}
