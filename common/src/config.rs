//! Compile-time configuration for the engine gauge.
//!
//! Values come from the gauge hardware definition: a 240x240 round GC9A01
//! panel, a single engine instance on the bus, and an LDR divider on a 12-bit
//! ADC for ambient light. Runtime config structs (`ArcConfig`, `NeedleConfig`,
//! `BrightnessConfig`, `DispatchConfig`, `DiagConfig`) default to these
//! constants and can be overridden in tests.
//!
//! Ordering invariants are checked at compile time with `const` assertions.

// =============================================================================
// Display
// =============================================================================

/// Display width in pixels (GC9A01 round panel).
pub const SCREEN_WIDTH: u32 = 240;

/// Display height in pixels.
pub const SCREEN_HEIGHT: u32 = 240;

/// Bytes in one RGB565 frame.
pub const FRAME_BYTES: usize = (SCREEN_WIDTH * SCREEN_HEIGHT * 2) as usize;

/// Dial center X coordinate.
pub const CENTER_X: i32 = (SCREEN_WIDTH / 2) as i32;

/// Dial center Y coordinate.
pub const CENTER_Y: i32 = (SCREEN_HEIGHT / 2) as i32;

// =============================================================================
// Bus / Dispatch
// =============================================================================

/// Engine instance whose data drives this display.
pub const DISPLAY_ENGINE_INSTANCE: u8 = 0;

/// Staleness timeout for the Engine Rapid message (ms).
pub const ENGINE_RAPID_TIMEOUT_MS: u32 = 10_000;

/// Maximum messages decoded per dispatcher pass.
pub const MAX_DISPATCH_BATCH: usize = 16;

/// Capacity of the inbound message queue between bus and decoder.
pub const INBOX_CAPACITY: usize = 16;

// =============================================================================
// Coolant Arc
// =============================================================================

/// Coolant temperature at the start of the arc (°C).
pub const COOLANT_MIN_TEMPERATURE: f32 = 30.0;

/// Coolant temperature at the end of the arc (°C).
pub const COOLANT_MAX_TEMPERATURE: f32 = 125.0;

/// Above this the arc turns critical red (°C).
pub const COOLANT_CRITICAL_TEMPERATURE: f32 = 98.0;

/// Below `COOLANT_MIN_TEMPERATURE + margin` the arc is drawn passive gray.
pub const COOLANT_PASSIVE_MARGIN: f32 = 5.0;

/// Arc ring outer radius (px).
pub const COOLANT_ARC_OUTER_RADIUS: u32 = 108;

/// Arc ring inner radius (px).
pub const COOLANT_ARC_INNER_RADIUS: u32 = 100;

/// Arc start angle (degrees, 0 = 6 o'clock, clockwise).
pub const COOLANT_ARC_ANGLE_START: f32 = 330.0;

/// Arc end angle (degrees, wraps through 0 when smaller than the start).
pub const COOLANT_ARC_ANGLE_END: f32 = 270.0;

const _: () = assert!(COOLANT_MIN_TEMPERATURE < COOLANT_CRITICAL_TEMPERATURE);
const _: () = assert!(COOLANT_CRITICAL_TEMPERATURE < COOLANT_MAX_TEMPERATURE);
const _: () = assert!(COOLANT_ARC_INNER_RADIUS < COOLANT_ARC_OUTER_RADIUS);
const _: () = assert!(COOLANT_ARC_OUTER_RADIUS * 2 <= SCREEN_WIDTH);

// =============================================================================
// Needle
// =============================================================================

/// Engine speed at full needle deflection (rpm).
pub const NEEDLE_MAX_SPEED: f32 = 4000.0;

/// Needle angle at 0 rpm (degrees, 0 = 12 o'clock, clockwise).
pub const NEEDLE_MIN_ANGLE: f32 = 226.0;

/// Needle angle at `NEEDLE_MAX_SPEED` (may exceed 360, wrapped when drawn).
pub const NEEDLE_MAX_ANGLE: f32 = 386.0;

/// Needle sprite width (px).
pub const NEEDLE_SPRITE_WIDTH: u32 = 11;

/// Needle sprite height (px).
pub const NEEDLE_SPRITE_HEIGHT: u32 = 96;

/// Distance from the sprite's top edge to the rotation pivot (px).
pub const NEEDLE_PIVOT_Y: i32 = 88;

const _: () = assert!(NEEDLE_MIN_ANGLE < NEEDLE_MAX_ANGLE);
const _: () = assert!(NEEDLE_PIVOT_Y < NEEDLE_SPRITE_HEIGHT as i32);

// =============================================================================
// Text Overlays (sprite size and top-left position on the frame)
// =============================================================================

/// Coolant temperature text sprite width.
pub const COOLANT_TEXT_WIDTH: u32 = 61;
/// Coolant temperature text sprite height.
pub const COOLANT_TEXT_HEIGHT: u32 = 28;
/// Coolant temperature text X position.
pub const COOLANT_TEXT_POSITION_X: i32 = 170;
/// Coolant temperature text Y position.
pub const COOLANT_TEXT_POSITION_Y: i32 = 85;

/// Engine speed text sprite width.
pub const SPEED_TEXT_WIDTH: u32 = 136;
/// Engine speed text sprite height.
pub const SPEED_TEXT_HEIGHT: u32 = 54;
/// Engine speed text X position (horizontally centered).
pub const SPEED_TEXT_POSITION_X: i32 = (SCREEN_WIDTH as i32 - SPEED_TEXT_WIDTH as i32) / 2;
/// Engine speed text Y position.
pub const SPEED_TEXT_POSITION_Y: i32 = 128;

/// Engine hours text sprite width.
pub const ENGINE_HOURS_TEXT_WIDTH: u32 = 91;
/// Engine hours text sprite height.
pub const ENGINE_HOURS_TEXT_HEIGHT: u32 = 28;
/// Engine hours text X position.
pub const ENGINE_HOURS_POSITION_X: i32 = 49;
/// Engine hours text Y position.
pub const ENGINE_HOURS_POSITION_Y: i32 = 185;

const _: () = assert!(COOLANT_TEXT_POSITION_X + COOLANT_TEXT_WIDTH as i32 <= SCREEN_WIDTH as i32);
const _: () = assert!(ENGINE_HOURS_POSITION_Y + ENGINE_HOURS_TEXT_HEIGHT as i32 <= SCREEN_HEIGHT as i32);

// =============================================================================
// Brightness
// =============================================================================

/// Full-scale value of the 12-bit light sensor ADC.
pub const ADC_MAX: u16 = 4095;

/// ADC reads averaged per brightness sample.
pub const BRIGHTNESS_SAMPLES: usize = 8;

/// Samples closer than this to the last applied sample are ignored.
pub const BRIGHTNESS_HYSTERESIS: u16 = 50;

/// At or below this ADC value it is bright daylight (LDR pulls low in light).
pub const ANALOG_VALUE_MAX_DAYLIGHT: u16 = 500;
/// Backlight duty for bright daylight.
pub const BRIGHTNESS_OUTPUT_MAX_DAYLIGHT: u8 = 253;

/// At or below this ADC value it is daylight.
pub const ANALOG_VALUE_DAYLIGHT: u16 = 1500;
/// Backlight duty for daylight.
pub const BRIGHTNESS_OUTPUT_DAYLIGHT: u8 = 120;

/// At or above this ADC value it is night.
pub const ANALOG_VALUE_NIGHT: u16 = 1900;
/// Backlight duty for night.
pub const BRIGHTNESS_OUTPUT_NIGHT: u8 = 20;

const _: () = assert!(ANALOG_VALUE_MAX_DAYLIGHT < ANALOG_VALUE_DAYLIGHT);
const _: () = assert!(ANALOG_VALUE_DAYLIGHT < ANALOG_VALUE_NIGHT);
const _: () = assert!(ANALOG_VALUE_NIGHT <= ADC_MAX);
const _: () = assert!(BRIGHTNESS_OUTPUT_NIGHT < BRIGHTNESS_OUTPUT_DAYLIGHT);
const _: () = assert!(BRIGHTNESS_OUTPUT_DAYLIGHT < BRIGHTNESS_OUTPUT_MAX_DAYLIGHT);

// =============================================================================
// Diagnostics
// =============================================================================

/// Maximum wait for the diagnostic stream lock before a write is skipped (ms).
pub const DIAG_LOCK_TIMEOUT_MS: u32 = 20;

/// Log decode failures.
pub const DEBUG_ERROR: bool = true;

/// Log every decoded message.
pub const DEBUG_N2K_MESSAGES: bool = true;

/// Log backlight duty changes.
pub const DEBUG_DISPLAY_BRIGHTNESS: bool = true;

/// Periodically log per-message statistics.
pub const DEBUG_N2K_STATISTICS: bool = true;

// =============================================================================
// Task Periods
// =============================================================================

/// Inter-iteration delays of the periodic activities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskPeriods {
    /// Decode dispatcher pass.
    pub decode_ms: u32,
    /// Render pipeline frame.
    pub render_ms: u32,
    /// Brightness control loop.
    pub brightness_ms: u32,
    /// Diagnostic ring drain.
    pub diag_drain_ms: u32,
    /// Message statistics report.
    pub stats_report_ms: u32,
    /// Demo engine frame interval.
    pub demo_frame_ms: u32,
}

impl TaskPeriods {
    /// Default schedule.
    pub const DEFAULT: Self = Self {
        decode_ms: 5,
        render_ms: 40,
        brightness_ms: 250,
        diag_drain_ms: 50,
        stats_report_ms: 10_000,
        demo_frame_ms: 50,
    };
}

impl Default for TaskPeriods {
    fn default() -> Self { Self::DEFAULT }
}

// Staleness must be detectable within a few render frames of expiring.
const _: () = assert!(TaskPeriods::DEFAULT.render_ms < ENGINE_RAPID_TIMEOUT_MS);
const _: () = assert!(TaskPeriods::DEFAULT.decode_ms < TaskPeriods::DEFAULT.render_ms);

#[cfg(test)]
#[allow(clippy::assertions_on_constants)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bytes() {
        assert_eq!(FRAME_BYTES, 115_200);
    }

    #[test]
    fn test_speed_text_centered() {
        let left = SPEED_TEXT_POSITION_X;
        let right = SCREEN_WIDTH as i32 - (SPEED_TEXT_POSITION_X + SPEED_TEXT_WIDTH as i32);
        assert_eq!(left, right);
    }

    #[test]
    fn test_brightness_threshold_ordering() {
        assert!(ANALOG_VALUE_MAX_DAYLIGHT < ANALOG_VALUE_DAYLIGHT);
        assert!(ANALOG_VALUE_DAYLIGHT < ANALOG_VALUE_NIGHT);
    }

    #[test]
    fn test_default_periods() {
        assert_eq!(TaskPeriods::default(), TaskPeriods::DEFAULT);
        assert!(TaskPeriods::DEFAULT.brightness_ms > TaskPeriods::DEFAULT.render_ms);
    }
}
