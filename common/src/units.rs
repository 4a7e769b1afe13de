//! Unit conversions from NMEA 2000 SI units to gauge display units.
//!
//! The bus reports temperatures in Kelvin, durations in seconds and pressures
//! in Pascal. The gauge shows °C, hours and millibar.

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: f32 = 3600.0;

/// Pascal per millibar.
pub const PASCAL_PER_MILLIBAR: f32 = 100.0;

/// Convert Kelvin to degrees Celsius.
#[inline]
pub fn kelvin_to_celsius(kelvin: f32) -> f32 { kelvin - KELVIN_OFFSET }

/// Convert degrees Celsius to Kelvin.
#[inline]
pub fn celsius_to_kelvin(celsius: f32) -> f32 { celsius + KELVIN_OFFSET }

/// Convert seconds to hours.
#[inline]
pub fn seconds_to_hours(seconds: f32) -> f32 { seconds / SECONDS_PER_HOUR }

/// Convert Pascal to millibar.
#[inline]
pub fn pascal_to_millibar(pascal: f32) -> f32 { pascal / PASCAL_PER_MILLIBAR }

/// Convert Pascal to bar.
#[inline]
pub fn pascal_to_bar(pascal: f32) -> f32 { pascal / 100_000.0 }

// =============================================================================
// Unit Tests
// =============================================================================
