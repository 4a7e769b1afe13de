//! Color constants for the engine gauge.
//!
//! The coolant arc colors are the raw RGB565 words of the dial
//! artwork, so they are built with [`Rgb565`] from raw values rather than from
//! channel triples. Everything else uses the `RgbColor` trait constants where
//! one exists.

use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

/// Build a color from a raw big-endian RGB565 word.
#[inline]
pub const fn from_raw(raw: u16) -> Rgb565 {
    Rgb565::new((raw >> 11) as u8, ((raw >> 5) & 0x3F) as u8, (raw & 0x1F) as u8)
}

/// Raw RGB565 word of a color.
#[inline]
pub fn to_raw(color: Rgb565) -> u16 { RawU16::from(color).into_inner() }

// =============================================================================
// Standard Colors
// =============================================================================

/// Pure black. Dial face and text sprite background.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Pure white. Numeric overlays and tick marks.
pub const WHITE: Rgb565 = Rgb565::WHITE;

/// Pure red. Needle and low oil pressure badge.
pub const RED: Rgb565 = Rgb565::RED;

// =============================================================================
// Coolant Arc
// =============================================================================

/// Arc color in the normal operating range (dark green, 0x0D00).
pub const COOLANT_OK: Rgb565 = from_raw(0x0D00);

/// Arc color while the engine is still cold (gray, 0x528A).
pub const COOLANT_PASSIVE: Rgb565 = from_raw(0x528A);

/// Arc color above the critical temperature (red, 0xD800).
pub const COOLANT_CRITICAL: Rgb565 = from_raw(0xD800);

/// Unfilled part of the coolant track.
pub const COOLANT_TRACK: Rgb565 = Rgb565::new(4, 8, 4);

// =============================================================================
// Dial
// =============================================================================

/// Minor tick marks and captions.
pub const GRAY: Rgb565 = Rgb565::new(16, 32, 16);

/// Outer rim of the dial.
pub const RIM: Rgb565 = Rgb565::new(8, 16, 8);

/// Needle hub cap.
pub const HUB: Rgb565 = Rgb565::new(6, 12, 6);

/// Key color for sprite compositing: pixels of this color are never copied.
///
/// Pure magenta never appears in the dial artwork or the fonts.
pub const TRANSPARENT: Rgb565 = Rgb565::MAGENTA;
