//! Little-endian field reader for N2K payloads.
//!
//! Every N2K data field reserves its top values: an all-ones unsigned field
//! (or max-positive signed field) means "data not available". The `*_opt`
//! readers map that sentinel to `None`, so a sender that does not measure a
//! value cannot overwrite a good reading with garbage.

use core::fmt;

/// Payload decode failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Payload shorter than the message layout.
    Truncated {
        /// Bytes the layout requires.
        needed: usize,
        /// Bytes actually present.
        got: usize,
    },
    /// A field decoded but holds a value outside its valid range.
    OutOfRange(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Truncated { needed, got } => write!(f, "truncated: need {needed} bytes, got {got}"),
            Self::OutOfRange(field) => write!(f, "{field} out of range"),
        }
    }
}

/// Cursor over a payload with a fixed minimum length.
pub struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    /// Wrap `data`, failing with [`DecodeError::Truncated`] if it is shorter
    /// than `layout_len`. All reads within `layout_len` are then infallible.
    pub fn new(
        data: &'a [u8],
        layout_len: usize,
    ) -> Result<Self, DecodeError> {
        if data.len() < layout_len {
            return Err(DecodeError::Truncated {
                needed: layout_len,
                got: data.len(),
            });
        }
        Ok(Self { data, pos: 0 })
    }

    /// Current byte offset.
    #[inline]
    pub const fn position(&self) -> usize { self.pos }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        // Past the layout length (caller bug) reads as "not available".
        match self.data.get(self.pos..self.pos + N) {
            Some(bytes) => out.copy_from_slice(bytes),
            None => out = [0xFF; N],
        }
        self.pos += N;
        out
    }

    /// Skip `n` bytes.
    pub fn skip(
        &mut self,
        n: usize,
    ) {
        self.pos += n;
    }

    /// Raw byte.
    pub fn u8(&mut self) -> u8 { self.take::<1>()[0] }

    /// Raw little-endian u16.
    pub fn u16(&mut self) -> u16 { u16::from_le_bytes(self.take()) }

    /// Raw little-endian u32.
    pub fn u32(&mut self) -> u32 { u32::from_le_bytes(self.take()) }

    /// Byte, `None` if `0xFF`.
    pub fn u8_opt(&mut self) -> Option<u8> { Some(self.u8()).filter(|&v| v != u8::MAX) }

    /// u16, `None` if `0xFFFF`.
    pub fn u16_opt(&mut self) -> Option<u16> { Some(self.u16()).filter(|&v| v != u16::MAX) }

    /// u32, `None` if `0xFFFF_FFFF`.
    pub fn u32_opt(&mut self) -> Option<u32> { Some(self.u32()).filter(|&v| v != u32::MAX) }

    /// i8, `None` if `0x7F`.
    pub fn i8_opt(&mut self) -> Option<i8> {
        Some(self.u8() as i8).filter(|&v| v != i8::MAX)
    }

    /// i16, `None` if `0x7FFF`.
    pub fn i16_opt(&mut self) -> Option<i16> {
        Some(i16::from_le_bytes(self.take())).filter(|&v| v != i16::MAX)
    }

    /// u16 scaled by `resolution`, `None` if not available.
    pub fn u16_scaled(
        &mut self,
        resolution: f32,
    ) -> Option<f32> {
        self.u16_opt().map(|v| f32::from(v) * resolution)
    }

    /// i16 scaled by `resolution`, `None` if not available.
    pub fn i16_scaled(
        &mut self,
        resolution: f32,
    ) -> Option<f32> {
        self.i16_opt().map(|v| f32::from(v) * resolution)
    }

    /// u32 scaled by `resolution`, `None` if not available.
    pub fn u32_scaled(
        &mut self,
        resolution: f32,
    ) -> Option<f32> {
        self.u32_opt().map(|v| v as f32 * resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_payload() {
        let err = PayloadReader::new(&[0u8; 5], 8).err();
        assert_eq!(err, Some(DecodeError::Truncated { needed: 8, got: 5 }));
    }

    #[test]
    fn test_little_endian_reads() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xAB];
        let mut r = PayloadReader::new(&data, data.len()).unwrap();
        assert_eq!(r.u16(), 0x1234);
        assert_eq!(r.u32(), 0x1234_5678);
        assert_eq!(r.u8(), 0xAB);
        assert_eq!(r.position(), 7);
    }

    #[test]
    fn test_not_available_sentinels() {
        let data = [0xFF, 0xFF, 0xFF, 0x7F, 0xFF, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut r = PayloadReader::new(&data, data.len()).unwrap();
        assert_eq!(r.u8_opt(), None);
        assert_eq!(r.u16_opt(), None);
        assert_eq!(r.u8_opt(), Some(0x7F));
        assert_eq!(r.i16_opt(), None);
        assert_eq!(r.u32_opt(), None);
        assert_eq!(r.position(), data.len());
    }

    #[test]
    fn test_signed_all_ones_is_minus_one() {
        let data = [0xFF, 0xFF, 0xFF];
        let mut r = PayloadReader::new(&data, data.len()).unwrap();
        assert_eq!(r.i16_opt(), Some(-1));
        assert_eq!(r.i8_opt(), Some(-1));
    }

    #[test]
    fn test_signed_values() {
        let data = [0x80, 0x00, 0x80];
        let mut r = PayloadReader::new(&data, data.len()).unwrap();
        assert_eq!(r.i8_opt(), Some(i8::MIN));
        assert_eq!(r.i16_opt(), Some(i16::MIN));
    }

    #[test]
    fn test_scaled_read() {
        // 3456 rpm at 0.25 rpm/bit
        let raw = (3456u16 * 4).to_le_bytes();
        let mut r = PayloadReader::new(&raw, 2).unwrap();
        assert_eq!(r.u16_scaled(0.25), Some(3456.0));
    }

    #[test]
    fn test_error_display() {
        use core::fmt::Write;
        let mut s: heapless::String<64> = heapless::String::new();
        write!(s, "{}", DecodeError::Truncated { needed: 26, got: 8 }).unwrap();
        assert_eq!(s.as_str(), "truncated: need 26 bytes, got 8");
    }
}
