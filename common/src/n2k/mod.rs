//! NMEA 2000 message types handled by the gauge.
//!
//! The bus stack hands the core fully reassembled messages: a PGN, header
//! bytes, and the raw payload. Decoding of the payload into typed fields
//! happens in [`pgn`], on top of the little-endian field reader in [`fields`].

pub mod fields;
pub mod pgn;

use heapless::Vec;

pub use fields::{DecodeError, PayloadReader};
pub use pgn::{
    EngineDynamic, EngineRapid, EngineStatus1, EngineStatus2, Gear, SystemTime, TimeSource,
    Transmission,
};

/// Largest reassembled fast-packet payload.
pub const MAX_PAYLOAD: usize = 223;

/// System Time.
pub const PGN_SYSTEM_TIME: u32 = 126_992;
/// Engine Parameters, Rapid Update.
pub const PGN_ENGINE_RAPID: u32 = 127_488;
/// Engine Parameters, Dynamic.
pub const PGN_ENGINE_DYNAMIC: u32 = 127_489;
/// Transmission Parameters, Dynamic.
pub const PGN_TRANSMISSION: u32 = 127_493;

/// A parsed bus message: identifier, header and opaque payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct N2kMessage {
    /// Parameter group number.
    pub pgn: u32,
    /// CAN priority (0 highest, 7 lowest).
    pub priority: u8,
    /// Source address of the sender.
    pub source: u8,
    /// Reassembled payload bytes.
    pub data: Vec<u8, MAX_PAYLOAD>,
}

impl N2kMessage {
    /// Build a message from a payload slice.
    ///
    /// Returns `None` if the payload exceeds [`MAX_PAYLOAD`].
    pub fn new(
        pgn: u32,
        priority: u8,
        source: u8,
        payload: &[u8],
    ) -> Option<Self> {
        let data = Vec::from_slice(payload).ok()?;
        Some(Self {
            pgn,
            priority,
            source,
            data,
        })
    }

    /// Payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] { &self.data }
}

/// Non-blocking inbound message queue.
///
/// Implemented by whatever sits between the bus receive loop and the decoder:
/// an embassy channel receiver on the firmware, an mpsc receiver in the
/// simulator, a `Vec` in tests.
pub trait MessageSource {
    /// Next pending message, or `None` if the queue is empty right now.
    fn try_next(&mut self) -> Option<N2kMessage>;
}

impl<T: MessageSource + ?Sized> MessageSource for &mut T {
    fn try_next(&mut self) -> Option<N2kMessage> { (**self).try_next() }
}

impl<M, const N: usize> MessageSource for embassy_sync::channel::Receiver<'_, M, N2kMessage, N>
where
    M: embassy_sync::blocking_mutex::raw::RawMutex,
{
    fn try_next(&mut self) -> Option<N2kMessage> { self.try_receive().ok() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_new_rejects_oversized_payload() {
        let big = [0u8; MAX_PAYLOAD + 1];
        assert!(N2kMessage::new(PGN_ENGINE_RAPID, 2, 0, &big).is_none());
        let fits = [0u8; MAX_PAYLOAD];
        assert!(N2kMessage::new(PGN_ENGINE_RAPID, 2, 0, &fits).is_some());
    }

    #[test]
    fn test_channel_receiver_as_source() {
        use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
        use embassy_sync::channel::Channel;

        let channel: Channel<CriticalSectionRawMutex, N2kMessage, 4> = Channel::new();
        let mut rx = channel.receiver();
        assert!(rx.try_next().is_none());

        let msg = N2kMessage::new(PGN_SYSTEM_TIME, 3, 7, &[1, 2, 3]).unwrap();
        channel.try_send(msg.clone()).unwrap();
        assert_eq!(rx.try_next(), Some(msg));
        assert!(rx.try_next().is_none());
    }
}
