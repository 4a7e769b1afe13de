//! Fixed PGN -> handler table.
//!
//! A handler decodes one payload and, when the message belongs to the engine
//! instance this gauge displays, applies it to the telemetry sink. Other
//! instances are still decoded so the statistics count them.

use core::fmt;

use crate::n2k::{
    DecodeError, EngineDynamic, EngineRapid, PGN_ENGINE_DYNAMIC, PGN_ENGINE_RAPID,
    PGN_SYSTEM_TIME, PGN_TRANSMISSION, SystemTime, Transmission,
};
use crate::store::TelemetrySink;

/// What a handler is given besides the payload.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Where accepted values are written.
    pub sink: &'a dyn TelemetrySink,
    /// Engine instance this display shows.
    pub instance: u8,
}

/// A decoded payload, kept for logging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decoded {
    SystemTime(SystemTime),
    EngineRapid(EngineRapid),
    EngineDynamic(EngineDynamic),
    Transmission(Transmission),
}

impl fmt::Display for Decoded {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::SystemTime(m) => write!(f, "system time {m}"),
            Self::EngineRapid(m) => fmt::Display::fmt(m, f),
            Self::EngineDynamic(m) => fmt::Display::fmt(m, f),
            Self::Transmission(m) => fmt::Display::fmt(m, f),
        }
    }
}

/// Result of a successful handler call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandlerOutcome {
    pub decoded: Decoded,
    /// Whether anything was written to the sink.
    pub applied: bool,
}

/// Decode-and-apply function.
pub type Handler = fn(&[u8], &HandlerContext<'_>) -> Result<HandlerOutcome, DecodeError>;

/// One table row.
#[derive(Clone, Copy)]
pub struct HandlerRegistration {
    pub pgn: u32,
    pub name: &'static str,
    pub handler: Handler,
}

/// Statically sized handler table, searched in order.
pub struct MessageRegistry<const N: usize> {
    entries: [HandlerRegistration; N],
}

impl<const N: usize> MessageRegistry<N> {
    /// Build a table. PGNs must be unique; the first match wins otherwise.
    pub const fn new(entries: [HandlerRegistration; N]) -> Self { Self { entries } }

    /// Handler registered for `pgn`.
    pub fn lookup(
        &self,
        pgn: u32,
    ) -> Option<&HandlerRegistration> {
        self.entries.iter().find(|e| e.pgn == pgn)
    }

    /// Rows in table order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerRegistration> { self.entries.iter() }

    /// (pgn, name) of every row, for sizing the statistics table.
    pub fn ids(&self) -> [(u32, &'static str); N] { self.entries.map(|e| (e.pgn, e.name)) }

    /// Number of rows.
    pub const fn len(&self) -> usize { N }

    pub const fn is_empty(&self) -> bool { N == 0 }
}

// =============================================================================
// Engine Gauge Handlers
// =============================================================================

fn handle_system_time(
    data: &[u8],
    _ctx: &HandlerContext<'_>,
) -> Result<HandlerOutcome, DecodeError> {
    Ok(HandlerOutcome {
        decoded: Decoded::SystemTime(SystemTime::decode(data)?),
        applied: false,
    })
}

fn handle_engine_rapid(
    data: &[u8],
    ctx: &HandlerContext<'_>,
) -> Result<HandlerOutcome, DecodeError> {
    let msg = EngineRapid::decode(data)?;
    let applied = msg.instance == ctx.instance;
    if applied {
        ctx.sink.apply_engine_rapid(&msg);
    }
    Ok(HandlerOutcome {
        decoded: Decoded::EngineRapid(msg),
        applied,
    })
}

fn handle_engine_dynamic(
    data: &[u8],
    ctx: &HandlerContext<'_>,
) -> Result<HandlerOutcome, DecodeError> {
    let msg = EngineDynamic::decode(data)?;
    let applied = msg.instance == ctx.instance;
    if applied {
        ctx.sink.apply_engine_dynamic(&msg);
    }
    Ok(HandlerOutcome {
        decoded: Decoded::EngineDynamic(msg),
        applied,
    })
}

fn handle_transmission(
    data: &[u8],
    _ctx: &HandlerContext<'_>,
) -> Result<HandlerOutcome, DecodeError> {
    Ok(HandlerOutcome {
        decoded: Decoded::Transmission(Transmission::decode(data)?),
        applied: false,
    })
}

/// The four messages the engine gauge listens to.
pub const ENGINE_GAUGE_HANDLERS: MessageRegistry<4> = MessageRegistry::new([
    HandlerRegistration {
        pgn: PGN_SYSTEM_TIME,
        name: "SystemTime",
        handler: handle_system_time,
    },
    HandlerRegistration {
        pgn: PGN_ENGINE_RAPID,
        name: "EngineRapid",
        handler: handle_engine_rapid,
    },
    HandlerRegistration {
        pgn: PGN_ENGINE_DYNAMIC,
        name: "EngineDynamic",
        handler: handle_engine_dynamic,
    },
    HandlerRegistration {
        pgn: PGN_TRANSMISSION,
        name: "Transmission",
        handler: handle_transmission,
    },
]);

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    /// Sink that only counts writes.
    #[derive(Default)]
    struct CountingSink {
        rapid: Cell<u32>,
        dynamic: Cell<u32>,
    }

    impl TelemetrySink for CountingSink {
        fn apply_engine_rapid(
            &self,
            _update: &EngineRapid,
        ) {
            self.rapid.set(self.rapid.get() + 1);
        }

        fn apply_engine_dynamic(
            &self,
            _update: &EngineDynamic,
        ) {
            self.dynamic.set(self.dynamic.get() + 1);
        }
    }

    fn rapid_payload(instance: u8) -> [u8; 8] {
        EngineRapid {
            instance,
            speed_rpm: Some(800.0),
            boost_pressure_pa: None,
            tilt_trim: None,
        }
        .encode()
    }

    #[test]
    fn test_table_order_and_ids() {
        let ids = ENGINE_GAUGE_HANDLERS.ids();
        assert_eq!(
            ids,
            [
                (126_992, "SystemTime"),
                (127_488, "EngineRapid"),
                (127_489, "EngineDynamic"),
                (127_493, "Transmission"),
            ]
        );
        assert_eq!(ENGINE_GAUGE_HANDLERS.len(), 4);
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(ENGINE_GAUGE_HANDLERS.lookup(59_904).is_none());
        assert!(ENGINE_GAUGE_HANDLERS.lookup(0).is_none());
    }

    #[test]
    fn test_instance_filter() {
        let sink = CountingSink::default();
        let ctx = HandlerContext {
            sink: &sink,
            instance: 0,
        };
        let entry = ENGINE_GAUGE_HANDLERS.lookup(PGN_ENGINE_RAPID).unwrap();

        let outcome = (entry.handler)(&rapid_payload(0), &ctx).unwrap();
        assert!(outcome.applied);
        assert_eq!(sink.rapid.get(), 1);

        let outcome = (entry.handler)(&rapid_payload(1), &ctx).unwrap();
        assert!(!outcome.applied);
        assert_eq!(sink.rapid.get(), 1);
    }

    #[test]
    fn test_dynamic_other_instance_not_applied() {
        let sink = CountingSink::default();
        let ctx = HandlerContext {
            sink: &sink,
            instance: 2,
        };
        let payload = EngineDynamic {
            instance: 0,
            ..EngineDynamic::EMPTY
        }
        .encode();
        let entry = ENGINE_GAUGE_HANDLERS.lookup(PGN_ENGINE_DYNAMIC).unwrap();
        let outcome = (entry.handler)(&payload, &ctx).unwrap();
        assert!(!outcome.applied);
        assert_eq!(sink.dynamic.get(), 0);
    }

    #[test]
    fn test_log_only_handlers_never_apply() {
        let sink = CountingSink::default();
        let ctx = HandlerContext {
            sink: &sink,
            instance: 0,
        };
        let gear = [0, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let entry = ENGINE_GAUGE_HANDLERS.lookup(PGN_TRANSMISSION).unwrap();
        let outcome = (entry.handler)(&gear, &ctx).unwrap();
        assert!(!outcome.applied);
        assert_eq!((sink.rapid.get(), sink.dynamic.get()), (0, 0));
    }

    #[test]
    fn test_handler_propagates_decode_error() {
        let sink = CountingSink::default();
        let ctx = HandlerContext {
            sink: &sink,
            instance: 0,
        };
        let entry = ENGINE_GAUGE_HANDLERS.lookup(PGN_ENGINE_DYNAMIC).unwrap();
        let err = (entry.handler)(&[0; 10], &ctx).unwrap_err();
        assert_eq!(err, DecodeError::Truncated { needed: 26, got: 10 });
        assert_eq!(sink.dynamic.get(), 0);
    }
}
