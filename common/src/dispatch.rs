//! Decode dispatcher: routes inbound messages to their handlers.
//!
//! Runs inline in the bus receive path, so a call never blocks: lookup is a
//! linear scan over a four-row table, handlers only decode and copy, and
//! diagnostics use the bounded-wait writer. A bad payload is counted and
//! logged, never propagated.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::clock::Clock;
use crate::config::{DISPLAY_ENGINE_INSTANCE, MAX_DISPATCH_BATCH};
use crate::diag::{DiagConfig, DiagLog, LogLevel};
use crate::n2k::{DecodeError, MessageSource, N2kMessage};
use crate::registry::{HandlerContext, MessageRegistry};
use crate::stats::MessageStatistics;
use crate::store::TelemetrySink;

/// Dispatcher settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Engine instance whose values are applied to the store.
    pub instance: u8,
    /// Upper bound on messages handled per [`Dispatcher::process_pending`].
    pub max_batch: usize,
    pub diag: DiagConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            instance: DISPLAY_ENGINE_INSTANCE,
            max_batch: MAX_DISPATCH_BATCH,
            diag: DiagConfig::default(),
        }
    }
}

/// Outcome of dispatching one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// No handler for this PGN; nothing changed.
    Unhandled,
    /// Decoded. `applied` is false when the instance did not match.
    Decoded { applied: bool },
    /// Handler rejected the payload.
    Failed(DecodeError),
}

/// Totals for one [`Dispatcher::process_pending`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub decoded: usize,
    pub failed: usize,
    pub unhandled: usize,
}

impl BatchReport {
    /// Messages taken from the source.
    pub const fn total(&self) -> usize { self.decoded + self.failed + self.unhandled }
}

/// Routes messages through a registry, updating statistics and the store.
pub struct Dispatcher<'a, M: RawMutex, C: Clock, const N: usize> {
    registry: &'a MessageRegistry<N>,
    stats: &'a MessageStatistics<N>,
    sink: &'a dyn TelemetrySink,
    diag: &'a DiagLog<M>,
    clock: C,
    config: DispatchConfig,
}

impl<'a, M: RawMutex, C: Clock, const N: usize> Dispatcher<'a, M, C, N> {
    pub fn new(
        registry: &'a MessageRegistry<N>,
        stats: &'a MessageStatistics<N>,
        sink: &'a dyn TelemetrySink,
        diag: &'a DiagLog<M>,
        clock: C,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            stats,
            sink,
            diag,
            clock,
            config,
        }
    }

    /// Decode one message and apply it if it concerns the configured instance.
    ///
    /// Any decode of a tracked PGN refreshes its last-seen time, whichever
    /// instance sent it.
    pub fn dispatch(
        &self,
        msg: &N2kMessage,
    ) -> Dispatch {
        let Some(entry) = self.registry.lookup(msg.pgn) else {
            return Dispatch::Unhandled;
        };
        let ctx = HandlerContext {
            sink: self.sink,
            instance: self.config.instance,
        };

        match (entry.handler)(msg.payload(), &ctx) {
            Ok(outcome) => {
                self.stats.record_success(msg.pgn, self.clock.now_ms());
                if self.config.diag.log_messages {
                    self.diag.write(
                        &self.clock,
                        self.config.diag.lock_timeout_ms,
                        LogLevel::Debug,
                        format_args!("{}", outcome.decoded),
                    );
                }
                Dispatch::Decoded {
                    applied: outcome.applied,
                }
            }
            Err(err) => {
                self.stats.record_failure(msg.pgn);
                if self.config.diag.log_errors {
                    self.diag.write(
                        &self.clock,
                        self.config.diag.lock_timeout_ms,
                        LogLevel::Warn,
                        format_args!("{} ({}) from {}: {err}", entry.name, msg.pgn, msg.source),
                    );
                }
                Dispatch::Failed(err)
            }
        }
    }

    /// Dispatch up to `max_batch` pending messages from `source`.
    ///
    /// Returns as soon as the source is empty.
    pub fn process_pending<S: MessageSource + ?Sized>(
        &self,
        source: &mut S,
        max_batch: usize,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        while report.total() < max_batch {
            let Some(msg) = source.try_next() else {
                break;
            };
            match self.dispatch(&msg) {
                Dispatch::Unhandled => report.unhandled += 1,
                Dispatch::Decoded { .. } => report.decoded += 1,
                Dispatch::Failed(_) => report.failed += 1,
            }
        }
        report
    }

    /// [`Self::process_pending`] with the configured batch size.
    pub fn poll<S: MessageSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> BatchReport {
        self.process_pending(source, self.config.max_batch)
    }

    pub const fn config(&self) -> &DispatchConfig { &self.config }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::*;
    use crate::clock::ManualClock;
    use crate::n2k::{EngineDynamic, EngineRapid, PGN_ENGINE_DYNAMIC, PGN_ENGINE_RAPID};
    use crate::registry::ENGINE_GAUGE_HANDLERS;
    use crate::store::TelemetryStore;

    type Store = TelemetryStore<CriticalSectionRawMutex>;
    type Log = DiagLog<CriticalSectionRawMutex>;

    struct Fixture {
        stats: MessageStatistics<4>,
        store: Store,
        diag: Log,
        clock: ManualClock,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                stats: MessageStatistics::new(ENGINE_GAUGE_HANDLERS.ids(), PGN_ENGINE_RAPID, 10_000),
                store: Store::new(),
                diag: Log::new(),
                clock: ManualClock::new(1_000),
            }
        }

        fn dispatcher(&self) -> Dispatcher<'_, CriticalSectionRawMutex, &ManualClock, 4> {
            Dispatcher::new(
                &ENGINE_GAUGE_HANDLERS,
                &self.stats,
                &self.store,
                &self.diag,
                &self.clock,
                DispatchConfig::default(),
            )
        }
    }

    impl MessageSource for VecDeque<N2kMessage> {
        fn try_next(&mut self) -> Option<N2kMessage> { self.pop_front() }
    }

    fn rapid(
        instance: u8,
        rpm: f32,
    ) -> N2kMessage {
        let payload = EngineRapid {
            instance,
            speed_rpm: Some(rpm),
            boost_pressure_pa: None,
            tilt_trim: None,
        }
        .encode();
        N2kMessage::new(PGN_ENGINE_RAPID, 2, 23, &payload).unwrap()
    }

    #[test]
    fn test_matching_instance_updates_store() {
        let f = Fixture::new();
        let d = f.dispatcher();
        assert_eq!(d.dispatch(&rapid(0, 3456.0)), Dispatch::Decoded { applied: true });
        assert_eq!(f.store.snapshot().engine_speed_rpm, 3456.0);
        assert_eq!(f.stats.counts(PGN_ENGINE_RAPID), (1, 0));
    }

    #[test]
    fn test_other_instance_counts_but_does_not_apply() {
        let f = Fixture::new();
        let d = f.dispatcher();
        d.dispatch(&rapid(0, 3456.0));
        f.clock.advance(500);
        assert_eq!(d.dispatch(&rapid(1, 999.0)), Dispatch::Decoded { applied: false });
        assert_eq!(f.store.snapshot().engine_speed_rpm, 3456.0);
        assert_eq!(f.stats.counts(PGN_ENGINE_RAPID), (2, 0));
        // Staleness timer is refreshed by any instance
        assert_eq!(f.stats.last_seen_ms(PGN_ENGINE_RAPID), Some(1_500));
    }

    #[test]
    fn test_unknown_pgn_is_a_no_op() {
        let f = Fixture::new();
        let d = f.dispatcher();
        let msg = N2kMessage::new(130_306, 2, 5, &[0; 8]).unwrap();
        assert_eq!(d.dispatch(&msg), Dispatch::Unhandled);
        for (pgn, _) in ENGINE_GAUGE_HANDLERS.ids() {
            assert_eq!(f.stats.counts(pgn), (0, 0));
        }
        assert_eq!(f.store.snapshot(), crate::store::TelemetrySnapshot::DEFAULT);
        assert_eq!(f.diag.drain(|_| {}), 0);
    }

    #[test]
    fn test_decode_failure_counted_and_logged() {
        let f = Fixture::new();
        let d = f.dispatcher();
        let msg = N2kMessage::new(PGN_ENGINE_DYNAMIC, 3, 23, &[0; 12]).unwrap();
        assert_eq!(
            d.dispatch(&msg),
            Dispatch::Failed(DecodeError::Truncated { needed: 26, got: 12 })
        );
        assert_eq!(f.stats.counts(PGN_ENGINE_DYNAMIC), (0, 1));
        assert_eq!(f.stats.last_seen_ms(PGN_ENGINE_DYNAMIC), Some(0));

        let mut lines = std::vec::Vec::new();
        f.diag.drain(|e| lines.push((e.level, std::string::String::from(e.message.as_str()))));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, LogLevel::Warn);
        assert!(lines[0].1.starts_with("EngineDynamic (127489) from 23"));
    }

    #[test]
    fn test_failure_then_success_keeps_going() {
        let f = Fixture::new();
        let d = f.dispatcher();
        let mut queue: VecDeque<N2kMessage> = VecDeque::new();
        queue.push_back(N2kMessage::new(PGN_ENGINE_RAPID, 2, 1, &[0; 3]).unwrap());
        queue.push_back(N2kMessage::new(59_904, 6, 1, &[0; 3]).unwrap());
        queue.push_back(rapid(0, 1800.0));
        let report = d.process_pending(&mut queue, 16);
        assert_eq!(
            report,
            BatchReport {
                decoded: 1,
                failed: 1,
                unhandled: 1
            }
        );
        assert_eq!(f.store.snapshot().engine_speed_rpm, 1800.0);
        assert_eq!(f.stats.counts(PGN_ENGINE_RAPID), (1, 1));
    }

    #[test]
    fn test_process_pending_respects_batch_limit() {
        let f = Fixture::new();
        let d = f.dispatcher();
        let mut queue: VecDeque<N2kMessage> = (0..10).map(|i| rapid(0, i as f32 * 100.0)).collect();
        assert_eq!(d.process_pending(&mut queue, 4).total(), 4);
        assert_eq!(queue.len(), 6);
        assert_eq!(f.store.snapshot().engine_speed_rpm, 300.0);
        assert_eq!(d.poll(&mut queue).total(), 6);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_process_pending_empty_source_returns_immediately() {
        let f = Fixture::new();
        let d = f.dispatcher();
        let mut queue: VecDeque<N2kMessage> = VecDeque::new();
        assert_eq!(d.process_pending(&mut queue, 16), BatchReport::default());
    }

    #[test]
    fn test_dynamic_end_to_end() {
        let f = Fixture::new();
        let d = f.dispatcher();
        let payload = EngineDynamic {
            instance: 0,
            coolant_temperature_k: Some(crate::units::celsius_to_kelvin(101.0)),
            status1: Some(crate::n2k::EngineStatus1(1 << 2)),
            ..EngineDynamic::EMPTY
        }
        .encode();
        let msg = N2kMessage::new(PGN_ENGINE_DYNAMIC, 2, 23, &payload).unwrap();
        assert_eq!(d.dispatch(&msg), Dispatch::Decoded { applied: true });
        let snap = f.store.snapshot();
        assert!((snap.coolant_temp_c - 101.0).abs() < 0.01);
        assert!(snap.low_oil_pressure_warning);
    }

    #[test]
    fn test_diag_lock_busy_does_not_block_dispatch() {
        let f = Fixture::new();
        let d = f.dispatcher();
        // Hold the diag ring; the clock would never advance on its own, so use
        // a zero bound to keep the test from spinning.
        let d = Dispatcher::new(
            &ENGINE_GAUGE_HANDLERS,
            &f.stats,
            &f.store,
            &f.diag,
            &f.clock,
            DispatchConfig {
                diag: DiagConfig {
                    lock_timeout_ms: 0,
                    ..DiagConfig::default()
                },
                ..*d.config()
            },
        );
        let _held = f.diag.lock_within(&f.clock, 0).unwrap();
        assert_eq!(d.dispatch(&rapid(0, 2500.0)), Dispatch::Decoded { applied: true });
        assert_eq!(f.store.snapshot().engine_speed_rpm, 2500.0);
        assert_eq!(f.diag.dropped(), 1);
    }
}
