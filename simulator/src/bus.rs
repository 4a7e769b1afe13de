//! Host bus side: synthetic engine feed and decode loop threads.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::RawMutex;
use gauge_common::clock::Clock;
use gauge_common::demo::DemoEngine;
use gauge_common::dispatch::Dispatcher;
use gauge_common::n2k::{MessageSource, N2kMessage};

/// Switches shared between the window loop and the bus threads.
#[derive(Debug, Default)]
pub struct FeedControl {
    paused: AtomicBool,
    low_oil: AtomicBool,
    instance: AtomicU8,
    quit: AtomicBool,
}

impl FeedControl {
    /// Flip the paused flag, returning the new state.
    pub fn toggle_paused(&self) -> bool { !self.paused.fetch_xor(true, Ordering::Relaxed) }

    pub fn toggle_low_oil(&self) -> bool { !self.low_oil.fetch_xor(true, Ordering::Relaxed) }

    /// Alternate the transmitted engine instance between 0 and 1.
    pub fn toggle_instance(&self) -> u8 { self.instance.fetch_xor(1, Ordering::Relaxed) ^ 1 }

    pub fn request_quit(&self) { self.quit.store(true, Ordering::Relaxed); }

    pub fn should_quit(&self) -> bool { self.quit.load(Ordering::Relaxed) }
}

/// Inbox receiver drained by the dispatcher.
pub struct ChannelSource(pub Receiver<N2kMessage>);

impl MessageSource for ChannelSource {
    fn try_next(&mut self) -> Option<N2kMessage> { self.0.try_recv().ok() }
}

/// Push one demo frame per `period` unless paused.
pub fn run_feed(
    inbox: &SyncSender<N2kMessage>,
    control: &FeedControl,
    period: Duration,
) {
    let mut engine = DemoEngine::new();

    while !control.should_quit() {
        if !control.paused.load(Ordering::Relaxed) {
            engine.set_instance(control.instance.load(Ordering::Relaxed));
            engine.set_low_oil_pressure(control.low_oil.load(Ordering::Relaxed));
            for msg in engine.next_frame() {
                match inbox.try_send(msg) {
                    Ok(()) => {}
                    Err(TrySendError::Full(msg)) => eprintln!("[bus] inbox full, dropped PGN {}", msg.pgn),
                    Err(TrySendError::Disconnected(_)) => return,
                }
            }
        }
        thread::sleep(period);
    }
}

/// Poll the inbox every `period` until asked to quit.
pub fn run_decode<M, C, const N: usize>(
    dispatcher: &Dispatcher<'_, M, C, N>,
    source: &mut ChannelSource,
    control: &FeedControl,
    period: Duration,
) where
    M: RawMutex,
    C: Clock,
{
    while !control.should_quit() {
        let report = dispatcher.poll(source);
        if report.failed > 0 || report.unhandled > 0 {
            println!(
                "[decode] batch of {}: {} decoded, {} failed, {} unhandled",
                report.total(),
                report.decoded,
                report.failed,
                report.unhandled
            );
        }
        thread::sleep(period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_control_toggles() {
        let control = FeedControl::default();
        assert!(control.toggle_paused());
        assert!(!control.toggle_paused());
        assert!(control.toggle_low_oil());
        assert_eq!(control.toggle_instance(), 1);
        assert_eq!(control.toggle_instance(), 0);
        assert!(!control.should_quit());
        control.request_quit();
        assert!(control.should_quit());
    }
}
