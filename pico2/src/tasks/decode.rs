//! Decode task: the only writer of the telemetry store.

use defmt::{debug, info};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Ticker};
use gauge_common::config::INBOX_CAPACITY;
use gauge_common::dispatch::{DispatchConfig, Dispatcher};
use gauge_common::n2k::N2kMessage;

use super::{DIAG, EmbassyClock, REGISTRY, STORE, Statistics};

/// Drain the inbox every `period`, at most one batch per pass.
///
/// Never waits on the inbox: an empty queue just ends the pass.
#[embassy_executor::task]
pub async fn decode_task(
    mut inbox: Receiver<'static, CriticalSectionRawMutex, N2kMessage, INBOX_CAPACITY>,
    stats: &'static Statistics,
    config: DispatchConfig,
    period: Duration,
) {
    info!("Decode task started (instance {})", config.instance);

    let dispatcher = Dispatcher::new(&REGISTRY, stats, &STORE, &DIAG, EmbassyClock, config);
    let mut ticker = Ticker::every(period);

    loop {
        let report = dispatcher.poll(&mut inbox);
        if report.failed > 0 || report.unhandled > 0 {
            debug!(
                "Decode pass: {} ok, {} failed, {} unhandled",
                report.decoded, report.failed, report.unhandled
            );
        }
        ticker.next().await;
    }
}
