//! Synthetic bus source for bench runs without a CAN transceiver.

use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Ticker};
use gauge_common::config::INBOX_CAPACITY;
use gauge_common::demo::DemoEngine;
use gauge_common::n2k::N2kMessage;

/// Push one rapid + dynamic pair into the inbox every `period`.
#[embassy_executor::task]
pub async fn demo_bus_task(
    inbox: Sender<'static, CriticalSectionRawMutex, N2kMessage, INBOX_CAPACITY>,
    period: Duration,
) {
    info!("Demo bus source started");

    let mut engine = DemoEngine::new();
    let mut ticker = Ticker::every(period);

    loop {
        for msg in engine.next_frame() {
            // A full inbox means the decoder is behind; drop like a bus would.
            if inbox.try_send(msg).is_err() {
                warn!("Inbox full, demo frame dropped");
            }
        }
        ticker.next().await;
    }
}
