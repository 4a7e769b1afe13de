//! Diagnostic ring drain and periodic statistics report.

use defmt::{Display2Format, debug, error, info, trace, warn};
use embassy_time::{Duration, Ticker};
use gauge_common::clock::Clock;
use gauge_common::diag::LogLevel;

use super::{DIAG, EmbassyClock, Statistics};

/// Forward ring entries to defmt every `period`.
#[embassy_executor::task]
pub async fn diag_drain_task(period: Duration) {
    info!("Diagnostic drain task started");

    let mut ticker = Ticker::every(period);
    let mut reported_dropped = 0u32;

    loop {
        DIAG.drain(|entry| {
            let msg = entry.message.as_str();
            match entry.level {
                LogLevel::Trace => trace!("[{}] {}", entry.timestamp_ms, msg),
                LogLevel::Debug => debug!("[{}] {}", entry.timestamp_ms, msg),
                LogLevel::Info => info!("[{}] {}", entry.timestamp_ms, msg),
                LogLevel::Warn => warn!("[{}] {}", entry.timestamp_ms, msg),
                LogLevel::Error => error!("[{}] {}", entry.timestamp_ms, msg),
            }
        });

        let dropped = DIAG.dropped();
        if dropped != reported_dropped {
            warn!("{} diagnostic writes skipped on lock timeout", dropped.wrapping_sub(reported_dropped));
            reported_dropped = dropped;
        }

        ticker.next().await;
    }
}

/// Log one line per tracked PGN plus the staleness state every `period`.
#[embassy_executor::task]
pub async fn stats_report_task(
    stats: &'static Statistics,
    period: Duration,
) {
    let clock = EmbassyClock;
    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;

        let now = clock.now_ms();
        for summary in stats.summaries(now) {
            info!("{}", Display2Format(&summary));
        }
        info!("Engine speed timed out: {}", stats.is_primary_timed_out(now));
    }
}
