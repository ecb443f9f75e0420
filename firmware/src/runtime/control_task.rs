use defmt::{Display2Format, info};
use embassy_time::{Duration, Ticker};

use super::{SharedRouter, log_status};
use crate::config;
use crate::hw::FirmwareInstant;

/// Drives auto-off expiry and history sampling.
#[embassy_executor::task]
pub async fn run(router: &'static SharedRouter) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(config::TICK_PERIOD_MS));
    loop {
        ticker.next().await;
        let now = FirmwareInstant::now();
        let report = router.lock(|cell| cell.borrow_mut().tick(now));
        if report.is_quiet() {
            continue;
        }

        if report.expired {
            info!("auto-off elapsed at {} ms; outlets off", now.as_millis());
        }
        if let Some(measurement) = report.sample {
            info!("sampled {}", Display2Format(&measurement));
        }
        log_status(router, now);
    }
}
