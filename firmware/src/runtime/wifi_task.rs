use defmt::{Debug2Format, Display2Format, error, info, warn};
use embassy_time::{Duration, Timer};
use esp_wifi::wifi::{
    AccessPointConfiguration, AuthMethod, Configuration, WifiController, WifiEvent,
};

use crate::config::{self, ApSecurity};

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// Brings the soft access point up and restarts it whenever it stops.
#[embassy_executor::task]
pub async fn run(mut controller: WifiController<'static>) {
    let security = match config::ap_security(config::AP_SSID, config::AP_PASSWORD) {
        Ok(security) => security,
        Err(err) => {
            error!("access point disabled: {}", Display2Format(&err));
            return;
        }
    };
    let Some(ap_config) = access_point(security) else {
        error!("access point disabled: credentials do not fit the driver");
        return;
    };

    loop {
        if !matches!(controller.is_started(), Ok(true)) {
            if let Err(err) = controller.set_configuration(&ap_config) {
                warn!("Wi-Fi set_configuration error: {:?}", Debug2Format(&err));
                Timer::after(RESTART_DELAY).await;
                continue;
            }
            if let Err(err) = controller.start_async().await {
                warn!("Wi-Fi start_async error: {:?}", Debug2Format(&err));
                Timer::after(RESTART_DELAY).await;
                continue;
            }
            info!(
                "access point \"{}\" up at {} ({})",
                config::AP_SSID,
                Display2Format(&config::AP_ADDRESS),
                match security {
                    ApSecurity::Open => "open",
                    ApSecurity::Wpa2Personal => "WPA2",
                }
            );
        }

        controller.wait_for_event(WifiEvent::ApStop).await;
        warn!("access point stopped; restarting");
        Timer::after(RESTART_DELAY).await;
    }
}

fn access_point(security: ApSecurity) -> Option<Configuration> {
    let auth_method = match security {
        ApSecurity::Open => AuthMethod::None,
        ApSecurity::Wpa2Personal => AuthMethod::WPA2Personal,
    };
    Some(Configuration::AccessPoint(AccessPointConfiguration {
        ssid: config::AP_SSID.try_into().ok()?,
        password: config::AP_PASSWORD.try_into().ok()?,
        auth_method,
        ..Default::default()
    }))
}
