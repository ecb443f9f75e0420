#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Compile-time board configuration.
//!
//! Pin assignments (classic ESP32 DevKit):
//!
//! | function          | pin    |
//! |-------------------|--------|
//! | relay, outlet 1   | GPIO33 |
//! | relay, outlet 2   | GPIO25 |
//! | ready LED (green) | GPIO21 |
//! | idle LED (yellow) | GPIO19 |
//! | error LED (red)   | GPIO18 |
//! | ACS712 output     | GPIO35 (ADC1, 11 dB) |
//!
//! Pins are consumed by type in `runtime::main`; this table is the reference.

use core::fmt;
use core::net::Ipv4Addr;

/// Access point name, from `AP_SSID` at build time.
pub const AP_SSID: &str = env!("AP_SSID");
/// Access point passphrase, from `AP_PASSWORD` at build time. Empty means open.
pub const AP_PASSWORD: &str = env!("AP_PASSWORD");

pub const HOSTNAME: &str = "iotbulb";
pub const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);
pub const AP_PREFIX_LEN: u8 = 24;
pub const FIRST_LEASE: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 2);

pub const HTTP_PORT: u16 = 80;
pub const HTTP_WORKERS: usize = 2;
pub const HTTP_SOCKET_TIMEOUT_SECS: u64 = 10;
/// Request heads longer than this are cut off and parsed as-is.
pub const MAX_REQUEST_HEAD: usize = 1024;

/// Period of the control loop driving the auto-off timer and sampling.
pub const TICK_PERIOD_MS: u64 = 100;
pub const MDNS_ANNOUNCE_PERIOD_SECS: u64 = 30;

/// ADC reads per RMS window and their spacing; together one 50 Hz period.
pub const ADC_WINDOW: u32 = 200;
pub const ADC_SPACING_US: u32 = 100;

const SSID_MAX_LEN: usize = 32;
const WPA2_PASSWORD_LEN: core::ops::RangeInclusive<usize> = 8..=63;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApSecurity {
    Open,
    Wpa2Personal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialError {
    EmptySsid,
    SsidTooLong(usize),
    PasswordLength(usize),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::EmptySsid => f.write_str("SSID is empty"),
            CredentialError::SsidTooLong(len) => {
                write!(f, "SSID is {len} bytes (max {SSID_MAX_LEN})")
            }
            CredentialError::PasswordLength(len) => {
                write!(f, "password is {len} bytes (WPA2 needs 8..=63, or empty for open)")
            }
        }
    }
}

/// Picks the authentication mode implied by the configured credentials.
pub fn ap_security(ssid: &str, password: &str) -> Result<ApSecurity, CredentialError> {
    if ssid.is_empty() {
        return Err(CredentialError::EmptySsid);
    }
    if ssid.len() > SSID_MAX_LEN {
        return Err(CredentialError::SsidTooLong(ssid.len()));
    }
    match password.len() {
        0 => Ok(ApSecurity::Open),
        len if WPA2_PASSWORD_LEN.contains(&len) => Ok(ApSecurity::Wpa2Personal),
        len => Err(CredentialError::PasswordLength(len)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_credentials_are_wpa2() {
        assert_eq!(ap_security("ESP32-AP", "12345678"), Ok(ApSecurity::Wpa2Personal));
    }

    #[test]
    fn empty_password_opens_the_network() {
        assert_eq!(ap_security("ESP32-AP", ""), Ok(ApSecurity::Open));
    }

    #[test]
    fn rejects_unusable_credentials() {
        assert_eq!(ap_security("", "12345678"), Err(CredentialError::EmptySsid));
        assert_eq!(
            ap_security("ESP32-AP", "1234567"),
            Err(CredentialError::PasswordLength(7))
        );
        let long_ssid = "x".repeat(33);
        assert_eq!(
            ap_security(&long_ssid, "12345678"),
            Err(CredentialError::SsidTooLong(33))
        );
    }

    #[test]
    fn build_script_always_provides_credentials() {
        assert!(ap_security(AP_SSID, AP_PASSWORD).is_ok());
    }
}
