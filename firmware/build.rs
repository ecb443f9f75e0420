use std::env;
use std::path::Path;

mod credentials;

const DEFAULT_SSID: &str = "ESP32-AP";
const DEFAULT_PASSWORD: &str = "12345678";

fn main() {
    load_access_point_credentials();

    // Linker scripts only exist for the device target; host builds run unit tests.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        println!("cargo:rustc-link-arg=-Tdefmt.x");
        // linkall.x must stay last.
        println!("cargo:rustc-link-arg=-Tlinkall.x");
    }
}

/// Exports `AP_SSID` / `AP_PASSWORD` to the crate, preferring the process
/// environment over a `.env` file and falling back to the factory defaults.
fn load_access_point_credentials() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-env-changed=AP_SSID");
    println!("cargo:rerun-if-env-changed=AP_PASSWORD");

    if Path::new(".env").exists() {
        if let Err(err) = dotenvy::dotenv() {
            println!("cargo:warning=failed to load .env: {err}");
        }
    }

    let ssid = credential("AP_SSID", DEFAULT_SSID);
    let password = credential("AP_PASSWORD", DEFAULT_PASSWORD);

    println!("cargo:rustc-env=AP_SSID={ssid}");
    println!("cargo:rustc-env=AP_PASSWORD={password}");
    if password.is_empty() {
        println!("cargo:warning=AP_PASSWORD is empty; the access point will be open");
    }
}

fn credential(name: &str, fallback: &str) -> String {
    match credentials::resolve(env::var(name), fallback) {
        Ok(value) => value,
        Err(err) => panic!("{name}: {err}"),
    }
}
