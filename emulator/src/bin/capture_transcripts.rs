use std::io;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, SessionOptions};

const TRANSCRIPT_DIR: &str = "transcripts";

/// Scripted sessions whose transcripts document the controller behaviour.
const SCENARIOS: &[(&str, &[&str])] = &[
    (
        "auto-off",
        &[
            "/schedule?value=10",
            "status",
            "advance 9900ms",
            "status",
            "advance 200ms",
            "status",
            "/schedule?value=abc",
            "/schedule",
        ],
    ),
    (
        "history",
        &[
            "/timeInit?date=2024-11-05&time=08%3A30%3A00",
            "/toggleBulb1",
            "advance 20s",
            "/turnOnAll",
            "advance 40s",
            "/historicalData",
            "status",
        ],
    ),
    (
        "manual-control",
        &[
            "/",
            "/toggleBulb2",
            "/toggleBulb2",
            "/turnOnAll",
            "/schedule?value=30",
            "/turnOffAll",
            "advance 31s",
            "/unknown",
            "status",
        ],
    ),
];

fn main() -> io::Result<()> {
    for (name, commands) in SCENARIOS {
        let path = PathBuf::from(TRANSCRIPT_DIR).join(format!("emulator-{name}.log"));
        let mut session = Session::new(&SessionOptions {
            load_amps: None,
            transcript: Some(path.clone()),
        })?;
        for command in *commands {
            let _ = session.handle_command(command)?;
        }
        println!("wrote {}", path.display());
    }
    Ok(())
}
