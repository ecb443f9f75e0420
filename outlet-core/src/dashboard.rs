//! Control panel served at `/`.

/// Static dashboard document. All links are relative so the page works under
/// the access-point address and the mDNS name alike.
pub const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

#[cfg(test)]
mod tests {
    use super::DASHBOARD_HTML;

    #[test]
    fn dashboard_calls_every_endpoint() {
        for path in [
            "turnOnAll",
            "turnOffAll",
            "toggleBulb1",
            "toggleBulb2",
            "schedule?value=",
            "timeInit?date=",
            "historicalData",
        ] {
            assert!(DASHBOARD_HTML.contains(path), "missing {path}");
        }
    }
}
