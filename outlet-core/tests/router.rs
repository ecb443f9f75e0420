use core::cell::Cell;
use core::time::Duration;
use std::rc::Rc;

use outlet_core::config::ControllerConfig;
use outlet_core::controller::{ControlEvent, Controller};
use outlet_core::http::{ContentType, Endpoint, Status};
use outlet_core::indicator::{IndicatorDriver, IndicatorLines};
use outlet_core::outlets::{OutletDriver, OutletId, OutletLevel, OutletSnapshot};
use outlet_core::router::{Handled, RequestRouter};
use outlet_core::sensor::CurrentSensor;

struct NoRelays;

impl OutletDriver for NoRelays {
    fn drive(&mut self, _outlet: OutletId, _level: OutletLevel) {}
}

#[derive(Default)]
struct Lamps(Option<IndicatorLines>);

impl IndicatorDriver for Lamps {
    fn write_lines(&mut self, lines: IndicatorLines) {
        self.0 = Some(lines);
    }
}

#[derive(Clone, Default)]
struct Dial(Rc<Cell<f32>>);

impl CurrentSensor for Dial {
    fn read_amps(&mut self) -> f32 {
        self.0.get()
    }
}

type Bench = RequestRouter<Controller<NoRelays, Lamps, Dial, Duration>>;

fn bench(dial: &Dial) -> Bench {
    RequestRouter::new(Controller::new(
        NoRelays,
        Lamps::default(),
        dial.clone(),
        ControllerConfig::DEFAULT,
    ))
}

fn get(router: &mut Bench, target: &str, now: Duration) -> Handled {
    let head = format!("GET {target} HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n");
    router.handle(head.as_bytes(), now)
}

fn body(handled: &Handled) -> &str {
    handled.response.body.as_str()
}

#[test]
fn control_endpoints_answer_with_status_json() {
    let dial = Dial::default();
    let mut router = bench(&dial);
    let now = Duration::ZERO;

    let handled = get(&mut router, "/turnOnAll", now);
    assert_eq!(handled.response.status, Status::Ok);
    assert_eq!(handled.response.content_type, ContentType::Json);
    assert_eq!(body(&handled), r#"{"status":"All bulbs turned on"}"#);
    assert_eq!(handled.event, Some(ControlEvent::AllOn));

    let handled = get(&mut router, "/toggleBulb1", now);
    assert_eq!(body(&handled), r#"{"status":"Bulb 1 toggled"}"#);
    let handled = get(&mut router, "/toggleBulb2", now);
    assert_eq!(body(&handled), r#"{"status":"Bulb 2 toggled"}"#);
    assert_eq!(router.controller().outlets(), OutletSnapshot::ALL_OFF);
    assert_eq!(router.controller().indicator(), IndicatorLines::IDLE);

    get(&mut router, "/toggleBulb2", now);
    let handled = get(&mut router, "/turnOffAll", now);
    assert_eq!(body(&handled), r#"{"status":"All bulbs turned off"}"#);
    assert_eq!(router.controller().outlets(), OutletSnapshot::ALL_OFF);
}

#[test]
fn schedule_request_runs_the_auto_off_timer() {
    let dial = Dial::default();
    let mut router = bench(&dial);

    let handled = get(&mut router, "/schedule?value=10", Duration::ZERO);
    assert_eq!(handled.endpoint, Endpoint::Schedule);
    assert_eq!(body(&handled), r#"{"status":"success"}"#);
    assert!(router.controller().outlets().any_on());

    assert!(!router.tick(Duration::from_millis(9_900)).expired);
    assert!(router.tick(Duration::from_millis(10_100)).expired);
    assert_eq!(router.controller().outlets(), OutletSnapshot::ALL_OFF);
}

#[test]
fn bad_schedule_values_leave_state_untouched() {
    let dial = Dial::default();
    let mut router = bench(&dial);

    let handled = get(&mut router, "/schedule", Duration::ZERO);
    assert_eq!(handled.response.status, Status::BadRequest);
    assert_eq!(handled.response.content_type, ContentType::Json);
    assert_eq!(
        body(&handled),
        r#"{"status":"error","message":"Missing parameter"}"#
    );
    assert_eq!(handled.event, None);
    assert_eq!(router.controller().outlets(), OutletSnapshot::ALL_OFF);
    assert!(!router.controller().timer().is_armed());

    for target in ["/schedule?value=", "/schedule?value=0", "/schedule?value=soon"] {
        let handled = get(&mut router, target, Duration::ZERO);
        assert_eq!(handled.response.status, Status::BadRequest, "{target}");
        assert_eq!(
            body(&handled),
            r#"{"status":"error","message":"Invalid parameter"}"#
        );
    }
    assert_eq!(router.controller().outlets(), OutletSnapshot::ALL_OFF);
}

#[test]
fn first_time_init_wins() {
    let dial = Dial::default();
    let mut router = bench(&dial);

    let handled = get(
        &mut router,
        "/timeInit?date=2024-12-25&time=07%3A15%3A00",
        Duration::ZERO,
    );
    assert_eq!(handled.response.status, Status::Ok);
    assert_eq!(handled.response.content_type, ContentType::Text);
    assert_eq!(body(&handled), "Time initialized");
    assert_eq!(handled.event, Some(ControlEvent::ClockSet));

    let handled = get(
        &mut router,
        "/timeInit?date=2030-01-01&time=00:00:00",
        Duration::ZERO,
    );
    assert_eq!(body(&handled), "Time initialized");
    assert_eq!(handled.event, Some(ControlEvent::ClockKept));

    let clock = router.controller().clock();
    assert_eq!(clock.date().as_str(), "2024-12-25");
    assert_eq!(clock.time().as_str(), "07:15:00");
}

#[test]
fn incomplete_or_invalid_time_init_keeps_the_default_clock() {
    let dial = Dial::default();
    let mut router = bench(&dial);

    let handled = get(&mut router, "/timeInit?date=2024-12-25", Duration::ZERO);
    assert_eq!(handled.response.status, Status::Ok);
    assert_eq!(handled.event, None);

    let handled = get(
        &mut router,
        "/timeInit?date=2024%0A12&time=10:00:00",
        Duration::ZERO,
    );
    assert_eq!(handled.response.status, Status::BadRequest);
    assert!(!router.controller().clock().is_initialized());

    let handled = get(
        &mut router,
        "/timeInit?date=2024-12-26&time=10:00:00",
        Duration::ZERO,
    );
    assert_eq!(handled.event, Some(ControlEvent::ClockSet));
}

#[test]
fn history_lists_samples_newest_first() {
    let dial = Dial::default();
    let mut router = bench(&dial);

    let handled = get(&mut router, "/historicalData", Duration::ZERO);
    assert_eq!(body(&handled), r#"{"data":[]}"#);

    get(&mut router, "/timeInit?date=2024-12-25&time=07:15:00", Duration::ZERO);
    router.tick(Duration::ZERO);
    dial.0.set(0.0);
    router.tick(Duration::from_secs(5));
    get(&mut router, "/toggleBulb1", Duration::from_secs(6));
    dial.0.set(0.15);
    router.tick(Duration::from_secs(10));

    let handled = get(&mut router, "/historicalData", Duration::from_secs(11));
    assert_eq!(handled.response.status, Status::Ok);
    assert_eq!(handled.response.content_type, ContentType::Json);
    assert_eq!(
        body(&handled),
        concat!(
            r#"{"data":["#,
            r#"{"date":"2024-12-25","time":"07:15:00","bulb1State":"On","bulb2State":"Off","current":"0.1500","power":"33.00"},"#,
            r#"{"date":"2024-12-25","time":"07:15:00","bulb1State":"Off","bulb2State":"Off","current":"0.0000","power":"0.00"}"#,
            r#"]}"#
        )
    );
}

#[test]
fn dashboard_unknown_and_malformed_requests() {
    let dial = Dial::default();
    let mut router = bench(&dial);

    let handled = get(&mut router, "/", Duration::ZERO);
    assert_eq!(handled.response.status, Status::Ok);
    assert_eq!(handled.response.content_type, ContentType::Html);
    assert!(body(&handled).contains("historicalData"));

    let handled = get(&mut router, "/favicon.ico", Duration::ZERO);
    assert_eq!(handled.response.status, Status::NotFound);
    assert_eq!(handled.endpoint, Endpoint::NotFound);

    let handled = router.handle(b"\r\n\r\n", Duration::ZERO);
    assert_eq!(handled.response.status, Status::BadRequest);
    assert_eq!(handled.endpoint, Endpoint::Malformed);
    assert!(handled.error.is_some());
}

#[test]
fn response_head_matches_body() {
    let dial = Dial::default();
    let mut router = bench(&dial);
    let handled = get(&mut router, "/turnOnAll", Duration::ZERO);

    let mut head = String::new();
    handled.response.write_head(&mut head).unwrap();
    assert_eq!(
        head,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 32\r\nConnection: close\r\n\r\n"
    );
}
