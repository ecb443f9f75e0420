use core::time::Duration;

use outlet_core::config::ControllerConfig;
use outlet_core::controller::Controller;
use outlet_core::indicator::{IndicatorDriver, IndicatorLines};
use outlet_core::outlets::{OutletDriver, OutletId, OutletLevel};
use outlet_core::sensor::CurrentSensor;

const MAX_SEQUENCE: u32 = 6;

#[derive(Clone, Copy, Debug)]
enum Op {
    AllOn,
    AllOff,
    Toggle(OutletId),
    Schedule,
    Wait,
}

const OPS: [Op; 6] = [
    Op::AllOn,
    Op::AllOff,
    Op::Toggle(OutletId::One),
    Op::Toggle(OutletId::Two),
    Op::Schedule,
    Op::Wait,
];

struct NoRelays;

impl OutletDriver for NoRelays {
    fn drive(&mut self, _outlet: OutletId, _level: OutletLevel) {}
}

#[derive(Default)]
struct LampWrites {
    writes: usize,
    last: Option<IndicatorLines>,
}

impl IndicatorDriver for LampWrites {
    fn write_lines(&mut self, lines: IndicatorLines) {
        self.writes += 1;
        self.last = Some(lines);
    }
}

struct Idle;

impl CurrentSensor for Idle {
    fn read_amps(&mut self) -> f32 {
        0.0
    }
}

type Bench = Controller<NoRelays, LampWrites, Idle, Duration>;

fn bench() -> Bench {
    let config = ControllerConfig::DEFAULT.with_sample_interval(Duration::from_secs(3_600));
    Controller::new(NoRelays, LampWrites::default(), Idle, config)
}

/// Applies `op` and reports whether it was expected to rewrite the lamps.
fn apply(controller: &mut Bench, op: Op, now: &mut Duration) -> bool {
    match op {
        Op::AllOn => {
            controller.turn_on_all();
            true
        }
        Op::AllOff => {
            controller.turn_off_all();
            true
        }
        Op::Toggle(outlet) => {
            controller.toggle(outlet);
            true
        }
        Op::Schedule => {
            controller.schedule(Duration::from_secs(5), *now);
            true
        }
        Op::Wait => {
            *now += Duration::from_secs(3);
            controller.tick(*now).expired
        }
    }
}

fn check(controller: &Bench, sequence: &[Op]) {
    let outlets = controller.outlets();
    let lines = controller.indicator();
    let any_on = outlets.one.is_on() || outlets.two.is_on();

    assert_eq!(lines.ready, any_on, "ready lamp after {sequence:?}");
    assert_eq!(lines.idle, !any_on, "idle lamp after {sequence:?}");
    assert!(!lines.error, "error lamp after {sequence:?}");
    assert_eq!(lines, IndicatorLines::from_outlets(outlets));
    assert_eq!(
        controller.indicator_driver().last,
        Some(lines),
        "hardware disagrees with state after {sequence:?}"
    );
    if !any_on {
        assert!(
            !controller.timer().is_armed() || sequence.iter().any(|op| matches!(op, Op::Toggle(_))),
            "only toggling may leave a timer armed with everything off: {sequence:?}"
        );
    }
}

#[test]
fn lamps_track_outlets_for_every_short_sequence() {
    let mut checked = 0usize;
    for len in 0..=MAX_SEQUENCE {
        for code in 0..OPS.len().pow(len) {
            let mut sequence = Vec::with_capacity(len as usize);
            let mut rest = code;
            for _ in 0..len {
                sequence.push(OPS[rest % OPS.len()]);
                rest /= OPS.len();
            }

            let mut controller = bench();
            let mut now = Duration::ZERO;
            controller.tick(now);
            check(&controller, &[]);

            for (index, &op) in sequence.iter().enumerate() {
                let before = controller.indicator_driver().writes;
                let rewrites = apply(&mut controller, op, &mut now);
                let after = controller.indicator_driver().writes;
                assert_eq!(
                    after - before,
                    usize::from(rewrites),
                    "{op:?} should write all lamps exactly once when it changes state"
                );
                check(&controller, &sequence[..=index]);
            }
            checked += 1;
        }
    }
    assert_eq!(checked, (0..=MAX_SEQUENCE).map(|len| OPS.len().pow(len)).sum());
}
