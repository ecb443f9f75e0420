use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use outlet_core::config::ControllerConfig;
use outlet_core::controller::{Controller, TickReport};
use outlet_core::http::{Body, ContentType};
use outlet_core::indicator::{IndicatorDriver, IndicatorLines};
use outlet_core::outlets::{OutletDriver, OutletId, OutletLevel};
use outlet_core::router::{Handled, RequestRouter};
use outlet_core::sensor::CurrentSensor;
use outlet_core::status::StatusFormatter;

/// Control loop period, matching the firmware ticker.
pub const TICK: Duration = Duration::from_millis(100);

/// Current drawn by each energised outlet unless overridden.
pub const DEFAULT_LOAD_AMPS: f32 = 0.15;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "get",
        "GET <path> | <path>             - send a request (e.g. /schedule?value=30)",
    ),
    (
        "advance",
        "advance <duration>              - run the control loop (e.g. 500ms, 5s, 2m)",
    ),
    (
        "load",
        "load <amps>                     - set the simulated draw per energised outlet",
    ),
    (
        "status",
        "status                          - show outlets, lamps, timer, history and clock",
    ),
    (
        "help",
        "help [topic]                    - show help for a command",
    ),
];

/// Shared wiring between the simulated relays, lamps and current sensor.
#[derive(Debug)]
struct Bench {
    relays: [OutletLevel; 2],
    lamps: Option<IndicatorLines>,
    load_amps: f32,
}

impl Bench {
    fn energised(&self) -> u8 {
        let count = self.relays.iter().filter(|level| level.is_on()).count();
        u8::try_from(count).unwrap_or(u8::MAX)
    }
}

pub struct SimOutlets(Rc<RefCell<Bench>>);

impl OutletDriver for SimOutlets {
    fn drive(&mut self, outlet: OutletId, level: OutletLevel) {
        let index = usize::from(outlet.number() - 1);
        self.0.borrow_mut().relays[index] = level;
    }
}

pub struct SimIndicator(Rc<RefCell<Bench>>);

impl IndicatorDriver for SimIndicator {
    fn write_lines(&mut self, lines: IndicatorLines) {
        self.0.borrow_mut().lamps = Some(lines);
    }
}

/// Reports the configured load for every outlet whose relay is closed.
pub struct SimSensor(Rc<RefCell<Bench>>);

impl CurrentSensor for SimSensor {
    fn read_amps(&mut self) -> f32 {
        let bench = self.0.borrow();
        bench.load_amps * f32::from(bench.energised())
    }
}

type SimController = Controller<SimOutlets, SimIndicator, SimSensor, Duration>;

#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub load_amps: Option<f32>,
    pub transcript: Option<std::path::PathBuf>,
}

pub struct Session {
    router: RequestRouter<SimController>,
    bench: Rc<RefCell<Bench>>,
    now: Duration,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(options: &SessionOptions) -> io::Result<Self> {
        let bench = Rc::new(RefCell::new(Bench {
            relays: [OutletLevel::Off; 2],
            lamps: None,
            load_amps: options.load_amps.unwrap_or(DEFAULT_LOAD_AMPS),
        }));
        let controller = Controller::new(
            SimOutlets(Rc::clone(&bench)),
            SimIndicator(Rc::clone(&bench)),
            SimSensor(Rc::clone(&bench)),
            ControllerConfig::DEFAULT,
        );
        let transcript = match &options.transcript {
            Some(path) => Some(TranscriptLogger::create(path)?),
            None => None,
        };

        Ok(Self {
            router: RequestRouter::new(controller),
            bench,
            now: Duration::ZERO,
            transcript,
        })
    }

    /// Simulated time since the session started.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        self.record(TranscriptRole::Host, &[trimmed.to_string()])?;

        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (trimmed, ""),
        };

        let lines = if command.starts_with('/') {
            self.request("GET", command)
        } else if is_method(command) {
            if rest.is_empty() {
                vec![format!("ERR syntax `{command}` needs a path")]
            } else {
                self.request(command, rest)
            }
        } else if command.eq_ignore_ascii_case("advance") {
            match parse_duration(rest) {
                Ok(duration) => self.advance(duration),
                Err(err) => vec![format!("ERR syntax {err}")],
            }
        } else if command.eq_ignore_ascii_case("load") {
            self.set_load(rest)
        } else if command.eq_ignore_ascii_case("status") {
            self.status_lines()
        } else if command.eq_ignore_ascii_case("help") {
            help_lines((!rest.is_empty()).then_some(rest))
        } else {
            vec![format!("ERR syntax unknown command `{command}`")]
        };

        self.record(TranscriptRole::Emulator, &lines)?;
        Ok(lines)
    }

    fn request(&mut self, method: &str, target: &str) -> Vec<String> {
        let head = format!("{method} {target} HTTP/1.1\r\nHost: iotbulb.local\r\n\r\n");
        let handled = self.router.handle(head.as_bytes(), self.now);
        describe_response(&handled)
    }

    /// Runs the control loop in 100 ms steps until `duration` has elapsed.
    fn advance(&mut self, duration: Duration) -> Vec<String> {
        let target = self.now + duration;
        let mut lines = Vec::new();
        while self.now < target {
            self.now = (self.now + TICK).min(target);
            let report = self.router.tick(self.now);
            lines.extend(describe_tick(self.now, report));
        }
        lines.push(format!("clock at {}", format_offset(self.now)));
        lines
    }

    fn set_load(&mut self, value: &str) -> Vec<String> {
        match parse_load(value) {
            Ok(amps) => {
                self.bench.borrow_mut().load_amps = amps;
                vec![format!("OK load {amps:.4}A per outlet")]
            }
            Err(err) => vec![format!("ERR syntax {err}")],
        }
    }

    #[must_use]
    pub fn status_lines(&self) -> Vec<String> {
        let controller = self.router.controller();
        let snapshot = controller.status(self.now);
        let formatter = StatusFormatter::new(&snapshot);
        let mut lines = vec![
            render_line(|out| formatter.write_outlets_line(out)),
            render_line(|out| formatter.write_indicator_line(out)),
            render_line(|out| formatter.write_timer_line(out)),
            render_line(|out| formatter.write_history_line(out)),
            render_line(|out| formatter.write_clock_line(out)),
        ];

        let bench = self.bench.borrow();
        let lamps = bench
            .lamps
            .map_or_else(|| "unwritten".to_string(), |lines| lines.to_string());
        lines.push(format!(
            "bench relays={}/{} lamps={lamps} load={:.4}A",
            bench.relays[0], bench.relays[1], bench.load_amps
        ));
        lines
    }

    fn record(&mut self, role: TranscriptRole, lines: &[String]) -> io::Result<()> {
        if let Some(transcript) = self.transcript.as_mut() {
            for line in lines {
                transcript.append_line(self.now, role, line)?;
            }
        }
        Ok(())
    }
}

fn render_line(write: impl FnOnce(&mut String) -> std::fmt::Result) -> String {
    let mut line = String::new();
    // Writing into a `String` cannot fail.
    let _ = write(&mut line);
    line
}

fn is_method(command: &str) -> bool {
    ["GET", "POST", "PUT", "DELETE", "HEAD"]
        .iter()
        .any(|method| method.eq_ignore_ascii_case(command))
}

fn describe_response(handled: &Handled) -> Vec<String> {
    let response = &handled.response;
    let mut lines = vec![format!(
        "HTTP {} ({}, {} bytes) {}",
        response.status,
        response.content_type.as_str(),
        response.body_bytes().len(),
        handled.endpoint
    )];
    if let Some(error) = handled.error {
        lines.push(format!("  error: {error}"));
    }
    match (&response.body, response.content_type) {
        (Body::Static(_), ContentType::Html) => lines.push("  <dashboard document>".to_string()),
        (body, _) => lines.push(format!("  {}", body.as_str())),
    }
    if let Some(event) = handled.event {
        lines.push(format!("  event: {event}"));
    }
    lines
}

fn describe_tick(now: Duration, report: TickReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.expired {
        lines.push(format!("[{}] auto-off elapsed; outlets off", format_offset(now)));
    }
    if let Some(measurement) = report.sample {
        lines.push(format!("[{}] sampled {measurement}", format_offset(now)));
    }
    lines
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parses `500ms`, `5s`, `2m` or a bare number of seconds.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("expected a duration such as 500ms, 5s or 2m".to_string());
    }
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration `{text}`"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration `{text}` is too long")),
        _ => Err(format!("unknown duration unit `{unit}`")),
    }
}

/// Parses a non-negative, finite load in amperes.
pub fn parse_load(text: &str) -> Result<f32, String> {
    let text = text.trim();
    match text.parse::<f32>() {
        Ok(amps) if amps.is_finite() && amps >= 0.0 => Ok(amps),
        _ => Err(format!("invalid load `{text}` (expected amperes >= 0)")),
    }
}

fn format_offset(offset: Duration) -> String {
    let millis = offset.as_millis();
    format!("+{}.{:03}s", millis / 1_000, millis % 1_000)
}

struct TranscriptLogger {
    writer: BufWriter<File>,
}

impl TranscriptLogger {
    fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Outlet controller emulator transcript")?;
        writeln!(
            self.writer,
            "# Timestamps are simulated milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

#[derive(Clone, Copy)]
enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
