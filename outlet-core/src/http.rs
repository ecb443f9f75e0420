//! Minimal HTTP/1.x request-line codec and response model.
//!
//! Only the request line matters to the controller: every endpoint takes its
//! parameters from the query string and no request carries a body, so header
//! lines are skipped. Parsing uses `winnow` combinators over the first line of
//! the request head.

use core::fmt;

use heapless::{String, Vec};
use serde::{Serialize, Serializer};
use winnow::combinator::{opt, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::config::HISTORY_CAPACITY;
use crate::history::{Amperes, HistoryEntry, Watts};
use crate::outlets::OutletId;

/// Bytes reserved for a generated response body.
pub const RESPONSE_BODY_CAPACITY: usize = 4096;

/// Bounded storage for generated response bodies.
pub type ResponseText = String<RESPONSE_BODY_CAPACITY>;

/// Failures while reading the request line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestError {
    Empty,
    NotUtf8,
    MalformedRequestLine,
    RelativeTarget,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Empty => f.write_str("empty request"),
            RequestError::NotUtf8 => f.write_str("request line is not UTF-8"),
            RequestError::MalformedRequestLine => f.write_str("malformed request line"),
            RequestError::RelativeTarget => f.write_str("request target must start with `/`"),
        }
    }
}

/// Failures while decoding a query parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamError {
    Missing,
    Invalid,
    TooLong,
    BadEscape,
    NotUtf8,
}

impl ParamError {
    /// Message placed in JSON error bodies.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            ParamError::Missing => "Missing parameter",
            ParamError::Invalid => "Invalid parameter",
            ParamError::TooLong => "Parameter too long",
            ParamError::BadEscape => "Malformed percent escape",
            ParamError::NotUtf8 => "Parameter is not UTF-8",
        }
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Raw `key=value&...` query string. Values stay percent-encoded until decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Query<'a> {
    raw: &'a str,
}

impl<'a> Query<'a> {
    #[must_use]
    pub const fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Iterates `(key, raw_value)` pairs; a bare key yields an empty value.
    pub fn pairs(self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.raw
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
    }

    /// Returns the first raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}

/// Decodes `%XX` escapes and `+` into a bounded string.
pub fn decode_component<const N: usize>(raw: &str) -> Result<String<N>, ParamError> {
    let bytes = raw.as_bytes();
    let mut decoded: Vec<u8, N> = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let byte = match bytes[index] {
            b'+' => {
                index += 1;
                b' '
            }
            b'%' => {
                let high = bytes.get(index + 1).copied().and_then(hex_value);
                let low = bytes.get(index + 2).copied().and_then(hex_value);
                index += 3;
                match (high, low) {
                    (Some(high), Some(low)) => (high << 4) | low,
                    _ => return Err(ParamError::BadEscape),
                }
            }
            other => {
                index += 1;
                other
            }
        };
        decoded.push(byte).map_err(|_| ParamError::TooLong)?;
    }

    String::from_utf8(decoded).map_err(|_| ParamError::NotUtf8)
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Parsed request line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: Query<'a>,
    /// Version digits after `HTTP/`; absent for bare `METHOD /path` lines.
    pub version: Option<&'a str>,
}

impl<'a> Request<'a> {
    #[must_use]
    pub fn route(&self) -> Route<'a> {
        Route::resolve(self.path, self.query)
    }
}

type LineResult<T> = Result<T, ErrMode<ContextError>>;

fn method<'a>(input: &mut &'a str) -> LineResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

fn target<'a>(input: &mut &'a str) -> LineResult<&'a str> {
    take_till(1.., |c: char| c == ' ' || c.is_ascii_control()).parse_next(input)
}

fn version<'a>(input: &mut &'a str) -> LineResult<&'a str> {
    preceded(
        "HTTP/",
        take_while(1.., |c: char| c.is_ascii_digit() || c == '.'),
    )
    .parse_next(input)
}

fn space(input: &mut &str) -> LineResult<char> {
    ' '.parse_next(input)
}

fn request_line<'a>(input: &mut &'a str) -> LineResult<(&'a str, &'a str, Option<&'a str>)> {
    let method = method.parse_next(input)?;
    space.parse_next(input)?;
    let target = target.parse_next(input)?;
    let version = opt(preceded(space, version)).parse_next(input)?;
    Ok((method, target, version))
}

/// Parses the first line of a request head. Header lines are ignored.
pub fn parse_request(head: &[u8]) -> Result<Request<'_>, RequestError> {
    let line_end = head
        .iter()
        .position(|&byte| byte == b'\n')
        .unwrap_or(head.len());
    let line = core::str::from_utf8(&head[..line_end]).map_err(|_| RequestError::NotUtf8)?;
    let mut input = line.trim_end_matches('\r');
    if input.is_empty() {
        return Err(RequestError::Empty);
    }

    let (method, target, version) = request_line
        .parse_next(&mut input)
        .map_err(|_| RequestError::MalformedRequestLine)?;
    if !input.is_empty() {
        return Err(RequestError::MalformedRequestLine);
    }
    if !target.starts_with('/') {
        return Err(RequestError::RelativeTarget);
    }

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    Ok(Request {
        method,
        path,
        query: Query::new(query),
        version,
    })
}

/// Controller endpoint selected by a request path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Dashboard,
    TurnOnAll,
    TurnOffAll,
    Toggle(OutletId),
    Schedule {
        value: Option<&'a str>,
    },
    TimeInit {
        date: Option<&'a str>,
        time: Option<&'a str>,
    },
    History,
    NotFound,
}

impl<'a> Route<'a> {
    /// Maps a request path plus its query string onto a route.
    #[must_use]
    pub fn resolve(path: &str, query: Query<'a>) -> Self {
        match path {
            "/" => Route::Dashboard,
            "/turnOnAll" => Route::TurnOnAll,
            "/turnOffAll" => Route::TurnOffAll,
            "/toggleBulb1" => Route::Toggle(OutletId::One),
            "/toggleBulb2" => Route::Toggle(OutletId::Two),
            "/schedule" => Route::Schedule {
                value: query.get("value"),
            },
            "/timeInit" => Route::TimeInit {
                date: query.get("date"),
                time: query.get("time"),
            },
            "/historicalData" => Route::History,
            _ => Route::NotFound,
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Route::Dashboard => Endpoint::Dashboard,
            Route::TurnOnAll => Endpoint::TurnOnAll,
            Route::TurnOffAll => Endpoint::TurnOffAll,
            Route::Toggle(outlet) => Endpoint::Toggle(*outlet),
            Route::Schedule { .. } => Endpoint::Schedule,
            Route::TimeInit { .. } => Endpoint::TimeInit,
            Route::History => Endpoint::History,
            Route::NotFound => Endpoint::NotFound,
        }
    }
}

/// Parameter-free route tag used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Dashboard,
    TurnOnAll,
    TurnOffAll,
    Toggle(OutletId),
    Schedule,
    TimeInit,
    History,
    NotFound,
    Malformed,
}

impl Endpoint {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Dashboard => "/",
            Endpoint::TurnOnAll => "/turnOnAll",
            Endpoint::TurnOffAll => "/turnOffAll",
            Endpoint::Toggle(OutletId::One) => "/toggleBulb1",
            Endpoint::Toggle(OutletId::Two) => "/toggleBulb2",
            Endpoint::Schedule => "/schedule",
            Endpoint::TimeInit => "/timeInit",
            Endpoint::History => "/historicalData",
            Endpoint::NotFound => "(unknown)",
            Endpoint::Malformed => "(malformed)",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Response status codes the controller emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }

    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::InternalError => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Json,
    Text,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContentType::Html => "text/html",
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
        }
    }
}

/// Response payload: either a static asset or a generated document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Static(&'static str),
    Text(ResponseText),
}

impl Body {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Body::Static(text) => text,
            Body::Text(text) => text.as_str(),
        }
    }
}

/// Complete response ready for the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: ContentType,
    pub body: Body,
}

impl Response {
    #[must_use]
    pub const fn fixed(status: Status, content_type: ContentType, body: &'static str) -> Self {
        Self {
            status,
            content_type,
            body: Body::Static(body),
        }
    }

    #[must_use]
    pub const fn json(status: Status, body: &'static str) -> Self {
        Self::fixed(status, ContentType::Json, body)
    }

    #[must_use]
    pub const fn text(status: Status, body: &'static str) -> Self {
        Self::fixed(status, ContentType::Text, body)
    }

    /// JSON error body of the form `{"status":"error","message":...}`.
    #[must_use]
    pub fn json_error(message: &str) -> Self {
        let document = ErrorDocument {
            status: "error",
            message,
        };
        match render_json(&document) {
            Some(body) => Self {
                status: Status::BadRequest,
                content_type: ContentType::Json,
                body: Body::Text(body),
            },
            None => Self::json(
                Status::BadRequest,
                "{\"status\":\"error\",\"message\":\"Invalid parameter\"}",
            ),
        }
    }

    /// Renders `entries` as the history document, in iteration order.
    #[must_use]
    pub fn history<'e, E>(entries: E) -> Self
    where
        E: IntoIterator<Item = &'e HistoryEntry>,
    {
        let mut records: Vec<HistoryRecord<'e>, HISTORY_CAPACITY> = Vec::new();
        for entry in entries {
            if records.push(HistoryRecord::from(entry)).is_err() {
                return Self::text(Status::InternalError, "history exceeds its capacity");
            }
        }
        match render_json(&HistoryDocument { data: &records }) {
            Some(body) => Self {
                status: Status::Ok,
                content_type: ContentType::Json,
                body: Body::Text(body),
            },
            None => Self::text(Status::InternalError, "history does not fit response buffer"),
        }
    }

    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_str().as_bytes()
    }

    /// Writes the status line and headers, including the blank line.
    pub fn write_head<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(
            writer,
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.content_type.as_str(),
            self.body_bytes().len()
        )
    }
}

#[derive(Serialize)]
struct ErrorDocument<'a> {
    status: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct HistoryDocument<'a> {
    data: &'a [HistoryRecord<'a>],
}

/// Wire form of one history entry; every value is a string.
#[derive(Serialize)]
struct HistoryRecord<'a> {
    date: &'a str,
    time: &'a str,
    #[serde(rename = "bulb1State")]
    bulb1_state: &'static str,
    #[serde(rename = "bulb2State")]
    bulb2_state: &'static str,
    #[serde(serialize_with = "display_string")]
    current: Amperes,
    #[serde(serialize_with = "display_string")]
    power: Watts,
}

impl<'a> From<&'a HistoryEntry> for HistoryRecord<'a> {
    fn from(entry: &'a HistoryEntry) -> Self {
        Self {
            date: &entry.date,
            time: &entry.time,
            bulb1_state: entry.outlets.one.label(),
            bulb2_state: entry.outlets.two.label(),
            current: entry.measurement.current,
            power: entry.measurement.power,
        }
    }
}

fn display_string<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

/// Serializes `value` into a response body, or `None` if it does not fit.
fn render_json<T: Serialize>(value: &T) -> Option<ResponseText> {
    let mut bytes: Vec<u8, RESPONSE_BODY_CAPACITY> = Vec::new();
    bytes.resize(RESPONSE_BODY_CAPACITY, 0).ok()?;
    let len = serde_json_core::to_slice(value, &mut bytes).ok()?;
    bytes.truncate(len);
    ResponseText::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockState;
    use crate::config::ControllerConfig;
    use crate::history::Measurement;
    use crate::outlets::{OutletLevel, OutletSnapshot};

    #[test]
    fn parses_full_request_line() {
        let request =
            parse_request(b"GET /schedule?value=10 HTTP/1.1\r\nHost: iotbulb.local\r\n\r\n")
                .unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/schedule");
        assert_eq!(request.query.get("value"), Some("10"));
        assert_eq!(request.version, Some("1.1"));
        assert_eq!(request.route(), Route::Schedule { value: Some("10") });
    }

    #[test]
    fn accepts_bare_request_line() {
        let request = parse_request(b"POST /turnOnAll").unwrap();
        assert_eq!(request.version, None);
        assert_eq!(request.route(), Route::TurnOnAll);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_request(b""), Err(RequestError::Empty));
        assert_eq!(
            parse_request(b"GET\r\n"),
            Err(RequestError::MalformedRequestLine)
        );
        assert_eq!(
            parse_request(b"GET /a HTTP/1.1 extra\r\n"),
            Err(RequestError::MalformedRequestLine)
        );
        assert_eq!(
            parse_request(b"GET index.html HTTP/1.1\r\n"),
            Err(RequestError::RelativeTarget)
        );
        assert_eq!(
            parse_request(b"GET /\xff HTTP/1.1\r\n"),
            Err(RequestError::NotUtf8)
        );
    }

    #[test]
    fn resolves_every_path() {
        let empty = Query::default();
        assert_eq!(Route::resolve("/", empty), Route::Dashboard);
        assert_eq!(Route::resolve("/turnOffAll", empty), Route::TurnOffAll);
        assert_eq!(
            Route::resolve("/toggleBulb1", empty),
            Route::Toggle(OutletId::One)
        );
        assert_eq!(
            Route::resolve("/toggleBulb2", empty),
            Route::Toggle(OutletId::Two)
        );
        assert_eq!(Route::resolve("/historicalData", empty), Route::History);
        assert_eq!(Route::resolve("/favicon.ico", empty), Route::NotFound);
        assert_eq!(
            Route::resolve("/timeInit", Query::new("date=2024-01-01")),
            Route::TimeInit {
                date: Some("2024-01-01"),
                time: None
            }
        );
    }

    #[test]
    fn query_pairs_handle_bare_keys() {
        let query = Query::new("a=1&&flag&b=");
        assert_eq!(query.get("a"), Some("1"));
        assert_eq!(query.get("flag"), Some(""));
        assert_eq!(query.get("b"), Some(""));
        assert_eq!(query.get("c"), None);
    }

    #[test]
    fn decodes_percent_escapes() {
        let decoded: String<16> = decode_component("12%3A00+PM").unwrap();
        assert_eq!(decoded.as_str(), "12:00 PM");

        assert_eq!(
            decode_component::<16>("%4"),
            Err(ParamError::BadEscape)
        );
        assert_eq!(decode_component::<16>("%zz"), Err(ParamError::BadEscape));
        assert_eq!(decode_component::<2>("abc"), Err(ParamError::TooLong));
        assert_eq!(decode_component::<4>("%ff"), Err(ParamError::NotUtf8));
    }

    #[test]
    fn head_carries_length_and_type() {
        let response = Response::json(Status::Ok, "{\"status\":\"success\"}");
        let mut head: String<128> = String::new();
        response.write_head(&mut head).unwrap();
        assert_eq!(
            head.as_str(),
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 20\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn error_messages_are_escaped() {
        let response = Response::json_error("bad \"value\" \\ here");
        assert_eq!(response.status, Status::BadRequest);
        assert_eq!(response.content_type, ContentType::Json);
        assert_eq!(
            response.body.as_str(),
            r#"{"status":"error","message":"bad \"value\" \\ here"}"#
        );
    }

    #[test]
    fn history_renders_string_fields_in_order() {
        let mut clock = ClockState::new();
        clock.initialize("2024-12-25", "07:15:00").unwrap();
        let entry = HistoryEntry::capture(
            &clock,
            OutletSnapshot::new(OutletLevel::On, OutletLevel::Off),
            Measurement::from_reading(0.7, &ControllerConfig::DEFAULT),
        );
        let response = Response::history([&entry]);
        assert_eq!(response.status, Status::Ok);
        assert_eq!(
            response.body.as_str(),
            concat!(
                r#"{"data":[{"date":"2024-12-25","time":"07:15:00","bulb1State":"On","#,
                r#""bulb2State":"Off","current":"0.7000","power":"154.00"}]}"#
            )
        );
    }

    #[test]
    fn empty_history_is_an_empty_array() {
        let response = Response::history(core::iter::empty());
        assert_eq!(response.body.as_str(), r#"{"data":[]}"#);
    }
}
