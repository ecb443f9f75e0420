//! Request dispatcher.
//!
//! This module glues parsed HTTP request lines to controller operations and
//! renders the JSON or text bodies the dashboard expects. It stays `no_std` so
//! the firmware and the emulator share one implementation.

use core::time::Duration;

use heapless::String;

use crate::clock::ClockText;
use crate::controller::{ControlEvent, Controller, TickReport};
use crate::dashboard::DASHBOARD_HTML;
use crate::http::{
    self, ContentType, Endpoint, ParamError, RequestError, Response, Route, Status,
    decode_component,
};
use crate::indicator::IndicatorDriver;
use crate::outlets::{OutletDriver, OutletId};
use crate::sensor::CurrentSensor;
use crate::time::MonotonicInstant;

const ALL_ON_BODY: &str = "{\"status\":\"All bulbs turned on\"}";
const ALL_OFF_BODY: &str = "{\"status\":\"All bulbs turned off\"}";
const TOGGLE_ONE_BODY: &str = "{\"status\":\"Bulb 1 toggled\"}";
const TOGGLE_TWO_BODY: &str = "{\"status\":\"Bulb 2 toggled\"}";
const SCHEDULED_BODY: &str = "{\"status\":\"success\"}";
const TIME_INIT_BODY: &str = "Time initialized";

/// Outcome of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handled {
    pub endpoint: Endpoint,
    pub response: Response,
    /// State change applied while serving the request, if any.
    pub event: Option<ControlEvent>,
    /// Why the request line could not be parsed, for logging.
    pub error: Option<RequestError>,
}

impl Handled {
    fn new(endpoint: Endpoint, response: Response, event: Option<ControlEvent>) -> Self {
        Self {
            endpoint,
            response,
            event,
            error: None,
        }
    }
}

/// Dispatches requests into the owned controller.
pub struct RequestRouter<C> {
    controller: C,
}

impl<C> RequestRouter<C> {
    /// Creates a new router around the provided controller.
    pub const fn new(controller: C) -> Self {
        Self { controller }
    }

    /// Returns an immutable reference to the underlying controller.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Returns a mutable reference to the underlying controller.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Consumes the router and yields the inner controller.
    pub fn into_inner(self) -> C {
        self.controller
    }
}

impl<O, L, S, I> RequestRouter<Controller<O, L, S, I>>
where
    O: OutletDriver,
    L: IndicatorDriver,
    S: CurrentSensor,
    I: MonotonicInstant,
{
    /// Parses a raw request head and serves it to completion.
    pub fn handle(&mut self, head: &[u8], now: I) -> Handled {
        match http::parse_request(head) {
            Ok(request) => self.dispatch(request.route(), now),
            Err(error) => Handled {
                endpoint: Endpoint::Malformed,
                response: Response::text(Status::BadRequest, "Bad Request"),
                event: None,
                error: Some(error),
            },
        }
    }

    /// Serves an already resolved route.
    pub fn dispatch(&mut self, route: Route<'_>, now: I) -> Handled {
        let endpoint = route.endpoint();
        match route {
            Route::Dashboard => Handled::new(
                endpoint,
                Response::fixed(Status::Ok, ContentType::Html, DASHBOARD_HTML),
                None,
            ),
            Route::TurnOnAll => {
                let event = self.controller.turn_on_all();
                Handled::new(endpoint, Response::json(Status::Ok, ALL_ON_BODY), Some(event))
            }
            Route::TurnOffAll => {
                let event = self.controller.turn_off_all();
                Handled::new(endpoint, Response::json(Status::Ok, ALL_OFF_BODY), Some(event))
            }
            Route::Toggle(outlet) => {
                let event = self.controller.toggle(outlet);
                let body = match outlet {
                    OutletId::One => TOGGLE_ONE_BODY,
                    OutletId::Two => TOGGLE_TWO_BODY,
                };
                Handled::new(endpoint, Response::json(Status::Ok, body), Some(event))
            }
            Route::Schedule { value } => match schedule_duration(value) {
                Ok(duration) => {
                    let event = self.controller.schedule(duration, now);
                    Handled::new(
                        endpoint,
                        Response::json(Status::Ok, SCHEDULED_BODY),
                        Some(event),
                    )
                }
                Err(error) => Handled::new(endpoint, Response::json_error(error.message()), None),
            },
            Route::TimeInit { date, time } => {
                let (response, event) = self.init_time(date, time);
                Handled::new(endpoint, response, event)
            }
            Route::History => Handled::new(
                endpoint,
                Response::history(self.controller.history().newest_first()),
                None,
            ),
            Route::NotFound => Handled::new(
                endpoint,
                Response::text(Status::NotFound, "Not Found"),
                None,
            ),
        }
    }

    /// Runs the controller's periodic bookkeeping.
    pub fn tick(&mut self, now: I) -> TickReport {
        self.controller.tick(now)
    }

    fn init_time(
        &mut self,
        date: Option<&str>,
        time: Option<&str>,
    ) -> (Response, Option<ControlEvent>) {
        let acknowledged = Response::text(Status::Ok, TIME_INIT_BODY);
        let (Some(date), Some(time)) = (date, time) else {
            return (acknowledged, None);
        };
        if self.controller.clock().is_initialized() {
            return (acknowledged, Some(ControlEvent::ClockKept));
        }

        let decoded: Result<(ClockText, ClockText), ParamError> =
            decode_component(date).and_then(|date| Ok((date, decode_component(time)?)));
        let (date, time) = match decoded {
            Ok(pair) => pair,
            Err(_) => {
                return (
                    Response::text(Status::BadRequest, "Invalid time parameters"),
                    None,
                );
            }
        };

        match self.controller.init_time(&date, &time) {
            Ok(event) => (acknowledged, Some(event)),
            Err(_) => (
                Response::text(Status::BadRequest, "Invalid time parameters"),
                None,
            ),
        }
    }
}

/// Parses the `value` parameter of a schedule request as whole seconds.
fn schedule_duration(value: Option<&str>) -> Result<Duration, ParamError> {
    let raw = value.ok_or(ParamError::Missing)?;
    let text: String<16> = decode_component(raw).map_err(|_| ParamError::Invalid)?;
    let seconds: u32 = text.trim().parse().map_err(|_| ParamError::Invalid)?;
    if seconds == 0 {
        return Err(ParamError::Invalid);
    }
    Ok(Duration::from_secs(u64::from(seconds)))
}
