//! Control-socket line protocol.
//!
//! One request line in, one reply line out:
//!
//! | Request                         | Reply                                      |
//! |---------------------------------|--------------------------------------------|
//! | `on <pin>` / `off <pin>`        | `OK ` / `timed out `                       |
//! | `query <pin>`                   | `OK <0\|1>` / `timed out `                 |
//! | `queryactions`                  | `OK [(temp, 60, 1, off), ...]`             |
//! | `boost <pin> temp <°C>`         | `OK ` / `temperature already above target!`|
//! | `boost <pin> time <seconds>`    | `OK ` / `time delta must be positive!`     |
//! | anything else                   | `invalid request: <reason>`                |
//!
//! Verbs and metrics are case-insensitive.  Negative pins address the
//! Controller's own relays (see [`Channel`]).

use core::fmt;
use core::str::FromStr;

use crate::error::RequestError;
use crate::radio::Channel;
use crate::scheduler::Metric;

/// A parsed control request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    Set { channel: Channel, on: bool },
    Query { channel: Channel },
    QueryActions,
    /// `threshold` is °C for `temp` and a delta in seconds for `time`.
    Boost {
        channel: Channel,
        metric: Metric,
        threshold: f64,
    },
}

impl FromStr for Request {
    type Err = RequestError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut args = line.split_whitespace();
        let verb = args.next().ok_or(RequestError::Empty)?.to_ascii_lowercase();

        let request = match verb.as_str() {
            "on" | "off" => Self::Set {
                channel: parse_channel(args.next())?,
                on: verb == "on",
            },
            "query" => Self::Query {
                channel: parse_channel(args.next())?,
            },
            "queryactions" => {
                // An optional argument is tolerated and ignored.
                args.next();
                Self::QueryActions
            }
            "boost" => {
                let channel = parse_channel(args.next())?;
                let metric = parse_metric(args.next())?;
                let threshold = parse_threshold(args.next())?;
                Self::Boost {
                    channel,
                    metric,
                    threshold,
                }
            }
            _ => return Err(RequestError::UnknownVerb(verb)),
        };

        let rest: Vec<&str> = args.collect();
        if !rest.is_empty() {
            return Err(RequestError::TrailingArguments(rest.join(" ")));
        }
        Ok(request)
    }
}

fn parse_channel(arg: Option<&str>) -> Result<Channel, RequestError> {
    let arg = arg.ok_or(RequestError::MissingArgument("pin"))?;
    let pin: i64 = arg
        .parse()
        .map_err(|_| RequestError::BadPin(arg.to_owned()))?;
    Channel::from_wire(pin)
}

fn parse_metric(arg: Option<&str>) -> Result<Metric, RequestError> {
    let arg = arg.ok_or(RequestError::MissingArgument("metric"))?;
    match arg.to_ascii_lowercase().as_str() {
        "temp" => Ok(Metric::Temp),
        "time" => Ok(Metric::Time),
        _ => Err(RequestError::BadMetric(arg.to_owned())),
    }
}

fn parse_threshold(arg: Option<&str>) -> Result<f64, RequestError> {
    let arg = arg.ok_or(RequestError::MissingArgument("threshold"))?;
    match arg.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RequestError::BadThreshold(arg.to_owned())),
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { channel, on } => {
                write!(f, "{} {}", if *on { "on" } else { "off" }, channel)
            }
            Self::Query { channel } => write!(f, "query {channel}"),
            Self::QueryActions => f.write_str("queryactions"),
            Self::Boost {
                channel,
                metric,
                threshold,
            } => write!(f, "boost {channel} {metric} {threshold}"),
        }
    }
}

/// The single reply line sent back to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OK <payload>`; the payload may be empty.
    Ok(String),
    /// The radio peer did not acknowledge or answer.
    TimedOut,
    /// `boost .. temp` whose target is already reached.
    AboveTarget,
    /// `boost .. time` with a delta that is zero or negative.
    NonPositiveDelta,
    /// Anything the server could not carry out; holds the reason.
    Invalid(String),
}

impl Reply {
    /// `OK` when `acked`, `timed out` otherwise.
    pub fn acked(acked: bool) -> Self {
        if acked {
            Self::Ok(String::new())
        } else {
            Self::TimedOut
        }
    }

    /// The reply as sent, newline included.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }

    /// Read a reply line as received by a client.
    pub fn from_line(line: &str) -> Self {
        let line = line.strip_suffix('\n').unwrap_or(line);
        if let Some(payload) = line.strip_prefix("OK ") {
            return Self::Ok(payload.to_owned());
        }
        if let Some(reason) = line.strip_prefix("invalid request: ") {
            return Self::Invalid(reason.to_owned());
        }
        match line {
            "OK" => Self::Ok(String::new()),
            "timed out " | "timed out" => Self::TimedOut,
            "temperature already above target!" => Self::AboveTarget,
            "time delta must be positive!" => Self::NonPositiveDelta,
            other => Self::Invalid(other.to_owned()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

impl From<RequestError> for Reply {
    fn from(e: RequestError) -> Self {
        Self::Invalid(e.to_string())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(payload) => write!(f, "OK {payload}"),
            Self::TimedOut => f.write_str("timed out "),
            Self::AboveTarget => f.write_str("temperature already above target!"),
            Self::NonPositiveDelta => f.write_str("time delta must be positive!"),
            Self::Invalid(reason) => write!(f, "invalid request: {reason}"),
        }
    }
}
