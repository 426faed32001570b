//! Request dispatch and per-connection handling.
//!
//! Every accepted connection goes through the same pipeline:
//!
//! 1. **Read** one line, bounded by the client read timeout.
//! 2. **Parse** it into a [`Request`]; malformed input becomes an
//!    `invalid request` reply.
//! 3. **Dispatch** against the Controller's channels and scheduler.  A
//!    panic inside dispatch is caught and reported the same way.
//! 4. **Reply** with exactly one line, then close the connection.
//!
//! Nothing that happens to one connection reaches the control loop.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use log::{error, info, warn};

use super::codec::read_line;
use super::request::{Reply, Request};
use super::transport::Connection;
use crate::app::ports::ChannelControl;
use crate::error::RequestError;
use crate::scheduler::{Action, ActionScheduler, Metric, Switch};

/// Carry out one request.
///
/// `temperature` is the latest local reading, if any; `now` is wall-clock
/// epoch seconds.
pub fn dispatch(
    request: Request,
    ctl: &mut impl ChannelControl,
    scheduler: &mut ActionScheduler,
    temperature: Option<f64>,
    now: f64,
) -> Reply {
    match request {
        Request::Set { channel, on } => match ctl.control(channel, on) {
            Ok(acked) => Reply::acked(acked),
            Err(e) => RequestError::from(e).into(),
        },
        Request::Query { channel } => match ctl.query(channel) {
            Ok(Some(state)) => Reply::Ok(u8::from(state).to_string()),
            Ok(None) => Reply::TimedOut,
            Err(e) => RequestError::from(e).into(),
        },
        Request::QueryActions => Reply::Ok(scheduler.describe()),
        Request::Boost {
            channel,
            metric,
            threshold,
        } => {
            let threshold = match metric {
                Metric::Temp => {
                    if temperature.is_some_and(|t| t >= threshold) {
                        return Reply::AboveTarget;
                    }
                    threshold
                }
                Metric::Time => {
                    if threshold <= 0.0 {
                        return Reply::NonPositiveDelta;
                    }
                    now + threshold
                }
            };
            let acked = match ctl.control(channel, true) {
                Ok(acked) => acked,
                Err(e) => return RequestError::from(e).into(),
            };
            // The off-action stands even if the on command went unanswered.
            scheduler.schedule(Action {
                metric,
                threshold,
                channel,
                state: Switch::Off,
            });
            Reply::acked(acked)
        }
    }
}

/// Serve one client: read a line, hand the parsed request to `handler`,
/// write one reply line and close the connection.
///
/// Returns the reply that was sent (or attempted).
pub fn serve_connection<C: Connection>(
    conn: &mut C,
    read_timeout: Duration,
    handler: impl FnOnce(Request) -> Reply,
) -> Reply {
    if let Err(e) = conn.set_read_timeout(Some(read_timeout)) {
        warn!("control: could not set read timeout: {}", e);
    }

    let reply = match read_line(conn).and_then(|line| {
        info!("control: request {:?}", line);
        line.parse::<Request>()
    }) {
        Ok(request) => panic::catch_unwind(AssertUnwindSafe(|| handler(request)))
            .unwrap_or_else(|payload| {
                let reason = panic_message(payload.as_ref());
                error!("control: request handler failed: {}", reason);
                Reply::Invalid(reason)
            }),
        Err(e) => {
            warn!("control: {}", e);
            e.into()
        }
    };

    if let Err(e) = conn
        .write_all(reply.to_line().as_bytes())
        .and_then(|()| conn.flush())
    {
        error!("control: could not send reply: {}", e);
    }
    if let Err(e) = conn.close() {
        warn!("control: close failed: {}", e);
    }
    reply
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_owned()
    }
}
