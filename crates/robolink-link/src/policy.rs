//! Caller-facing failure policy.
//!
//! Every application loop reacts to link trouble the same way, so the
//! decision lives here instead of in each loop:
//!
//! | Failure             | Action                               | Outcome                         |
//! |---------------------|--------------------------------------|---------------------------------|
//! | `ConnectionClosed`  | restart (re-accept / reconnect)      | `RecoveredRetry`, or `Fatal`    |
//! | `ConnectionTimeout` | restart once                         | `RecoveredRetry`, or `Fatal`    |
//! | `SocketError`       | none                                 | `Fatal`                         |
//! | `DecodeError`       | drop the frame; restart if desynced  | `Ok`, or as `ConnectionClosed`  |
//! | `Reconnected`       | resend the in-flight payload once    | `RecoveredRetry`, or `Fatal`    |

use robolink_payload::Payload;
use tracing::{error, info, warn};

use crate::connection::Connection;
use crate::failure::FailureKind;

/// What the caller should do after an operation or a recovery step.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Carry on.
    Ok(T),
    /// The link was recovered; start the cycle again with fresh data.
    RecoveredRetry,
    /// Nothing left to try. The owning process should log and exit.
    Fatal(FailureKind),
}

impl<T> Outcome<T> {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }
}

/// Decide and perform the recovery step for `kind`.
///
/// `in_flight` is the payload the caller was trying to deliver when the
/// failure surfaced; it is only used for [`FailureKind::Reconnected`].
pub fn handle_failure<C>(
    conn: &mut C,
    kind: FailureKind,
    in_flight: Option<&Payload>,
) -> Outcome<()>
where
    C: Connection + ?Sized,
{
    match kind {
        FailureKind::ConnectionClosed | FailureKind::ConnectionTimeout => restart(conn, kind),
        FailureKind::SocketError => {
            error!(role = %conn.role(), "socket error; no recovery path");
            Outcome::Fatal(FailureKind::SocketError)
        }
        FailureKind::DecodeError if conn.is_desynchronized() => {
            warn!(role = %conn.role(), "frame boundary lost; restarting the link");
            restart(conn, kind)
        }
        FailureKind::DecodeError => {
            warn!(role = %conn.role(), "dropped undecodable frame");
            Outcome::Ok(())
        }
        FailureKind::Reconnected => match in_flight {
            None => Outcome::RecoveredRetry,
            Some(payload) => match conn.send(payload) {
                Ok(()) => {
                    info!(role = %conn.role(), kind = payload.kind(), "resent in-flight payload");
                    Outcome::RecoveredRetry
                }
                Err(err) => {
                    error!(error = %err, kind = %err.kind(), "resend after reconnect failed");
                    Outcome::Fatal(err.kind())
                }
            },
        },
    }
}

fn restart<C>(conn: &mut C, cause: FailureKind) -> Outcome<()>
where
    C: Connection + ?Sized,
{
    info!(role = %conn.role(), %cause, "restarting link");
    match conn.restart() {
        Ok(()) => Outcome::RecoveredRetry,
        Err(err) => {
            error!(role = %conn.role(), error = %err, kind = %err.kind(), "link restart failed");
            Outcome::Fatal(err.kind())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::net::SocketAddr;

    use robolink_payload::CommandRecord;

    use super::*;
    use crate::connection::{Received, Role, Status};
    use crate::error::{LinkError, Result};

    /// Scripted connection: each call pops the next canned result.
    #[derive(Default)]
    struct ScriptedConnection {
        restarts: VecDeque<Result<()>>,
        sends: VecDeque<Result<()>>,
        sent: Vec<Payload>,
        restart_calls: usize,
        desynchronized: bool,
    }

    impl Connection for ScriptedConnection {
        fn role(&self) -> Role {
            Role::Client
        }

        fn status(&self) -> Status {
            Status::Connected
        }

        fn peer_addr(&self) -> Option<SocketAddr> {
            None
        }

        fn wait_for_connection(&mut self) -> Result<SocketAddr> {
            Err(LinkError::NotApplicable {
                operation: "wait_for_connection",
                role: Role::Client,
            })
        }

        fn send(&mut self, payload: &Payload) -> Result<()> {
            self.sent.push(payload.clone());
            self.sends.pop_front().unwrap_or(Ok(()))
        }

        fn receive(&mut self) -> Result<Received> {
            Err(LinkError::NotConnected)
        }

        fn close(&mut self) {}

        fn attempt_reconnection(&mut self) -> Result<()> {
            self.restart()
        }

        fn restart(&mut self) -> Result<()> {
            self.restart_calls += 1;
            self.desynchronized = false;
            self.restarts.pop_front().unwrap_or(Ok(()))
        }

        fn is_desynchronized(&self) -> bool {
            self.desynchronized
        }
    }

    fn socket_error() -> LinkError {
        LinkError::Frame(robolink_frame::FrameError::Io(io::Error::from(
            io::ErrorKind::PermissionDenied,
        )))
    }

    fn timeout() -> LinkError {
        LinkError::ReconnectTimeout {
            addr: "127.0.0.1:4421".parse().unwrap(),
            timeout: std::time::Duration::from_secs(1),
        }
    }

    #[test]
    fn closed_restarts_and_retries() {
        let mut conn = ScriptedConnection::default();
        let outcome = handle_failure(&mut conn, FailureKind::ConnectionClosed, None);
        assert_eq!(outcome, Outcome::RecoveredRetry);
        assert_eq!(conn.restart_calls, 1);
        assert!(conn.sent.is_empty());
    }

    #[test]
    fn closed_with_failed_restart_is_fatal() {
        let mut conn = ScriptedConnection {
            restarts: VecDeque::from([Err(timeout())]),
            ..Default::default()
        };
        let outcome = handle_failure(&mut conn, FailureKind::ConnectionClosed, None);
        assert_eq!(outcome, Outcome::Fatal(FailureKind::ConnectionTimeout));
        assert!(outcome.is_fatal());
    }

    #[test]
    fn timeout_gets_exactly_one_more_try() {
        let mut conn = ScriptedConnection {
            restarts: VecDeque::from([Err(timeout()), Ok(())]),
            ..Default::default()
        };
        let outcome = handle_failure(&mut conn, FailureKind::ConnectionTimeout, None);
        assert_eq!(outcome, Outcome::Fatal(FailureKind::ConnectionTimeout));
        assert_eq!(conn.restart_calls, 1);
    }

    #[test]
    fn socket_error_is_always_fatal() {
        let mut conn = ScriptedConnection::default();
        let outcome = handle_failure(&mut conn, FailureKind::SocketError, None);
        assert_eq!(outcome, Outcome::Fatal(FailureKind::SocketError));
        assert_eq!(conn.restart_calls, 0);
    }

    #[test]
    fn decode_error_is_dropped_while_in_sync() {
        let mut conn = ScriptedConnection::default();
        let payload = Payload::Command(CommandRecord::new(1, 1));
        let outcome = handle_failure(&mut conn, FailureKind::DecodeError, Some(&payload));
        assert_eq!(outcome, Outcome::Ok(()));
        assert_eq!(conn.restart_calls, 0);
        assert!(conn.sent.is_empty());
    }

    #[test]
    fn decode_error_on_desynced_link_restarts() {
        let mut conn = ScriptedConnection {
            desynchronized: true,
            ..Default::default()
        };
        let outcome = handle_failure(&mut conn, FailureKind::DecodeError, None);
        assert_eq!(outcome, Outcome::RecoveredRetry);
        assert_eq!(conn.restart_calls, 1);
        assert!(!conn.is_desynchronized());
    }

    #[test]
    fn reconnected_resends_in_flight_once() {
        let mut conn = ScriptedConnection::default();
        let payload = Payload::Command(CommandRecord::new(60, 60));
        let outcome = handle_failure(&mut conn, FailureKind::Reconnected, Some(&payload));
        assert_eq!(outcome, Outcome::RecoveredRetry);
        assert_eq!(conn.sent, vec![payload]);
        assert_eq!(conn.restart_calls, 0);
    }

    #[test]
    fn reconnected_without_in_flight_sends_nothing() {
        let mut conn = ScriptedConnection::default();
        let outcome = handle_failure(&mut conn, FailureKind::Reconnected, None);
        assert_eq!(outcome, Outcome::RecoveredRetry);
        assert!(conn.sent.is_empty());
    }

    #[test]
    fn failed_resend_is_fatal() {
        let mut conn = ScriptedConnection {
            sends: VecDeque::from([Err(socket_error())]),
            ..Default::default()
        };
        let payload = Payload::Command(CommandRecord::new(60, 60));
        let outcome = handle_failure(&mut conn, FailureKind::Reconnected, Some(&payload));
        assert_eq!(outcome, Outcome::Fatal(FailureKind::SocketError));
        assert_eq!(conn.sent.len(), 1);
    }

    #[test]
    fn works_through_a_trait_object() {
        let mut conn = ScriptedConnection::default();
        let dynamic: &mut dyn Connection = &mut conn;
        assert_eq!(
            handle_failure(dynamic, FailureKind::ConnectionClosed, None),
            Outcome::RecoveredRetry
        );
    }
}
