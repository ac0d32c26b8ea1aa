//! Async boundary around a blocking connection.
//!
//! The connection keeps its blocking contract; each operation moves it onto
//! tokio's blocking pool and hands it back when the call returns.

use std::net::SocketAddr;

use robolink_payload::Payload;
use tracing::error;

use crate::connection::{Connection, Received, Role, Status};
use crate::error::{LinkError, Result};
use crate::failure::FailureKind;
use crate::policy::{handle_failure, Outcome};

/// Owns a blocking [`Connection`] and drives it from async code.
pub struct AsyncConnection<C> {
    inner: Option<C>,
    role: Role,
}

impl<C> AsyncConnection<C>
where
    C: Connection + Send + 'static,
{
    pub fn new(conn: C) -> Self {
        let role = conn.role();
        Self {
            inner: Some(conn),
            role,
        }
    }

    /// Take back the blocking connection. `None` if an earlier task panicked
    /// while holding it.
    pub fn into_inner(self) -> Option<C> {
        self.inner
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Lifecycle state; `Idle` once the connection was lost to a failed task.
    pub fn status(&self) -> Status {
        self.inner.as_ref().map_or(Status::Idle, Connection::status)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.as_ref().and_then(Connection::peer_addr)
    }

    pub async fn wait_for_connection(&mut self) -> Result<SocketAddr> {
        self.run(|conn| conn.wait_for_connection()).await
    }

    pub async fn send(&mut self, payload: Payload) -> Result<()> {
        self.run(move |conn| conn.send(&payload)).await
    }

    pub async fn receive(&mut self) -> Result<Received> {
        self.run(|conn| conn.receive()).await
    }

    pub async fn close(&mut self) -> Result<()> {
        self.run(|conn| {
            conn.close();
            Ok(())
        })
        .await
    }

    pub async fn attempt_reconnection(&mut self) -> Result<()> {
        self.run(|conn| conn.attempt_reconnection()).await
    }

    pub async fn restart(&mut self) -> Result<()> {
        self.run(|conn| conn.restart()).await
    }

    /// Apply [`handle_failure`] on the blocking pool.
    pub async fn handle_failure(
        &mut self,
        kind: FailureKind,
        in_flight: Option<Payload>,
    ) -> Outcome<()> {
        match self
            .run(move |conn| Ok(handle_failure(conn, kind, in_flight.as_ref())))
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Fatal(err.kind()),
        }
    }

    async fn run<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut C) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = self.inner.take().ok_or_else(|| {
            LinkError::TaskFailed("connection was lost to an earlier task failure".into())
        })?;

        let joined = tokio::task::spawn_blocking(move || {
            let result = op(&mut conn);
            (conn, result)
        })
        .await;

        match joined {
            Ok((conn, result)) => {
                self.inner = Some(conn);
                result
            }
            Err(err) => {
                error!(role = %self.role, error = %err, "blocking connection task failed");
                Err(LinkError::TaskFailed(err.to_string()))
            }
        }
    }
}
