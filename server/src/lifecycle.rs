//! Listener lifecycle: `Starting → Listening → ShuttingDown → Stopped`.
//!
//! # Design
//! `Server::bind` moves the state to `Listening`. `Server::run` spawns the
//! accept loop on its own task and every accepted connection into a `JoinSet`
//! owned by that loop. When the shutdown token fires the listener is dropped,
//! each connection is asked to finish its current request and close, and the
//! loop waits for the set to empty. If the grace period elapses first the set
//! is aborted, which drops the remaining sockets. In-flight store calls are
//! not cancelled before that point.

use std::io;
use std::net::SocketAddr;
use std::pin::pin;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_READ_TIMEOUT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Listening,
    ShuttingDown,
    Stopped,
}

/// How the server came to a stop after the shutdown token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request finished within the grace period.
    Drained,
    /// The grace period elapsed and the remaining connections were closed.
    TimedOut,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),
}

pub struct Server {
    listener: TcpListener,
    router: Router,
    grace: Duration,
    read_timeout: Duration,
    phase: watch::Sender<Phase>,
}

impl Server {
    /// Bind `addr`. A bind failure is returned to the caller, never retried.
    pub async fn bind(addr: SocketAddr, router: Router, grace: Duration) -> Result<Self, ServerError> {
        let (phase, _) = watch::channel(Phase::Starting);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self::with_phase(listener, router, grace, phase))
    }

    /// Wrap a listener that is already bound.
    pub fn from_listener(listener: TcpListener, router: Router, grace: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        Self::with_phase(listener, router, grace, phase)
    }

    fn with_phase(listener: TcpListener, router: Router, grace: Duration, phase: watch::Sender<Phase>) -> Self {
        phase.send_replace(Phase::Listening);
        Self {
            listener,
            router,
            grace,
            read_timeout: DEFAULT_READ_TIMEOUT,
            phase,
        }
    }

    /// Close connections that take longer than `timeout` to send a request
    /// head, including keep-alive connections waiting for their next request.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Subscribe to phase transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Serve until `shutdown` is cancelled, then drain for at most the grace
    /// period.
    pub async fn run(self, shutdown: CancellationToken) -> Result<ShutdownOutcome, ServerError> {
        Ok(tokio::spawn(self.serve(shutdown)).await?)
    }

    async fn serve(self, shutdown: CancellationToken) -> ShutdownOutcome {
        let Server {
            listener,
            router,
            grace,
            read_timeout,
            phase,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening");
        }

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer,
                            router.clone(),
                            read_timeout,
                            shutdown.clone(),
                        ));
                    }
                    Err(err) => warn!(error = %err, "failed to accept connection"),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        phase.send_replace(Phase::ShuttingDown);
        info!(?grace, open = connections.len(), "shutting down");

        let drained = tokio::time::timeout(grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        let outcome = match drained {
            Ok(()) => {
                info!("server gracefully stopped");
                ShutdownOutcome::Drained
            }
            Err(_) => {
                warn!(open = connections.len(), "grace period elapsed, closing remaining connections");
                connections.abort_all();
                while connections.join_next().await.is_some() {}
                ShutdownOutcome::TimedOut
            }
        };
        phase.send_replace(Phase::Stopped);
        outcome
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    read_timeout: Duration,
    shutdown: CancellationToken,
) {
    let conn = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout)
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(router));
    let mut conn = pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(err) = result {
                debug!(%peer, error = %err, "connection closed with error");
            }
            return;
        }
        _ = shutdown.cancelled() => conn.as_mut().graceful_shutdown(),
    }

    if let Err(err) = conn.await {
        debug!(%peer, error = %err, "connection closed with error");
    }
}

/// Resolve on Ctrl+C / SIGINT.
pub async fn interrupt() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for interrupt; shutdown only via token");
        std::future::pending::<()>().await;
    }
}
