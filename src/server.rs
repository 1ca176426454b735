//! Listening socket lifecycle: `Stopped --start()--> Running --stop()--> Stopped`.
//!
//! Each accepted connection is served by hyper on its own tokio task, tracked
//! in a [`JoinSet`] owned by the accept loop. A connection that does not
//! deliver a complete request head within
//! [`Config::read_timeout`](crate::Config::read_timeout) is closed, and request
//! bodies get the same idle bound between frames.
//!
//! On `stop()` the listener is closed at once and open connections are asked
//! to finish their current request. Whatever is still open after
//! [`Config::shutdown_grace`](crate::Config::shutdown_grace) is aborted, which
//! closes its socket. Dropping a running [`ShareServer`] starts the same
//! shutdown without waiting for it.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, Router};
use hyper::{body::Incoming, server::conn::http1, service::service_fn, Request};
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tower::Service;
use tower_http::timeout::RequestBodyTimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::routes;
use crate::AppState;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// The full application: routes, middleware and state.
pub fn app(state: AppState) -> Router {
    let read_timeout = state.config.read_timeout();

    Router::new()
        .merge(routes::share_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyTimeoutLayer::new(read_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves once `true` is sent or the sender is dropped.
async fn shutdown_requested(signal: &mut watch::Receiver<bool>) {
    while !*signal.borrow_and_update() {
        if signal.changed().await.is_err() {
            return;
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: Router,
    read_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let service = service_fn(move |request: Request<Incoming>| app.clone().call(request));

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout);
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut draining = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    debug!("Connection from {} closed: {}", peer, err);
                }
                break;
            }
            _ = shutdown_requested(&mut shutdown), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    app: Router,
    read_timeout: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {}", peer);
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        app.clone(),
                        read_timeout,
                        shutdown.clone(),
                    ));
                }
                Err(err) => {
                    warn!("Accept failed: {}", err);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    debug!("Listener closed, draining {} connection(s)", connections.len());
    while connections.join_next().await.is_some() {}
}

struct Running {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct ShareServer {
    state: AppState,
    running: Option<Running>,
}

impl ShareServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }

    /// Bind `addr` and begin serving. Returns the bound address.
    ///
    /// The socket accepts connections as soon as this returns. Calling it on a
    /// running server does nothing.
    pub async fn start(&mut self, addr: SocketAddr) -> io::Result<SocketAddr> {
        if let Some(running) = &self.running {
            warn!("Server already running on {}", running.addr);
            return Ok(running.addr);
        }

        self.state.repository.ensure_exists().await?;

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(accept_loop(
            listener,
            app(self.state.clone()),
            self.state.config.read_timeout(),
            signal,
        ));

        self.state.set_running(true);
        self.running = Some(Running {
            addr: local_addr,
            shutdown,
            task,
        });

        info!(
            "Sharing {} on http://{}",
            self.state.repository.root().display(),
            local_addr
        );
        Ok(local_addr)
    }

    /// Stop accepting, drain for the grace period, then close what is left.
    ///
    /// Calling it on a stopped server does nothing.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            debug!("Stop requested but server is not running");
            return;
        };

        let _ = running.shutdown.send(true);
        let grace = self.state.config.shutdown_grace();
        let mut task = running.task;

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => debug!("All connections drained"),
            Ok(Err(err)) => warn!("Server task failed: {}", err),
            Err(_) => {
                warn!(
                    "Connections still open after {:?}, closing them",
                    grace
                );
                // Dropping the accept loop drops its JoinSet, aborting every connection
                task.abort();
                let _ = task.await;
            }
        }

        self.state.set_running(false);
        info!("Server on {} stopped", running.addr);
    }
}

impl Drop for ShareServer {
    fn drop(&mut self) {
        // A dropped sender reads as a shutdown request
        if self.running.take().is_some() {
            self.state.set_running(false);
        }
    }
}
