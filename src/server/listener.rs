use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::handler::Service;

/// Pause after a failed accept before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of incoming connections.
pub trait Acceptor {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn accept(
        &self,
    ) -> impl Future<Output = std::io::Result<(Self::Stream, SocketAddr)>> + Send;
}

impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Binds the configured address and serves until shutdown.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;
    info!("Listening on {}", cfg.listen_addr);

    serve(listener, cfg).await
}

/// Accepts connections on an already bound listener.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    serve_with(listener, cfg).await
}

/// Accept loop over any `Acceptor`.
///
/// Each connection runs on its own task; at most `max_connections` run at
/// once, further accepts wait for a slot. A failed accept (for example
/// EMFILE or ECONNABORTED) is logged and retried after `ACCEPT_BACKOFF`.
pub async fn serve_with<A: Acceptor>(acceptor: A, cfg: &Config) -> anyhow::Result<()> {
    let service = Arc::new(Service::new(cfg.directory.clone()));
    let limit = Arc::new(Semaphore::new(cfg.max_connections));

    if let Some(dir) = &cfg.directory {
        info!(directory = %dir.display(), "Serving files");
    }

    loop {
        let permit = limit
            .clone()
            .acquire_owned()
            .await
            .context("connection limiter closed")?;

        let (socket, peer) = match acceptor.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                drop(permit);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let service = service.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let mut conn = Connection::new(socket, service);
            if let Err(e) = conn.run().await {
                warn!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
}
