// src/server/serve.rs
use anyhow::{Context, Result};
use hyper::server::conn::Http;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::DashboardHandler;

/// Accept loop for the dashboard. One task per connection; on shutdown the
/// listener stops accepting and open connections are drained.
pub struct DashboardServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl DashboardServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn serve<F>(self, handler: DashboardHandler, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let (drain_tx, drain_rx) = watch::channel(false);
        let mut connections = JoinSet::new();

        info!("HTTP server listening on http://{}", self.addr);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            warn!(%err, "accept failed");
                            continue;
                        }
                    };
                    let svc = handler.clone();
                    let mut drain_rx = drain_rx.clone();

                    connections.spawn(async move {
                        let conn = Http::new().serve_connection(stream, svc);
                        tokio::pin!(conn);

                        let result = tokio::select! {
                            result = conn.as_mut() => result,
                            _ = drain_rx.changed() => {
                                conn.as_mut().graceful_shutdown();
                                conn.await
                            }
                        };
                        if let Err(err) = result {
                            warn!(%peer, %err, "connection error");
                        }
                    });
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                _ = &mut shutdown => break,
            }
        }

        info!("Dashboard server draining {} connections", connections.len());
        let _ = drain_tx.send(true);
        while connections.join_next().await.is_some() {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::testing::{descriptor, ScriptedProbe};
    use crate::health::{StatusAggregator, StatusBoard};
    use std::sync::Arc;
    use tokio::sync::oneshot;
    use tokio::time::{timeout, Duration};

    fn handler() -> DashboardHandler {
        let probe = ScriptedProbe::new(&[("backend", 0, Some("UP"))]);
        let board = StatusBoard::new(
            vec![descriptor("backend", "UP")],
            StatusAggregator::new(Arc::new(probe), None),
            None,
        );
        DashboardHandler::new(Arc::new(board), "Status")
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let server = DashboardServer::bind(([127, 0, 0, 1], 0).into()).await.unwrap();
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let running = tokio::spawn(server.serve(handler(), async {
            let _ = stop_rx.await;
        }));

        let response = reqwest::get(format!("http://{}/api/status", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body[0]["service_name"], "backend");

        stop_tx.send(()).unwrap();
        timeout(Duration::from_secs(5), running)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_an_error() {
        let first = DashboardServer::bind(([127, 0, 0, 1], 0).into()).await.unwrap();
        assert!(DashboardServer::bind(first.local_addr()).await.is_err());
    }
}
