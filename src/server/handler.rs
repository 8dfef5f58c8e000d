// src/server/handler.rs
use hyper::header::{CONTENT_TYPE, LOCATION};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tower::Service;

use crate::health::{ServiceStatus, StatusBoard};
use crate::server::render::render_page;

#[derive(Clone)]
pub struct DashboardHandler {
    board: Arc<StatusBoard>,
    title: Arc<str>,
}

#[derive(Serialize)]
struct StatusView<'a> {
    #[serde(flatten)]
    status: &'a ServiceStatus,
    label: &'a str,
}

impl DashboardHandler {
    pub fn new(board: Arc<StatusBoard>, title: impl Into<String>) -> Self {
        let title: String = title.into();
        Self {
            board,
            title: Arc::from(title),
        }
    }

    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, DashboardError> {
        match (req.method(), req.uri().path()) {
            (&Method::GET, "/") => {
                let page = render_page(&self.title, self.board.descriptors(), &self.board.snapshot())?;
                Ok(Response::builder()
                    .status(StatusCode::OK)
                    .header(CONTENT_TYPE, "text/html; charset=utf-8")
                    .body(Body::from(page))?)
            }
            (&Method::GET, "/api/status") => json_response(&self.board.snapshot()),
            (&Method::POST, "/api/refresh") => json_response(&self.board.refresh().await),
            (&Method::POST, "/refresh") => {
                self.board.refresh().await;
                Ok(Response::builder()
                    .status(StatusCode::SEE_OTHER)
                    .header(LOCATION, "/")
                    .body(Body::empty())?)
            }
            (_, "/" | "/api/status" | "/api/refresh" | "/refresh") => {
                Err(DashboardError::MethodNotAllowed)
            }
            _ => Err(DashboardError::NotFound),
        }
    }
}

fn json_response(statuses: &[ServiceStatus]) -> Result<Response<Body>, DashboardError> {
    let views: Vec<_> = statuses
        .iter()
        .map(|status| StatusView {
            status,
            label: status.label(),
        })
        .collect();
    let body = serde_json::to_vec(&views)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))?)
}

impl Service<Request<Body>> for DashboardHandler {
    type Response = Response<Body>;
    type Error = std::convert::Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();
            Ok(handler.handle(req).await.unwrap_or_else(|e| {
                match e {
                    DashboardError::NotFound | DashboardError::MethodNotAllowed => {
                        tracing::debug!(%method, %path, %e, "rejected request");
                    }
                    _ => tracing::error!(%method, %path, %e, "dashboard error"),
                }
                e.into()
            }))
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Response build error: {0}")]
    Http(#[from] hyper::http::Error),
}

impl From<DashboardError> for Response<Body> {
    fn from(err: DashboardError) -> Self {
        let (status, message) = match err {
            DashboardError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            DashboardError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            }
            DashboardError::Serialization(_)
            | DashboardError::Template(_)
            | DashboardError::Http(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        let mut response = Response::new(Body::from(message));
        *response.status_mut() = status;
        response
    }
}
