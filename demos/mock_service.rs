//! demos/mock_service.rs
//! A fake service health endpoint for trying the dashboard locally.
//! Run: cargo run --example mock_service -- <port> [healthy-value]

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use rand::Rng;
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::sleep;

#[derive(Clone)]
struct MockState {
    healthy_value: String,
    probe_counter: Arc<AtomicU64>,
    healthy_flag: Arc<AtomicBool>,
    jitter_ms: u64,
}

async fn handle(req: Request<Body>, state: MockState) -> Result<Response<Body>, Infallible> {
    let n = state.probe_counter.fetch_add(1, Ordering::SeqCst) + 1;

    if req.uri().path() != "/health" {
        return Ok(reply(StatusCode::NOT_FOUND, "Not Found".to_string()));
    }

    if state.jitter_ms > 0 {
        let delay = rand::thread_rng().gen_range(0..=state.jitter_ms);
        sleep(Duration::from_millis(delay)).await;
    }

    let status = if state.healthy_flag.load(Ordering::SeqCst) {
        state.healthy_value.clone()
    } else {
        "DOWN".to_string()
    };

    let body = serde_json::json!({ "status": status, "probe": n }).to_string();
    Ok(reply(StatusCode::OK, body))
}

fn reply(status: StatusCode, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port: u16 = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "8001".into())
        .parse()?;
    let healthy_value = std::env::args()
        .nth(2)
        .or_else(|| std::env::var("HEALTHY_VALUE").ok())
        .unwrap_or_else(|| "healthy".to_string());
    let jitter_ms = std::env::var("JITTER_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let flip_secs: u64 = std::env::var("FLIP_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    let state = MockState {
        healthy_value: healthy_value.clone(),
        probe_counter: Arc::new(AtomicU64::new(0)),
        healthy_flag: Arc::new(AtomicBool::new(true)),
        jitter_ms,
    };

    // Toggle health periodically
    if flip_secs > 0 {
        let st = state.clone();
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(flip_secs)).await;
                let cur = st.healthy_flag.load(Ordering::SeqCst);
                st.healthy_flag.store(!cur, Ordering::SeqCst);
                println!(
                    "[{}] health flipped -> {}",
                    port,
                    if !cur { "healthy" } else { "unhealthy" }
                );
            }
        });
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let make_svc = make_service_fn(move |_conn| {
        let st = state.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| handle(req, st.clone()))) }
    });

    println!(
        "Mock service on http://{}/health  [healthy={} jitter={}ms flip={}s]",
        addr, healthy_value, jitter_ms, flip_secs
    );

    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}
