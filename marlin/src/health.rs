use http_body_util::Full;
use hyper::{Request, Response, StatusCode, body::Bytes, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use parking_lot::RwLock;
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::watch};
use tracing::{debug, error, info};

/// Aggregated component health consulted by the readiness endpoint.
///
/// Liveness only proves the process is up; readiness is green when every
/// registered component (cache, bus, circuit breakers) last reported
/// healthy.
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<BTreeMap<&'static str, bool>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, component: &'static str, healthy: bool) {
        self.components.write().insert(component, healthy);
    }

    pub fn is_ready(&self) -> bool {
        self.components.read().values().all(|healthy| *healthy)
    }

    fn report(&self) -> String {
        let components = self.components.read();
        let body: Vec<String> = components
            .iter()
            .map(|(name, healthy)| {
                format!(
                    "\"{name}\":\"{}\"",
                    if *healthy { "healthy" } else { "unhealthy" }
                )
            })
            .collect();
        format!("{{{}}}", body.join(","))
    }
}

/// Serve `/health/live` and `/health/ready` until shutdown.
pub async fn serve(
    listen: SocketAddr,
    registry: HealthRegistry,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!(%listen, "health endpoints listening");

    loop {
        let (stream, remote) = tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return Ok(());
                }
                continue;
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(error) => {
                    error!(%error, "health accept failed");
                    continue;
                }
            }
        };

        let registry = registry.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |request: Request<hyper::body::Incoming>| {
                let registry = registry.clone();
                async move { handle(request, registry) }
            });

            if let Err(error) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%remote, %error, "health connection error");
            }
        });
    }
}

fn handle(
    request: Request<hyper::body::Incoming>,
    registry: HealthRegistry,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let response = match request.uri().path() {
        "/health/live" => plain(StatusCode::OK, "OK"),
        "/health/ready" => {
            if registry.is_ready() {
                plain(StatusCode::OK, "ready")
            } else {
                json(StatusCode::SERVICE_UNAVAILABLE, registry.report())
            }
        }
        _ => plain(StatusCode::NOT_FOUND, "not found"),
    };
    Ok(response)
}

fn plain(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_default()
}

fn json(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_default()
}
