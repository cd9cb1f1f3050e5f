use std::net::SocketAddr;

use bytes::Bytes;
use http::header;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tourneytext::abbrev::abbrev_str;
use tourneytext::{render, sanitize, twitch, FieldRecord};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

mod error;

const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const JAVASCRIPT: &str = "application/javascript; charset=utf-8";
const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
pub struct App {
    metrics: PrometheusHandle,
}

type HttpResponse = Response<Full<Bytes>>;

fn respond(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Result<HttpResponse> {
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(body.into()))?)
}

fn parse_record(body: &[u8]) -> Result<FieldRecord> {
    Ok(serde_json::from_slice(body)?)
}

async fn render_field(r: Request<hyper::body::Incoming>) -> Result<HttpResponse> {
    let body = r.into_body().collect().await?.to_bytes();

    let record = match parse_record(&body) {
        Ok(record) => record,
        Err(err) => {
            warn!("bad render request: {}", err);
            return respond(
                StatusCode::BAD_REQUEST,
                TEXT_PLAIN,
                format!("invalid render request: {}\n", err),
            );
        }
    };

    let kind = record.kind.unwrap_or_default();
    metrics::counter!("render_requests_total", "kind" => kind.as_str()).increment(1);
    debug!(
        "rendering {} field {:?}",
        kind.as_str(),
        abbrev_str(record.text.as_deref().unwrap_or_default())
    );

    respond(StatusCode::OK, TEXT_HTML, render::render_record(&record))
}

async fn sanitize_fragment(r: Request<hyper::body::Incoming>) -> Result<HttpResponse> {
    let body = r.into_body().collect().await?.to_bytes();
    let html = String::from_utf8_lossy(&body);

    metrics::counter!("sanitize_requests_total").increment(1);
    debug!("sanitizing {:?}", abbrev_str(&html));

    respond(StatusCode::OK, TEXT_HTML, sanitize(&html))
}

async fn serve(app: &App, r: Request<hyper::body::Incoming>) -> Result<HttpResponse> {
    match (r.method(), r.uri().path()) {
        (&Method::POST, "/render") => render_field(r).await,
        (&Method::POST, "/sanitize") => sanitize_fragment(r).await,
        (&Method::GET, "/twitch-embed.js") => {
            respond(StatusCode::OK, JAVASCRIPT, twitch::BOOTSTRAP_JS)
        }
        (&Method::GET, "/metrics") => respond(StatusCode::OK, PROMETHEUS_TEXT, app.metrics.render()),
        _ => respond(StatusCode::NOT_FOUND, TEXT_PLAIN, "not found\n"),
    }
}

fn parse_addr(value: Option<String>) -> SocketAddr {
    let default = SocketAddr::from(DEFAULT_ADDR);
    match value {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(
                "Invalid TOURNEYTEXT_ADDR value '{}', using default {}",
                value, default
            );
            default
        }),
        None => default,
    }
}

fn get_env_addr() -> SocketAddr {
    parse_addr(std::env::var("TOURNEYTEXT_ADDR").ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let metrics = PrometheusBuilder::new().install_recorder()?;
    let app = App { metrics };

    let addr = get_env_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;

        // Use an adapter to access something implementing `tokio::io` traits as if they implement
        // `hyper::rt` IO traits.
        let io = TokioIo::new(stream);

        let app_copy = app.clone();

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(|req| serve(&app_copy, req)))
                .await
            {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr(None), SocketAddr::from(DEFAULT_ADDR));
        assert_eq!(
            parse_addr(Some("0.0.0.0:8080".into())),
            SocketAddr::from(([0, 0, 0, 0], 8080))
        );
        assert_eq!(
            parse_addr(Some("not an address".into())),
            SocketAddr::from(DEFAULT_ADDR)
        );
    }

    #[test]
    fn test_parse_record() {
        let record = parse_record(br#"{"text":"gg","type":"perc"}"#).unwrap();
        assert_eq!(record.text.as_deref(), Some("gg"));
        assert!(matches!(parse_record(b"{not json"), Err(Error::Json(_))));
        assert!(matches!(parse_record(b""), Err(Error::Json(_))));
    }
}
