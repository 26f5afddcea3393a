use std::{io, sync::OnceLock, time};

use application::{api, Args, Config};
use axum::{extract::MatchedPath, Extension, Router};
use axum_client_ip::InsecureClientIp;
use http::{header, Method, Request, Response};
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    trace::{MakeSpan, OnResponse, TraceLayer},
};
use tracing as log;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum level to log, set once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    init_logging();

    _ = run().await;
}

/// Installs a global subscriber splitting log output between `stdout` and
/// `stderr` by [`STDERR_LEVELS`].
fn init_logging() {
    tracing_subscriber::registry()
        .with(output(io::stdout, false))
        .with(output(io::stderr, true))
        .init();
}

/// Builds a formatting layer writing either [`STDERR_LEVELS`] events or all
/// the other ones into the provided `writer`.
fn output<S, W>(writer: W, stderr: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || (STDERR_LEVELS.contains(meta.level()) == stderr
                    && max >= *meta.level())
        }))
}

/// Boots the hotel booking server and serves it until a shutdown signal.
async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        service,
        postgres,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    _ = LOG_LEVEL.set(log.level.into());

    let service_config = service::Config::try_from(service).map_err(|e| {
        log::error!("invalid `service` config: {e}");
    })?;

    let mut db = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to create `Postgres` pool: {e}");
    })?;
    let report = migrations::runner()
        .run_async(&mut db)
        .await
        .map_err(|e| {
            log::error!("failed to migrate database: {e}");
        })?;
    log::info!("applied {} migration(s)", report.applied_migrations().len());

    let app = api::router()
        .layer(Extension(Service::new(service_config, db)))
        .layer(cors_layer(&server.cors.origins)?)
        .layer(trace_layer());

    serve(app, &server.host, server.port).await
}

/// Builds the [CORS] layer allowing the provided origins.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
fn cors_layer(origins: &[String]) -> Result<CorsLayer, ()> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin.parse::<header::HeaderValue>().map_err(|e| {
                log::error!("`{origin}` is not a valid CORS origin: {e}");
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_methods([
            Method::DELETE,
            Method::GET,
            Method::OPTIONS,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(origins))
}

/// Builds the layer tracing every HTTP request in its own span.
fn trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<axum::body::Body> + Clone,
    tower_http::trace::DefaultOnRequest,
    impl OnResponse<axum::body::Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|r: &Request<axum::body::Body>| {
            let client_ip = InsecureClientIp::from(r.headers(), r.extensions())
                .map(|ip| ip.0.to_string())
                .ok();
            log::info_span!(
                "HTTP request",
                http.client_ip = client_ip,
                http.method = r.method().as_str(),
                http.route = r
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str),
                http.target = r
                    .uri()
                    .path_and_query()
                    .map(http::uri::PathAndQuery::as_str),
                http.user_agent = r
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|h| h.to_str().ok()),
                http.status_code = log::field::Empty,
            )
        })
        .on_response(
            |r: &Response<axum::body::Body>,
             took: time::Duration,
             span: &log::Span| {
                let status = r.status();
                span.record("http.status_code", status.as_u16());

                let took = format!("{}ms", took.as_millis());
                if status.is_server_error() {
                    log::error!(duration = took);
                } else if status.is_client_error() {
                    log::warn!(duration = took);
                } else {
                    log::info!(duration = took);
                }
            },
        )
}

/// Serves the provided [`Router`] on `host:port` until `Ctrl+C` is received.
async fn serve(app: Router, host: &str, port: u16) -> Result<(), ()> {
    let listener = TcpListener::bind((host, port)).await.map_err(|e| {
        log::error!("failed to listen on `{host}:{port}`: {e}");
    })?;
    log::info!("listening on `{host}:{port}`");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("failed to await `Ctrl+C` signal: {e}");
            }
            log::info!("shutting down");
        })
        .await
        .map_err(|e| {
            log::error!("webserver failed: {e}");
        })
}
