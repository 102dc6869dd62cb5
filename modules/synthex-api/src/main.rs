use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use brightdata_client::{BrightDataClient, DatasetKind, JobPoller, PollPolicy};
use synthex_analysis::{EnrichmentCoordinator, ProfileAnalyzer};
use synthex_common::{Config, PollSettings};

mod error;
mod prompt;
mod relay;
mod rest;

use relay::{CompletionService, ProfileAnalysis};

pub struct AppState {
    pub completion: Arc<dyn CompletionService>,
    pub analyzer: Arc<dyn ProfileAnalysis>,
    pub keep_alive: Duration,
}

fn poll_policy(settings: &PollSettings) -> PollPolicy {
    PollPolicy {
        poll_interval: Duration::from_secs(settings.interval_secs),
        max_wait: Duration::from_secs(settings.max_wait_secs),
        extended_after_attempts: settings.extended_after_attempts,
        extended_interval: Duration::from_secs(settings.extended_interval_secs),
        accept_partial_after: settings.accept_partial_after,
        error_backoff: Duration::from_secs(settings.error_backoff_secs),
        accept_bare_objects: settings.accept_bare_objects,
    }
}

fn build_analyzer(config: &Config) -> ProfileAnalyzer {
    let mut client = BrightDataClient::new(config.brightdata_api_key.clone());
    if let Some(base_url) = &config.brightdata_base_url {
        client = client.with_base_url(base_url);
    }
    if let Some(id) = &config.profile_dataset_id {
        client = client.with_dataset(DatasetKind::Profile, id);
    }
    if let Some(id) = &config.detail_dataset_id {
        client = client.with_dataset(DatasetKind::VideoDetail, id);
    }

    let client = Arc::new(client);
    let policy = poll_policy(&config.poll);
    let enrichment = if config.enrichment_enabled {
        EnrichmentCoordinator::new(JobPoller::new(client.clone(), policy.clone()))
    } else {
        info!("Video detail dataset disabled, reports will use basic data");
        EnrichmentCoordinator::disabled()
    };

    ProfileAnalyzer::new(JobPoller::new(client, policy), enrichment)
}

fn build_completion(config: &Config) -> OpenAi {
    let mut ai = OpenAi::new(config.openai_api_key.clone(), config.openai_model.clone())
        .with_temperature(config.openai_temperature)
        .with_max_tokens(config.openai_max_tokens);
    if let Some(base_url) = &config.openai_base_url {
        ai = ai.with_base_url(base_url.clone());
    }
    ai
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/analyze", post(rest::api_analyze))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Streams must not be cached by proxies
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            )
            .on_response(tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
}

/// `RUST_LOG` plus info-level output for our crates and request logging.
fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("synthex=info".parse()?)
        .add_directive("brightdata_client=info".parse()?)
        .add_directive("ai_client=info".parse()?)
        .add_directive("tower_http=info".parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()?).init();

    let config = Config::from_env();
    config.log_redacted();

    let state = Arc::new(AppState {
        completion: Arc::new(build_completion(&config)),
        analyzer: Arc::new(build_analyzer(&config)),
        keep_alive: Duration::from_secs(config.sse_keepalive_secs),
    });

    let app = router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Synthex API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_policy_carries_every_setting() {
        let settings = PollSettings {
            interval_secs: 5,
            max_wait_secs: 600,
            extended_after_attempts: 7,
            extended_interval_secs: 9,
            accept_partial_after: 11,
            error_backoff_secs: 13,
            accept_bare_objects: false,
        };
        let policy = poll_policy(&settings);

        assert_eq!(policy.poll_interval, Duration::from_secs(5));
        assert_eq!(policy.max_wait, Duration::from_secs(600));
        assert_eq!(policy.extended_after_attempts, 7);
        assert_eq!(policy.extended_interval, Duration::from_secs(9));
        assert_eq!(policy.accept_partial_after, 11);
        assert_eq!(policy.error_backoff, Duration::from_secs(13));
        assert!(!policy.accept_bare_objects);
    }

    #[test]
    fn log_filter_enables_request_and_client_logs() {
        let filter = log_filter().unwrap().to_string();
        for directive in ["synthex=info", "brightdata_client=info", "ai_client=info", "tower_http=info"] {
            assert!(filter.contains(directive), "{directive} missing from {filter}");
        }
    }
}
