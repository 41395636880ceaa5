use axum::{middleware, routing::get, Router};
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use stockroom_api::{
    auth::{self, AuthConfig, AuthService},
    config, db, events, handlers, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;
    config::init_tracing(&app_config.log_level, app_config.log_json);

    info!(
        environment = %app_config.environment,
        "Starting stockroom-api"
    );

    let db_pool = Arc::new(db::establish_connection_from_app_config(&app_config).await?);

    if app_config.auto_migrate {
        db::run_migrations(&db_pool).await?;
    } else {
        info!("Automatic migrations disabled, skipping");
    }

    // Domain events are drained by a background task so request handlers
    // never block on consumers.
    let (event_tx, event_rx) = mpsc::channel(app_config.event_channel_capacity);
    let event_sender = events::EventSender::new(event_tx);
    tokio::spawn(events::process_events(event_rx));

    let auth_service = Arc::new(AuthService::new(
        AuthConfig::new(
            app_config.jwt_secret.clone(),
            Duration::from_secs(app_config.jwt_expiration as u64),
        ),
        db_pool.clone(),
    ));

    let services = handlers::AppServices::new(db_pool.clone(), Arc::new(event_sender.clone()));

    let state = AppState {
        db: db_pool,
        config: app_config.clone(),
        event_sender,
        services,
    };

    let cors = build_cors_layer(&app_config);

    let app = Router::new()
        .route("/", get(|| async { "stockroom-api" }))
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", stockroom_api::api_v1_routes())
        .nest(
            "/auth",
            auth::auth_routes().with_state(auth_service.clone()),
        )
        .layer(middleware::from_fn(
            move |mut request: axum::extract::Request, next: axum::middleware::Next| {
                let auth_service = auth_service.clone();
                async move {
                    request.extensions_mut().insert(auth_service);
                    next.run(request).await
                }
            },
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

fn build_cors_layer(config: &config::AppConfig) -> CorsLayer {
    if config.should_allow_permissive_cors() {
        warn!("CORS configured to allow any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Ignoring malformed CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
