mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::JwtValidator;
use crate::features::images::{
    routes as images_routes, ImageService, PgImageRepository, ViewService,
};
use crate::features::links::handlers::LinksState;
use crate::features::links::{
    protected_routes as links_protected_routes, public_routes as links_public_routes,
    LinkService, PgTokenRepository,
};
use crate::features::media::routes as media_routes;
use crate::features::plans::{PgPlanRepository, PlanService};
use crate::modules::media::MediaStore;
use crate::shared::types::ApiResponse;
use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically (schema + builtin plan tiers)
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize auth
    let jwt_validator = Arc::new(JwtValidator::new(
        &config.auth.jwt_secret,
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    // Initialize media store
    let media_store = Arc::new(MediaStore::new(config.media.root.clone()));
    media_store.ensure_root().await?;
    tracing::info!("Media store initialized at {}", config.media.root);

    // Initialize repositories and services
    let plan_service = Arc::new(PlanService::new(Arc::new(PgPlanRepository::new(
        pool.clone(),
    ))));
    let image_service = Arc::new(ImageService::new(
        Arc::new(PgImageRepository::new(pool.clone())),
        Arc::clone(&media_store),
    ));
    let view_service = Arc::new(ViewService::new(config.app.base_url.clone()));
    let link_service = Arc::new(LinkService::new(
        Arc::new(PgTokenRepository::new(pool.clone())),
        Arc::clone(&media_store),
        config.app.base_url.clone(),
    ));
    tracing::info!("Services initialized");

    let links_state = LinksState {
        link_service,
        image_service: Arc::clone(&image_service),
        plan_service: Arc::clone(&plan_service),
    };

    // Swagger UI
    let mut openapi = ApiDoc::openapi();
    SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    }
    .modify(&mut openapi);
    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    // Routes that require a bearer token
    let protected_routes = Router::new()
        .merge(images_routes(
            image_service,
            Arc::clone(&plan_service),
            view_service,
            config.app.max_upload_size,
        ))
        .merge(links_protected_routes(links_state.clone()))
        .route_layer(from_fn_with_state(
            jwt_validator.clone(),
            middleware::auth_middleware,
        ));

    // Public routes: link redemption and media bytes
    let public_routes = Router::new()
        .merge(links_public_routes(links_state))
        .merge(media_routes(media_store));

    let health_route = Router::new().route("/health", get(health));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success(Some("ok".to_string()), None))
}
