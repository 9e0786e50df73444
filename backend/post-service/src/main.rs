use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use chrono::Utc;
use post_service::config::CacheBackend;
use post_service::db::{self, PgPostRepository};
use post_service::schema::{build_schema, AppSchema};
use post_service::services::{PostService, ReadCounter};
use post_service::Config;
use prometheus::{Encoder, TextEncoder};
use redis_utils::RedisPool;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use versioned_cache::{
    CacheMetrics, KeySchema, MemoryVersionStore, RedisVersionStore, VersionStore, VersionedCache,
};

struct HealthState {
    db_pool: sqlx::PgPool,
    versions: Arc<dyn VersionStore>,
    cache_backend: CacheBackend,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }

    async fn check_cache(&self) -> versioned_cache::CacheResult<()> {
        self.versions.ping().await
    }
}

fn component_check<E: std::fmt::Display>(
    name: &str,
    result: Result<(), E>,
    started: Instant,
) -> ComponentCheck {
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{} reachable", name),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("{} check failed: {}", name, e),
            latency_ms,
        },
    }
}

async fn graphql_handler(schema: web::Data<AppSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

/// SDL endpoint for client code generation
async fn schema_handler(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "post-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let pg_result = state.check_postgres().await;
    checks.insert(
        "postgresql".to_string(),
        component_check("PostgreSQL", pg_result, start),
    );

    let cache_name = match state.cache_backend {
        CacheBackend::Redis => "redis",
        CacheBackend::Memory => "memory-cache",
    };
    let start = Instant::now();
    let cache_result = state.check_cache().await;
    checks.insert(
        cache_name.to_string(),
        component_check(cache_name, cache_result, start),
    );

    let ready = checks
        .values()
        .all(|check| matches!(check.status, ComponentStatus::Healthy));
    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Prometheus metrics in text format
async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,post_service=debug,versioned_cache=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Post Service
///
/// # Routes
///
/// - `POST /graphql` - post queries and mutations
/// - `GET /graphql/schema` - SDL
/// - `GET /health`, `GET /ready` - liveness and readiness
/// - `GET /metrics` - Prometheus
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.json_logs);

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = db::create_pool(&config.database)
        .await
        .context("failed to create database pool")?;
    db::ensure_schema(&db_pool)
        .await
        .context("failed to ensure posts table")?;

    let keys = KeySchema::new(config.cache.namespace.clone());
    let (versions, redis_pool): (Arc<dyn VersionStore>, Option<RedisPool>) =
        match config.cache.backend {
            CacheBackend::Redis => {
                let pool = RedisPool::connect(&config.cache.redis)
                    .await
                    .context("failed to initialize Redis connection")?;
                let store = RedisVersionStore::new(pool.manager(), keys);
                (Arc::new(store), Some(pool))
            }
            CacheBackend::Memory => {
                tracing::warn!("Using the in-process cache backend; counters are not shared");
                (Arc::new(MemoryVersionStore::new(keys)), None)
            }
        };
    tracing::info!(
        namespace = %config.cache.namespace,
        backend = ?config.cache.backend,
        "Versioned cache initialized"
    );

    if let Err(e) = CacheMetrics::register(prometheus::default_registry()) {
        tracing::warn!(error = %e, "Cache metrics registration failed");
    }

    let service = Arc::new(PostService::new(
        Arc::new(PgPostRepository::new(db_pool.clone())),
        VersionedCache::new(versions.clone()),
        config.cache.retry_config(),
    ));
    let schema = build_schema(service, ReadCounter::new(versions.clone()));

    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
        versions,
        cache_backend: config.cache.backend,
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(schema.clone()))
            .app_data(health_state.clone())
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/graphql", web::post().to(graphql_handler))
            .route("/graphql/schema", web::get().to(schema_handler))
            .route("/health", web::get().to(liveness_check))
            .route("/ready", web::get().to(readiness_check))
            .route("/metrics", web::get().to(serve_metrics))
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    let finished = tokio::select! {
        joined = &mut server_task => Some(joined),
        _ = shutdown_signal() => None,
    };

    match finished {
        Some(joined) => {
            joined
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        None => {
            tracing::info!("Shutdown signal received, draining in-flight requests");
            server_handle.stop(true).await;
            match server_task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "HTTP server stopped with error"),
                Err(e) => tracing::error!(error = %e, "HTTP server task join error"),
            }
        }
    }

    db_pool.close().await;
    tracing::info!("PostgreSQL pool closed");
    if let Some(pool) = redis_pool {
        pool.shutdown().await;
    }

    tracing::info!("Post-service shut down");
    Ok(())
}
