use actix_web::{dev::Service, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civic_feed_service::config::{Config, StorageBackend};
use civic_feed_service::repository::{InMemoryFeedStore, PgFeedStore};
use civic_feed_service::{configure, db, metrics, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(true),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting civic-feed-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let state = match config.storage.backend {
        StorageBackend::Postgres => {
            let db_config = config.database.as_ref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::Other, "database configuration missing")
            })?;

            let pool = db::create_pool(db_config).await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("Failed to create database pool: {e}"),
                )
            })?;

            if db_config.run_migrations {
                db::run_migrations(&pool).await.map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("Failed to run database migrations: {e}"),
                    )
                })?;
            }

            AppState::from_store(Arc::new(PgFeedStore::new(pool)), config.feed)
        }
        StorageBackend::Memory => {
            warn!(
                tenants = config.storage.memory_tenants.len(),
                "Using in-memory storage; data is lost on restart"
            );
            let store =
                InMemoryFeedStore::with_tenants(config.storage.memory_tenants.iter().copied());
            AppState::from_store(Arc::new(store), config.feed)
        }
    };
    let state = web::Data::new(state);

    let bind_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("HTTP server listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req
                    .match_pattern()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| req.path().to_string());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => {
                            metrics::observe_http_request(
                                &method,
                                &path,
                                res.status().as_u16(),
                                start.elapsed(),
                            );
                            Ok(res)
                        }
                        Err(err) => {
                            metrics::observe_http_request(&method, &path, 500, start.elapsed());
                            Err(err)
                        }
                    }
                }
            })
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
