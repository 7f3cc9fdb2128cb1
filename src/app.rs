//! Application bootstrap: wires storage, persistence and the HTTP router,
//! then serves until a shutdown signal arrives.

use crate::models::Config;
use crate::repository::{postgres, InMemoryProductRepository, PgProductRepository, ProductRepository};
use crate::service::ProductService;
use crate::storage::client::S3Settings;
use crate::storage::{ImageStore, MockImageStore, S3ImageStore};
use crate::web::{self, AppState};
use crate::{Error, Result};
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

/// Owns the router state and the database pool for the lifetime of the server.
pub struct App {
    config: Config,
    state: AppState,
    pool: Option<PgPool>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub repository: Arc<dyn ProductRepository>,
    pub images: Arc<dyn ImageStore>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, config: Config) -> Self {
        Self {
            config,
            state: AppState {
                products: ProductService::new(services.repository, services.images),
            },
            pool: None,
        }
    }

    /// Connect to the database and image storage described by `config`.
    ///
    /// In dry-run mode both are replaced by in-memory implementations.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        if config.dry_run {
            info!("DRY_RUN enabled: using in-memory products and mock image storage");
            let services = AppServices {
                repository: Arc::new(InMemoryProductRepository::new()),
                images: Arc::new(
                    MockImageStore::new().with_base_url(config.storage_base_url.clone()),
                ),
            };
            return Ok(Self::with_services(services, config));
        }

        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| Error::Config("DATABASE_URL not set".to_string()))?;
        let pool = postgres::connect(database_url, config.database_max_connections).await?;

        let images = S3ImageStore::new(S3Settings {
            access_key_id: config
                .storage_access_key_id
                .clone()
                .ok_or_else(|| Error::Config("STORAGE_ACCESS_KEY_ID not set".to_string()))?,
            secret_access_key: config
                .storage_secret_access_key
                .clone()
                .ok_or_else(|| Error::Config("STORAGE_SECRET_ACCESS_KEY not set".to_string()))?,
            endpoint: config.storage_endpoint.clone(),
            region: config.storage_region.clone(),
            bucket: config.storage_bucket.clone(),
            base_url: config.storage_base_url.clone(),
        })
        .await?;
        info!(
            "Image storage: bucket {} at {}",
            config.storage_bucket, config.storage_endpoint
        );

        let mut app = Self::with_services(
            AppServices {
                repository: Arc::new(PgProductRepository::new(pool.clone())),
                images: Arc::new(images),
            },
            config,
        );
        app.pool = Some(pool);
        Ok(app)
    }

    pub fn router(&self) -> Router {
        web::router(self.state.clone(), self.config.max_upload_bytes)
    }

    /// Serve until ctrl-c/SIGTERM, then close the database pool.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Product catalog listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(pool) = self.pool {
            pool.close().await;
            info!("Database pool closed");
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
