use std::{process, sync::Arc};

use axum::http::StatusCode;
use pictura::{
    application::{
        error::{AppError, ErrorReport},
        identity::IdentityVerifier,
        posts::{EngineConfig, PostService},
        repos::ObjectStore,
    },
    cache::{CacheConfig, ListingCache, MemoryReadCache, ReadCache},
    config,
    infra::{
        cache::RedisReadCache,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        identity::HttpIdentityVerifier,
        images::FsObjectStore,
        telemetry,
        uploads::UploadStorage,
    },
};
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("main", StatusCode::INTERNAL_SERVER_ERROR, error);
    let emit = || {
        error!(
            error = %error,
            chain = ?report.messages,
            exit_code = error.exit_code(),
            "application error"
        );
    };

    if dispatcher::has_been_set() {
        emit();
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, emit);
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    connect_and_migrate(&settings).await?;
    info!(target = "pictura::migrations", "migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_and_migrate(&settings).await?;
    let repositories = PostgresRepositories::new(pool);

    let storage = UploadStorage::new(settings.uploads.directory.clone())
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let objects: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(
        Arc::new(storage),
        repositories.clone(),
    ));

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = ListingCache::new(build_read_cache(&cache_config).await, cache_config);

    let repositories = Arc::new(repositories);
    let posts = Arc::new(PostService::new(
        repositories.clone(),
        repositories,
        objects,
        cache,
        EngineConfig::from(&settings),
    ));

    let identity: Arc<dyn IdentityVerifier> = Arc::new(
        HttpIdentityVerifier::new(&settings.identity.base_url, settings.identity.timeout)
            .map_err(AppError::from)?,
    );

    serve_http(&settings, ApiState::new(posts, identity)).await
}

async fn connect_and_migrate(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(pool)
}

async fn build_read_cache(cache_config: &CacheConfig) -> Arc<dyn ReadCache> {
    let Some(redis_url) = cache_config.redis_url.as_deref() else {
        info!(
            target = "pictura::cache",
            capacity = cache_config.memory_capacity_non_zero().get(),
            "no redis url configured; using in-process listing cache"
        );
        return Arc::new(MemoryReadCache::new(cache_config));
    };

    match RedisReadCache::connect(redis_url).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            warn!(
                target = "pictura::cache",
                error = %err,
                "redis unavailable at startup; using in-process listing cache"
            );
            Arc::new(MemoryReadCache::new(cache_config))
        }
    }
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "pictura::http",
        addr = %settings.server.addr,
        "listening"
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(target = "pictura::http", error = %err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!(target = "pictura::http", "shutdown signal received; draining connections");
            let _ = shutdown_tx.send(true);
        },
    );

    let grace = settings.server.graceful_shutdown;
    let deadline = async move {
        if shutdown_rx.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = deadline => {
            warn!(
                target = "pictura::http",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}
