use huddle_bot::{BootError, BotConfig, HttpGateway, routes};
use huddle_conversation::{CommandRegistry, FlowController, InteractionRouter, MessagingGateway};
use huddle_directory::{DirectoryStore, HistoryLedger, InMemoryDirectory, PgDirectory};
use huddle_scheduler::TriggerEngine;
use huddle_session::{InMemorySessionStore, NatsSessionConfig, NatsSessionStore, SessionStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> huddle_core::Result<(), BootError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env().map_err(|e| BootError::Config {
        details: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    let (directory, ledger): (Arc<dyn DirectoryStore>, Arc<dyn HistoryLedger>) =
        match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(url)
                    .await
                    .map_err(|e| BootError::Database {
                        details: e.to_string(),
                    })?;
                let store = PgDirectory::new(pool);

                tracing::info!("Running database migrations...");
                store.migrate().await.map_err(|e| BootError::Migration {
                    details: e.to_string(),
                })?;

                let store = Arc::new(store);
                let directory: Arc<dyn DirectoryStore> = store.clone();
                (directory, store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; directory is kept in memory");
                let store = Arc::new(InMemoryDirectory::new());
                let directory: Arc<dyn DirectoryStore> = store.clone();
                (directory, store)
            }
        };

    let sessions: Arc<dyn SessionStore> = match &config.nats_url {
        Some(url) => {
            let nats = NatsSessionConfig {
                bucket_name: Some(config.session.bucket.clone()),
                max_age: config.session.ttl(),
                ..NatsSessionConfig::new(url.clone())
            };
            let store = NatsSessionStore::connect(nats)
                .await
                .map_err(|e| BootError::Sessions {
                    details: e.to_string(),
                })?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("NATS_URL not set; sessions are kept in memory");
            let store = InMemorySessionStore::new();
            store.spawn_purge(config.session.cleanup_interval());
            Arc::new(store)
        }
    };

    let gateway: Arc<dyn MessagingGateway> = Arc::new(
        HttpGateway::new(config.bridge_url.clone()).map_err(|e| BootError::Config {
            details: e.to_string(),
        })?,
    );

    let registry = Arc::new(CommandRegistry::standard());
    gateway
        .register_commands(&registry)
        .await
        .map_err(|e| BootError::Commands {
            details: e.to_string(),
        })?;

    let controller = FlowController::new(
        directory.clone(),
        ledger.clone(),
        sessions,
        gateway.clone(),
    )
    .with_session_ttl(config.session.ttl());

    if config.scheduler.enabled {
        let engine = TriggerEngine::new(
            directory,
            ledger,
            gateway,
            Arc::new(controller.clone()),
        );
        let every = config.scheduler.tick();
        tokio::spawn(async move { engine.run(every).await });
    } else {
        tracing::info!("Trigger engine disabled");
    }

    let app = routes(InteractionRouter::new(controller, registry));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| BootError::Bind {
            addr: config.listen_addr.clone(),
            details: e.to_string(),
        })?;

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| BootError::Serve {
            details: e.to_string(),
        })?;

    Ok(())
}
