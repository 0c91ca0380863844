//! Application Startup
//!
//! Wires repositories, realtime components and services together, and
//! builds the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    GroupService, GroupServiceImpl, MessageService, MessageServiceImpl, PresenceService,
    PresenceServiceImpl, UserService, UserServiceImpl,
};
use crate::config::{Settings, StorageBackend};
use crate::domain::services::NotificationSink;
use crate::domain::{GroupMessageRepository, GroupRepository, MessageRepository, UserRepository};
use crate::infrastructure::cache::{
    self, GroupDirectory, MessageSequencer, UnreadTracker, UserDirectory,
};
use crate::infrastructure::database;
use crate::infrastructure::notifications::RedisNotificationSink;
use crate::infrastructure::realtime::{Broadcaster, PresenceAggregator, SessionRegistry};
use crate::infrastructure::repositories::{
    InMemoryGroupMessageRepository, InMemoryGroupRepository, InMemoryMessageRepository,
    InMemoryUserRepository, PgGroupMessageRepository, PgGroupRepository, PgMessageRepository,
    PgUserRepository,
};
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};

/// The four stores every deployment needs
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub group_messages: Arc<dyn GroupMessageRepository>,
}

impl Repositories {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            group_messages: Arc::new(PgGroupMessageRepository::new(pool.clone())),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            groups: Arc::new(InMemoryGroupRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            group_messages: Arc::new(InMemoryGroupMessageRepository::new()),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserService>,
    pub groups: Arc<dyn GroupService>,
    pub messages: Arc<dyn MessageService>,
    pub presence: Arc<dyn PresenceService>,
    pub registry: Arc<SessionRegistry>,
    pub db: Option<PgPool>,
    pub redis: Option<ConnectionManager>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Construct every component on top of `repos`.
    pub fn new(
        settings: Settings,
        repos: Repositories,
        sink: Option<Arc<dyn NotificationSink>>,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let aggregator = Arc::new(PresenceAggregator::new(registry.clone()));
        let broadcaster = match sink {
            Some(sink) => Broadcaster::new(registry.clone()).with_sink(sink),
            None => Broadcaster::new(registry.clone()),
        };
        let broadcaster = Arc::new(broadcaster);

        let user_directory = Arc::new(UserDirectory::new(repos.users));
        let group_directory = Arc::new(GroupDirectory::new(repos.groups));
        let sequencer = Arc::new(MessageSequencer::new(
            settings.realtime.sequencer_idle(),
            settings.realtime.sequencer_max_keys,
        ));
        let unread = Arc::new(UnreadTracker::new(repos.messages.clone()));

        let presence: Arc<dyn PresenceService> = Arc::new(PresenceServiceImpl::new(
            user_directory.clone(),
            registry.clone(),
            aggregator,
            broadcaster.clone(),
        ));
        let users = Arc::new(UserServiceImpl::new(
            user_directory.clone(),
            presence.clone(),
            broadcaster.clone(),
            settings.limits.clone(),
        ));
        let groups = Arc::new(GroupServiceImpl::new(
            user_directory.clone(),
            group_directory.clone(),
            broadcaster.clone(),
            settings.limits.clone(),
        ));
        let messages = Arc::new(MessageServiceImpl::new(
            user_directory,
            group_directory,
            repos.messages,
            repos.group_messages,
            sequencer,
            unread,
            broadcaster,
            settings.limits.clone(),
        ));

        Self {
            users,
            groups,
            messages,
            presence,
            registry,
            db: None,
            redis: None,
            settings: Arc::new(settings),
        }
    }

    /// State over the in-memory stores, without external backends.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, Repositories::in_memory(), None)
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let (repos, db) = match settings.storage.backend {
            StorageBackend::Postgres => {
                let db = database::create_pool(&settings.database).await?;
                tracing::info!("Database connection pool created");
                if settings.database.run_migrations {
                    database::run_migrations(&db).await?;
                    tracing::info!("Database migrations applied");
                }
                (Repositories::postgres(&db), Some(db))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data is lost on restart");
                (Repositories::in_memory(), None)
            }
        };

        let redis = if settings.notifications.enabled {
            let conn = cache::create_redis_client(&settings.notifications.redis_url).await?;
            tracing::info!("Redis connection established");
            Some(conn)
        } else {
            None
        };
        let sink = redis.clone().map(|conn| {
            Arc::new(RedisNotificationSink::new(
                conn,
                settings.notifications.channel_prefix.clone(),
            )) as Arc<dyn NotificationSink>
        });

        let mut state = AppState::new(settings.clone(), repos, sink);
        state.db = db;
        state.redis = redis;

        let warmed = state.users.warm_cache().await?;
        tracing::info!(users = warmed, "User cache warmed");

        // Build router with middleware
        let router = build_router(state, &settings);

        // Bind to address
        let addr = settings.server_addr();
        let listener = TcpListener::bind(addr.as_str()).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Router with request tracing and CORS applied
pub fn build_router(state: AppState, settings: &Settings) -> Router {
    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors::create_cors_layer(&settings.cors))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
