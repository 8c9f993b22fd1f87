pub mod admins;
pub mod askama;
pub mod auth;
pub mod blog;
pub mod editor;
pub mod error;
pub mod extract;
pub mod image;
pub mod message;
pub mod project;

pub use extract::admin::AdminSession;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Extension;
use tower_http::trace::TraceLayer;

use crate::{ActionResult, Config, Database, ListCache, Result};

pub type Router = axum::Router<cookie::Key>;

pub type ConfigExt<C = Config> = Extension<Arc<C>>;
pub type DbExt = Extension<Arc<Database>>;
pub type CacheExt = Extension<Arc<ListCache>>;

/// Extra room on top of the upload limit for multipart framing, so that
/// slightly oversized images still reach validation and get a readable
/// rejection.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Result of an admin action together with the affected item.
#[derive(Clone, Debug, Serialize)]
pub struct Outcome<T> {
    #[serde(flatten)]
    pub action: ActionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            action: ActionResult::ok(message),
            data: Some(data),
        }
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self {
            action: ActionResult::ok(message),
            data: None,
        }
    }
}

/// Registers beacon routes on the provided router.
///
/// # Configurable routes
///
/// Route groups can be switched off through `routes.disable` in the config,
/// e.g. to register a custom handler in place of the stock one. Groups are
/// `public`, `projects`, `blog`, `messages`, `image`, `auth`, `editor` and
/// `admins`.
pub fn router(mut router: Router, config: &Config) -> Router {
    router = conditional_merge("projects", router, project::router(), config);
    router = conditional_merge("blog", router, blog::router(), config);
    router = conditional_merge("messages", router, message::router(), config);
    router = conditional_merge("image", router, image::router(), config);
    router = conditional_merge("auth", router, auth::router(), config);
    router = conditional_merge("editor", router, editor::router(), config);
    conditional_merge("admins", router, admins::router(), config)
}

fn conditional_merge(route: &str, routera: Router, routerb: Router, config: &Config) -> Router {
    if config.routes.enable.contains(&route.to_string())
        || !config.routes.disable.contains(&route.to_string())
    {
        routera.merge(routerb)
    } else {
        routera
    }
}

/// Registers beacon routes along with shared state on top of `router`,
/// producing a ready to serve application.
pub fn app(db: Database, router: Router, config: Config, key: cookie::Key) -> axum::Router {
    let cache = ListCache::from_config(&config.cache);
    let body_limit = config.uploads.max_bytes + BODY_LIMIT_SLACK;
    let mut router = self::router(router, &config);

    if config.assets.serve {
        router = router.nest_service(
            "/assets",
            tower_http::services::ServeDir::new(&config.assets.path),
        );
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(cache)))
        .layer(Extension(Arc::new(config)))
        .layer(Extension(Arc::new(db)))
        .with_state(key)
}

/// Opens the configured database and starts the web server.
pub async fn start(router: Router, config: Config) -> Result<()> {
    let db = Database::open(&config.db)?;
    start_with(db, router, config).await
}

pub async fn start_with(db: Database, router: Router, config: Config) -> Result<()> {
    let _guard = crate::tracing::init(&config).unwrap_or_else(|e| {
        log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}");
        None
    });

    // Provide initial state as defined in config
    if config.init.enabled {
        crate::init::initialize(&config, &db)?;
    }

    if config.dev.enabled && config.dev.mock {
        crate::mock::generate(&config, &db)?;
    }

    // The cookie key lives in router state, that's where the private cookie
    // jar extractor looks for it.
    let key = if config.dev.enabled {
        // Dev mode sessions only last until the application is rerun.
        cookie::Key::generate()
    } else {
        crate::util::cookie_key(&db)?
    };

    let addr = config.address;
    let app = app(db, router, config, key);

    tracing::info!("starting server at {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.map_err(|e| e.into())
}
