use std::net::SocketAddr;

use serde::de::DeserializeOwned;

use crate::{Result, Role};

pub static CONFIG_FILE: &str = "beacon.toml";

/// Application configuration.
///
/// # Sensible defaults
///
/// Configuration provided through `Config::default()` allows for a quick
/// local setup: database in `./db`, logs formatted to stdout, uploads capped
/// at 5 MiB and admin lockout after 5 failed logins.
///
/// Using the *struct update syntax* one can initialize a new `Config`, making
/// a few changes right in the definition.
///
/// ```ignore
/// let cfg = Config {
///     tracing: Tracing {
///         enabled: false,
///         ..Default::default()
///     },
///     ..Default::default()
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub version: String,

    /// Domain name pointing to the machine running the application.
    pub domain: String,
    /// Address on which to serve the application. Defaults to
    /// `127.0.0.1:8080`.
    pub address: SocketAddr,
    /// Base url used when building public links, e.g. for uploaded images.
    /// Empty value results in root-relative links.
    pub base_url: String,

    pub db: Db,
    pub assets: Assets,
    pub tracing: Tracing,
    pub uploads: Uploads,
    pub cache: Cache,
    pub auth: Auth,
    pub email: Email,

    /// List of initial admin accounts.
    pub admins: Vec<InitAdmin>,

    /// Development mode configuration.
    pub dev: DevMode,

    pub init: Init,
    /// Selectively enable/disable pre-made routes
    pub routes: Routes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            domain: "localhost".to_string(),
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "".to_string(),
            db: Db::default(),
            assets: Assets::default(),
            tracing: Tracing::default(),
            uploads: Uploads::default(),
            cache: Cache::default(),
            auth: Auth::default(),
            email: Email::default(),
            admins: vec![],
            dev: DevMode::default(),
            init: Init::default(),
            routes: Routes::default(),
        }
    }
}

/// Loads application config from toml file at default location.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_from(CONFIG_FILE)
}

/// Loads application config from toml file at standard path using provided
/// name.
///
/// For example for `name` == `beacon.toml` we will load both `beacon.toml`
/// and `secret.beacon.toml` from the main project directory. Environment
/// variables override both, e.g. `__EMAIL__SMTP_PASSWORD`.
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix_separator("__"),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

/// Loads application config from multiple toml files at given paths.
pub fn load_from_many<T: DeserializeOwned>(paths: &[impl AsRef<str>]) -> Result<T> {
    let mut builder = config::Config::builder().add_source(
        config::Environment::default()
            .separator("__")
            .prefix_separator("__"),
    );

    for path in paths {
        builder = builder.add_source(config::File::with_name(path.as_ref()));
    }
    let config = builder.build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

/// Admin account to be ensured at startup.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct InitAdmin {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
}

impl Default for InitAdmin {
    fn default() -> Self {
        Self {
            email: "".to_string(),
            name: "".to_string(),
            password: "".to_string(),
            role: Role::ContentManager,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Db {
    /// Path to the database directory, relative to the current working
    /// directory.
    pub path: String,
    /// Keep the database in a temporary location removed on drop.
    pub temporary: bool,
}

impl Default for Db {
    fn default() -> Self {
        Self {
            path: "./db".to_string(),
            temporary: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Assets {
    /// Flag for enabling the asset serving service, serving assets from
    /// filesystem directory based on provided path.
    pub serve: bool,
    /// Path to the assets directory to be accessed at runtime. Defaults to
    /// `./assets`.
    pub path: String,
}

impl Default for Assets {
    fn default() -> Self {
        Self {
            serve: true,
            path: "assets".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    /// Directory for daily rotated log files. Logs go to stdout only when
    /// not set.
    pub directory: Option<String>,

    pub loki_address: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            directory: None,
            loki_address: "".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Uploads {
    /// Maximum accepted size of a single image, in bytes.
    pub max_bytes: usize,
    /// Image formats accepted, as detected from the file content.
    pub accepted_types: Vec<String>,
}

impl Default for Uploads {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            accepted_types: ["image/png", "image/jpeg", "image/gif", "image/webp"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Cache {
    /// Lifetime of cached listings, in seconds. Any write clears the cache
    /// regardless.
    pub ttl_secs: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    /// Consecutive failed logins after which the account gets locked.
    pub max_failed_logins: u32,
    /// How long a locked account stays locked.
    pub lockout_minutes: i64,
    /// Lifetime of an admin session.
    pub session_hours: i64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            max_failed_logins: 5,
            lockout_minutes: 15,
            session_hours: 12,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Email {
    /// Enables sending notifications about new messages.
    pub enabled: bool,

    /// Address that the application will use as sender.
    pub address: String,
    /// Address receiving notifications about new inbound messages.
    pub notify: String,

    // Smtp server and credentials.
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
}

/// NOTE: make sure to disable on production.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DevMode {
    /// Global switch for all dev mode items.
    pub enabled: bool,
    /// Automatic login flag. Includes the email of the admin to be logged in.
    pub autologin: Option<String>,
    /// Populate the database with sample content.
    pub mock: bool,
    /// Regenerate sample content even if it's already present.
    pub mock_regen: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Init {
    pub enabled: bool,
    /// Directory searched for seed content (`blog/*.md`, `projects/*.yaml`).
    pub content_dir: String,
}

impl Default for Init {
    fn default() -> Self {
        Self {
            enabled: true,
            content_dir: "content".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Routes {
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}
