use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::profile::Role;
use crate::Result;

pub static CONFIG_FILE: &'static str = "byline.toml";
pub static ENV_PREFIX: &'static str = "BYLINE";

/// Application configuration.
///
/// # Sensible defaults
///
/// `Config::default()` yields a working setup: sled database at `./db`,
/// formatted logging, 5 MiB upload ceiling, 256px avatars and 800px wide
/// post images. Individual sections can be overridden with the *struct
/// update syntax*.
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

    /// Address on which to serve the application. Defaults to
    /// `127.0.0.1:8080`.
    pub address: SocketAddr,

    pub db: Db,
    pub tracing: Tracing,
    pub auth: Auth,
    pub uploads: Uploads,
    pub comments: Comments,
    pub timeouts: Timeouts,
    pub pagination: Pagination,

    /// List of accounts to be created on startup if missing.
    pub users: Vec<User>,

    /// Development mode configuration.
    pub dev: DevMode,

    pub init: Init,
    /// Selectively enable/disable route groups
    pub routes: Routes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db: Db::default(),
            tracing: Tracing::default(),
            auth: Auth::default(),
            uploads: Uploads::default(),
            comments: Comments::default(),
            timeouts: Timeouts::default(),
            pagination: Pagination::default(),
            users: vec![],
            dev: DevMode::default(),
            init: Init::default(),
            routes: Routes::default(),
        }
    }
}

/// Loads application config from the default location. A missing file is
/// not an error, defaults and environment still apply.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_with(CONFIG_FILE, false)
}

/// Loads application config from toml file at the provided path.
///
/// For example for `name` == `byline.toml` we will load both `byline.toml`
/// and `secret.byline.toml`, then apply `BYLINE_`-prefixed environment
/// variables on top, using `__` to descend into sections
/// (`BYLINE_UPLOADS__MAX_BYTES=1048576`).
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    load_with(name, true)
}

fn load_with<T: DeserializeOwned>(name: impl AsRef<str>, required: bool) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()).required(required))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

/// Account to be seeded on startup.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct User {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Db {
    /// Path to the sled database directory, relative to the current working
    /// directory.
    pub path: String,
}

impl Default for Db {
    fn default() -> Self {
        Self {
            path: "./db".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    pub loki_address: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            loki_address: "".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    /// Lifetime of issued access tokens, in hours.
    pub token_hours: u64,
    pub min_password_length: u64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            token_hours: 168,
            min_password_length: 6,
        }
    }
}

/// Image upload limits and processing parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Uploads {
    /// Hard ceiling on the upload request body.
    pub max_bytes: usize,

    /// Edge length of the square avatar thumbnail.
    pub avatar_size: u32,
    pub avatar_quality: u8,

    /// Post images wider than this get scaled down.
    pub post_max_width: u32,
    pub post_quality: u8,

    /// Size variants produced for multi-resolution cover uploads.
    pub variants: Vec<Variant>,
    pub variant_quality: u8,
}

impl Default for Uploads {
    fn default() -> Self {
        Self {
            max_bytes: 5 << 20,
            avatar_size: 256,
            avatar_quality: 80,
            post_max_width: 800,
            post_quality: 65,
            variants: vec![
                Variant::new("thumb", 400),
                Variant::new("card", 800),
                Variant::new("banner", 1200),
            ],
            variant_quality: 65,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Variant {
    pub label: String,
    pub width: u32,
}

impl Variant {
    pub fn new(label: impl Into<String>, width: u32) -> Self {
        Self {
            label: label.into(),
            width,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Comments {
    /// Maximum comment length, in characters.
    pub max_length: usize,
}

impl Default for Comments {
    fn default() -> Self {
        Self { max_length: 2000 }
    }
}

/// Upper bounds on store operations.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    pub default_secs: u64,
    /// Used for quick existence checks, e.g. token lookup.
    pub quick_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_secs: 10,
            quick_secs: 5,
        }
    }
}

impl Timeouts {
    pub fn standard(&self) -> Duration {
        Duration::from_secs(self.default_secs)
    }

    pub fn quick(&self) -> Duration {
        Duration::from_secs(self.quick_secs)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Pagination {
    pub default_limit: usize,
    pub max_limit: usize,
    pub comments_default_limit: usize,
    pub users_default_limit: usize,
    pub users_max_limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            comments_default_limit: 20,
            users_default_limit: 20,
            users_max_limit: 100,
        }
    }
}

/// NOTE: make sure to disable on production.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DevMode {
    /// Global switch for all dev mode items.
    pub enabled: bool,
    /// Use a temporary database that is wiped on shutdown.
    pub temporary_db: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Init {
    pub enabled: bool,
}

impl Default for Init {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Routes {
    pub enable: Vec<String>,
    pub disable: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_policy() {
        let config = Config::default();
        assert_eq!(config.uploads.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.uploads.avatar_size, 256);
        assert_eq!(config.uploads.avatar_quality, 80);
        assert_eq!(config.uploads.post_max_width, 800);
        assert_eq!(config.uploads.post_quality, 65);
        assert_eq!(config.timeouts.standard(), Duration::from_secs(10));
        assert_eq!(config.timeouts.quick(), Duration::from_secs(5));
        assert_eq!(config.comments.max_length, 2000);
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let config: Config = load_with("definitely-not-here.toml", false).unwrap();
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.auth.token_hours, 168);
    }
}
