use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use http::StatusCode;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
    pub request: Option<Uuid>,
    pub user: Option<Uuid>,
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            request: None,
            user: None,
        }
    }

    pub fn new_with(kind: ErrorKind, request: Option<Uuid>, user: Option<Uuid>) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
            request,
            user,
        }
    }

    /// Attaches the acting user to the error so that it shows up in logs.
    pub fn with_user(mut self, user: Uuid) -> Self {
        self.user = Some(user);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(user) = self.user {
            write!(f, ", user: {}", user)?;
        }
        if let Some(request) = self.request {
            write!(f, ", request: {}", request)?;
        }
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, ", {}", self.backtrace)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("unexpected error")]
    StdIoError(#[from] std::io::Error),

    #[error("config error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("failed parsing value from string: {0}")]
    ParsingError(String),
    #[error("failed parsing url: {0}")]
    UrlParseError(#[from] tracing_loki::url::ParseError),

    #[error("other error: {0}")]
    Other(String),

    #[error("bad input: {0}")]
    BadInput(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("payload too large (max {0} bytes)")]
    PayloadTooLarge(usize),
    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,

    #[error("{0} not found")]
    NotFound(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("db error: {0}")]
    DbError(String),
    #[error("sled db error: {0}")]
    SledError(#[from] sled::Error),

    #[error("passwordhash error: {0}")]
    PasswordHashError(#[from] argon2::password_hash::Error),

    #[error("json decode error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("pot decode error: {0}")]
    PotError(#[from] pot::Error),
    #[error("base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("uuid error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("image codec error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("blocking task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("user with this email already exists: {0}")]
    UserWithEmailAlreadyExists(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
}

impl ErrorKind {
    /// Status code the kind maps onto at the http boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadInput(_)
            | Self::InvalidId(_)
            | Self::UuidError(_)
            | Self::ParsingError(_)
            | Self::UnsupportedImageType(_)
            | Self::InvalidImage(_)
            | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AuthFailed(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::AccountDisabled => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::UserWithEmailAlreadyExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

macro_rules! impl_from_kind {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(e: $ty) -> Self {
                    Self::new(ErrorKind::$variant(e))
                }
            }
        )*
    };
}

impl_from_kind! {
    std::io::Error => StdIoError,
    config::ConfigError => ConfigError,
    tracing_loki::url::ParseError => UrlParseError,
    sled::Error => SledError,
    argon2::password_hash::Error => PasswordHashError,
    serde_json::Error => JsonError,
    pot::Error => PotError,
    base64::DecodeError => Base64Error,
    uuid::Error => UuidError,
    image::ImageError => ImageError,
    validator::ValidationErrors => ValidationError,
    tokio::task::JoinError => JoinError,
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::new(ErrorKind::Other(e))
    }
}

impl From<ErrorKind> for Error {
    fn from(k: ErrorKind) -> Self {
        Self::new(k)
    }
}
