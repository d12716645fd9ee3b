//! Multi-tenant blogging and profile backend.
//!
//! Users authenticate with bearer tokens, keep an editable profile with an
//! avatar, and publish posts that readers can view, like and comment on.
//!
//! Two subsystems carry most of the weight:
//!
//! - [`imaging`]: upload validation, EXIF orientation correction, crop and
//!   resize, JPEG re-encoding. Results are persisted inline, either as a data
//!   URI on the profile or as a [`StoredImage`] document.
//! - [`engagement`]: view, like and comment counters kept consistent under
//!   concurrent requests through insert-if-absent markers and atomic counter
//!   adjustments.
//!
//! The HTTP surface lives in [`axum`](crate::axum) behind the default `axum`
//! feature.

#[macro_use]
extern crate serde_derive;

pub mod api;
pub mod auth;
pub mod comment;
pub mod config;
pub mod db;
pub mod engagement;
pub mod error;
pub mod imaging;
pub mod init;
pub mod media;
pub mod metrics;
pub mod post;
pub mod profile;
pub mod routes;
pub mod tracing;
pub mod user;
pub mod util;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::comment::{Comment, CommentId};
pub use crate::config::Config;
pub use crate::db::Database;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::media::{ImageId, StoredImage};
pub use crate::metrics::{Collector, Counter, Metrics};
pub use crate::post::{Post, PostId};
pub use crate::profile::{Profile, Role};
pub use crate::user::{User, UserId};

#[cfg(feature = "axum")]
pub use crate::axum::{app, router, serve, start, start_with, Router};
