use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_auth::AuthBearer;

use crate::auth::resolve_token;
use crate::db::Database;
use crate::engagement::Actor;
use crate::error::{Error, ErrorKind, Result};
use crate::profile::{Profile, Role};
use crate::user::User as RawUser;
use crate::Config;

/// Authenticated caller, resolved from the `Authorization: Bearer` header.
///
/// Use `Option<User>` on endpoints where identity is optional; a missing
/// or unusable token then yields `None`.
#[derive(Clone, Debug)]
pub struct User {
    pub user: RawUser,
    pub profile: Profile,
}

impl Deref for User {
    type Target = RawUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user.id,
            role: self.profile.role,
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.role().is_admin() {
            Ok(())
        } else {
            Err(Error::new_with(
                ErrorKind::Forbidden("admin role required".to_string()),
                None,
                Some(self.user.id),
            ))
        }
    }

    pub fn require_author(&self) -> Result<()> {
        if self.role().can_author() {
            Ok(())
        } else {
            Err(Error::new_with(
                ErrorKind::Forbidden("author role required".to_string()),
                None,
                Some(self.user.id),
            ))
        }
    }
}

pub(crate) fn extension<T: Send + Sync + 'static>(parts: &Parts) -> Result<Arc<T>> {
    parts
        .extensions
        .get::<Arc<T>>()
        .cloned()
        .ok_or_else(|| {
            ErrorKind::Other(format!(
                "{} extension unavailable",
                std::any::type_name::<T>()
            ))
            .into()
        })
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for User {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let db = extension::<Database>(parts)?;
        let config = extension::<Config>(parts)?;

        let AuthBearer(token) = AuthBearer::from_request_parts(parts, state)
            .await
            .map_err(|_| ErrorKind::AuthFailed("missing bearer token".to_string()))?;

        let (user, profile) = db
            .call(config.timeouts.quick(), move |db| {
                let user = resolve_token(db, &token)?;
                let profile = db
                    .try_get::<Profile>(user.id)?
                    .unwrap_or_else(|| Profile::new(user.id, ""));
                Ok((user, profile))
            })
            .await?;

        Ok(User { user, profile })
    }
}
