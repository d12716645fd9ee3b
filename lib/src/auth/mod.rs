use std::str::FromStr;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::db::{Collectable, Database, Identifiable};
use crate::error::{ErrorKind, Result};
use crate::profile::{Profile, Role};
use crate::user::normalize_email;
use crate::{User, UserId};

pub mod login;

pub use login::{authenticate, log_in_user};

/// Tree mapping normalized emails onto user ids. Taking an entry is what
/// makes an email address belong to an account.
pub const USER_EMAILS: &str = "user_emails";

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn validate_password(password: &[u8], expected_password_hash: &str) -> Result<()> {
    let expected_password_hash = PasswordHash::new(expected_password_hash)
        .map_err(|_| ErrorKind::Other("Failed to parse hash in PHC string format.".to_string()))?;
    Argon2::default()
        .verify_password(password, &expected_password_hash)
        .map_err(|_| ErrorKind::InvalidCredentials)?;
    Ok(())
}

pub type TokenId = Uuid;

/// Opaque bearer token issued on login.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenMeta {
    pub id: TokenId,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Default for TokenMeta {
    fn default() -> Self {
        Self::new(Uuid::nil(), 0)
    }
}

impl Collectable for TokenMeta {
    fn get_collection_name() -> &'static str {
        "access_token"
    }
}

impl Identifiable for TokenMeta {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl TokenMeta {
    pub fn new(user_id: UserId, valid_hours: u64) -> Self {
        let issued_at = Utc::now();
        Self {
            id: TokenId::new_v4(),
            user_id,
            issued_at,
            expires_at: issued_at + Duration::hours(valid_hours as i64),
        }
    }

    /// Returns true if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Resolves a raw bearer token into the user it was issued for.
///
/// Unknown, malformed and expired tokens all fail with `AuthFailed`.
/// Expired tokens are removed on the way.
pub fn resolve_token(db: &Database, token: &str) -> Result<User> {
    let id = Uuid::from_str(token.trim())
        .map_err(|_| ErrorKind::AuthFailed("malformed token".to_string()))?;
    let meta = db
        .try_get::<TokenMeta>(id)?
        .ok_or_else(|| ErrorKind::AuthFailed("unknown token".to_string()))?;

    if meta.is_expired() {
        db.remove::<TokenMeta>(meta.id)?;
        return Err(ErrorKind::AuthFailed("token expired".to_string()).into());
    }

    let user = db
        .try_get::<User>(meta.user_id)?
        .ok_or_else(|| ErrorKind::AuthFailed("token owner no longer exists".to_string()))?;
    if user.is_disabled {
        return Err(ErrorKind::AccountDisabled.into());
    }
    Ok(user)
}

/// Creates an account along with its profile.
///
/// The email is claimed atomically, of two concurrent registrations for the
/// same address only one succeeds and the other gets
/// `UserWithEmailAlreadyExists`.
pub fn register(
    db: &Database,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> Result<(User, Profile)> {
    let user = User::new(email, password)?;
    if !db.insert_if_absent(USER_EMAILS, user.email.as_bytes(), &user.id)? {
        return Err(ErrorKind::UserWithEmailAlreadyExists(user.email).into());
    }

    let mut profile = Profile::new(user.id, name.trim());
    profile.role = role;

    db.set(&user)?;
    db.set(&profile)?;

    Ok((user, profile))
}

/// Looks up an account through the email index.
pub fn find_user_by_email(db: &Database, email: &str) -> Result<Option<User>> {
    match db.get_key::<UserId>(USER_EMAILS, normalize_email(email).as_bytes())? {
        Some(id) => db.try_get::<User>(id),
        None => Ok(None),
    }
}
