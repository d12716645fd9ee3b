use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::db::{Collectable, Identifiable};
use crate::Result;

pub type UserId = Uuid;

/// Account data. Everything presentable lives on the
/// [`Profile`](crate::Profile) keyed by the same id.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,

    pub email: String,
    pub password_hash: String,

    pub registration_date: DateTime<Utc>,

    pub is_disabled: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "".to_string(),
            password_hash: "".to_string(),
            registration_date: Utc::now(),
            is_disabled: false,
        }
    }
}

impl Collectable for User {
    fn get_collection_name() -> &'static str {
        "user"
    }
}

impl Identifiable for User {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl User {
    /// Creates a new account with a freshly hashed password.
    pub fn new(email: &str, password: &str) -> Result<Self> {
        Ok(Self {
            email: normalize_email(email),
            password_hash: hash_password(password)?,
            ..Default::default()
        })
    }
}

/// Emails are compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
