use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{Collectable, Database, Identifiable};
use crate::{Result, UserId};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Author,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }

    /// Authors and admins may publish posts.
    pub fn can_author(&self) -> bool {
        matches!(self, Role::Author | Role::Admin)
    }
}

/// Public-facing side of an account, stored under the owning user's id.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    /// JPEG thumbnail as a `data:image/jpeg;base64,...` URI. Empty if none
    /// was uploaded.
    pub avatar: String,
    pub bio: String,
    pub role: Role,
    pub settings: Settings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Profile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::nil(),
            name: "".to_string(),
            avatar: "".to_string(),
            bio: "".to_string(),
            role: Role::default(),
            settings: Settings::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Collectable for Profile {
    fn get_collection_name() -> &'static str {
        "profile"
    }
}

impl Identifiable for Profile {
    fn get_id(&self) -> Uuid {
        self.user_id
    }
}

impl Profile {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Applies a partial update. Returns the number of fields changed.
    pub fn apply(&mut self, update: ProfileUpdate) -> usize {
        let mut changed = 0;
        if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            self.name = name;
            changed += 1;
        }
        if let Some(bio) = update.bio {
            self.bio = bio;
            changed += 1;
        }
        if let Some(settings) = update.settings {
            changed += self.settings.apply(settings);
        }
        self.updated_at = Utc::now();
        changed
    }
}

/// Applies a partial update to the stored profile in a single atomic
/// read-modify-write. Returns the stored profile and the number of fields
/// changed.
pub fn update(db: &Database, user_id: UserId, update: ProfileUpdate) -> Result<(Profile, usize)> {
    let mut changed = 0;
    let profile = db.update_key(
        Profile::get_collection_name(),
        user_id.as_bytes(),
        |profile: &mut Profile| {
            profile.user_id = user_id;
            changed = profile.apply(update.clone());
        },
    )?;
    Ok((profile, changed))
}

/// Replaces only the avatar of the stored profile.
pub fn set_avatar(db: &Database, user_id: UserId, avatar: &str) -> Result<Profile> {
    db.update_key(
        Profile::get_collection_name(),
        user_id.as_bytes(),
        |profile: &mut Profile| {
            profile.user_id = user_id;
            profile.avatar = avatar.to_string();
            profile.updated_at = Utc::now();
        },
    )
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub currency: String,
    pub language: String,
    pub theme: Theme,
    /// 0 is Sunday, 1 is Monday.
    pub first_day_of_week: u8,
    pub date_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "BRL".to_string(),
            language: "pt-BR".to_string(),
            theme: Theme::default(),
            first_day_of_week: 0,
            date_format: "DD/MM/YYYY".to_string(),
        }
    }
}

impl Settings {
    fn apply(&mut self, update: SettingsUpdate) -> usize {
        let mut changed = 0;
        if let Some(currency) = update.currency {
            self.currency = currency;
            changed += 1;
        }
        if let Some(language) = update.language {
            self.language = language;
            changed += 1;
        }
        if let Some(day) = update.first_day_of_week {
            self.first_day_of_week = day;
            changed += 1;
        }
        if let Some(format) = update.date_format {
            self.date_format = format;
            changed += 1;
        }
        if let Some(theme) = update.theme {
            if let Some(mode) = theme.mode {
                self.theme.mode = mode;
                changed += 1;
            }
            if let Some(color) = theme.primary_color {
                self.theme.primary_color = color;
                changed += 1;
            }
            if let Some(color) = theme.accent_color {
                self.theme.accent_color = color;
                changed += 1;
            }
        }
        changed
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Theme {
    /// `light`, `dark` or `system`.
    pub mode: String,
    pub primary_color: String,
    pub accent_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: "system".to_string(),
            primary_color: "".to_string(),
            accent_color: "".to_string(),
        }
    }
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub settings: Option<SettingsUpdate>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub currency: Option<String>,
    pub language: Option<String>,
    pub theme: Option<ThemeUpdate>,
    pub first_day_of_week: Option<u8>,
    pub date_format: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeUpdate {
    pub mode: Option<String>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
}
