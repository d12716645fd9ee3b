//! Data initialization procedures.
//!
//! The app config can list accounts expected to exist once the application
//! is started. This module turns those entries into initial application
//! state.

use crate::auth::{find_user_by_email, register};
use crate::{Config, Database, Profile, Result};

/// Initializes database state based on entries found in the config.
pub fn initialize(config: &Config, db: &Database) -> Result<()> {
    if !config.init.enabled {
        return Ok(());
    }
    users(config, db)?;
    Ok(())
}

/// Creates the configured accounts that don't exist yet.
///
/// Existing accounts keep their password and profile, only their role is
/// brought in line with the config.
pub fn users(config: &Config, db: &Database) -> Result<()> {
    for entry in &config.users {
        match find_user_by_email(db, &entry.email)? {
            Some(existing) => {
                let mut profile = db
                    .try_get::<Profile>(existing.id)?
                    .unwrap_or_else(|| Profile::new(existing.id, entry.name.clone()));
                if profile.role != entry.role {
                    profile.role = entry.role;
                    db.set(&profile)?;
                    tracing::info!(user_id = %existing.id, role = %entry.role, "seeded account role updated");
                }
            }
            None => {
                let (user, _) = register(db, &entry.email, &entry.password, &entry.name, entry.role)?;
                tracing::info!(user_id = %user.id, email = %user.email, "seeded account created");
            }
        }
    }
    Ok(())
}
