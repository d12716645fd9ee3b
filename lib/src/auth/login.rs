use crate::db::Database;
use crate::error::{Error, ErrorKind, Result};
use crate::{User, UserId};

use super::{find_user_by_email, validate_password, TokenMeta};

/// Checks the credentials and returns the matching account.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<User> {
    let user = find_user_by_email(db, email)?.ok_or(ErrorKind::InvalidCredentials)?;
    validate_password(password.as_bytes(), &user.password_hash)
        .map_err(|e| e.with_user(user.id))?;

    // don't let disabled users log in
    if user.is_disabled {
        return Err(Error::new_with(ErrorKind::AccountDisabled, None, Some(user.id)));
    }

    Ok(user)
}

/// Issues an access token for the user, reusing a still valid one if the
/// user already has it.
pub fn log_in_user(db: &Database, user_id: UserId, valid_hours: u64) -> Result<TokenMeta> {
    let existing = db.find::<TokenMeta, _>(|t| t.user_id == user_id && !t.is_expired())?;
    if let Some(token) = existing {
        return Ok(token);
    }

    let token = TokenMeta::new(user_id, valid_hours);
    db.set(&token)?;
    Ok(token)
}
