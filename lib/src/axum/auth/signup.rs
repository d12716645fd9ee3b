use axum::http::StatusCode;
use axum::{Extension, Json};
use validator::{Validate, ValidateLength};

use crate::api::{AuthResponse, RegisterRequest};
use crate::auth::{log_in_user, register as register_account};
use crate::axum::extract::Payload;
use crate::axum::{ConfigExt, DbExt, MetricsExt};
use crate::metrics::Counter;
use crate::{ErrorKind, Result, Role};

/// Creates an account with a default profile and logs it in right away.
pub async fn register(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Payload(request): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    // validate inputs
    request.validate()?;
    let min_password = config.auth.min_password_length;
    if !request.password.validate_length(Some(min_password), None, None) {
        return Err(ErrorKind::BadInput(format!(
            "password must be at least {min_password} characters"
        ))
        .into());
    }

    let token_hours = config.auth.token_hours;
    let (user, profile, token) = db
        .call(config.timeouts.standard(), move |db| {
            let (user, profile) = register_account(
                db,
                &request.email,
                &request.password,
                &request.name,
                Role::User,
            )?;
            let token = log_in_user(db, user.id, token_hours)?;
            Ok((user, profile, token))
        })
        .await?;

    metrics.incr(Counter::UserRegistered);
    tracing::info!(user_id = %user.id, email = %user.email, "user_registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: (&user).into(),
            profile,
            token: token.id.to_string(),
        }),
    ))
}
