use axum::{Extension, Json};

use crate::api::{AuthResponse, LoginRequest, MeResponse};
use crate::auth::{authenticate, log_in_user};
use crate::axum::extract::{Payload, User};
use crate::axum::{ConfigExt, DbExt, MetricsExt};
use crate::metrics::Counter;
use crate::{Profile, Result};

/// Checks the credentials and hands out a bearer token.
pub async fn login(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Extension(metrics): MetricsExt,
    Payload(request): Payload<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let token_hours = config.auth.token_hours;
    let email = request.email.clone();
    let result = db
        .call(config.timeouts.standard(), move |db| {
            let user = authenticate(db, &request.email, &request.password)?;
            let token = log_in_user(db, user.id, token_hours)?;
            let profile = db
                .try_get::<Profile>(user.id)?
                .unwrap_or_else(|| Profile::new(user.id, ""));
            Ok((user, profile, token))
        })
        .await;

    let (user, profile, token) = match result {
        Ok(logged_in) => logged_in,
        Err(e) => {
            if e.status().is_client_error() {
                metrics.incr(Counter::LoginFailed);
                tracing::info!(email = %email, user_id = ?e.user, "login_failed");
            }
            return Err(e);
        }
    };

    metrics.incr(Counter::LoginSuccess);
    tracing::info!(user_id = %user.id, "login_success");

    Ok(Json(AuthResponse {
        user: (&user).into(),
        profile,
        token: token.id.to_string(),
    }))
}

/// Account and profile of the caller.
pub async fn me(user: User) -> Json<MeResponse> {
    Json(MeResponse {
        user: (&user.user).into(),
        profile: user.profile,
    })
}
