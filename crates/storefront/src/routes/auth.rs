//! Authentication route handlers.
//!
//! Identity lives in the remote commerce API; these handlers only trade
//! credentials for a session-stored [`CurrentUser`]. There is no local
//! password storage.

use axum::{Form, extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::models::session::{CurrentUser, keys};
use crate::state::AppState;

/// Read the signed-in customer from the session, if any.
///
/// Session read failures count as signed-out rather than erroring the
/// whole request.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session.get::<CurrentUser>(keys::CURRENT_USER).await.ok()?
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signed-in customer view.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.to_string(),
        }
    }
}

/// Authenticate against the commerce API and store the identity in the
/// session.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Json<UserView>> {
    let user = state
        .commerce()
        .login(&form.email, &form.password)
        .await
        .map_err(|err| match err {
            ApiError::Rejected(message) => AppError::Unauthorized(message),
            other => other.into(),
        })?;

    session
        .insert(keys::CURRENT_USER, &user)
        .await
        .map_err(|err| AppError::Internal(format!("failed to store session user: {err}")))?;

    tracing::info!(user_id = %user.id, "customer signed in");
    Ok(Json(UserView::from(&user)))
}

/// Return the signed-in customer, or 401 when signed out.
#[instrument(skip(session))]
pub async fn me(session: Session) -> Result<Json<UserView>> {
    match current_user(&session).await {
        Some(user) => Ok(Json(UserView::from(&user))),
        None => Err(AppError::Unauthorized("not signed in".to_owned())),
    }
}

/// Clear the signed-in customer from the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    session
        .remove::<CurrentUser>(keys::CURRENT_USER)
        .await
        .map_err(|err| AppError::Internal(format!("failed to clear session user: {err}")))?;

    Ok(StatusCode::NO_CONTENT)
}
