//! Sign-in, sign-out and session introspection.
//!
//! `whoami` reports how the catalog resolved the caller's credentials. Token
//! contents beyond subject, email and role are never echoed.
use crate::api::error::{ApiError, api_bad_body, api_unauthorized};
use crate::api::types::{LoginRequest, LoginResponse, MessageResponse, WhoAmIResponse};
use crate::app::AppState;
use crate::auth::LoginError;
use crate::observability::LOGIN_ATTEMPTS;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use luxe_authz::Action;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued; also set as the session cookie", body = LoginResponse),
        (status = 400, description = "Malformed body", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Unknown username or wrong password", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(api_bad_body)?;
    let session = match state.auth.login(&request.username, &request.password).await {
        Ok(session) => session,
        Err(LoginError::InvalidCredentials) => {
            metrics::counter!(LOGIN_ATTEMPTS, "result" => "rejected").increment(1);
            tracing::warn!(username = %request.username, "staff login rejected");
            return Err(api_unauthorized("invalid username or password"));
        }
        Err(err @ LoginError::Session(_)) => {
            metrics::counter!(LOGIN_ATTEMPTS, "result" => "error").increment(1);
            tracing::error!(error = %err, "session could not be minted");
            return Err(api_unauthorized("invalid username or password"));
        }
    };
    metrics::counter!(LOGIN_ATTEMPTS, "result" => "ok").increment(1);
    tracing::info!(subject = %session.subject, role = session.role.as_str(), "staff login");
    let cookie = state.auth.set_cookie(&session);
    let body = LoginResponse {
        role: session.role.as_str().to_string(),
        subject: session.subject,
        expires_in: session.expires_in.as_secs(),
        token: session.token,
    };
    Ok((
        [
            (header::SET_COOKIE, cookie),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        Json(body),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse)
    )
)]
pub(crate) async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.auth.clear_cookie())],
        Json(MessageResponse {
            message: "signed out".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/whoami",
    tag = "auth",
    responses(
        (status = 200, description = "Resolved caller", body = WhoAmIResponse)
    )
)]
pub(crate) async fn whoami(State(state): State<AppState>, headers: HeaderMap) -> Json<WhoAmIResponse> {
    let context = state.auth.resolve(&headers);
    let permissions = context
        .role
        .map(|role| {
            Action::ALL
                .into_iter()
                .filter(|action| role.permits(*action))
                .map(|action| action.as_str().to_string())
                .collect()
        })
        .unwrap_or_default();
    Json(WhoAmIResponse {
        authenticated: context.authenticated(),
        role: context.role.map(|role| role.as_str().to_string()),
        subject: context.subject,
        email: context.email,
        channel: context.channel,
        permissions,
    })
}
