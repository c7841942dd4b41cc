//! Bearer authentication layer
//!
//! Validates the `Authorization: Bearer` token with the application's
//! [`TokenIssuer`](taskdesk_shared::auth::jwt::TokenIssuer) and inserts the
//! resulting [`AuthContext`] into request extensions. Requests without a valid
//! token never reach a handler.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskdesk_shared::auth::middleware::{authenticate, AuthContext};

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth: AuthContext = authenticate(&state.tokens, req.headers())?;

    tracing::Span::current().record("user_id", tracing::field::display(auth.user_id));
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
