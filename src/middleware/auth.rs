use axum::{
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::{ActorType, AuthUser};
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Resolves a bearer token into an [`AuthUser`] request extension. Requests
/// without an Authorization header pass through anonymously; handlers that
/// need an identity reject those themselves. A header that is present but
/// invalid is always a 401, and the referenced account must still exist.
pub async fn authenticate<B>(
    State(state): State<AppState>,
    mut req: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let Some(header_value) = header_value else {
        return Ok(next.run(req).await);
    };

    let token = header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value.as_str());

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

    let auth_user = match claims.actor {
        ActorType::User => {
            let user = queries::get_user(&state.db, claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;
            AuthUser {
                id: user.id,
                actor: ActorType::User,
                role: Some(user.role),
            }
        }
        ActorType::Vendor => {
            let vendor = queries::get_vendor(&state.db, claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;
            AuthUser {
                id: vendor.id,
                actor: ActorType::Vendor,
                role: None,
            }
        }
        ActorType::Customer => {
            let customer = queries::get_customer(&state.db, claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;
            AuthUser {
                id: customer.id,
                actor: ActorType::Customer,
                role: None,
            }
        }
    };

    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}
