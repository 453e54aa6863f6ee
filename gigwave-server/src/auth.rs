use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use gigwave_collab::Caller;

use crate::{context::ServerContext, errors::ServerError};

/// Wraps the [Caller] of a request so [FromRequestParts] can be implemented for it.
///
/// Requests without an Authorization header are anonymous, the collab system
/// decides whether that is allowed.
pub struct Session(pub Caller);

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Self(Caller::Anonymous));
        };

        let header = header
            .to_str()
            .map_err(|_| ServerError::InvalidArgument("Authorization is not valid text".into()))?;

        let parts: Vec<_> = header.split_ascii_whitespace().collect();

        if parts.first() != Some(&"Bearer") || parts.len() != 2 {
            return Err(ServerError::InvalidArgument(
                "Authorization must be Bearer".into(),
            ));
        }

        let caller = state.collab.authenticate(parts[1]).await?;

        Ok(Self(caller))
    }
}
