//! Request extractors that reject with the registry's JSON error body.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use casefile::core::error::RecordError;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `Query<T>` whose rejection is a `malformed_payload` [`ApiError`].
#[derive(Debug, Clone)]
pub struct ListQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ListQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| RecordError::MalformedPayload {
                reason: format!("query string: {}", rejection.body_text()),
            })?;
        Ok(ListQuery(query))
    }
}
