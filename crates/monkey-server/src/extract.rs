//! Request extractors that reject with the API's `{"error": ...}` body.

use axum::extract::{FromRequest, FromRequestParts};
use uuid::Uuid;

use crate::error::ServerError;

/// `Json<T>` whose malformed or incomplete bodies become `400 Bad Request`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// `Path<T>` whose undecodable segments become `400 Bad Request`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub struct ApiPath<T>(pub T);

/// Parse a record id taken from the URL.  A string that is not a UUID cannot
/// name any record, so it is reported as missing.
pub fn record_id(raw: &str, what: &'static str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::NotFound(format!("{what} not found")))
}
