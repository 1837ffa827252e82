//! JSON extractor that runs `validator` rules before the handler sees the body.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{CatalogError, ErrorResponse};

/// Deserialized and validated JSON body.
///
/// Malformed JSON keeps axum's status code; rule violations are answered with
/// 400 and per-field details. Either way no handler code runs.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(reject_json)?;

        data.validate().map_err(|e| {
            let details = e
                .field_errors()
                .iter()
                .map(|(field, errors)| {
                    let messages: Vec<serde_json::Value> = errors
                        .iter()
                        .map(|err| {
                            serde_json::json!({
                                "code": err.code,
                                "message": err.message,
                            })
                        })
                        .collect();
                    (field.to_string(), serde_json::json!(messages))
                })
                .collect::<serde_json::Map<_, _>>();

            let error = CatalogError::Validation("Request validation failed".to_string());
            error_with_details(error, serde_json::Value::Object(details))
        })?;

        Ok(ValidatedJson(data))
    }
}

fn reject_json(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let error = CatalogError::Validation(rejection.body_text());
    let mut response = error.into_response();
    *response.status_mut() = status;
    response
}

fn error_with_details(error: CatalogError, details: serde_json::Value) -> Response {
    let body = ErrorResponse {
        details: Some(details),
        ..ErrorResponse::from(&error)
    };
    (error.status_code(), Json(body)).into_response()
}
