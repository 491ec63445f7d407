//! Request extractors for the API: caller identity and request fields.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
};
use serde_json::Value;

use crate::domain::user::User;

use super::{AppState, error::ApiError, run_blocking};

/// The caller of a protected endpoint, resolved through the auth gateway.
/// As an extractor it fails with 401 before the handler body runs; handlers
/// that must answer 404 first call [`ApiUser::from_headers`] themselves.
pub struct ApiUser(pub User);

impl ApiUser {
    pub async fn from_headers(
        headers: &HeaderMap,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let state = Arc::clone(state);
        let user = run_blocking(move || {
            Ok(state.gateway.resolve_identity(authorization.as_deref()))
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        user.map(ApiUser).ok_or(ApiError::Unauthenticated)
    }
}

impl FromRequestParts<Arc<AppState>> for ApiUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers, state).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    Form,
}

/// Request fields from either a JSON object or a form-encoded body.
/// Any other content type reads as an empty body.
#[derive(Debug, Clone)]
pub struct ApiInput {
    encoding: BodyEncoding,
    fields: HashMap<String, Value>,
}

impl ApiInput {
    pub fn from_json(value: Value) -> Result<Self, ApiError> {
        match value {
            Value::Object(map) => Ok(Self {
                encoding: BodyEncoding::Json,
                fields: map
                    .into_iter()
                    .filter(|(_, v)| !v.is_null())
                    .collect(),
            }),
            _ => Err(ApiError::BadRequest(
                "request body must be a JSON object".into(),
            )),
        }
    }

    pub fn from_form(form: HashMap<String, String>) -> Self {
        Self {
            encoding: BodyEncoding::Form,
            fields: form
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        }
    }

    pub fn encoding(&self) -> BodyEncoding {
        self.encoding
    }

    /// A required text field. Records `missing` under `field` if absent.
    pub fn text(
        &self,
        field: &'static str,
        missing: &str,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        match self.fields.get(field) {
            None => {
                errors.add(field, missing);
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                errors.add(field, format!("{field} must be a string"));
                None
            }
        }
    }

    /// A required boolean field. JSON bodies must carry a real boolean; form
    /// bodies go through [`form_flag`].
    pub fn flag(
        &self,
        field: &'static str,
        missing: &str,
        errors: &mut FieldErrors,
    ) -> Option<bool> {
        match (self.encoding, self.fields.get(field)) {
            (_, None) => {
                errors.add(field, missing);
                None
            }
            (BodyEncoding::Json, Some(Value::Bool(b))) => Some(*b),
            (BodyEncoding::Form, Some(Value::String(s))) => Some(form_flag(s)),
            (_, Some(_)) => {
                errors.add(field, format!("{field} must be a boolean"));
                None
            }
        }
    }
}

/// Boolean from a form field.
///
/// Form clients send the flag as text, typically `True` / `False`. The
/// literal `"False"` and the empty string read as false; any other text,
/// including `"false"`, reads as true.
pub fn form_flag(value: &str) -> bool {
    !(value.is_empty() || value == "False")
}

impl<S> FromRequest<S> for ApiInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Self::from_json(value)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(Self::from_form(form))
        } else {
            Ok(Self::from_form(HashMap::new()))
        }
    }
}

/// Per-field validation messages collected while reading an [`ApiInput`].
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors.0)
    }
}
