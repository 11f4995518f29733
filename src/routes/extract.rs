use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// Boundary checks for a request body
pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

/// JSON body extractor that rejects malformed or invalid payloads with the
/// application's error shape before the handler runs
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Rejects blank strings
pub fn require_non_blank(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

/// Rejects the 0 ID, which no catalog item carries
pub fn require_catalog_id(field: &str, value: u64) -> AppResult<()> {
    if value == 0 {
        return Err(AppError::InvalidInput(format!("{} must be a catalog ID", field)));
    }
    Ok(())
}
