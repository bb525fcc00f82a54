use std::sync::Arc;

use axum::http::StatusCode;
use uuid::Uuid;

use crate::nutrition::dto::{
    CreateLogRequest, ListEnvelope, LogListQuery, MealRequest, NutritionLogDto,
    WaterUpdateRequest,
};

/// Error surfaced by the API client. `message` carries the server's
/// `error.message` and nothing else; transport detail only shows up in the
/// `Display` output, so call sites picking user-facing text via
/// [`message_or`] fall back to their fixed string when the server did not
/// speak.
///
/// [`message_or`]: ClientError::message_or
#[derive(Debug, thiserror::Error)]
#[error("{}", .message.as_deref().or(.detail.as_deref()).unwrap_or("request failed"))]
pub struct ClientError {
    pub status: Option<StatusCode>,
    pub message: Option<String>,
    detail: Option<String>,
}

impl ClientError {
    pub fn api(status: StatusCode, message: Option<String>) -> Self {
        Self {
            status: Some(status),
            message,
            detail: None,
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self {
            status: None,
            message: None,
            detail: Some(err.to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }

    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}

/// The nutrition endpoints the day view drives. One implementation talks
/// HTTP (`RestClient`); tests substitute an in-memory fake.
#[async_trait::async_trait]
pub trait NutritionApi: Send + Sync {
    async fn list_logs(
        &self,
        query: &LogListQuery,
    ) -> Result<ListEnvelope<NutritionLogDto>, ClientError>;

    async fn create_log(&self, body: &CreateLogRequest) -> Result<NutritionLogDto, ClientError>;

    async fn update_water(&self, body: &WaterUpdateRequest)
        -> Result<NutritionLogDto, ClientError>;

    async fn add_meal(
        &self,
        log_id: Uuid,
        meal: &MealRequest,
    ) -> Result<NutritionLogDto, ClientError>;

    async fn update_meal(
        &self,
        log_id: Uuid,
        meal_id: Uuid,
        meal: &MealRequest,
    ) -> Result<NutritionLogDto, ClientError>;

    async fn delete_meal(
        &self,
        log_id: Uuid,
        meal_id: Uuid,
    ) -> Result<NutritionLogDto, ClientError>;
}

#[async_trait::async_trait]
impl<T: NutritionApi + ?Sized> NutritionApi for Arc<T> {
    async fn list_logs(
        &self,
        query: &LogListQuery,
    ) -> Result<ListEnvelope<NutritionLogDto>, ClientError> {
        (**self).list_logs(query).await
    }

    async fn create_log(&self, body: &CreateLogRequest) -> Result<NutritionLogDto, ClientError> {
        (**self).create_log(body).await
    }

    async fn update_water(
        &self,
        body: &WaterUpdateRequest,
    ) -> Result<NutritionLogDto, ClientError> {
        (**self).update_water(body).await
    }

    async fn add_meal(
        &self,
        log_id: Uuid,
        meal: &MealRequest,
    ) -> Result<NutritionLogDto, ClientError> {
        (**self).add_meal(log_id, meal).await
    }

    async fn update_meal(
        &self,
        log_id: Uuid,
        meal_id: Uuid,
        meal: &MealRequest,
    ) -> Result<NutritionLogDto, ClientError> {
        (**self).update_meal(log_id, meal_id, meal).await
    }

    async fn delete_meal(
        &self,
        log_id: Uuid,
        meal_id: Uuid,
    ) -> Result<NutritionLogDto, ClientError> {
        (**self).delete_meal(log_id, meal_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_use_the_caller_fallback() {
        let err = ClientError::transport(
            "error sending request for url (http://localhost:9/api/nutrition/logs)",
        );
        assert_eq!(
            err.message_or("Failed to fetch nutrition log"),
            "Failed to fetch nutrition log"
        );
        // The wire detail still surfaces when the error itself is logged.
        assert!(err.to_string().contains("localhost:9"));
    }

    #[test]
    fn server_messages_take_precedence_over_the_fallback() {
        let err = ClientError::api(
            StatusCode::CONFLICT,
            Some("Nutrition log already exists for this date".into()),
        );
        assert_eq!(
            err.message_or("Failed to create nutrition log"),
            "Nutrition log already exists for this date"
        );
    }

    #[test]
    fn bare_api_errors_fall_back_too() {
        let err = ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(err.message_or("Failed to update water intake"), "Failed to update water intake");
        assert!(ClientError::api(StatusCode::NOT_FOUND, None).is_not_found());
        assert!(!err.is_not_found());
    }
}
