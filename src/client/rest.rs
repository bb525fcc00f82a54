use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;
use uuid::Uuid;

use crate::client::api::{ClientError, NutritionApi};
use crate::goals::dto::{CalculateGoalsRequest, GoalRecommendation, GoalsDto, SetGoalsRequest};
use crate::nutrition::dto::{
    CreateLogRequest, DataEnvelope, ListEnvelope, LogListQuery, MealRequest, NutritionLogDto,
    NutritionStatsDto, StatsQuery, WaterUpdateRequest,
};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// HTTP implementation of [`NutritionApi`] plus the goals and stats calls the
/// standalone tab views use.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: access_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/nutrition{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .map(|e| e.error.message);
            debug!(%status, ?message, "api error response");
            return Err(ClientError::api(status, message));
        }
        response.json::<T>().await.map_err(ClientError::transport)
    }

    async fn expect_no_content(response: Response) -> Result<(), ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .map(|e| e.error.message);
            return Err(ClientError::api(status, message));
        }
        Ok(())
    }

    pub async fn get_stats(&self, query: &StatsQuery) -> Result<NutritionStatsDto, ClientError> {
        let response = self
            .authed(self.http.get(self.url("/stats")).query(query))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<NutritionStatsDto>>(response)
            .await?
            .data)
    }

    pub async fn get_goals(&self) -> Result<Option<GoalsDto>, ClientError> {
        let response = self
            .authed(self.http.get(self.url("/goals")))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<Option<GoalsDto>>>(response)
            .await?
            .data)
    }

    pub async fn set_goals(&self, body: &SetGoalsRequest) -> Result<GoalsDto, ClientError> {
        let response = self
            .authed(self.http.post(self.url("/goals")).json(body))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<GoalsDto>>(response).await?.data)
    }

    pub async fn reset_goals(&self) -> Result<(), ClientError> {
        let response = self
            .authed(self.http.delete(self.url("/goals")))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Self::expect_no_content(response).await
    }

    pub async fn calculate_goals(
        &self,
        body: &CalculateGoalsRequest,
    ) -> Result<GoalsDto, ClientError> {
        let response = self
            .authed(self.http.post(self.url("/goals/calculate")).json(body))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<GoalsDto>>(response).await?.data)
    }

    pub async fn goal_recommendations(&self) -> Result<Vec<GoalRecommendation>, ClientError> {
        let response = self
            .authed(self.http.get(self.url("/goals/recommendations")))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(
            Self::parse::<DataEnvelope<Vec<GoalRecommendation>>>(response)
                .await?
                .data,
        )
    }
}

#[async_trait::async_trait]
impl NutritionApi for RestClient {
    async fn list_logs(
        &self,
        query: &LogListQuery,
    ) -> Result<ListEnvelope<NutritionLogDto>, ClientError> {
        let response = self
            .authed(self.http.get(self.url("/logs")).query(query))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Self::parse(response).await
    }

    async fn create_log(&self, body: &CreateLogRequest) -> Result<NutritionLogDto, ClientError> {
        let response = self
            .authed(self.http.post(self.url("/logs")).json(body))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<NutritionLogDto>>(response)
            .await?
            .data)
    }

    async fn update_water(
        &self,
        body: &WaterUpdateRequest,
    ) -> Result<NutritionLogDto, ClientError> {
        let response = self
            .authed(self.http.patch(self.url("/water")).json(body))
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<NutritionLogDto>>(response)
            .await?
            .data)
    }

    async fn add_meal(
        &self,
        log_id: Uuid,
        meal: &MealRequest,
    ) -> Result<NutritionLogDto, ClientError> {
        let response = self
            .authed(
                self.http
                    .post(self.url(&format!("/logs/{log_id}/meals")))
                    .json(meal),
            )
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<NutritionLogDto>>(response)
            .await?
            .data)
    }

    async fn update_meal(
        &self,
        log_id: Uuid,
        meal_id: Uuid,
        meal: &MealRequest,
    ) -> Result<NutritionLogDto, ClientError> {
        let response = self
            .authed(
                self.http
                    .put(self.url(&format!("/logs/{log_id}/meals/{meal_id}")))
                    .json(meal),
            )
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<NutritionLogDto>>(response)
            .await?
            .data)
    }

    async fn delete_meal(
        &self,
        log_id: Uuid,
        meal_id: Uuid,
    ) -> Result<NutritionLogDto, ClientError> {
        let response = self
            .authed(
                self.http
                    .delete(self.url(&format!("/logs/{log_id}/meals/{meal_id}"))),
            )
            .send()
            .await
            .map_err(ClientError::transport)?;
        Ok(Self::parse::<DataEnvelope<NutritionLogDto>>(response)
            .await?
            .data)
    }
}
