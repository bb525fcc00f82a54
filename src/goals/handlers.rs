use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    error::ApiError,
    goals::calc::suggest_goals,
    goals::dto::{
        ActivityLevel, CalculateGoalsRequest, GoalKind, GoalRecommendation, GoalsDto,
        SetGoalsRequest, Sex,
    },
    goals::repo::NutritionGoals,
    nutrition::dto::DataEnvelope,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/goals", get(get_goals).post(set_goals).delete(reset_goals))
        .route("/goals/calculate", post(calculate_goals))
        .route("/goals/recommendations", get(goal_recommendations))
}

#[instrument(skip(state))]
pub async fn get_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DataEnvelope<Option<GoalsDto>>>, ApiError> {
    let goals = NutritionGoals::find(&state.db, user_id).await?;
    Ok(Json(DataEnvelope {
        data: goals.map(GoalsDto::from),
    }))
}

#[instrument(skip(state, body))]
pub async fn set_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SetGoalsRequest>,
) -> Result<Json<DataEnvelope<GoalsDto>>, ApiError> {
    if body.calories <= 0 || body.water_ml < 0 {
        return Err(ApiError::bad_request("Goal values must be positive"));
    }

    let goals = NutritionGoals::upsert(&state.db, user_id, &body).await?;
    info!(%user_id, calories = goals.calories, "nutrition goals set");
    Ok(Json(DataEnvelope {
        data: goals.into(),
    }))
}

#[instrument(skip(state))]
pub async fn reset_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    NutritionGoals::reset(&state.db, user_id).await?;
    info!(%user_id, "nutrition goals reset");
    Ok(StatusCode::NO_CONTENT)
}

/// Computes suggested targets without persisting them; the client decides
/// whether to save the suggestion via POST /goals.
#[instrument(skip(body))]
pub async fn calculate_goals(
    AuthUser(user_id): AuthUser,
    Json(body): Json<CalculateGoalsRequest>,
) -> Result<Json<DataEnvelope<GoalsDto>>, ApiError> {
    if body.age == 0 || body.height_cm <= 0.0 || body.weight_kg <= 0.0 {
        return Err(ApiError::bad_request("Invalid body metrics"));
    }
    Ok(Json(DataEnvelope {
        data: suggest_goals(&body),
    }))
}

#[instrument]
pub async fn goal_recommendations(
    AuthUser(_user_id): AuthUser,
) -> Json<DataEnvelope<Vec<GoalRecommendation>>> {
    let presets = [
        (
            "Weight loss",
            "Moderate deficit for a typical adult",
            CalculateGoalsRequest {
                age: 35,
                sex: Sex::Female,
                height_cm: 168.0,
                weight_kg: 72.0,
                activity_level: ActivityLevel::Light,
                goal: GoalKind::Lose,
            },
        ),
        (
            "Maintenance",
            "Hold current weight with balanced macros",
            CalculateGoalsRequest {
                age: 35,
                sex: Sex::Male,
                height_cm: 178.0,
                weight_kg: 78.0,
                activity_level: ActivityLevel::Moderate,
                goal: GoalKind::Maintain,
            },
        ),
        (
            "Muscle gain",
            "Surplus with higher protein for active training",
            CalculateGoalsRequest {
                age: 28,
                sex: Sex::Male,
                height_cm: 180.0,
                weight_kg: 75.0,
                activity_level: ActivityLevel::Active,
                goal: GoalKind::Gain,
            },
        ),
    ];

    let data = presets
        .into_iter()
        .map(|(name, description, req)| GoalRecommendation {
            name: name.to_string(),
            description: description.to_string(),
            goals: suggest_goals(&req),
        })
        .collect();

    Json(DataEnvelope { data })
}
