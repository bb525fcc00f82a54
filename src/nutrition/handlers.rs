use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    nutrition::dto::{
        CreateLogRequest, DataEnvelope, ListEnvelope, LogListQuery, MealRequest,
        NutritionLogDto, NutritionStatsDto, ReplaceLogRequest, StatsQuery, WaterUpdateRequest,
    },
    nutrition::repo::{self, Meal, NutritionLog},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs).post(create_log))
        .route(
            "/logs/:id",
            get(get_log).put(replace_log).delete(delete_log),
        )
        .route("/logs/:id/meals", post(add_meal))
        .route(
            "/logs/:id/meals/:meal_id",
            put(update_meal).delete(delete_meal),
        )
        .route("/water", patch(update_water))
        .route("/stats", get(get_stats))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

async fn with_meals(db: &PgPool, log: NutritionLog) -> Result<NutritionLogDto, ApiError> {
    let meals = Meal::list_for_log(db, log.id).await?;
    Ok(NutritionLogDto::from_parts(log, meals))
}

/// Look up a log by id, scoped to the requesting user. Foreign ids 404 the
/// same as unknown ones.
async fn owned_log(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<NutritionLog, ApiError> {
    NutritionLog::find(db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Nutrition log not found"))
}

#[instrument(skip(state))]
pub async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<LogListQuery>,
) -> Result<Json<ListEnvelope<NutritionLogDto>>, ApiError> {
    let logs = NutritionLog::list(
        &state.db,
        user_id,
        q.start_date,
        q.end_date,
        q.limit,
        q.offset,
    )
    .await?;

    let mut data = Vec::with_capacity(logs.len());
    for log in logs {
        data.push(with_meals(&state.db, log).await?);
    }

    Ok(Json(ListEnvelope {
        count: data.len(),
        data,
    }))
}

#[instrument(skip(state, body))]
pub async fn create_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateLogRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<NutritionLogDto>>), ApiError> {
    let today = OffsetDateTime::now_utc().date();
    if body.date > today {
        warn!(%user_id, date = %body.date, "rejected future log");
        return Err(ApiError::bad_request(
            "Cannot create nutrition log for future dates",
        ));
    }

    let log = NutritionLog::create_with_meals(
        &state.db,
        user_id,
        body.date,
        body.water_intake,
        &body.meals,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("Nutrition log already exists for this date")
        } else {
            e.into()
        }
    })?;

    info!(%user_id, log_id = %log.id, date = %log.log_date, "nutrition log created");
    let dto = with_meals(&state.db, log).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope { data: dto })))
}

#[instrument(skip(state))]
pub async fn get_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DataEnvelope<NutritionLogDto>>, ApiError> {
    let log = owned_log(&state.db, user_id, id).await?;
    let dto = with_meals(&state.db, log).await?;
    Ok(Json(DataEnvelope { data: dto }))
}

#[instrument(skip(state, body))]
pub async fn replace_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReplaceLogRequest>,
) -> Result<Json<DataEnvelope<NutritionLogDto>>, ApiError> {
    let log = NutritionLog::replace(&state.db, user_id, id, body.water_intake)
        .await?
        .ok_or_else(|| ApiError::not_found("Nutrition log not found"))?;
    let dto = with_meals(&state.db, log).await?;
    Ok(Json(DataEnvelope { data: dto }))
}

#[instrument(skip(state))]
pub async fn delete_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = NutritionLog::delete(&state.db, user_id, id).await?;
    if !deleted {
        return Err(ApiError::not_found("Nutrition log not found"));
    }
    info!(%user_id, log_id = %id, "nutrition log deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Meal mutations respond with the full updated log; the client replaces its
/// local copy wholesale rather than merging.
#[instrument(skip(state, body))]
pub async fn add_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MealRequest>,
) -> Result<(StatusCode, Json<DataEnvelope<NutritionLogDto>>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Meal name is required"));
    }

    let log = owned_log(&state.db, user_id, id).await?;
    Meal::insert(&state.db, log.id, &body).await?;
    NutritionLog::touch(&state.db, log.id).await?;

    let log = owned_log(&state.db, user_id, id).await?;
    let dto = with_meals(&state.db, log).await?;
    Ok((StatusCode::CREATED, Json(DataEnvelope { data: dto })))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, meal_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<MealRequest>,
) -> Result<Json<DataEnvelope<NutritionLogDto>>, ApiError> {
    let log = owned_log(&state.db, user_id, id).await?;
    let updated = Meal::update(&state.db, log.id, meal_id, &body).await?;
    if !updated {
        return Err(ApiError::not_found("Meal not found"));
    }
    NutritionLog::touch(&state.db, log.id).await?;

    let log = owned_log(&state.db, user_id, id).await?;
    let dto = with_meals(&state.db, log).await?;
    Ok(Json(DataEnvelope { data: dto }))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((id, meal_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DataEnvelope<NutritionLogDto>>, ApiError> {
    let log = owned_log(&state.db, user_id, id).await?;
    let deleted = Meal::delete(&state.db, log.id, meal_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Meal not found"));
    }
    NutritionLog::touch(&state.db, log.id).await?;

    let log = owned_log(&state.db, user_id, id).await?;
    let dto = with_meals(&state.db, log).await?;
    Ok(Json(DataEnvelope { data: dto }))
}

/// PATCH /water addresses the day by date in the body. It never creates the
/// day; a missing log is a 404 and the client decides whether to create one.
#[instrument(skip(state, body))]
pub async fn update_water(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<WaterUpdateRequest>,
) -> Result<Json<DataEnvelope<NutritionLogDto>>, ApiError> {
    if body.amount < 0 {
        return Err(ApiError::bad_request("Water amount must be non-negative"));
    }

    let log = NutritionLog::set_water(&state.db, user_id, body.date, body.amount)
        .await?
        .ok_or_else(|| ApiError::not_found("No nutrition log exists for this date"))?;

    info!(%user_id, date = %body.date, amount = body.amount, "water intake updated");
    let dto = with_meals(&state.db, log).await?;
    Ok(Json(DataEnvelope { data: dto }))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsQuery>,
) -> Result<Json<DataEnvelope<NutritionStatsDto>>, ApiError> {
    let logs = repo::log_aggregates(&state.db, user_id, q.start_date, q.end_date).await?;
    let meals = repo::meal_aggregates(&state.db, user_id, q.start_date, q.end_date).await?;

    let days = logs.days_logged;
    let stats = NutritionStatsDto {
        days_logged: days,
        total_calories: meals.total_calories,
        avg_calories_per_day: if days > 0 {
            meals.total_calories as f64 / days as f64
        } else {
            0.0
        },
        total_water_ml: logs.total_water_ml,
        avg_water_ml: if days > 0 {
            logs.total_water_ml as f64 / days as f64
        } else {
            0.0
        },
        meal_count: meals.meal_count,
    };

    Ok(Json(DataEnvelope { data: stats }))
}
