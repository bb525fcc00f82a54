use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::dto::MealRequest;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: Date,
    pub water_intake_ml: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub log_id: Uuid,
    pub name: String,
    pub meal_type: Option<String>,
    pub calories: i32,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub created_at: OffsetDateTime,
}

const LOG_COLUMNS: &str = "id, user_id, log_date, water_intake_ml, created_at, updated_at";
const MEAL_COLUMNS: &str =
    "id, log_id, name, meal_type, calories, protein_g, carbs_g, fat_g, created_at";

impl NutritionLog {
    /// Logs in a date range, newest day first. Both bounds are inclusive and
    /// optional.
    pub async fn list(
        db: &PgPool,
        user_id: Uuid,
        start: Option<Date>,
        end: Option<Date>,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<NutritionLog>> {
        let sql = format!(
            r#"
            SELECT {LOG_COLUMNS}
            FROM nutrition_logs
            WHERE user_id = $1
              AND ($2::date IS NULL OR log_date >= $2)
              AND ($3::date IS NULL OR log_date <= $3)
            ORDER BY log_date DESC
            LIMIT $4 OFFSET $5
            "#
        );
        sqlx::query_as::<_, NutritionLog>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
    }

    pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<Option<NutritionLog>> {
        let sql = format!(
            r#"
            SELECT {LOG_COLUMNS}
            FROM nutrition_logs
            WHERE id = $1 AND user_id = $2
            "#
        );
        sqlx::query_as::<_, NutritionLog>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    /// Insert a new day together with its initial meals, in one transaction:
    /// a failing meal insert rolls the whole day back. The (user_id,
    /// log_date) unique index makes this fail with a unique violation if the
    /// day already exists.
    pub async fn create_with_meals(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        water_intake_ml: i32,
        meals: &[MealRequest],
    ) -> sqlx::Result<NutritionLog> {
        let mut tx = db.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO nutrition_logs (user_id, log_date, water_intake_ml)
            VALUES ($1, $2, $3)
            RETURNING {LOG_COLUMNS}
            "#
        );
        let log = sqlx::query_as::<_, NutritionLog>(&sql)
            .bind(user_id)
            .bind(date)
            .bind(water_intake_ml)
            .fetch_one(&mut *tx)
            .await?;

        for meal in meals {
            sqlx::query(
                r#"
                INSERT INTO meals (log_id, name, meal_type, calories, protein_g, carbs_g, fat_g)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(log.id)
            .bind(&meal.name)
            .bind(&meal.meal_type)
            .bind(meal.calories)
            .bind(meal.protein_g)
            .bind(meal.carbs_g)
            .bind(meal.fat_g)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(log)
    }

    pub async fn replace(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        water_intake_ml: i32,
    ) -> sqlx::Result<Option<NutritionLog>> {
        let sql = format!(
            r#"
            UPDATE nutrition_logs
            SET water_intake_ml = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {LOG_COLUMNS}
            "#
        );
        sqlx::query_as::<_, NutritionLog>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(water_intake_ml)
            .fetch_optional(db)
            .await
    }

    /// Set water for a day, addressed by date. Returns None if no log exists
    /// for that day; the route turns that into a 404 and the client decides
    /// whether to create the day first.
    pub async fn set_water(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        amount_ml: i32,
    ) -> sqlx::Result<Option<NutritionLog>> {
        let sql = format!(
            r#"
            UPDATE nutrition_logs
            SET water_intake_ml = $3, updated_at = now()
            WHERE user_id = $1 AND log_date = $2
            RETURNING {LOG_COLUMNS}
            "#
        );
        sqlx::query_as::<_, NutritionLog>(&sql)
            .bind(user_id)
            .bind(date)
            .bind(amount_ml)
            .fetch_optional(db)
            .await
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM nutrition_logs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn touch(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE nutrition_logs SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

impl Meal {
    pub async fn list_for_log(db: &PgPool, log_id: Uuid) -> sqlx::Result<Vec<Meal>> {
        let sql = format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE log_id = $1
            ORDER BY created_at ASC
            "#
        );
        sqlx::query_as::<_, Meal>(&sql)
            .bind(log_id)
            .fetch_all(db)
            .await
    }

    pub async fn insert(db: &PgPool, log_id: Uuid, meal: &MealRequest) -> sqlx::Result<Meal> {
        let sql = format!(
            r#"
            INSERT INTO meals (log_id, name, meal_type, calories, protein_g, carbs_g, fat_g)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEAL_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Meal>(&sql)
            .bind(log_id)
            .bind(&meal.name)
            .bind(&meal.meal_type)
            .bind(meal.calories)
            .bind(meal.protein_g)
            .bind(meal.carbs_g)
            .bind(meal.fat_g)
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: &PgPool,
        log_id: Uuid,
        meal_id: Uuid,
        meal: &MealRequest,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE meals
            SET name = $3, meal_type = $4, calories = $5,
                protein_g = $6, carbs_g = $7, fat_g = $8
            WHERE id = $1 AND log_id = $2
            "#,
        )
        .bind(meal_id)
        .bind(log_id)
        .bind(&meal.name)
        .bind(&meal.meal_type)
        .bind(meal.calories)
        .bind(meal.protein_g)
        .bind(meal.carbs_g)
        .bind(meal.fat_g)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(db: &PgPool, log_id: Uuid, meal_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM meals WHERE id = $1 AND log_id = $2")
            .bind(meal_id)
            .bind(log_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
pub struct LogAggregates {
    pub days_logged: i64,
    pub total_water_ml: i64,
}

#[derive(Debug, FromRow)]
pub struct MealAggregates {
    pub meal_count: i64,
    pub total_calories: i64,
}

pub async fn log_aggregates(
    db: &PgPool,
    user_id: Uuid,
    start: Option<Date>,
    end: Option<Date>,
) -> sqlx::Result<LogAggregates> {
    sqlx::query_as::<_, LogAggregates>(
        r#"
        SELECT COUNT(*) AS days_logged,
               COALESCE(SUM(water_intake_ml), 0)::BIGINT AS total_water_ml
        FROM nutrition_logs
        WHERE user_id = $1
          AND ($2::date IS NULL OR log_date >= $2)
          AND ($3::date IS NULL OR log_date <= $3)
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await
}

pub async fn meal_aggregates(
    db: &PgPool,
    user_id: Uuid,
    start: Option<Date>,
    end: Option<Date>,
) -> sqlx::Result<MealAggregates> {
    sqlx::query_as::<_, MealAggregates>(
        r#"
        SELECT COUNT(m.id) AS meal_count,
               COALESCE(SUM(m.calories), 0)::BIGINT AS total_calories
        FROM meals m
        JOIN nutrition_logs l ON l.id = m.log_id
        WHERE l.user_id = $1
          AND ($2::date IS NULL OR l.log_date >= $2)
          AND ($3::date IS NULL OR l.log_date <= $3)
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await
}
