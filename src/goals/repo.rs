use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::goals::dto::SetGoalsRequest;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionGoals {
    pub user_id: Uuid,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub water_ml: i32,
    pub updated_at: OffsetDateTime,
}

const GOAL_COLUMNS: &str = "user_id, calories, protein_g, carbs_g, fat_g, water_ml, updated_at";

impl NutritionGoals {
    pub async fn find(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<NutritionGoals>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM nutrition_goals WHERE user_id = $1");
        sqlx::query_as::<_, NutritionGoals>(&sql)
            .bind(user_id)
            .fetch_optional(db)
            .await
    }

    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        goals: &SetGoalsRequest,
    ) -> sqlx::Result<NutritionGoals> {
        let sql = format!(
            r#"
            INSERT INTO nutrition_goals (user_id, calories, protein_g, carbs_g, fat_g, water_ml)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET calories = EXCLUDED.calories,
                protein_g = EXCLUDED.protein_g,
                carbs_g = EXCLUDED.carbs_g,
                fat_g = EXCLUDED.fat_g,
                water_ml = EXCLUDED.water_ml,
                updated_at = now()
            RETURNING {GOAL_COLUMNS}
            "#
        );
        sqlx::query_as::<_, NutritionGoals>(&sql)
            .bind(user_id)
            .bind(goals.calories)
            .bind(goals.protein_g)
            .bind(goals.carbs_g)
            .bind(goals.fat_g)
            .bind(goals.water_ml)
            .fetch_one(db)
            .await
    }

    pub async fn reset(db: &PgPool, user_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM nutrition_goals WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
