use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::repo::{Meal, NutritionLog};

/// List responses: `{ count, data }` with `count` the number of returned
/// rows. Clients probe "is there a log for this day" with `limit=1` and
/// check `count > 0`, so this shape is load-bearing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub count: usize,
    pub data: Vec<T>,
}

/// Single-item responses: `{ data }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDto {
    pub id: Uuid,
    pub name: String,
    pub meal_type: Option<String>,
    pub calories: i32,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub created_at: OffsetDateTime,
}

impl From<Meal> for MealDto {
    fn from(m: Meal) -> Self {
        Self {
            id: m.id,
            name: m.name,
            meal_type: m.meal_type,
            calories: m.calories,
            protein_g: m.protein_g,
            carbs_g: m.carbs_g,
            fat_g: m.fat_g,
            created_at: m.created_at,
        }
    }
}

/// One day's log. `date` travels as `yyyy-MM-dd`, meals in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionLogDto {
    pub id: Uuid,
    pub date: Date,
    pub meals: Vec<MealDto>,
    pub water_intake: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl NutritionLogDto {
    pub fn from_parts(log: NutritionLog, meals: Vec<Meal>) -> Self {
        Self {
            id: log.id,
            date: log.log_date,
            meals: meals.into_iter().map(MealDto::from).collect(),
            water_intake: log.water_intake_ml,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListQuery {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    31
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRequest {
    pub name: String,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub calories: i32,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogRequest {
    pub date: Date,
    #[serde(default)]
    pub meals: Vec<MealRequest>,
    #[serde(default)]
    pub water_intake: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceLogRequest {
    pub water_intake: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterUpdateRequest {
    pub date: Date,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionStatsDto {
    pub days_logged: i64,
    pub total_calories: i64,
    pub avg_calories_per_day: f64,
    pub total_water_ml: i64,
    pub avg_water_ml: f64,
    pub meal_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn dates_travel_as_iso_strings() {
        let q = WaterUpdateRequest {
            date: date!(2025 - 03 - 09),
            amount: 1500,
        };
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["date"], "2025-03-09");
        assert_eq!(json["amount"], 1500);
    }

    #[test]
    fn list_envelope_shape() {
        let env = ListEnvelope::<i32> {
            count: 0,
            data: vec![],
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["count"], 0);
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn create_request_defaults_to_empty_day() {
        let body: CreateLogRequest =
            serde_json::from_str(r#"{"date":"2025-03-09"}"#).unwrap();
        assert!(body.meals.is_empty());
        assert_eq!(body.water_intake, 0);
    }

    #[test]
    fn meal_request_uses_camel_case_keys() {
        let body: MealRequest = serde_json::from_str(
            r#"{"name":"Oatmeal","mealType":"breakfast","calories":320,"proteinG":11.5}"#,
        )
        .unwrap();
        assert_eq!(body.name, "Oatmeal");
        assert_eq!(body.meal_type.as_deref(), Some("breakfast"));
        assert_eq!(body.calories, 320);
        assert_eq!(body.protein_g, Some(11.5));
        assert_eq!(body.carbs_g, None);
    }

    #[test]
    fn log_list_query_parses_from_query_string() {
        let q: LogListQuery =
            serde_urlencoded::from_str("startDate=2025-03-09&endDate=2025-03-09&limit=1")
                .unwrap();
        assert_eq!(q.start_date, Some(date!(2025 - 03 - 09)));
        assert_eq!(q.end_date, Some(date!(2025 - 03 - 09)));
        assert_eq!(q.limit, 1);
        assert_eq!(q.offset, 0);
    }
}
