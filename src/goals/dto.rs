use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::goals::repo::NutritionGoals;

/// Per-user daily targets. Not tied to any particular log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsDto {
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub water_ml: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<NutritionGoals> for GoalsDto {
    fn from(g: NutritionGoals) -> Self {
        Self {
            calories: g.calories,
            protein_g: g.protein_g,
            carbs_g: g.carbs_g,
            fat_g: g.fat_g,
            water_ml: g.water_ml,
            updated_at: Some(g.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGoalsRequest {
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub water_ml: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Lose,
    Maintain,
    Gain,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateGoalsRequest {
    pub age: u8,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub goal: GoalKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecommendation {
    pub name: String,
    pub description: String,
    pub goals: GoalsDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_goals_request_serializes_as_camel_case_body() {
        let body = SetGoalsRequest {
            calories: 2400,
            protein_g: 180.0,
            carbs_g: 240.0,
            fat_g: 80.0,
            water_ml: 2800,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["calories"], 2400);
        assert_eq!(json["proteinG"], 180.0);
        assert_eq!(json["waterMl"], 2800);
    }

    #[test]
    fn calculate_request_enums_use_wire_casing() {
        let body: CalculateGoalsRequest = serde_json::from_str(
            r#"{"age":30,"sex":"male","heightCm":180.0,"weightKg":80.0,
                "activityLevel":"very_active","goal":"gain"}"#,
        )
        .unwrap();
        assert_eq!(body.sex, Sex::Male);
        assert_eq!(body.activity_level, ActivityLevel::VeryActive);
        assert_eq!(body.goal, GoalKind::Gain);
    }
}
