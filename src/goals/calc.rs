use crate::goals::dto::{ActivityLevel, CalculateGoalsRequest, GoalKind, GoalsDto, Sex};

/// Suggested daily targets from body metrics: Mifflin-St Jeor BMR, scaled by
/// activity, shifted for the stated goal, with a 30/40/30 macro split and
/// 35 ml water per kg body weight.
pub fn suggest_goals(req: &CalculateGoalsRequest) -> GoalsDto {
    let bmr = 10.0 * req.weight_kg + 6.25 * req.height_cm - 5.0 * f64::from(req.age)
        + match req.sex {
            Sex::Male => 5.0,
            Sex::Female => -161.0,
        };

    let factor = match req.activity_level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    };

    let adjustment = match req.goal {
        GoalKind::Lose => -500.0,
        GoalKind::Maintain => 0.0,
        GoalKind::Gain => 300.0,
    };

    let calories = (bmr * factor + adjustment).max(1200.0);

    GoalsDto {
        calories: calories.round() as i32,
        // 4 kcal/g protein and carbs, 9 kcal/g fat
        protein_g: (calories * 0.30 / 4.0).round(),
        carbs_g: (calories * 0.40 / 4.0).round(),
        fat_g: (calories * 0.30 / 9.0).round(),
        water_ml: (req.weight_kg * 35.0).round() as i32,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CalculateGoalsRequest {
        CalculateGoalsRequest {
            age: 30,
            sex: Sex::Male,
            height_cm: 180.0,
            weight_kg: 80.0,
            activity_level: ActivityLevel::Moderate,
            goal: GoalKind::Maintain,
        }
    }

    #[test]
    fn maintain_moderate_male() {
        // BMR = 800 + 1125 - 150 + 5 = 1780; TDEE = 1780 * 1.55 = 2759
        let goals = suggest_goals(&base_request());
        assert_eq!(goals.calories, 2759);
        assert_eq!(goals.water_ml, 2800);
        assert_eq!(goals.protein_g, (2759.0_f64 * 0.30 / 4.0).round());
    }

    #[test]
    fn lose_reduces_and_gain_increases_calories() {
        let maintain = suggest_goals(&base_request());
        let lose = suggest_goals(&CalculateGoalsRequest {
            goal: GoalKind::Lose,
            ..base_request()
        });
        let gain = suggest_goals(&CalculateGoalsRequest {
            goal: GoalKind::Gain,
            ..base_request()
        });
        assert_eq!(lose.calories, maintain.calories - 500);
        assert_eq!(gain.calories, maintain.calories + 300);
    }

    #[test]
    fn female_bmr_is_lower() {
        let male = suggest_goals(&base_request());
        let female = suggest_goals(&CalculateGoalsRequest {
            sex: Sex::Female,
            ..base_request()
        });
        assert!(female.calories < male.calories);
    }

    #[test]
    fn calories_never_drop_below_floor() {
        let goals = suggest_goals(&CalculateGoalsRequest {
            age: 80,
            sex: Sex::Female,
            height_cm: 150.0,
            weight_kg: 45.0,
            activity_level: ActivityLevel::Sedentary,
            goal: GoalKind::Lose,
        });
        assert_eq!(goals.calories, 1200);
    }
}
