use serde::{Deserialize, Serialize};

use super::repo_types::{Difficulty, LeaderboardEntry, Meal};

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MealResponse {
    pub id: i64,
    pub meal: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles: i64,
    pub wins: i64,
    pub win_pct: Option<f64>,
}

impl From<Meal> for MealResponse {
    fn from(m: Meal) -> Self {
        Self {
            win_pct: m.win_pct(),
            id: m.id,
            meal: m.name,
            cuisine: m.cuisine,
            price: m.price,
            difficulty: m.difficulty,
            battles: m.battles,
            wins: m.wins,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub removed: u64,
}
