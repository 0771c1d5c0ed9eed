use serde::{Deserialize, Serialize};

use crate::meals::dto::MealResponse;

#[derive(Debug, Deserialize)]
pub struct PrepCombatantRequest {
    pub meal: String,
}

#[derive(Debug, Serialize)]
pub struct CombatantsResponse {
    pub combatants: Vec<MealResponse>,
}

#[derive(Debug, Serialize)]
pub struct BattleResponse {
    pub winner: String,
}
