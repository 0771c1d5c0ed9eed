use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{BattleResponse, CombatantsResponse, PrepCombatantRequest};
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/battle/combatants",
            get(get_combatants).post(prep_combatant).delete(clear_combatants),
        )
        .route("/battle", axum::routing::post(battle))
}

async fn snapshot(state: &AppState) -> CombatantsResponse {
    let model = state.battle.lock().await;
    CombatantsResponse {
        combatants: model.combatants().iter().cloned().map(Into::into).collect(),
    }
}

#[instrument(skip(state))]
pub async fn get_combatants(State(state): State<AppState>) -> Json<CombatantsResponse> {
    Json(snapshot(&state).await)
}

/// Looks the meal up by name and adds it to the next battle.
#[instrument(skip(state))]
pub async fn prep_combatant(
    State(state): State<AppState>,
    Json(body): Json<PrepCombatantRequest>,
) -> Result<Json<CombatantsResponse>, AppError> {
    let meal = state.catalog.get_meal_by_name(&body.meal).await?;
    state.battle.lock().await.prep_combatant(meal)?;
    Ok(Json(snapshot(&state).await))
}

#[instrument(skip(state))]
pub async fn clear_combatants(State(state): State<AppState>) -> Json<CombatantsResponse> {
    state.battle.lock().await.clear_combatants();
    Json(snapshot(&state).await)
}

#[instrument(skip(state))]
pub async fn battle(State(state): State<AppState>) -> Result<Json<BattleResponse>, AppError> {
    let model = state.battle.lock().await;
    let winner = model.battle(&state.catalog, state.rng.as_ref()).await?;
    Ok(Json(BattleResponse { winner }))
}
