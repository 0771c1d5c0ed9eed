use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    ClearedResponse, CreateMealRequest, LeaderboardQuery, LeaderboardResponse, MealResponse,
    StatusResponse,
};
use super::repo_types::LeaderboardSort;
use crate::{error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/random", get(get_random_meal))
        .route("/meals/by-name/:name", get(get_meal_by_name))
        .route("/leaderboard", get(get_leaderboard))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", axum::routing::post(create_meal).delete(clear_meals))
        .route("/meals/:id", get(get_meal_by_id).delete(delete_meal))
}

#[instrument(skip(state))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(body): Json<CreateMealRequest>,
) -> Result<(StatusCode, HeaderMap, Json<MealResponse>), AppError> {
    let meal = state
        .catalog
        .create_meal(&body.meal, &body.cuisine, body.price, &body.difficulty)
        .await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/meals/{}", meal.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(meal.into())))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    state.catalog.delete_meal(id).await?;
    Ok(Json(StatusResponse { status: "meal deleted" }))
}

#[instrument(skip(state))]
pub async fn clear_meals(State(state): State<AppState>) -> Result<Json<ClearedResponse>, AppError> {
    let removed = state.catalog.clear_meals().await?;
    Ok(Json(ClearedResponse { removed }))
}

#[instrument(skip(state))]
pub async fn get_meal_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MealResponse>, AppError> {
    let meal = state.catalog.get_meal_by_id(id).await?;
    Ok(Json(meal.into()))
}

#[instrument(skip(state))]
pub async fn get_meal_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MealResponse>, AppError> {
    let meal = state.catalog.get_meal_by_name(&name).await?;
    Ok(Json(meal.into()))
}

#[instrument(skip(state))]
pub async fn get_random_meal(State(state): State<AppState>) -> Result<Json<MealResponse>, AppError> {
    let meal = state.catalog.get_random_meal(state.rng.as_ref()).await?;
    Ok(Json(meal.into()))
}

#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let sort = match q.sort.as_deref() {
        Some(key) => key.parse::<LeaderboardSort>()?,
        None => LeaderboardSort::default(),
    };
    let leaderboard = state.catalog.get_leaderboard(sort).await?;
    Ok(Json(LeaderboardResponse { leaderboard }))
}
