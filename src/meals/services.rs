use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

use super::repo;
use super::repo_types::{Difficulty, LeaderboardEntry, LeaderboardSort, Lookup, Meal, MealRow, Outcome};
use crate::{
    db,
    error::{AppError, AppResult},
    random::RandomSource,
};

/// Receives battle results. Implemented by [`Catalog`]; the battle engine only
/// sees this seam.
#[async_trait]
pub trait OutcomeRecorder: Send + Sync {
    /// `Win` for the winner and `Loss` for the loser. Either both land or
    /// neither does.
    async fn record_battle(&self, winner_id: i64, loser_id: i64) -> AppResult<()>;
}

/// CRUD and query operations over meal records.
#[derive(Clone)]
pub struct Catalog {
    db: SqlitePool,
}

fn storage(e: sqlx::Error) -> AppError {
    error!(error = %e, "database error");
    AppError::Storage(e)
}

async fn deletion_state(conn: &mut SqliteConnection, meal_id: i64) -> AppResult<Lookup<()>> {
    let flag = repo::deleted_flag(conn, meal_id).await.map_err(storage)?;
    Ok(match flag {
        None => Lookup::Missing,
        Some(true) => Lookup::Deleted,
        Some(false) => Lookup::Live(()),
    })
}

fn classify(row: Option<MealRow>) -> Lookup<MealRow> {
    match row {
        None => Lookup::Missing,
        Some(r) if r.deleted => Lookup::Deleted,
        Some(r) => Lookup::Live(r),
    }
}

impl Catalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_meal(
        &self,
        name: &str,
        cuisine: &str,
        price: f64,
        difficulty: &str,
    ) -> AppResult<Meal> {
        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "Invalid price: {}. Price must be a positive number.",
                price
            )));
        }
        let difficulty: Difficulty = difficulty.parse()?;

        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        let row = match repo::insert_meal(&mut conn, name, cuisine, price, difficulty.as_str()).await {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                error!(meal = %name, "duplicate meal name");
                return Err(AppError::DuplicateName(name.to_string()));
            }
            Err(e) => return Err(storage(e)),
        };

        info!(meal_id = row.id, meal = %name, "meal added to the catalog");
        Meal::try_from(row)
    }

    /// Soft delete: the row stays, flagged.
    pub async fn delete_meal(&self, meal_id: i64) -> AppResult<()> {
        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        match deletion_state(&mut conn, meal_id).await? {
            Lookup::Missing => {
                info!(meal_id, "meal not found");
                Err(AppError::NotFound(format!("Meal with ID {} not found", meal_id)))
            }
            Lookup::Deleted => {
                info!(meal_id, "meal has already been deleted");
                Err(AppError::AlreadyDeleted(format!(
                    "Meal with ID {} has been deleted",
                    meal_id
                )))
            }
            Lookup::Live(()) => {
                repo::mark_deleted(&mut conn, meal_id).await.map_err(storage)?;
                info!(meal_id, "meal marked as deleted");
                Ok(())
            }
        }
    }

    pub async fn get_meal_by_id(&self, meal_id: i64) -> AppResult<Meal> {
        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        let row = repo::find_by_id(&mut conn, meal_id).await.map_err(storage)?;
        match classify(row) {
            Lookup::Missing => {
                info!(meal_id, "meal not found");
                Err(AppError::NotFound(format!("Meal with ID {} not found", meal_id)))
            }
            Lookup::Deleted => {
                info!(meal_id, "meal has been deleted");
                Err(AppError::AlreadyDeleted(format!(
                    "Meal with ID {} has been deleted",
                    meal_id
                )))
            }
            Lookup::Live(row) => Meal::try_from(row),
        }
    }

    pub async fn get_meal_by_name(&self, name: &str) -> AppResult<Meal> {
        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        let row = repo::find_by_name(&mut conn, name).await.map_err(storage)?;
        match classify(row) {
            Lookup::Missing => {
                info!(meal = %name, "meal not found");
                Err(AppError::NotFound(format!("Meal with name {} not found", name)))
            }
            Lookup::Deleted => {
                info!(meal = %name, "meal has been deleted");
                Err(AppError::AlreadyDeleted(format!(
                    "Meal with name {} has been deleted",
                    name
                )))
            }
            Lookup::Live(row) => Meal::try_from(row),
        }
    }

    /// Live meals with at least one battle, best first.
    pub async fn get_leaderboard(&self, sort: LeaderboardSort) -> AppResult<Vec<LeaderboardEntry>> {
        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        let rows = repo::leaderboard(&mut conn, sort).await.map_err(storage)?;
        if rows.is_empty() {
            warn!("the leaderboard is empty");
        } else {
            info!(sort = ?sort, count = rows.len(), "leaderboard retrieved");
        }
        Ok(rows)
    }

    /// Uniform pick from the wins-ordered leaderboard.
    pub async fn get_random_meal(&self, rng: &dyn RandomSource) -> AppResult<Meal> {
        let mut board = self.get_leaderboard(LeaderboardSort::Wins).await?;
        if board.is_empty() {
            info!("cannot pick a random meal, the catalog is empty");
            return Err(AppError::EmptyCatalog);
        }
        let idx = rng.draw_index(board.len());
        info!(index = idx, total = board.len(), "random index selected");
        Meal::try_from(board.swap_remove(idx))
    }

    pub async fn update_meal_stats(&self, meal_id: i64, outcome: Outcome) -> AppResult<()> {
        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        match deletion_state(&mut conn, meal_id).await? {
            Lookup::Missing => {
                info!(meal_id, "meal not found");
                Err(AppError::NotFound(format!("Meal with ID {} not found", meal_id)))
            }
            Lookup::Deleted => {
                info!(meal_id, "meal has been deleted");
                Err(AppError::AlreadyDeleted(format!(
                    "Meal with ID {} has been deleted",
                    meal_id
                )))
            }
            Lookup::Live(()) => {
                repo::increment_stats(&mut conn, meal_id, outcome)
                    .await
                    .map_err(storage)?;
                info!(meal_id, outcome = ?outcome, "meal stats updated");
                Ok(())
            }
        }
    }

    /// Both meals must be live before either row is touched.
    pub async fn record_battle(&self, winner_id: i64, loser_id: i64) -> AppResult<()> {
        let mut tx = self.db.begin().await.map_err(storage)?;
        for meal_id in [winner_id, loser_id] {
            match deletion_state(&mut tx, meal_id).await? {
                Lookup::Missing => {
                    info!(meal_id, "combatant not found");
                    return Err(AppError::NotFound(format!("Meal with ID {} not found", meal_id)));
                }
                Lookup::Deleted => {
                    info!(meal_id, "combatant has been deleted");
                    return Err(AppError::AlreadyDeleted(format!(
                        "Meal with ID {} has been deleted",
                        meal_id
                    )));
                }
                Lookup::Live(()) => {}
            }
        }
        repo::increment_stats(&mut tx, winner_id, Outcome::Win)
            .await
            .map_err(storage)?;
        repo::increment_stats(&mut tx, loser_id, Outcome::Loss)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;

        info!(winner_id, loser_id, "battle recorded");
        Ok(())
    }

    pub async fn clear_meals(&self) -> AppResult<u64> {
        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        let removed = repo::delete_all(&mut conn).await.map_err(storage)?;
        info!(removed, "catalog cleared");
        Ok(removed)
    }

    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = db::acquire(&self.db).await.map_err(storage)?;
        sqlx::query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl OutcomeRecorder for Catalog {
    async fn record_battle(&self, winner_id: i64, loser_id: i64) -> AppResult<()> {
        Catalog::record_battle(self, winner_id, loser_id).await
    }
}

#[cfg(test)]
mod catalog_tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::random::FixedRandom;

    async fn catalog() -> Catalog {
        Catalog::new(db::test_pool().await)
    }

    async fn battled(c: &Catalog, name: &str, price: f64, wins: usize, losses: usize) -> Meal {
        let meal = c.create_meal(name, "Cuisine", price, "MED").await.unwrap();
        for _ in 0..wins {
            c.update_meal_stats(meal.id, Outcome::Win).await.unwrap();
        }
        for _ in 0..losses {
            c.update_meal_stats(meal.id, Outcome::Loss).await.unwrap();
        }
        meal
    }

    #[tokio::test]
    async fn create_then_get_by_name_roundtrip() {
        let c = catalog().await;
        let created = c.create_meal("Meal Name", "Cuisine Type", 8.99, "LOW").await.unwrap();
        let fetched = c.get_meal_by_name("Meal Name").await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.cuisine, "Cuisine Type");
        assert_eq!(fetched.price, 8.99);
        assert_eq!(fetched.difficulty, Difficulty::Low);
        assert_eq!((fetched.battles, fetched.wins), (0, 0));
    }

    #[tokio::test]
    async fn create_rejects_bad_price_and_difficulty() {
        let c = catalog().await;
        let err = c.create_meal("m", "c", -8.99, "LOW").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid price: -8.99. Price must be a positive number.");
        assert!(matches!(c.create_meal("m", "c", 0.0, "LOW").await, Err(AppError::InvalidInput(_))));
        assert!(matches!(
            c.create_meal("m", "c", 8.99, "INVALID").await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(c.clear_meals().await.unwrap(), 0, "nothing was written");
    }

    #[tokio::test]
    async fn create_duplicate_name_fails() {
        let c = catalog().await;
        c.create_meal("Meal Name", "Cuisine", 8.99, "LOW").await.unwrap();
        let err = c.create_meal("Meal Name", "Other", 1.0, "HIGH").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateName(ref n) if n == "Meal Name"));
    }

    #[tokio::test]
    async fn name_is_reusable_after_delete() {
        let c = catalog().await;
        let old = c.create_meal("Stew", "Irish", 5.0, "LOW").await.unwrap();
        c.delete_meal(old.id).await.unwrap();
        let new = c.create_meal("Stew", "French", 7.0, "MED").await.unwrap();
        let fetched = c.get_meal_by_name("Stew").await.unwrap();
        assert_eq!(fetched.id, new.id);
    }

    #[tokio::test]
    async fn delete_paths_are_distinguishable() {
        let c = catalog().await;
        let meal = c.create_meal("Meal", "Cuisine", 1.0, "LOW").await.unwrap();
        assert!(matches!(c.delete_meal(999).await, Err(AppError::NotFound(_))));
        c.delete_meal(meal.id).await.unwrap();
        let err = c.delete_meal(meal.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyDeleted(_)));
        assert_eq!(err.to_string(), format!("Meal with ID {} has been deleted", meal.id));
    }

    #[tokio::test]
    async fn deleted_meal_is_not_readable() {
        let c = catalog().await;
        let meal = c.create_meal("Meal", "Cuisine", 1.0, "LOW").await.unwrap();
        c.delete_meal(meal.id).await.unwrap();
        assert!(matches!(c.get_meal_by_id(meal.id).await, Err(AppError::AlreadyDeleted(_))));
        assert!(matches!(c.get_meal_by_name("Meal").await, Err(AppError::AlreadyDeleted(_))));
    }

    #[tokio::test]
    async fn missing_meal_lookups_fail_not_found() {
        let c = catalog().await;
        let err = c.get_meal_by_id(999).await.unwrap_err();
        assert_eq!(err.to_string(), "Meal with ID 999 not found");
        assert!(matches!(c.get_meal_by_name("nope").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn record_battle_updates_both_sides() {
        let c = catalog().await;
        let w = c.create_meal("Winner", "x", 1.0, "LOW").await.unwrap();
        let l = c.create_meal("Loser", "y", 1.0, "LOW").await.unwrap();
        c.record_battle(w.id, l.id).await.unwrap();

        let w = c.get_meal_by_id(w.id).await.unwrap();
        let l = c.get_meal_by_id(l.id).await.unwrap();
        assert_eq!((w.battles, w.wins), (1, 1));
        assert_eq!((l.battles, l.wins), (1, 0));
    }

    #[tokio::test]
    async fn record_battle_with_deleted_loser_changes_nothing() {
        let c = catalog().await;
        let w = c.create_meal("Winner", "x", 1.0, "LOW").await.unwrap();
        let l = c.create_meal("Loser", "y", 1.0, "LOW").await.unwrap();
        c.delete_meal(l.id).await.unwrap();

        let err = c.record_battle(w.id, l.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyDeleted(_)));
        let w = c.get_meal_by_id(w.id).await.unwrap();
        assert_eq!((w.battles, w.wins), (0, 0));
    }

    #[tokio::test]
    async fn record_battle_with_missing_winner_fails() {
        let c = catalog().await;
        let l = c.create_meal("Loser", "y", 1.0, "LOW").await.unwrap();
        assert!(matches!(c.record_battle(404, l.id).await, Err(AppError::NotFound(_))));
        assert_eq!(c.get_meal_by_id(l.id).await.unwrap().battles, 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn empty_leaderboard_is_an_empty_vec() {
        let c = catalog().await;
        c.create_meal("Unbattled", "Cuisine", 1.0, "LOW").await.unwrap();
        let board = c.get_leaderboard(LeaderboardSort::Wins).await.unwrap();
        assert!(board.is_empty());
        assert!(logs_contain("the leaderboard is empty"));
    }

    #[tokio::test]
    async fn leaderboard_orders_by_each_key() {
        let c = catalog().await;
        let a = battled(&c, "Meal A", 8.99, 3, 2).await; // 3 wins, 0.6
        let b = battled(&c, "Meal B", 9.99, 2, 2).await; // 2 wins, 0.5
        let cc = battled(&c, "Meal C", 10.99, 4, 6).await; // 4 wins, 0.4

        let ids = |v: Vec<LeaderboardEntry>| v.into_iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(c.get_leaderboard(LeaderboardSort::Wins).await.unwrap()), vec![cc.id, a.id, b.id]);
        assert_eq!(ids(c.get_leaderboard(LeaderboardSort::WinPct).await.unwrap()), vec![a.id, b.id, cc.id]);
        assert_eq!(ids(c.get_leaderboard(LeaderboardSort::Price).await.unwrap()), vec![cc.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn leaderboard_excludes_deleted_meals() {
        let c = catalog().await;
        let a = battled(&c, "Meal A", 1.0, 1, 0).await;
        let b = battled(&c, "Meal B", 1.0, 0, 1).await;
        c.delete_meal(a.id).await.unwrap();
        let board = c.get_leaderboard(LeaderboardSort::Wins).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].id, b.id);
        assert_eq!(board[0].win_pct, 0.0);
    }

    #[tokio::test]
    async fn random_meal_uses_zero_based_index() {
        let c = catalog().await;
        battled(&c, "Meal A", 1.0, 3, 0).await;
        battled(&c, "Meal B", 1.0, 2, 0).await;
        battled(&c, "Meal C", 1.0, 1, 0).await;

        assert_eq!(c.get_random_meal(&FixedRandom(0.0)).await.unwrap().name, "Meal A");
        assert_eq!(c.get_random_meal(&FixedRandom(0.5)).await.unwrap().name, "Meal B");
        assert_eq!(c.get_random_meal(&FixedRandom(0.99)).await.unwrap().name, "Meal C");
    }

    #[tokio::test]
    async fn random_meal_on_empty_catalog_fails() {
        let c = catalog().await;
        let err = c.get_random_meal(&FixedRandom(0.0)).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyCatalog));
    }

    #[tokio::test]
    async fn stats_are_monotonic() {
        let c = catalog().await;
        let meal = c.create_meal("Meal", "Cuisine", 1.0, "LOW").await.unwrap();

        c.update_meal_stats(meal.id, Outcome::Win).await.unwrap();
        let m = c.get_meal_by_id(meal.id).await.unwrap();
        assert_eq!((m.battles, m.wins), (1, 1));

        c.update_meal_stats(meal.id, Outcome::Loss).await.unwrap();
        let m = c.get_meal_by_id(meal.id).await.unwrap();
        assert_eq!((m.battles, m.wins), (2, 1));
        assert_eq!(m.win_pct(), Some(0.5));

        c.update_meal_stats(meal.id, Outcome::Win).await.unwrap();
        let m = c.get_meal_by_id(meal.id).await.unwrap();
        assert_eq!((m.battles, m.wins), (3, 2));
    }

    #[tokio::test]
    async fn stats_on_missing_or_deleted_meal_fail() {
        let c = catalog().await;
        assert!(matches!(
            c.update_meal_stats(42, Outcome::Win).await,
            Err(AppError::NotFound(_))
        ));
        let meal = c.create_meal("Meal", "Cuisine", 1.0, "LOW").await.unwrap();
        c.delete_meal(meal.id).await.unwrap();
        assert!(matches!(
            c.update_meal_stats(meal.id, Outcome::Loss).await,
            Err(AppError::AlreadyDeleted(_))
        ));
    }

    #[tokio::test]
    async fn clear_meals_removes_everything() {
        let c = catalog().await;
        c.create_meal("A", "x", 1.0, "LOW").await.unwrap();
        c.create_meal("B", "y", 2.0, "HIGH").await.unwrap();
        assert_eq!(c.clear_meals().await.unwrap(), 2);
        assert!(matches!(c.get_meal_by_name("A").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_pool() {
        catalog().await.ping().await.expect("db reachable");
    }
}
