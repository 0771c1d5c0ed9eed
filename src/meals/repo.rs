use sqlx::SqliteConnection;

use super::repo_types::{LeaderboardEntry, LeaderboardSort, MealRow, Outcome};

pub async fn insert_meal(
    conn: &mut SqliteConnection,
    name: &str,
    cuisine: &str,
    price: f64,
    difficulty: &str,
) -> Result<MealRow, sqlx::Error> {
    sqlx::query_as::<_, MealRow>(
        r#"
        INSERT INTO meals (name, cuisine, price, difficulty)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, cuisine, price, difficulty, deleted, battles, wins
        "#,
    )
    .bind(name)
    .bind(cuisine)
    .bind(price)
    .bind(difficulty)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    meal_id: i64,
) -> Result<Option<MealRow>, sqlx::Error> {
    sqlx::query_as::<_, MealRow>(
        r#"
        SELECT id, name, cuisine, price, difficulty, deleted, battles, wins
          FROM meals
         WHERE id = ?
        "#,
    )
    .bind(meal_id)
    .fetch_optional(&mut *conn)
    .await
}

/// A live meal wins over deleted ones that used the same name before it.
pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<MealRow>, sqlx::Error> {
    sqlx::query_as::<_, MealRow>(
        r#"
        SELECT id, name, cuisine, price, difficulty, deleted, battles, wins
          FROM meals
         WHERE name = ?
         ORDER BY deleted ASC, id DESC
         LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn deleted_flag(
    conn: &mut SqliteConnection,
    meal_id: i64,
) -> Result<Option<bool>, sqlx::Error> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT deleted FROM meals WHERE id = ?")
        .bind(meal_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|(deleted,)| deleted))
}

pub async fn mark_deleted(conn: &mut SqliteConnection, meal_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE meals SET deleted = TRUE WHERE id = ?")
        .bind(meal_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn leaderboard(
    conn: &mut SqliteConnection,
    sort: LeaderboardSort,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT id, name, cuisine, price, difficulty, battles, wins,
               (wins * 1.0 / battles) AS win_pct
          FROM meals
         WHERE deleted = FALSE AND battles > 0
         ORDER BY {}
        "#,
        sort.order_by()
    );
    sqlx::query_as::<_, LeaderboardEntry>(&query)
        .fetch_all(&mut *conn)
        .await
}

pub async fn increment_stats(
    conn: &mut SqliteConnection,
    meal_id: i64,
    outcome: Outcome,
) -> Result<(), sqlx::Error> {
    let sql = match outcome {
        Outcome::Win => "UPDATE meals SET battles = battles + 1, wins = wins + 1 WHERE id = ?",
        Outcome::Loss => "UPDATE meals SET battles = battles + 1 WHERE id = ?",
    };
    sqlx::query(sql).bind(meal_id).execute(&mut *conn).await?;
    Ok(())
}

/// Physically removes every meal. Returns the number of rows dropped.
pub async fn delete_all(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM meals").execute(&mut *conn).await?;
    Ok(res.rows_affected())
}
