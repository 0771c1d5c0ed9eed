use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Low,
    Med,
    High,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Low => "LOW",
            Difficulty::Med => "MED",
            Difficulty::High => "HIGH",
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Low => 1.0,
            Difficulty::Med => 2.0,
            Difficulty::High => 3.0,
        }
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Difficulty::Low),
            "MED" => Ok(Difficulty::Med),
            "HIGH" => Ok(Difficulty::High),
            other => Err(AppError::InvalidInput(format!(
                "Invalid difficulty level: {}. Must be 'LOW', 'MED', or 'HIGH'.",
                other
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entry. Construct through [`Meal::new`] so price and difficulty
/// are always valid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: Difficulty,
    pub battles: i64,
    pub wins: i64,
}

impl Meal {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        cuisine: impl Into<String>,
        price: f64,
        difficulty: &str,
    ) -> Result<Self, AppError> {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::InvalidInput(
                "Price must be a positive value.".into(),
            ));
        }
        let difficulty = difficulty.parse::<Difficulty>()?;
        Ok(Self {
            id,
            name: name.into(),
            cuisine: cuisine.into(),
            price,
            difficulty,
            battles: 0,
            wins: 0,
        })
    }

    /// `wins / battles`, or `None` before the first battle.
    pub fn win_pct(&self) -> Option<f64> {
        (self.battles > 0).then(|| self.wins as f64 / self.battles as f64)
    }
}

/// Raw `meals` row, including the deletion flag.
#[derive(Debug, Clone, FromRow)]
pub struct MealRow {
    pub id: i64,
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: String,
    pub deleted: bool,
    pub battles: i64,
    pub wins: i64,
}

impl TryFrom<MealRow> for Meal {
    type Error = AppError;

    fn try_from(r: MealRow) -> Result<Self, Self::Error> {
        let mut meal = Meal::new(r.id, r.name, r.cuisine, r.price, &r.difficulty)?;
        meal.battles = r.battles;
        meal.wins = r.wins;
        Ok(meal)
    }
}

/// Result of looking a meal up without treating absence as an error.
#[derive(Debug)]
pub enum Lookup<T> {
    Missing,
    Deleted,
    Live(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardSort {
    #[default]
    Wins,
    WinPct,
    Price,
}

impl LeaderboardSort {
    pub fn order_by(self) -> &'static str {
        match self {
            LeaderboardSort::Wins => "wins DESC, id ASC",
            LeaderboardSort::WinPct => "win_pct DESC, id ASC",
            LeaderboardSort::Price => "price DESC, id ASC",
        }
    }
}

impl FromStr for LeaderboardSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wins" => Ok(LeaderboardSort::Wins),
            "win_pct" => Ok(LeaderboardSort::WinPct),
            "price" => Ok(LeaderboardSort::Price),
            other => Err(AppError::InvalidInput(format!(
                "Invalid sort_by parameter: {}",
                other
            ))),
        }
    }
}

/// Result of one battle for one meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl FromStr for Outcome {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            other => Err(AppError::InvalidInput(format!(
                "Invalid result: {}. Expected 'win' or 'loss'.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub name: String,
    pub cuisine: String,
    pub price: f64,
    pub difficulty: String,
    pub battles: i64,
    pub wins: i64,
    pub win_pct: f64,
}

impl TryFrom<LeaderboardEntry> for Meal {
    type Error = AppError;

    fn try_from(e: LeaderboardEntry) -> Result<Self, Self::Error> {
        let mut meal = Meal::new(e.id, e.name, e.cuisine, e.price, &e.difficulty)?;
        meal.battles = e.battles;
        meal.wins = e.wins;
        Ok(meal)
    }
}
