use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::battle::model::BattleModel;
use crate::config::AppConfig;
use crate::db;
use crate::meals::services::Catalog;
use crate::random::{RandomSource, SeededRandom, ThreadRandom};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub catalog: Catalog,
    pub battle: Arc<Mutex<BattleModel>>,
    pub rng: Arc<dyn RandomSource>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url, config.max_connections).await?;

        let rng = match config.random_seed {
            Some(seed) => {
                tracing::info!(seed, "using seeded random source");
                Arc::new(SeededRandom::new(seed)) as Arc<dyn RandomSource>
            }
            None => Arc::new(ThreadRandom) as Arc<dyn RandomSource>,
        };

        Ok(Self::from_parts(db, config, rng))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            catalog: Catalog::new(db.clone()),
            battle: Arc::new(Mutex::new(BattleModel::new())),
            db,
            config,
            rng,
        }
    }

    /// Migrated in-memory database and a fixed random draw.
    #[cfg(test)]
    pub async fn fake(draw: f64) -> Self {
        use crate::random::FixedRandom;

        let db = db::test_pool().await;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            random_seed: None,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(db, config, Arc::new(FixedRandom(draw)))
    }
}
