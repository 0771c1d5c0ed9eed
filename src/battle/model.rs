use tracing::info;

use super::score::{battle_score, win_probability};
use crate::{
    error::{AppError, AppResult},
    meals::{
        repo_types::Meal,
        services::OutcomeRecorder,
    },
    random::RandomSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleState {
    Empty,
    OnePrepped,
    Ready,
}

/// Holds the two meals about to fight.
#[derive(Debug, Default)]
pub struct BattleModel {
    combatants: Vec<Meal>,
}

impl BattleModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BattleState {
        match self.combatants.len() {
            0 => BattleState::Empty,
            1 => BattleState::OnePrepped,
            _ => BattleState::Ready,
        }
    }

    pub fn prep_combatant(&mut self, meal: Meal) -> AppResult<()> {
        if self.state() == BattleState::Ready {
            info!(meal = %meal.name, "combatant list is full");
            return Err(AppError::State(
                "Combatant list is full, cannot add more combatants.".into(),
            ));
        }
        info!(meal = %meal.name, "adding combatant");
        self.combatants.push(meal);
        Ok(())
    }

    pub fn combatants(&self) -> &[Meal] {
        &self.combatants
    }

    pub fn clear_combatants(&mut self) {
        info!("clearing the combatants list");
        self.combatants.clear();
    }

    /// Fights the two prepped meals and records the result for both.
    /// Returns the winner's name. The combatant list is left as it was.
    pub async fn battle(
        &self,
        recorder: &dyn OutcomeRecorder,
        rng: &dyn RandomSource,
    ) -> AppResult<String> {
        let [a, b] = self.combatants.as_slice() else {
            info!(count = self.combatants.len(), "not enough combatants to battle");
            return Err(AppError::State(
                "Two combatants must be prepped for a battle.".into(),
            ));
        };

        let score_a = battle_score(a);
        let score_b = battle_score(b);
        let p_a = win_probability(score_a, score_b);
        let draw = rng.draw();
        info!(
            a = %a.name, score_a, b = %b.name, score_b, p_a, draw,
            "battle scores computed"
        );

        let (winner, loser) = if draw < p_a { (a, b) } else { (b, a) };
        recorder.record_battle(winner.id, loser.id).await?;

        info!(winner = %winner.name, loser = %loser.name, "battle resolved");
        Ok(winner.name.clone())
    }
}
