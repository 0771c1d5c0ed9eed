use crate::meals::repo_types::Meal;

/// Score delta that moves the win probability from 0.5 to about 0.73.
pub const SCORE_SCALE: f64 = 100.0;

/// `price * difficulty multiplier - length of the cuisine label`.
pub fn battle_score(meal: &Meal) -> f64 {
    let penalty = meal.cuisine.chars().count() as f64;
    meal.price * meal.difficulty.multiplier() - penalty
}

/// Probability that the side scoring `score_a` beats `score_b`.
///
/// Logistic in the score delta: strictly increasing, `p(d) + p(-d) == 1`,
/// and always inside `[0, 1]`. Equal scores give an even fight, and so do two
/// scores that both overflow to the same infinity.
pub fn win_probability(score_a: f64, score_b: f64) -> f64 {
    let delta = score_a - score_b;
    if delta.is_nan() {
        return 0.5;
    }
    1.0 / (1.0 + (-delta / SCORE_SCALE).exp())
}
