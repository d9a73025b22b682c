//! Weighted winner draw
//!
//! A registrant with weight `n` holds `n` slots in the pool. Each pick is
//! uniform over the remaining slots, and a picked registrant loses all of
//! its slots, so nobody wins twice.

use crate::db::Registrant;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Draw up to `count` distinct winners from `roster`, in draw order.
pub fn select_winners<R: Rng + ?Sized>(
    roster: &[Registrant],
    count: usize,
    rng: &mut R,
) -> Vec<Registrant> {
    let mut pool: Vec<&Registrant> = roster.iter().collect();
    let mut winners = Vec::with_capacity(count.min(pool.len()));

    while winners.len() < count && !pool.is_empty() {
        // Weights are clamped to 1..=MAX_WEIGHT, so the pool total cannot
        // overflow and is never zero
        let slots = match WeightedIndex::new(pool.iter().map(|r| r.draw_weight())) {
            Ok(slots) => slots,
            Err(e) => {
                tracing::error!(error = %e, pool = pool.len(), "Invalid draw weights");
                break;
            }
        };
        let picked = pool.swap_remove(slots.sample(rng));
        winners.push(picked.clone());
    }

    winners
}

/// [`select_winners`] using the thread-local random source
pub fn draw_winners(roster: &[Registrant], count: usize) -> Vec<Registrant> {
    select_winners(roster, count, &mut rand::thread_rng())
}
