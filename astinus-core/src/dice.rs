//! Dice pool engine: bonus/penalty dice pools rolled on d6, keep-two.
//!
//! Pure and deterministic given an RNG source; every entry point takes an
//! injected `R: Rng` so tests can seed reproducible rolls.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A dice pool request: a flat modifier plus bonus/penalty dice counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolSpec {
    #[serde(default)]
    pub modifier: i32,
    #[serde(default)]
    pub bonus_dice: u32,
    #[serde(default)]
    pub penalty_dice: u32,
}

impl PoolSpec {
    pub fn new(modifier: i32, bonus_dice: u32, penalty_dice: u32) -> Self {
        Self {
            modifier,
            bonus_dice,
            penalty_dice,
        }
    }

    /// `bonus_dice - penalty_dice`, positive meaning net advantage.
    fn net(&self) -> i32 {
        self.bonus_dice as i32 - self.penalty_dice as i32
    }

    /// Total dice drawn: `2 + |net|`.
    fn count(&self) -> u32 {
        (2 + self.net().unsigned_abs()) as u32
    }

    /// The dice-notation string this pool resolves to: `2d6`, `(n)d6kh2`, or
    /// `(n)d6kl2`.
    pub fn formula(&self) -> String {
        let net = self.net();
        let count = self.count();
        match net.cmp(&0) {
            std::cmp::Ordering::Equal => "2d6".to_string(),
            std::cmp::Ordering::Greater => format!("{count}d6kh2"),
            std::cmp::Ordering::Less => format!("{count}d6kl2"),
        }
    }
}

/// Outcome bucket derived from a [`DiceResult::total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Critical,
    Success,
    Partial,
    Failure,
}

impl Outcome {
    fn from_total(total: i32) -> Self {
        match total {
            t if t >= 12 => Outcome::Critical,
            10..=11 => Outcome::Success,
            7..=9 => Outcome::Partial,
            _ => Outcome::Failure,
        }
    }
}

/// The full record of a resolved pool roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceResult {
    pub all_rolls: Vec<u32>,
    pub kept_rolls: Vec<u32>,
    pub dropped_rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
    pub outcome: Outcome,
    pub is_bonus: bool,
    pub is_penalty: bool,
}

/// Roll a [`PoolSpec`] using `rng`.
///
/// Draws `2 + |net|` d6 where `net = bonus_dice - penalty_dice`. Keeps the
/// two highest when `net >= 0`, the two lowest when `net < 0`. Kept dice are
/// sorted descending for stable display; dropped dice keep roll order.
pub fn roll<R: Rng>(spec: &PoolSpec, rng: &mut R) -> DiceResult {
    let net = spec.net();
    let count = spec.count();

    let all_rolls: Vec<u32> = (0..count).map(|_| rng.gen_range(1..=6)).collect();

    let mut indexed: Vec<(usize, u32)> = all_rolls.iter().copied().enumerate().collect();
    if net >= 0 {
        indexed.sort_by(|a, b| b.1.cmp(&a.1));
    } else {
        indexed.sort_by(|a, b| a.1.cmp(&b.1));
    }
    let kept_indices: std::collections::HashSet<usize> =
        indexed.iter().take(2).map(|&(i, _)| i).collect();

    let mut kept_rolls: Vec<u32> = kept_indices.iter().map(|&i| all_rolls[i]).collect();
    kept_rolls.sort_by(|a, b| b.cmp(a));

    let dropped_rolls: Vec<u32> = all_rolls
        .iter()
        .enumerate()
        .filter(|(i, _)| !kept_indices.contains(i))
        .map(|(_, &v)| v)
        .collect();

    let total = kept_rolls.iter().sum::<u32>() as i32 + spec.modifier;

    DiceResult {
        all_rolls,
        kept_rolls,
        dropped_rolls,
        modifier: spec.modifier,
        total,
        outcome: Outcome::from_total(total),
        is_bonus: net > 0,
        is_penalty: net < 0,
    }
}


#[cfg(test)]
mod pool_algebra {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    proptest! {
        /// For any pool spec, exactly two dice are kept, the drawn count is
        /// `2 + |net|`, and `total` is always the sum of kept plus modifier.
        #[test]
        fn pool_invariants_hold(
            modifier in -5i32..5,
            bonus_dice in 0u32..6,
            penalty_dice in 0u32..6,
            seed in any::<u64>(),
        ) {
            let spec = PoolSpec::new(modifier, bonus_dice, penalty_dice);
            let mut rng = StdRng::seed_from_u64(seed);
            let result = roll(&spec, &mut rng);

            let net = bonus_dice as i32 - penalty_dice as i32;
            prop_assert_eq!(result.kept_rolls.len(), 2);
            prop_assert_eq!(result.all_rolls.len(), (2 + net.unsigned_abs()) as usize);
            prop_assert_eq!(
                result.total,
                result.kept_rolls.iter().sum::<u32>() as i32 + modifier
            );
            prop_assert_eq!(result.is_bonus, net > 0);
            prop_assert_eq!(result.is_penalty, net < 0);
            for &d in &result.all_rolls {
                prop_assert!((1..=6).contains(&d));
            }
        }
    }
}
