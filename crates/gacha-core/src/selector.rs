//! Weighted random selection for category and rarity draws.

use crate::error::{GachaError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Anything that can take part in a weighted draw.
pub trait Weighted {
    fn id(&self) -> &str;
    fn weight(&self) -> f64;
}

/// A plain `{id, weight}` pair. Weights need not sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionWeight {
    pub id: String,
    pub weight: f64,
}

impl SelectionWeight {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

impl Weighted for SelectionWeight {
    fn id(&self) -> &str {
        &self.id
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}

/// Pick one item with probability `weight / total`.
///
/// Draws `r` uniformly from `[0, total)` and walks the slice subtracting each
/// weight until the remainder drops to zero or below. If rounding leaves a
/// positive remainder after the whole walk, the last item is returned.
pub fn select<'a, T: Weighted, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Result<&'a T> {
    let Some(last) = items.last() else {
        return Err(GachaError::InvalidInput(
            "cannot select from an empty set".into(),
        ));
    };
    if let Some(bad) = items
        .iter()
        .find(|i| !(i.weight().is_finite() && i.weight() > 0.0))
    {
        return Err(GachaError::InvalidInput(format!(
            "weight for '{}' must be a positive number, got {}",
            bad.id(),
            bad.weight()
        )));
    }

    let total: f64 = items.iter().map(Weighted::weight).sum();
    if !total.is_finite() {
        return Err(GachaError::InvalidInput("total weight overflows".into()));
    }

    let mut remainder = rng.gen_range(0.0..total);
    for item in items {
        remainder -= item.weight();
        if remainder <= 0.0 {
            return Ok(item);
        }
    }
    Ok(last)
}
