use crate::error::{GachaError, Result};
use crate::selector::{self, Weighted};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tech,
    Gadget,
    Food,
    Entertainment,
    Life,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Tech,
            Category::Gadget,
            Category::Food,
            Category::Entertainment,
            Category::Life,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tech => "tech",
            Category::Gadget => "gadget",
            Category::Food => "food",
            Category::Entertainment => "entertainment",
            Category::Life => "life",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Tech => "Tech",
            Category::Gadget => "Gadget",
            Category::Food => "Food",
            Category::Entertainment => "Entertainment",
            Category::Life => "Life",
        }
    }

    /// What kind of items belong in this category's comparisons.
    pub fn description(self) -> &'static str {
        match self {
            Category::Tech => "developer tools, SaaS subscriptions and technical services",
            Category::Gadget => "gadgets, electronics and hardware",
            Category::Food => "food, drinks and restaurants",
            Category::Entertainment => "entertainment, subscriptions and hobbies",
            Category::Life => "household goods, daily necessities and services",
        }
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Category {
        // Catalog weights are static and positive, so selection cannot fail.
        selector::select(Category::all(), rng)
            .copied()
            .unwrap_or(Category::Tech)
    }
}

impl Weighted for Category {
    fn id(&self) -> &str {
        self.as_str()
    }

    fn weight(&self) -> f64 {
        20.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GachaError;

    fn from_str(s: &str) -> Result<Self> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GachaError::UnknownSelector {
                kind: "category",
                id: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    N,
    R,
    SR,
    UR,
    LR,
}

/// Inclusive USD price band an assistant should spread its comparisons over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Rarity {
    pub fn all() -> &'static [Rarity] {
        &[Rarity::N, Rarity::R, Rarity::SR, Rarity::UR, Rarity::LR]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::N => "N",
            Rarity::R => "R",
            Rarity::SR => "SR",
            Rarity::UR => "UR",
            Rarity::LR => "LR",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Rarity::N => "Normal",
            Rarity::R => "Rare",
            Rarity::SR => "Super Rare",
            Rarity::UR => "Ultra Rare",
            Rarity::LR => "Legend Rare",
        }
    }

    pub fn stars(self) -> &'static str {
        match self {
            Rarity::N => "☆",
            Rarity::R => "★★",
            Rarity::SR => "★★★",
            Rarity::UR => "★★★★",
            Rarity::LR => "★★★★★",
        }
    }

    pub fn price_range(self) -> PriceRange {
        let (min, max) = match self {
            Rarity::N => (0.0, 200.0),
            Rarity::R => (3.0, 10_000.0),
            Rarity::SR => (4.0, 10_000.0),
            Rarity::UR => (10.0, 50_000.0),
            Rarity::LR => (100.0, 100_000.0),
        };
        PriceRange { min, max }
    }

    pub fn min_item_count(self) -> usize {
        match self {
            Rarity::N => 30,
            Rarity::R => 32,
            Rarity::SR => 35,
            Rarity::UR => 40,
            Rarity::LR => 45,
        }
    }

    pub fn high_usage_message(self) -> &'static str {
        match self {
            Rarity::N => "Basically a startup's server bill",
            Rarity::R => "Basically a small company's IT budget",
            Rarity::SR => "Basically a unicorn's R&D spend",
            Rarity::UR => "Basically big tech's AI research budget",
            Rarity::LR => "Basically a national budget (not really)",
        }
    }

    /// SR and above get flavor prefixes and "more inventive items" directives.
    pub fn is_high_tier(self) -> bool {
        matches!(self, Rarity::SR | Rarity::UR | Rarity::LR)
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Rarity {
        selector::select(Rarity::all(), rng)
            .copied()
            .unwrap_or(Rarity::N)
    }
}

impl Weighted for Rarity {
    fn id(&self) -> &str {
        self.as_str()
    }

    fn weight(&self) -> f64 {
        match self {
            Rarity::N => 60.0,
            Rarity::R => 25.0,
            Rarity::SR => 10.0,
            Rarity::UR => 4.0,
            Rarity::LR => 1.0,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = GachaError;

    fn from_str(s: &str) -> Result<Self> {
        Rarity::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| GachaError::UnknownSelector {
                kind: "rarity",
                id: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// One (category, rarity) pair to generate content for. Created per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub category: Category,
    pub rarity: Rarity,
}

impl GenerationRequest {
    pub fn new(category: Category, rarity: Rarity) -> Self {
        Self { category, rarity }
    }

    /// Build a request from raw ids, failing with `UnknownSelector`.
    pub fn from_ids(category: &str, rarity: &str) -> Result<Self> {
        Ok(Self {
            category: category.parse()?,
            rarity: rarity.parse()?,
        })
    }

    /// Draw category and rarity independently from their weighted sets.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            category: Category::draw(rng),
            rarity: Rarity::draw(rng),
        }
    }

    /// Collection-facing theme name, e.g. "Tech - Latest AI tooling".
    pub fn theme_name(&self) -> String {
        let theme = match (self.category, self.rarity) {
            (Category::Tech, Rarity::N) => "Everyday dev tools",
            (Category::Tech, Rarity::R) => "Latest AI tooling",
            (Category::Tech, Rarity::SR) => "Engineer in-jokes",
            (Category::Tech, Rarity::UR) => "The phantom dev environment",
            (Category::Tech, Rarity::LR) => "The legendary debugger",
            (Category::Gadget, Rarity::N) => "Desk staples",
            (Category::Gadget, Rarity::R) => "Maker bench",
            (Category::Gadget, Rarity::SR) => "Retro revival",
            (Category::Gadget, Rarity::UR) => "Devices from the future",
            (Category::Gadget, Rarity::LR) => "The lost prototype",
            (Category::Food, Rarity::N) => "Convenience store run",
            (Category::Food, Rarity::R) => "Regional specialties",
            (Category::Food, Rarity::SR) => "Fine dining",
            (Category::Food, Rarity::UR) => "Three stars",
            (Category::Food, Rarity::LR) => "The world's priciest meal",
            (Category::Entertainment, Rarity::N) => "Standard subscriptions",
            (Category::Entertainment, Rarity::R) => "Niche hobbies",
            (Category::Entertainment, Rarity::SR) => "VIP experiences",
            (Category::Entertainment, Rarity::UR) => "Premium events",
            (Category::Entertainment, Rarity::LR) => "Once in a lifetime",
            (Category::Life, Rarity::N) => "Daily expenses",
            (Category::Life, Rarity::R) => "A little luxury",
            (Category::Life, Rarity::SR) => "Petit celebrity life",
            (Category::Life, Rarity::UR) => "Luxury living",
            (Category::Life, Rarity::LR) => "A billionaire's day",
        };
        format!("{} - {theme}", self.category.display_name())
    }
}

impl fmt::Display for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.rarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ids_roundtrip_through_from_str() {
        for c in Category::all() {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), *c);
        }
        for r in Rarity::all() {
            assert_eq!(r.as_str().parse::<Rarity>().unwrap(), *r);
        }
    }

    #[test]
    fn unknown_ids_are_unknown_selector() {
        let err = GenerationRequest::from_ids("space", "N").unwrap_err();
        assert!(matches!(err, GachaError::UnknownSelector { kind: "category", .. }));
        let err = GenerationRequest::from_ids("tech", "SSR").unwrap_err();
        assert!(matches!(err, GachaError::UnknownSelector { kind: "rarity", ref id } if id == "SSR"));
    }

    #[test]
    fn rarity_weights_sum_to_hundred() {
        let total: f64 = Rarity::all().iter().map(Weighted::weight).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn price_ranges_and_counts_grow_with_tier() {
        let counts: Vec<_> = Rarity::all().iter().map(|r| r.min_item_count()).collect();
        assert!(counts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Rarity::LR.price_range().max, 100_000.0);
    }

    #[test]
    fn draw_produces_catalog_members() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let req = GenerationRequest::draw(&mut rng);
            assert!(Category::all().contains(&req.category));
            assert!(Rarity::all().contains(&req.rarity));
        }
    }

    #[test]
    fn serde_uses_catalog_ids() {
        let req = GenerationRequest::new(Category::Entertainment, Rarity::SR);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"category":"entertainment","rarity":"SR"}"#);
    }

    #[test]
    fn theme_name_is_prefixed_with_category() {
        let req = GenerationRequest::new(Category::Food, Rarity::LR);
        assert!(req.theme_name().starts_with("Food - "));
    }
}
