//! Wardrobe taxonomy: item categories and seasons
//!
//! Categories double as outfit slots. `Top` and `Pants` are multi-slot
//! (layering: a shirt under a jacket, a skirt over leggings); every other
//! category holds at most one item in an outfit.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Clothing category (also the outfit slot key)
///
/// Ordered by canonical display order (head to toe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hat,
    Scarf,
    Top,
    Pants,
    Shoes,
}

impl Category {
    /// All categories in canonical display order
    pub fn all() -> [Category; 5] {
        [
            Category::Hat,
            Category::Scarf,
            Category::Top,
            Category::Pants,
            Category::Shoes,
        ]
    }

    /// Whether an outfit slot of this category holds multiple items
    pub fn is_multi_slot(&self) -> bool {
        matches!(self, Category::Top | Category::Pants)
    }

    /// Human-readable label for the UI
    pub fn label(&self) -> &'static str {
        match self {
            Category::Hat => "Hat",
            Category::Scarf => "Scarf",
            Category::Top => "Top",
            Category::Pants => "Pants",
            Category::Shoes => "Shoes",
        }
    }

    /// Built-in tag suggestions offered when tagging an item
    pub fn tag_suggestions(&self) -> &'static [&'static str] {
        match self {
            Category::Hat => &["cap", "beanie", "bucket hat", "beret", "sun hat"],
            Category::Scarf => &["silk scarf", "wool scarf", "shawl", "bandana"],
            Category::Top => &[
                "tee", "shirt", "blouse", "sweater", "hoodie", "jacket", "coat", "dress",
            ],
            Category::Pants => &["jeans", "trousers", "shorts", "skirt", "leggings"],
            Category::Shoes => &["sneakers", "boots", "loafers", "sandals", "heels"],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Hat => write!(f, "hat"),
            Category::Scarf => write!(f, "scarf"),
            Category::Top => write!(f, "top"),
            Category::Pants => write!(f, "pants"),
            Category::Shoes => write!(f, "shoes"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hat" => Ok(Category::Hat),
            "scarf" => Ok(Category::Scarf),
            "top" => Ok(Category::Top),
            "pants" => Ok(Category::Pants),
            "shoes" => Ok(Category::Shoes),
            other => Err(Error::InvalidInput(format!("Unknown category: {}", other))),
        }
    }
}

/// Season an item is suited for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// All seasons in canonical display order
    pub fn all() -> [Season; 4] {
        [Season::Spring, Season::Summer, Season::Autumn, Season::Winter]
    }

    /// Human-readable label for the UI
    pub fn label(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Spring => write!(f, "spring"),
            Season::Summer => write!(f, "summer"),
            Season::Autumn => write!(f, "autumn"),
            Season::Winter => write!(f, "winter"),
        }
    }
}

impl std::str::FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "autumn" => Ok(Season::Autumn),
            "winter" => Ok(Season::Winter),
            other => Err(Error::InvalidInput(format!("Unknown season: {}", other))),
        }
    }
}

/// Normalize a season list into canonical form: deduplicated, canonical
/// order. The legacy marker `"all"` expands to every season.
///
/// Lenient: unknown entries are dropped. Use [`parse_season_set`] when
/// rejecting bad input matters.
pub fn normalize_seasons(raw: &[String]) -> Vec<Season> {
    if raw.iter().any(|s| s == "all") {
        return Season::all().to_vec();
    }
    let mut present = [false; 4];
    for entry in raw {
        if let Ok(season) = entry.parse::<Season>() {
            present[season as usize] = true;
        }
    }
    Season::all()
        .into_iter()
        .filter(|s| present[*s as usize])
        .collect()
}

/// Parse a user-supplied season list, rejecting unknown entries
pub fn parse_season_set(raw: &[String]) -> Result<Vec<Season>> {
    for entry in raw {
        if entry != "all" {
            entry.parse::<Season>()?;
        }
    }
    Ok(normalize_seasons(raw))
}

/// Decode a stored JSON season array
///
/// Stored data may predate the current schema: a bare `"all"` string, an
/// array containing `"all"`, or unknown entries all normalize instead of
/// failing.
pub fn seasons_from_json(json: &str) -> Vec<Season> {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(serde_json::Value::String(s)) if s == "all" => Season::all().to_vec(),
        Ok(serde_json::Value::Array(entries)) => {
            let raw: Vec<String> = entries
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            normalize_seasons(&raw)
        }
        _ => Vec::new(),
    }
}

/// Encode a season list as a JSON array of lowercase names
pub fn seasons_to_json(seasons: &[Season]) -> String {
    // Serializing a Vec<Season> to a string array cannot fail
    serde_json::to_string(seasons).unwrap_or_else(|_| "[]".to_string())
}
