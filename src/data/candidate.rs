use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub u32);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed role classification. Declaration order is the order squads are solved and listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "GK", alias = "goalkeeper", alias = "Goalkeeper")]
    Goalkeeper,
    #[serde(rename = "DEF", alias = "defender", alias = "Defender")]
    Defender,
    #[serde(rename = "MID", alias = "midfielder", alias = "Midfielder")]
    Midfielder,
    #[serde(rename = "FWD", alias = "forward", alias = "Forward")]
    Forward,
}

impl Category {
    pub const COUNT: usize = 4;
    pub const ALL: [Category; Category::COUNT] = [
        Category::Goalkeeper,
        Category::Defender,
        Category::Midfielder,
        Category::Forward,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Goalkeeper => 0,
            Self::Defender => 1,
            Self::Midfielder => 2,
            Self::Forward => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goalkeeper => "GK",
            Self::Defender => "DEF",
            Self::Midfielder => "MID",
            Self::Forward => "FWD",
        }
    }

    /// Plural label used when squads are grouped for display.
    pub fn plural_label(self) -> &'static str {
        match self {
            Self::Goalkeeper => "goalkeepers",
            Self::Defender => "defenders",
            Self::Midfielder => "midfielders",
            Self::Forward => "forwards",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gk" | "gkp" | "goalkeeper" => Ok(Self::Goalkeeper),
            "def" | "defender" => Ok(Self::Defender),
            "mid" | "midfielder" => Ok(Self::Midfielder),
            "fwd" | "forward" => Ok(Self::Forward),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// A scored entity eligible for selection. Scores come from an external model and are taken as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    /// Affiliation used for the per-group concentration cap (e.g. club).
    pub group: String,
    pub category: Category,
    pub price: Decimal,
    pub predicted_score: f64,
}

impl Candidate {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        group: impl Into<String>,
        category: Category,
        price: Decimal,
        predicted_score: f64,
    ) -> Self {
        Self {
            id: CandidateId(id),
            name: name.into(),
            group: group.into(),
            category,
            price,
            predicted_score,
        }
    }
}
