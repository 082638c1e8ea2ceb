use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CivilStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

impl CivilStatus {
    pub const ALL: [CivilStatus; 4] = [
        Self::Single,
        Self::Married,
        Self::Divorced,
        Self::Widowed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
            Self::Divorced => "divorced",
            Self::Widowed => "widowed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "married" => Some(Self::Married),
            "divorced" => Some(Self::Divorced),
            "widowed" => Some(Self::Widowed),
            _ => None,
        }
    }

    /// Portuguese label used in prompts and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "solteiro(a)",
            Self::Married => "casado(a)",
            Self::Divorced => "divorciado(a)",
            Self::Widowed => "viúvo(a)",
        }
    }
}

impl fmt::Display for CivilStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
