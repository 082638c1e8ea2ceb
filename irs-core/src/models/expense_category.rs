use std::fmt;

use serde::{Deserialize, Serialize};

/// Deductible expense categories, in the order the assistant asks about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Health,
    Education,
    Housing,
    Donations,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 4] = [
        Self::Health,
        Self::Education,
        Self::Housing,
        Self::Donations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Education => "education",
            Self::Housing => "housing",
            Self::Donations => "donations",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "health" => Some(Self::Health),
            "education" => Some(Self::Education),
            "housing" => Some(Self::Housing),
            "donations" => Some(Self::Donations),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Health => "saúde",
            Self::Education => "educação",
            Self::Housing => "habitação",
            Self::Donations => "donativos",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
