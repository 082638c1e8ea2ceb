use serde::{Deserialize, Serialize};

/// Accounting regime for self-employment income.
///
/// `Simplified` swaps the itemized expense deductions for a flat share of
/// independent income; `Organized` keeps the itemized path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Simplified,
    #[default]
    Organized,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simplified => "simplified",
            Self::Organized => "organized",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simplified" => Some(Self::Simplified),
            "organized" => Some(Self::Organized),
            _ => None,
        }
    }
}
