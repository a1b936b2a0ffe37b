use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of a transcript a viewer wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Actions whose targets include the viewer, and their rules
    #[default]
    Affected,
    /// Rules owned by the viewer, and their actions
    Owned,
    /// Everything, unfiltered
    All,
}

impl FilterMode {
    /// Every mode, in menu order.
    pub const MODES: [FilterMode; 3] = [FilterMode::Affected, FilterMode::Owned, FilterMode::All];

    /// Parse from the URL token.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "affected" => Some(FilterMode::Affected),
            "owned" => Some(FilterMode::Owned),
            "all" => Some(FilterMode::All),
            _ => None,
        }
    }

    /// Parse a caller-supplied token, falling back to the default mode.
    ///
    /// Missing and unrecognized tokens are never rejected.
    pub fn from_token(token: Option<&str>) -> Self {
        token.and_then(Self::from_str).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Affected => "affected",
            FilterMode::Owned => "owned",
            FilterMode::All => "all",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::Affected => "Rules that Affected Me",
            FilterMode::Owned => "Rules I Own",
            FilterMode::All => "All Rules",
        }
    }

    /// Returns true if this mode restricts the transcript at all.
    #[inline]
    pub fn is_filtering(&self) -> bool {
        !matches!(self, FilterMode::All)
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
