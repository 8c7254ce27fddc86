//! Source resolution: pick one winning source per minute
//!
//! When several sources report overlapping data for the same minute, an
//! ordered list of priority substrings decides which single source counts.
//! Matching is case-insensitive. Ties inside a priority tier, and the
//! no-match fallback, both resolve to the lexicographically smallest
//! identifier, so the result is independent of enumeration order.

/// Default priority list: watches over phones.
pub const DEFAULT_PRIORITY: &str = "Apple Watch,Watch,iPhone";

/// Ordered, case-insensitive priority substrings for source resolution.
#[derive(Debug, Clone)]
pub struct SourcePriority {
    /// Lowercased match substrings, highest priority first
    patterns: Vec<String>,
}

impl SourcePriority {
    /// Parse a comma-separated priority list, e.g. `"Apple Watch,Watch,iPhone"`.
    /// Empty entries are dropped; an empty list leaves only the fallback.
    pub fn from_list(spec: &str) -> Self {
        let patterns = spec
            .split(',')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect();
        Self { patterns }
    }

    /// Choose exactly one source from a non-empty set of identifiers.
    ///
    /// Walks the priority list in order; the first substring with any match
    /// wins, and the lexicographically smallest matching identifier is
    /// returned. When no substring matches any identifier, the
    /// lexicographically smallest identifier overall wins. Returns `None`
    /// only for an empty input.
    pub fn resolve<'a, I>(&self, sources: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<&str> = sources.into_iter().collect();
        for pattern in &self.patterns {
            let winner = names
                .iter()
                .filter(|name| name.to_lowercase().contains(pattern.as_str()))
                .min()
                .copied();
            if winner.is_some() {
                return winner;
            }
        }
        names.into_iter().min()
    }
}

impl Default for SourcePriority {
    fn default() -> Self {
        Self::from_list(DEFAULT_PRIORITY)
    }
}
