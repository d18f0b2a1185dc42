// 🔍 Name Resolver - free-text pool names → lookup entries
// Three tiers: Exact, Normalized, Substring
//
// Each tier scans the whole candidate list before the next tier starts, so
// a precise hit on any candidate beats a loose hit on an earlier one.

use crate::lookup::{KeySpace, LookupIndex, ResolvedEntity};
use crate::normalize::normalize_name;

// ============================================================================
// MATCH TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    /// Trimmed candidate equals a display name or a resource identifier
    Exact,

    /// Normalized candidate equals a normalized display name or identifier
    Normalized,

    /// Normalized candidate and some index key contain one another
    Substring,
}

/// A successful resolution and the tier that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub entity: &'a ResolvedEntity,
    pub tier: MatchTier,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolve the first candidate that matches, tier by tier
///
/// Returns `None` when no tier finds anything; callers keep the raw name.
pub fn resolve<'a, S: AsRef<str>>(
    candidates: &[S],
    index: &'a LookupIndex,
) -> Option<Resolution<'a>> {
    if index.is_empty() {
        return None;
    }

    if let Some(entity) = check_exact(candidates, index) {
        return Some(Resolution { entity, tier: MatchTier::Exact });
    }

    let normalized: Vec<String> = candidates
        .iter()
        .map(|c| normalize_name(c.as_ref()))
        .filter(|n| !n.is_empty())
        .collect();

    if let Some(entity) = check_normalized(&normalized, index) {
        return Some(Resolution { entity, tier: MatchTier::Normalized });
    }

    check_substring(&normalized, index)
        .map(|entity| Resolution { entity, tier: MatchTier::Substring })
}

/// Resolve a single pooled name
pub fn resolve_name<'a>(name: &str, index: &'a LookupIndex) -> Option<Resolution<'a>> {
    resolve(&[name], index)
}

/// Tier 1: verbatim (trimmed) lookup
fn check_exact<'a, S: AsRef<str>>(
    candidates: &[S],
    index: &'a LookupIndex,
) -> Option<&'a ResolvedEntity> {
    candidates.iter().find_map(|candidate| {
        let trimmed = candidate.as_ref().trim();
        index
            .get(KeySpace::Exact, trimmed)
            .or_else(|| index.get(KeySpace::Identifier, trimmed))
    })
}

/// Tier 2: normalized lookup
fn check_normalized<'a>(normalized: &[String], index: &'a LookupIndex) -> Option<&'a ResolvedEntity> {
    normalized.iter().find_map(|key| {
        index
            .get(KeySpace::Normalized, key)
            .or_else(|| index.get(KeySpace::Identifier, key))
    })
}

/// Tier 3: containment either way, first key in index order wins
fn check_substring<'a>(normalized: &[String], index: &'a LookupIndex) -> Option<&'a ResolvedEntity> {
    normalized.iter().find_map(|candidate| {
        index
            .scan_keys()
            .find(|(key, _)| key.contains(candidate.as_str()) || candidate.contains(*key))
            .map(|(_, entity)| entity)
    })
}

// ============================================================================
// TESTS
// ============================================================================
