//! Trigger-chain reconstruction
//!
//! Template errors are reported where the template body breaks, which is
//! rarely where the user made the mistake. Compilers follow the error with
//! (Clang, MSVC) or precede it by (GCC) notes pointing at each instantiation
//! site. This module links those notes into one ordered chain per error:
//!
//! ```text
//! serializer.h:19 -> main.cpp:48 -> main.cpp:62
//! (primary)          (hop 1)        (hop 2, outermost)
//! ```

use crate::dialect::Grammar;
use crate::parser::{clean_line, Diagnostic, Location};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Handling of trigger hops the compiler printed more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainDedup {
    /// Keep every hop exactly as printed
    #[default]
    Keep,
    /// Collapse consecutive hops on the same file and line
    CollapseAdjacent,
    /// Keep only the first occurrence of each file and line
    Unique,
}

impl ChainDedup {
    fn apply(self, locations: &mut Vec<Location>) {
        match self {
            Self::Keep => {}
            Self::CollapseAdjacent => locations.dedup_by(|next, prev| next.same_line(prev)),
            Self::Unique => {
                let mut seen = HashSet::new();
                locations.retain(|loc| seen.insert((loc.file.clone(), loc.line)));
            }
        }
    }
}

impl std::str::FromStr for ChainDedup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "keep" | "" => Ok(Self::Keep),
            "collapse-adjacent" | "collapse" => Ok(Self::CollapseAdjacent),
            "unique" => Ok(Self::Unique),
            other => Err(format!(
                "unknown chain dedup policy '{other}' (expected keep, collapse-adjacent or unique)"
            )),
        }
    }
}

/// Ordered locations from a primary error outward through its trigger sites
///
/// Only constructible through [`ErrorChain::new`], so the primary location
/// is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorChain {
    /// Primary location first
    locations: Vec<Location>,
    /// Message of the primary error
    pub message: String,
}

impl ErrorChain {
    pub fn new(
        primary: Location,
        hops: impl IntoIterator<Item = Location>,
        message: impl Into<String>,
    ) -> Self {
        let mut locations = vec![primary];
        locations.extend(hops);
        Self {
            locations,
            message: message.into(),
        }
    }

    pub fn primary(&self) -> &Location {
        &self.locations[0]
    }

    /// Trigger sites after the primary location
    pub fn hops(&self) -> &[Location] {
        &self.locations[1..]
    }

    /// Primary location followed by every hop
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Always false; kept alongside `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `loc1 -> loc2 -> ...`
    pub fn render(&self) -> String {
        self.locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl std::fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Build one chain per error-kind diagnostic, in detection order
pub fn reconstruct(
    diagnostics: &[Diagnostic],
    grammar: &Grammar,
    dedup: ChainDedup,
) -> Vec<ErrorChain> {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|diag| {
            let mut chain = ErrorChain::new(
                diag.location.clone(),
                leading_hops(diag, grammar)
                    .into_iter()
                    .chain(following_hops(diag, grammar)),
                diag.message.clone(),
            );
            // Both policies keep the first occurrence, so the primary survives.
            dedup.apply(&mut chain.locations);
            tracing::trace!(primary = %diag.location, hops = chain.hops().len(), "Chain");
            chain
        })
        .collect()
}

/// Trigger lines printed inside the context block before the error (GCC)
fn leading_hops(diag: &Diagnostic, grammar: &Grammar) -> Vec<Location> {
    diag.leading_context
        .iter()
        .filter_map(|raw| grammar.trigger_location(&clean_line(raw)))
        .collect()
}

/// Trigger notes printed after the error (Clang, MSVC, GCC macro notes)
///
/// Unlocated lines (code excerpts, carets) are skipped; the first located
/// line that is neither a trigger nor transparent ends the scan.
fn following_hops(diag: &Diagnostic, grammar: &Grammar) -> Vec<Location> {
    let mut hops = Vec::new();
    let mut reversed_from: Option<usize> = None;

    for raw in diag.continuation() {
        let line = clean_line(raw);
        if grammar.is_reverse_marker(&line) {
            reversed_from.get_or_insert(hops.len());
            continue;
        }
        if let Some(location) = grammar.trigger_location(&line) {
            hops.push(location);
            continue;
        }
        if grammar.is_transparent(&line) {
            continue;
        }
        if grammar.has_location(&line) {
            break;
        }
    }

    // Listed oldest (outermost) first; flip so the chain runs primary → outward.
    if let Some(start) = reversed_from {
        hops[start..].reverse();
    }
    hops
}
