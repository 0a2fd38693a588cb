//! Header normalization.
//!
//! Display headers such as `"Custo Unitário (R$)"` become warehouse column
//! identifiers such as `custo_unitario_r`:
//!
//! 1. Unicode compatibility decomposition (NFKD)
//! 2. Drop every non-ASCII character (accents fall away, base letters stay)
//! 3. Drop everything that is not a letter, digit, underscore or whitespace
//! 4. Trim, then replace each whitespace run with one underscore
//! 5. Lowercase

use std::collections::{BTreeMap, HashSet};

use ledger_model::HeaderMap;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::error::{HeaderCollision, NormalizationError};

/// What to do when two headers normalize to the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderCollisionPolicy {
    /// Keep the first claimant and suffix later ones with `_2`, `_3`, ...
    #[default]
    Disambiguate,
    /// Fail with [`NormalizationError::Collision`].
    Reject,
}

/// Normalize one header. Pure and idempotent; may return an empty string.
pub fn normalize_header(header: &str) -> String {
    let kept: String = header
        .nfkd()
        .filter(|c| c.is_ascii() && (c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace()))
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}

/// Build the header map for a file's header row.
///
/// `reserved` names (the business id column and the audit columns) count as
/// already taken, so a source header can never overwrite them. Headers that
/// normalize to nothing are named `column_<n>` after their 1-based position.
/// Repeated original headers are keyed `Name (2)`, `Name (3)`, ... in the map.
pub fn normalize_headers(
    headers: &[String],
    reserved: &[&str],
    policy: HeaderCollisionPolicy,
) -> Result<HeaderMap, NormalizationError> {
    let mut owners: BTreeMap<String, String> = reserved
        .iter()
        .map(|name| ((*name).to_string(), (*name).to_string()))
        .collect();
    let mut taken: HashSet<String> = owners.keys().cloned().collect();
    let mut collisions: Vec<HeaderCollision> = Vec::new();
    let mut map = HeaderMap::new();

    for (idx, original) in headers.iter().enumerate() {
        let mut normalized = normalize_header(original);
        if normalized.is_empty() {
            normalized = format!("column_{}", idx + 1);
            warn!(header = %original, column = %normalized, "header has no usable characters");
        }

        if taken.contains(&normalized) {
            match policy {
                HeaderCollisionPolicy::Reject => {
                    record_collision(&mut collisions, &owners, &normalized, original);
                    continue;
                }
                HeaderCollisionPolicy::Disambiguate => {
                    let renamed = next_free_name(&taken, &normalized);
                    warn!(
                        header = %original,
                        collides_with = %normalized,
                        column = %renamed,
                        "header collision resolved with suffix"
                    );
                    normalized = renamed;
                }
            }
        }

        debug!(header = %original, column = %normalized, "normalized header");
        taken.insert(normalized.clone());
        owners.insert(normalized.clone(), original.clone());
        map.insert(unique_key(&map, original), normalized);
    }

    if collisions.is_empty() {
        Ok(map)
    } else {
        Err(NormalizationError::Collision { collisions })
    }
}

fn record_collision(
    collisions: &mut Vec<HeaderCollision>,
    owners: &BTreeMap<String, String>,
    normalized: &str,
    original: &str,
) {
    if let Some(existing) = collisions.iter_mut().find(|c| c.normalized == normalized) {
        existing.originals.push(original.to_string());
        return;
    }
    let mut originals = Vec::with_capacity(2);
    if let Some(owner) = owners.get(normalized) {
        originals.push(owner.clone());
    }
    originals.push(original.to_string());
    collisions.push(HeaderCollision {
        normalized: normalized.to_string(),
        originals,
    });
}

fn next_free_name(taken: &HashSet<String>, base: &str) -> String {
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn unique_key(map: &HeaderMap, original: &str) -> String {
    if !map.contains_original(original) {
        return original.to_string();
    }
    (2..)
        .map(|n| format!("{original} ({n})"))
        .find(|candidate| !map.contains_original(candidate))
        .unwrap_or_else(|| original.to_string())
}
