//! Seed argument resolution: numeric literals and friendly codes.

use anyhow::{Result, bail};
use orrery_engine::seed::{decode_to_seed, encode_friendly};

const DEFAULT_SEED: u64 = 1337;

/// Seed metadata carried through reports.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    #[must_use]
    pub const fn from_code(seed: u64, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
        }
    }

    /// Shareable representation of this seed.
    #[must_use]
    pub fn share_code(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| encode_friendly(self.seed))
    }
}

/// Resolve a comma-separated seed argument into canonical seed metadata.
///
/// Supports literal integers and friendly codes; duplicates collapse to the
/// first occurrence, preferring entries that carry a code.
///
/// # Errors
///
/// Fails on any token that is neither an integer nor a known code.
pub fn resolve_seed_inputs(raw: &str) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(seed) = decode_to_seed(token) {
            pending.push(SeedInfo::from_code(seed, token.to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    for info in pending {
        if let Some(existing) = deduped.iter_mut().find(|entry| entry.seed == info.seed) {
            if existing.code.is_none() && info.code.is_some() {
                *existing = info;
            }
        } else {
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}
