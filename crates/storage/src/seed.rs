use std::collections::HashSet;

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::{
    directory,
    domain::{FlagDefinition, FlagValue, FlagValueMap, FlagValueType, OrgId},
};
use tracing::info;

pub const DEFAULT_ORG_COUNT: usize = 1000;

const SHORT_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SHORT_ID_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub org_count: usize,
    /// Fixed seed for reproducible stores. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            org_count: DEFAULT_ORG_COUNT,
            seed: None,
        }
    }
}

pub(crate) fn generate_orgs(options: &SeedOptions) -> Vec<(OrgId, FlagValueMap)> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut seen = HashSet::with_capacity(options.org_count);
    let mut orgs = Vec::with_capacity(options.org_count);
    while orgs.len() < options.org_count {
        let org_id = random_org_id(&mut rng);
        if !seen.insert(org_id.clone()) {
            continue;
        }

        let flags = directory::definitions()
            .iter()
            .map(|def| {
                let value = if rng.gen_bool(0.5) {
                    def.default_value.clone()
                } else {
                    random_value_for(def, &mut rng)
                };
                (def.key.as_str().to_string(), value)
            })
            .collect();
        orgs.push((org_id, flags));
    }

    info!(org_count = orgs.len(), seeded = options.seed.is_some(), "seeded flag store");
    orgs
}

pub fn random_org_id(rng: &mut impl Rng) -> OrgId {
    OrgId(format!("org-{}", short_id(rng)))
}

/// Random value that respects the definition's declared type.
pub fn random_value_for(def: &FlagDefinition, rng: &mut impl Rng) -> FlagValue {
    match def.value_type {
        FlagValueType::Boolean => FlagValue::Bool(rng.gen_bool(0.5)),
        FlagValueType::Number => FlagValue::from(rng.gen_range(0..100_i64)),
        FlagValueType::String => FlagValue::String(format!(
            "{}_{}",
            def.key.as_str().to_ascii_lowercase(),
            short_id(rng)
        )),
    }
}

fn short_id(rng: &mut impl Rng) -> String {
    (0..SHORT_ID_LEN)
        .map(|_| SHORT_ID_ALPHABET[rng.gen_range(0..SHORT_ID_ALPHABET.len())] as char)
        .collect()
}
