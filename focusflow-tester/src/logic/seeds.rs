use anyhow::{Result, bail};

/// Resolve CLI seed arguments into numeric seeds.
///
/// Accepts decimal or `0x`-prefixed hex literals, plus the keyword `random`
/// which draws a fresh seed from OS entropy.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::with_capacity(tokens.len());
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("random") {
            seeds.push(rand::random());
            continue;
        }
        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let Ok(value) = u64::from_str_radix(&hex.replace('_', ""), 16) else {
                bail!("invalid hex seed {token:?}");
            };
            seeds.push(value);
            continue;
        }
        if let Ok(value) = token.parse::<u64>() {
            seeds.push(value);
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            seeds.push(value.unsigned_abs());
            continue;
        }
        bail!("unrecognised seed {token:?}");
    }
    if seeds.is_empty() {
        bail!("no seeds provided");
    }
    seeds.dedup();
    Ok(seeds)
}
