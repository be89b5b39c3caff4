use std::collections::BTreeMap;

use semeq_types::{AttributePath, Diagnostics, TypedValue};

use super::raw_fallback;
use crate::walker::{Interrupted, Resolved, Traversal};

/// Key-value maps: pairing by key.
///
/// Differing key sets resolve to the proposed map without recursing.
/// Otherwise each key's value is compared and merged independently.
pub(crate) fn compare(
    t: &mut Traversal<'_>,
    path: &AttributePath,
    prior: &TypedValue,
    proposed: &TypedValue,
) -> Result<Resolved, Interrupted> {
    let (Some(old), Some(new)) = (prior.entries(), proposed.entries()) else {
        return Ok(raw_fallback(prior, proposed));
    };
    if old.len() != new.len() || !old.keys().eq(new.keys()) {
        return Ok(Resolved::take(proposed));
    }

    let mut keep_prior = true;
    let mut merged = BTreeMap::new();
    let mut diagnostics = Diagnostics::new();

    // Both maps iterate in the same sorted key order.
    for ((key, p), q) in old.iter().zip(new.values()) {
        let child = t.visit(&path.key(key.as_str()), p, q)
            .map_err(|stop| stop.after(std::mem::take(&mut diagnostics)))?;
        keep_prior &= child.keep_prior;
        merged.insert(key.clone(), child.merged);
        diagnostics.extend(child.diagnostics);
    }

    let merged = proposed.with_entries(merged).unwrap_or_else(|| proposed.clone());
    Ok(Resolved {
        merged,
        keep_prior,
        diagnostics,
    })
}
