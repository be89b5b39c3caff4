use semeq_types::{AttributePath, Diagnostics, TypedValue};

use super::raw_fallback;
use crate::walker::{Interrupted, Resolved, Traversal};

/// Ordered sequences: positional pairing.
///
/// Differing lengths resolve to the proposed sequence without recursing.
/// Equal lengths compare element by element; the merged sequence takes
/// each element's own resolution, and the sequence keeps prior only if
/// every element did.
pub(crate) fn compare(
    t: &mut Traversal<'_>,
    path: &AttributePath,
    prior: &TypedValue,
    proposed: &TypedValue,
) -> Result<Resolved, Interrupted> {
    let (Some(old), Some(new)) = (prior.elements(), proposed.elements()) else {
        return Ok(raw_fallback(prior, proposed));
    };
    if old.len() != new.len() {
        return Ok(Resolved::take(proposed));
    }

    let mut keep_prior = true;
    let mut merged = Vec::with_capacity(new.len());
    let mut diagnostics = Diagnostics::new();

    for (i, (p, q)) in old.iter().zip(new).enumerate() {
        let child = t.visit(&path.index(i), p, q)
            .map_err(|stop| stop.after(std::mem::take(&mut diagnostics)))?;
        keep_prior &= child.keep_prior;
        merged.push(child.merged);
        diagnostics.extend(child.diagnostics);
    }

    let merged = proposed.with_elements(merged).unwrap_or_else(|| proposed.clone());
    Ok(Resolved {
        merged,
        keep_prior,
        diagnostics,
    })
}
