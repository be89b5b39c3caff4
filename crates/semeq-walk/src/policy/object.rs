use std::collections::BTreeMap;

use semeq_types::{AttributePath, Diagnostics, TypedValue};

use super::raw_fallback;
use crate::walker::{Interrupted, Resolved, Traversal};

/// Structured objects: every attribute resolves on its own.
///
/// The merged object is the attribute-wise composition of the children.
/// `keep_prior` is reported as the AND of all attributes but never decides
/// which representation an attribute keeps. Attributes missing on one side
/// (a caller shape error) resolve to the proposed shape.
pub(crate) fn compare(
    t: &mut Traversal<'_>,
    path: &AttributePath,
    prior: &TypedValue,
    proposed: &TypedValue,
) -> Result<Resolved, Interrupted> {
    let (Some(old), Some(new)) = (prior.entries(), proposed.entries()) else {
        return Ok(raw_fallback(prior, proposed));
    };

    let mut keep_prior = old.len() == new.len();
    let mut merged = BTreeMap::new();
    let mut diagnostics = Diagnostics::new();

    for (name, q) in new {
        match old.get(name) {
            Some(p) => {
                let child = t.visit(&path.attribute(name.as_str()), p, q)
                    .map_err(|stop| stop.after(std::mem::take(&mut diagnostics)))?;
                keep_prior &= child.keep_prior;
                merged.insert(name.clone(), child.merged);
                diagnostics.extend(child.diagnostics);
            }
            None => {
                keep_prior = false;
                merged.insert(name.clone(), q.clone());
            }
        }
    }

    let merged = proposed.with_entries(merged).unwrap_or_else(|| proposed.clone());
    Ok(Resolved {
        merged,
        keep_prior,
        diagnostics,
    })
}
