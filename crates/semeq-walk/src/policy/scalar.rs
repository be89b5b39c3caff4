use semeq_types::{AttributePath, TypedValue};

use crate::walker::{Interrupted, Resolved, Traversal};

/// Bool, int, float and string.
///
/// Raw-equal values keep prior without consulting any rule. Otherwise the
/// type's registered rule decides; without one the proposed value wins.
pub(crate) fn compare(
    t: &mut Traversal<'_>,
    path: &AttributePath,
    prior: &TypedValue,
    proposed: &TypedValue,
) -> Result<Resolved, Interrupted> {
    if prior.value() == proposed.value() {
        return Ok(Resolved::keep(prior));
    }

    let Some(rule) = t.registry().resolve(prior.type_id()) else {
        return Ok(Resolved::take(proposed));
    };

    let verdict = t.invoke_rule(rule, path, prior, proposed)?;
    Ok(Resolved::decide(verdict.keep_prior, prior, proposed).with_diagnostics(verdict.diagnostics))
}
