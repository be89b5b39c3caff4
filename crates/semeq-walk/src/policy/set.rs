//! Unordered sets: members have no position, so prior and proposed members
//! are paired by a one-to-one matching before they can be compared.
//!
//! Matching runs in two phases over members sorted by canonical text:
//!
//! 1. Raw pairing: members with identical fingerprints are paired directly.
//! 2. Semantic pairing: every remaining prior/proposed combination is
//!    compared recursively, and a maximum matching over the compatible
//!    combinations is found with augmenting paths. Candidates are always
//!    tried in canonical order, which makes the result reproducible.
//!
//! Matched pairs report their own diagnostics. Trials that lost to another
//! pairing are dropped, except that a trial involving a member left
//! unmatched keeps its warnings and errors, so a failing rule inside a set
//! is still reported.

use std::collections::HashMap;

use semeq_types::{canonical_string, AttributePath, Diagnostics, Fingerprint, Severity, TypedValue};

use super::raw_fallback;
use crate::walker::{Interrupted, Resolved, Traversal};

/// A set member with its canonical text, in canonical order.
struct Member<'v> {
    value: &'v TypedValue,
    text: String,
    fingerprint: Fingerprint,
}

fn canonical_members(items: &[TypedValue]) -> Vec<Member<'_>> {
    let mut members: Vec<(usize, Member<'_>)> = items
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let text = canonical_string(value);
            let fingerprint = Fingerprint::from_canonical(&text);
            (
                index,
                Member {
                    value,
                    text,
                    fingerprint,
                },
            )
        })
        .collect();
    members.sort_by(|a, b| a.1.text.cmp(&b.1.text).then(a.0.cmp(&b.0)));
    members.into_iter().map(|(_, m)| m).collect()
}

/// Outcome of pairing two member lists. Indices are canonical ranks.
struct SetMatching {
    /// For each prior rank, the proposed rank it is paired with.
    prior_to_proposed: Vec<Option<usize>>,
    /// For each proposed rank, the resolution of its pair.
    resolutions: Vec<Option<Resolved>>,
    /// Warnings and errors from trials that left a member unmatched.
    unmatched: Diagnostics,
}

impl SetMatching {
    fn is_complete(&self) -> bool {
        self.prior_to_proposed.iter().all(Option::is_some)
            && self.resolutions.iter().all(Option::is_some)
    }
}

pub(crate) fn compare(
    t: &mut Traversal<'_>,
    path: &AttributePath,
    prior: &TypedValue,
    proposed: &TypedValue,
) -> Result<Resolved, Interrupted> {
    let (Some(old), Some(new)) = (prior.elements(), proposed.elements()) else {
        return Ok(raw_fallback(prior, proposed));
    };

    let old = canonical_members(old);
    let new = canonical_members(new);
    let mut matching = match_members(t, path, &old, &new)?;
    let keep_prior = matching.is_complete();

    let mut diagnostics = Diagnostics::new();
    for resolution in matching.resolutions.iter().flatten() {
        diagnostics.extend(resolution.diagnostics.iter().cloned());
    }
    diagnostics.extend(std::mem::take(&mut matching.unmatched));

    let merged = if keep_prior {
        let mut items = Vec::with_capacity(old.len());
        for qr in matching.prior_to_proposed.iter().flatten() {
            if let Some(resolution) = matching.resolutions[*qr].take() {
                items.push(resolution.merged);
            }
        }
        prior.with_elements(items).unwrap_or_else(|| prior.clone())
    } else {
        let items = new
            .iter()
            .zip(matching.resolutions)
            .map(|(member, resolution)| match resolution {
                Some(r) => r.merged,
                None => member.value.clone(),
            })
            .collect();
        proposed.with_elements(items).unwrap_or_else(|| proposed.clone())
    };

    Ok(Resolved {
        merged,
        keep_prior,
        diagnostics,
    })
}

fn match_members(
    t: &mut Traversal<'_>,
    path: &AttributePath,
    old: &[Member<'_>],
    new: &[Member<'_>],
) -> Result<SetMatching, Interrupted> {
    let mut prior_to_proposed: Vec<Option<usize>> = vec![None; old.len()];
    let mut resolutions: Vec<Option<Resolved>> = (0..new.len()).map(|_| None).collect();

    // Phase 1: raw pairing by fingerprint, lowest proposed rank first.
    let mut by_fingerprint: HashMap<Fingerprint, Vec<usize>> = HashMap::new();
    for (qr, member) in new.iter().enumerate().rev() {
        by_fingerprint.entry(member.fingerprint).or_default().push(qr);
    }
    for (pr, member) in old.iter().enumerate() {
        if let Some(qr) = by_fingerprint.get_mut(&member.fingerprint).and_then(Vec::pop) {
            prior_to_proposed[pr] = Some(qr);
            resolutions[qr] = Some(Resolved::keep(member.value));
        }
    }

    // Phase 2: semantic pairing of whatever is left.
    let open_prior: Vec<usize> = (0..old.len())
        .filter(|&pr| prior_to_proposed[pr].is_none())
        .collect();
    let open_proposed: Vec<usize> = (0..new.len())
        .filter(|&qr| resolutions[qr].is_none())
        .collect();
    if open_prior.is_empty() || open_proposed.is_empty() {
        return Ok(SetMatching {
            prior_to_proposed,
            resolutions,
            unmatched: Diagnostics::new(),
        });
    }

    let mut candidates: Vec<Vec<Option<Resolved>>> = Vec::with_capacity(open_prior.len());
    for &pr in &open_prior {
        let mut row = Vec::with_capacity(open_proposed.len());
        for &qr in &open_proposed {
            t.stats.set_candidates_compared += 1;
            let element_path = path.element(new[qr].text.as_str());
            row.push(Some(t.visit(&element_path, old[pr].value, new[qr].value)?));
        }
        candidates.push(row);
    }

    let mut owner: Vec<Option<usize>> = vec![None; open_proposed.len()];
    for i in 0..open_prior.len() {
        let mut seen = vec![false; open_proposed.len()];
        augment(i, &candidates, &mut seen, &mut owner);
    }

    for (j, slot) in owner.iter().enumerate() {
        if let Some(i) = *slot {
            let (pr, qr) = (open_prior[i], open_proposed[j]);
            prior_to_proposed[pr] = Some(qr);
            resolutions[qr] = candidates[i][j].take();
        }
    }

    let mut unmatched = Diagnostics::new();
    for (i, row) in candidates.into_iter().enumerate() {
        let prior_open = prior_to_proposed[open_prior[i]].is_none();
        for (j, trial) in row.into_iter().enumerate() {
            let Some(trial) = trial else { continue };
            if prior_open || resolutions[open_proposed[j]].is_none() {
                unmatched.extend(
                    trial
                        .diagnostics
                        .into_iter()
                        .filter(|d| d.severity > Severity::Trace),
                );
            }
        }
    }

    Ok(SetMatching {
        prior_to_proposed,
        resolutions,
        unmatched,
    })
}

fn is_candidate(trial: &Option<Resolved>) -> bool {
    trial.as_ref().is_some_and(Resolved::is_clean_match)
}

/// Kuhn's augmenting-path step: try to give prior `i` a partner, possibly
/// by moving an earlier prior to another compatible proposed member. A
/// trial is compatible when it kept prior without errors.
fn augment(
    i: usize,
    candidates: &[Vec<Option<Resolved>>],
    seen: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for j in 0..candidates[i].len() {
        if seen[j] || !is_candidate(&candidates[i][j]) {
            continue;
        }
        seen[j] = true;
        let free = match owner[j] {
            None => true,
            Some(k) => augment(k, candidates, seen, owner),
        };
        if free {
            owner[j] = Some(i);
            return true;
        }
    }
    false
}
