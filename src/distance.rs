//! Shortest-path distances over role denotations.
//!
//! Every edge has unit length. Whenever no finite distance exists the result
//! is [`INFINITY`]; sums are [`INFINITY`] as soon as one summand is.

use std::collections::VecDeque;

use crate::denotation::{ConceptDenotation, RoleDenotation};

/// Sentinel for "no path". Never produced by a finite computation.
pub const INFINITY: i32 = i32::MAX;

/// Multi-source BFS from `sources` along the pairs of `role`, stopping at
/// the first member of `targets`.
fn bfs(sources: &ConceptDenotation, role: &RoleDenotation, targets: &ConceptDenotation) -> i32 {
    let n = role.num_objects();
    let mut distances = vec![INFINITY; n];
    let mut queue = VecDeque::new();
    for s in sources.iter() {
        if targets.contains(s) {
            return 0;
        }
        distances[s] = 0;
        queue.push_back(s);
    }
    while let Some(x) = queue.pop_front() {
        let next = distances[x] + 1;
        for y in 0..n {
            if role.contains(x, y) && distances[y] == INFINITY {
                if targets.contains(y) {
                    return next;
                }
                distances[y] = next;
                queue.push_back(y);
            }
        }
    }
    INFINITY
}

/// Length of the shortest `role`-path from any member of `from` to any member of `to`.
pub fn concept_distance(from: &ConceptDenotation, role: &RoleDenotation, to: &ConceptDenotation) -> i32 {
    if from.is_empty() {
        return INFINITY;
    }
    bfs(from, role, to)
}

/// Sum over `x ∈ from` of the distance from `{x}` to `to`.
pub fn sum_concept_distance(from: &ConceptDenotation, role: &RoleDenotation, to: &ConceptDenotation) -> i32 {
    if from.is_empty() {
        return INFINITY;
    }
    let mut sum: i32 = 0;
    for x in from.iter() {
        let source = ConceptDenotation::from_objects(from.num_objects(), [x]);
        let d = bfs(&source, role, to);
        if d == INFINITY {
            return INFINITY;
        }
        sum = sum.saturating_add(d);
    }
    if sum == INFINITY {
        // A finite sum must stay distinguishable from the sentinel.
        sum - 1
    } else {
        sum
    }
}

/// Per-object distances `concept_distance(from(a,·), role, to(a,·))` for every
/// `a` with a non-empty `from(a,·)`.
fn role_distances<'a>(
    from: &'a RoleDenotation,
    role: &'a RoleDenotation,
    to: &'a RoleDenotation,
) -> impl Iterator<Item = i32> + 'a {
    (0..from.num_objects()).filter_map(move |a| {
        let sources = from.successors(a);
        if sources.is_empty() {
            None
        } else {
            Some(bfs(&sources, role, &to.successors(a)))
        }
    })
}

/// Minimum over objects `a` of the distance from `from(a,·)` to `to(a,·)`.
pub fn role_distance(from: &RoleDenotation, role: &RoleDenotation, to: &RoleDenotation) -> i32 {
    role_distances(from, role, to).min().unwrap_or(INFINITY)
}

/// Sum over objects `a` of the distance from `from(a,·)` to `to(a,·)`.
pub fn sum_role_distance(from: &RoleDenotation, role: &RoleDenotation, to: &RoleDenotation) -> i32 {
    let mut sum: i32 = 0;
    let mut any = false;
    for d in role_distances(from, role, to) {
        if d == INFINITY {
            return INFINITY;
        }
        any = true;
        sum = sum.saturating_add(d);
    }
    if !any {
        INFINITY
    } else if sum == INFINITY {
        sum - 1
    } else {
        sum
    }
}
