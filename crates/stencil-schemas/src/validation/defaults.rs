//! Default value injection
//!
//! Defaults found outside any composition are written into the payload as
//! soon as they are met. Inside a `oneOf`/`anyOf` candidate they are queued
//! as [`PendingDefault`]s and only written once the combinator accepts that
//! candidate.
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::schema::Segment;
use crate::validation::base::{PathId, PathTable, Scope};
use serde_json::{Map, Value};

/// A default waiting for its branch to be accepted
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDefault {
    pub path: PathId,
    pub value: Value,
}

impl PendingDefault {
    pub fn new(path: PathId, value: Value) -> Self {
        Self { path, value }
    }
}

/// Write `value` at the end of `hops` below `target`; returns whether anything
/// was written.
///
/// Missing intermediate objects are created. A value already present at the
/// end is left alone.
pub fn insert(target: &mut Value, hops: &[&Segment], value: &Value) -> bool {
    let Some((last, parents)) = hops.split_last() else {
        return false;
    };

    let mut current = target;
    for segment in parents {
        current = match container(current, segment) {
            Some(next) => next,
            None => {
                log::warn!("cannot apply default below '{}': not a container", segment);
                return false;
            }
        };
    }

    match (current, last) {
        (Value::Object(map), segment) => {
            let key = segment.to_key();
            if map.contains_key(&key) {
                false
            } else {
                map.insert(key, value.clone());
                true
            }
        }
        (Value::Array(items), Segment::Index(index)) if *index == items.len() => {
            items.push(value.clone());
            true
        }
        _ => false,
    }
}

/// Step into the child container at `segment`, creating an empty object for a
/// missing property
fn container<'v>(current: &'v mut Value, segment: &Segment) -> Option<&'v mut Value> {
    let child = match (current, segment) {
        (Value::Object(map), segment) => map
            .entry(segment.to_key())
            .or_insert_with(|| Value::Object(Map::new())),
        (Value::Array(items), Segment::Index(index)) => items.get_mut(*index)?,
        _ => return None,
    };
    if child.is_object() || child.is_array() {
        Some(child)
    } else {
        None
    }
}

fn apply(scope: &mut Scope<'_>, paths: &PathTable, target: PathId, value: &Value) {
    if scope.place.write(paths, target, value) {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("applied default at '{}'", paths.render(target));
        }
        scope.evaluated.insert(target);
    }
}

/// Apply `value` at the scope's path now, or queue it when the scope defers
pub fn offer(scope: &mut Scope<'_>, paths: &PathTable, value: &Value) {
    let path = scope.path();
    if scope.mode.defer_defaults {
        scope.pending.push(PendingDefault::new(path, value.clone()));
    } else {
        apply(scope, paths, path, value);
    }
}

/// Commit the defaults of an accepted branch into the enclosing scope
pub fn commit(scope: &mut Scope<'_>, paths: &PathTable, accepted: Vec<PendingDefault>) {
    if scope.mode.defer_defaults {
        scope.pending.extend(accepted);
        return;
    }
    for pending in accepted {
        apply(scope, paths, pending.path, &pending.value);
    }
}
