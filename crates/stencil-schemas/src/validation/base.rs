//! Navigation context threaded through the evaluator
//!
//! Payload paths are interned in a [`PathTable`] so descending one level costs
//! a single hop no matter how deep the payload is. A [`Place`] keeps a mutable
//! borrow of the nearest present value, so the evaluator never walks the
//! payload again from its root.
//!
//! Copyright (c) 2025 Stencil Team
//! Licensed under the Apache-2.0 license

use crate::schema::{descend, Pointer, Segment};
use crate::validation::defaults::{self, PendingDefault};
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::thread;

/// Interned payload path; equal paths share one id within an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(usize);

impl PathId {
    pub const ROOT: PathId = PathId(0);
}

/// Paths of payload properties already accounted for
pub type EvaluatedPaths = HashSet<PathId>;

#[derive(Debug)]
struct Link {
    parent: PathId,
    segment: Segment,
    depth: usize,
}

/// Every path visited by one evaluation, stored as links to their parents
#[derive(Debug, Default)]
pub struct PathTable {
    links: Vec<Link>,
    children: HashMap<(PathId, Segment), PathId>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the path one hop below `parent`
    pub fn child(&mut self, parent: PathId, segment: impl Into<Segment>) -> PathId {
        let depth = self.depth(parent) + 1;
        match self.children.entry((parent, segment.into())) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = PathId(self.links.len() + 1);
                self.links.push(Link {
                    parent,
                    segment: entry.key().1.clone(),
                    depth,
                });
                entry.insert(id);
                id
            }
        }
    }

    fn link(&self, id: PathId) -> Option<&Link> {
        id.0.checked_sub(1).and_then(|index| self.links.get(index))
    }

    pub fn parent(&self, id: PathId) -> Option<PathId> {
        self.link(id).map(|link| link.parent)
    }

    /// Last hop of `id`; `None` for the root
    pub fn segment(&self, id: PathId) -> Option<&Segment> {
        self.link(id).map(|link| &link.segment)
    }

    /// Number of hops from the root
    pub fn depth(&self, id: PathId) -> usize {
        self.link(id).map_or(0, |link| link.depth)
    }

    /// Hops leading from `ancestor` down to `id`, each with the path it reaches.
    ///
    /// `None` when `ancestor` is not on the way to `id`.
    pub fn hops(&self, ancestor: PathId, id: PathId) -> Option<Vec<(PathId, &Segment)>> {
        let stop = self.depth(ancestor);
        let mut hops = Vec::with_capacity(self.depth(id).saturating_sub(stop));
        let mut current = id;
        while self.depth(current) > stop {
            let link = self.link(current)?;
            hops.push((current, &link.segment));
            current = link.parent;
        }
        if current != ancestor {
            return None;
        }
        hops.reverse();
        Some(hops)
    }

    pub fn pointer(&self, id: PathId) -> Pointer {
        self.hops(PathId::ROOT, id)
            .unwrap_or_default()
            .into_iter()
            .map(|(_, segment)| segment.clone())
            .collect()
    }

    /// Render `id` as a pointer, `/` for the root
    pub fn render(&self, id: PathId) -> String {
        self.pointer(id).render()
    }
}

/// Location of the value under evaluation.
///
/// `anchor` is the nearest value present at or above `path`. When `path` is
/// absent, `gap` is the first hop below the anchor on the way to it; checking
/// that single hop tells whether a default has since filled the gap.
#[derive(Debug)]
pub struct Place<'p> {
    anchor: &'p mut Value,
    anchor_path: PathId,
    path: PathId,
    gap: PathId,
}

impl<'p> Place<'p> {
    pub fn root(payload: &'p mut Value) -> Self {
        Self {
            anchor: payload,
            anchor_path: PathId::ROOT,
            path: PathId::ROOT,
            gap: PathId::ROOT,
        }
    }

    pub fn path(&self) -> PathId {
        self.path
    }

    /// The same place under a shorter borrow
    pub fn reborrow(&mut self) -> Place<'_> {
        Place {
            anchor: &mut *self.anchor,
            anchor_path: self.anchor_path,
            path: self.path,
            gap: self.gap,
        }
    }

    /// The value at this place, if present
    pub fn get(&self, paths: &PathTable) -> Option<&Value> {
        if self.anchor_path == self.path {
            return Some(&*self.anchor);
        }
        let below = paths.segment(self.gap)?.step(&*self.anchor)?;
        paths
            .hops(self.gap, self.path)?
            .into_iter()
            .try_fold(below, |current, (_, segment)| segment.step(current))
    }

    /// The deepest value present at or above this place, its path, and the
    /// next hop below it
    fn settle(&mut self, paths: &PathTable) -> (&mut Value, PathId, PathId) {
        if self.anchor_path == self.path {
            return (&mut *self.anchor, self.path, self.path);
        }
        let filled = paths
            .segment(self.gap)
            .is_some_and(|segment| segment.step(&*self.anchor).is_some());
        if !filled {
            return (&mut *self.anchor, self.anchor_path, self.gap);
        }

        let hops = paths.hops(self.anchor_path, self.path).unwrap_or_default();
        let segments: Vec<&Segment> = hops.iter().map(|(_, segment)| *segment).collect();
        let (value, taken) = descend(&mut *self.anchor, &segments);
        let at = match taken.checked_sub(1) {
            Some(last) => hops[last].0,
            None => self.anchor_path,
        };
        let gap = hops.get(taken).map_or(self.path, |(id, _)| *id);
        (value, at, gap)
    }

    /// The place one hop below this one
    pub fn child(&mut self, paths: &mut PathTable, segment: impl Into<Segment>) -> Place<'_> {
        let path = paths.child(self.path, segment);
        let paths = &*paths;
        let here = self.path;
        let (value, at, gap) = self.settle(paths);
        if at != here {
            return Place {
                anchor: value,
                anchor_path: at,
                path,
                gap,
            };
        }

        let Some(segment) = paths.segment(path) else {
            return Place {
                anchor: value,
                anchor_path: here,
                path,
                gap: path,
            };
        };
        match segment.step_mut(value) {
            Ok(child) => Place {
                anchor: child,
                anchor_path: path,
                path,
                gap: path,
            },
            Err(parent) => Place {
                anchor: parent,
                anchor_path: here,
                path,
                gap: path,
            },
        }
    }

    /// Write `value` at `target`, a path at or below this place, creating
    /// missing objects on the way; returns whether anything was written
    pub fn write(&mut self, paths: &PathTable, target: PathId, value: &Value) -> bool {
        let Some(hops) = paths.hops(self.anchor_path, target) else {
            log::warn!(
                "default for '{}' lies outside '{}'",
                paths.render(target),
                paths.render(self.path)
            );
            return false;
        };
        let segments: Vec<&Segment> = hops.iter().map(|(_, segment)| *segment).collect();
        defaults::insert(&mut *self.anchor, &segments, value)
    }
}

/// Flags inherited by every call below the scope that set them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mode {
    /// Matched leaves record their path in the shared evaluated set
    pub carry: bool,
    /// Failures become branch messages; the trail is not attached to errors raised here
    pub absorb: bool,
    /// Defaults are queued instead of applied
    pub defer_defaults: bool,
}

impl Mode {
    /// Mode of a `oneOf`/`anyOf`/`not` candidate
    pub fn branch() -> Self {
        Self {
            carry: false,
            absorb: true,
            defer_defaults: true,
        }
    }

    pub fn carrying(self) -> Self {
        Self {
            carry: true,
            ..self
        }
    }
}

/// Navigation context for one recursive call
#[derive(Debug)]
pub struct Scope<'s> {
    pub place: Place<'s>,
    pub mode: Mode,
    /// Evaluated paths shared with the caller
    pub evaluated: &'s mut EvaluatedPaths,
    /// Defaults waiting for their composition branch to be accepted
    pub pending: &'s mut Vec<PendingDefault>,
}

impl<'s> Scope<'s> {
    pub fn new(
        place: Place<'s>,
        mode: Mode,
        evaluated: &'s mut EvaluatedPaths,
        pending: &'s mut Vec<PendingDefault>,
    ) -> Self {
        Self {
            place,
            mode,
            evaluated,
            pending,
        }
    }

    pub fn path(&self) -> PathId {
        self.place.path()
    }

    /// Create a child scope one hop deeper, sharing this scope's state
    pub fn child(&mut self, paths: &mut PathTable, segment: impl Into<Segment>) -> Scope<'_> {
        Scope {
            place: self.place.child(paths, segment),
            mode: self.mode,
            evaluated: &mut *self.evaluated,
            pending: &mut *self.pending,
        }
    }

    /// Same place and shared state under different flags
    pub fn with_mode(&mut self, mode: Mode) -> Scope<'_> {
        Scope {
            place: self.place.reborrow(),
            mode,
            evaluated: &mut *self.evaluated,
            pending: &mut *self.pending,
        }
    }

    pub fn is_root(&self) -> bool {
        self.path() == PathId::ROOT
    }

    /// Record the current path as evaluated when carry-forward is on
    pub fn carry_forward(&mut self) {
        if self.mode.carry {
            self.evaluated.insert(self.path());
        }
    }
}

/// State owned by an isolated composition branch
#[derive(Debug, Default)]
pub struct BranchState {
    pub evaluated: EvaluatedPaths,
    pub pending: Vec<PendingDefault>,
}

impl BranchState {
    /// Start a branch from a copy of the caller's evaluated paths
    pub fn fork(evaluated: &EvaluatedPaths) -> Self {
        Self {
            evaluated: evaluated.clone(),
            pending: Vec::new(),
        }
    }

    pub fn scope<'a>(&'a mut self, place: Place<'a>, mode: Mode) -> Scope<'a> {
        Scope::new(place, mode, &mut self.evaluated, &mut self.pending)
    }
}

/// Nesting depth up to which work runs on the caller's stack
pub const INLINE_DEPTH: usize = 128;

const BASE_STACK: usize = 8 * 1024 * 1024;
const STACK_PER_LEVEL: usize = 16 * 1024;

/// Run `task` on a stack large enough for a tree `depth` levels deep.
///
/// Shallow trees run inline. Deeper ones run on a scoped worker thread sized
/// to the depth; if that thread cannot be spawned the task runs inline.
pub fn run_with_stack<R, F>(depth: usize, task: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if depth <= INLINE_DEPTH {
        return task();
    }

    let stack_size = BASE_STACK.saturating_add(depth.saturating_mul(STACK_PER_LEVEL));
    let mut slot = Some(task);
    let outcome = thread::scope(|scope| {
        let slot = &mut slot;
        let spawned = thread::Builder::new()
            .name("stencil-deep".to_string())
            .stack_size(stack_size)
            .spawn_scoped(scope, move || slot.take().map(|task| task()));
        match spawned {
            Ok(handle) => match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            Err(e) => {
                log::warn!(
                    "could not spawn a {} byte stack for depth {}, running inline: {}",
                    stack_size,
                    depth,
                    e
                );
                None
            }
        }
    });

    match (outcome, slot.take()) {
        (Some(result), _) => result,
        (None, Some(task)) => task(),
        (None, None) => unreachable!("deep-stack task neither ran nor stayed queued"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paths_are_interned() {
        let mut paths = PathTable::new();
        let address = paths.child(PathId::ROOT, "address");
        let first = paths.child(address, 0);
        assert_eq!(paths.child(PathId::ROOT, "address"), address);
        assert_eq!(paths.child(address, 0), first);
        assert_ne!(paths.child(address, 1), first);

        assert_eq!(paths.depth(first), 2);
        assert_eq!(paths.parent(first), Some(address));
        assert_eq!(paths.render(first), "/address/0");
        assert_eq!(paths.render(PathId::ROOT), "/");

        let hops = paths.hops(address, first).unwrap();
        assert_eq!(hops, vec![(first, &Segment::Index(0))]);
        assert!(paths.hops(first, address).is_none());
    }

    #[test]
    fn test_place_follows_present_and_absent_values() {
        let mut paths = PathTable::new();
        let mut payload = json!({"usage": {"tokens": 3}});
        let mut root = Place::root(&mut payload);

        {
            let mut usage = root.child(&mut paths, "usage");
            assert_eq!(usage.get(&paths), Some(&json!({"tokens": 3})));
            let tokens = usage.child(&mut paths, "tokens");
            assert_eq!(tokens.get(&paths), Some(&json!(3)));
        }

        let mut meta = root.child(&mut paths, "meta");
        assert_eq!(meta.get(&paths), None);
        let mut label = meta.child(&mut paths, "label");
        assert_eq!(paths.render(label.path()), "/meta/label");
        assert_eq!(label.get(&paths), None);

        let target = label.path();
        assert!(label.write(&paths, target, &json!("x")));
        assert_eq!(label.get(&paths), Some(&json!("x")));
        let mut sibling = meta.child(&mut paths, "label");
        assert_eq!(sibling.get(&paths), Some(&json!("x")));
        assert!(sibling.child(&mut paths, "deeper").get(&paths).is_none());
        assert_eq!(payload, json!({"usage": {"tokens": 3}, "meta": {"label": "x"}}));
    }

    #[test]
    fn test_child_scope_extends_path_and_shares_state() {
        let mut paths = PathTable::new();
        let mut payload = json!({"address": ["street"]});
        let mut evaluated = EvaluatedPaths::new();
        let mut pending = Vec::new();
        let mut root = Scope::new(
            Place::root(&mut payload),
            Mode::default().carrying(),
            &mut evaluated,
            &mut pending,
        );
        let leaf_path = {
            let mut child = root.child(&mut paths, "address");
            let mut leaf = child.child(&mut paths, 0);
            assert_eq!(leaf.place.get(&paths), Some(&json!("street")));
            leaf.carry_forward();
            leaf.path()
        };
        assert!(root.is_root());
        assert!(root.evaluated.contains(&leaf_path));
        assert_eq!(paths.render(leaf_path), "/address/0");
    }

    #[test]
    fn test_branch_state_is_isolated() {
        let mut paths = PathTable::new();
        let a = paths.child(PathId::ROOT, "a");
        let mut payload = json!({"a": 1, "b": 2});
        let mut evaluated = EvaluatedPaths::new();
        evaluated.insert(a);

        let mut branch = BranchState::fork(&evaluated);
        let b = {
            let mut root = Place::root(&mut payload);
            let mut scope = branch.scope(root.reborrow(), Mode::branch().carrying());
            let mut child = scope.child(&mut paths, "b");
            child.carry_forward();
            child.path()
        };
        assert!(branch.evaluated.contains(&a));
        assert!(branch.evaluated.contains(&b));
        assert!(!evaluated.contains(&b));
    }

    #[test]
    fn test_run_with_stack() {
        assert_eq!(run_with_stack(1, || 41 + 1), 42);

        let mut touched = Vec::new();
        let len = run_with_stack(INLINE_DEPTH * 4, || {
            touched.push(1);
            touched.len()
        });
        assert_eq!(len, 1);
        assert_eq!(touched, vec![1]);
    }
}
