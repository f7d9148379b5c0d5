// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Immutable scoped-context chain with diagnostic metadata accumulation.
//!
//! A [`Context`] is a persistent parent-pointer chain of typed bindings.
//! Deriving a child never mutates its parent, so any number of children can
//! share one ancestor safely across threads. On top of the plain typed
//! bindings, [`Context::with_meta`] accumulates a string key/value
//! [`MetaMap`] at a reserved binding point; each attachment flattens the
//! nearest ancestor's mapping into its own, so [`Context::meta`] is a single
//! lookup rather than a per-key chain walk.
//!
//! ```
//! use errtag_context::Context;
//!
//! let ctx = Context::background().with_meta(["request_id", "r-42"]);
//! let ctx = ctx.with_meta(["stage", "ingest"]);
//!
//! let meta = ctx.meta().unwrap();
//! assert_eq!(meta["request_id"], "r-42");
//! assert_eq!(meta["stage"], "ingest");
//! ```

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Diagnostic metadata accumulated on a [`Context`].
///
/// `BTreeMap` keeps iteration deterministic for downstream reporting.
pub type MetaMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Context chain
// ---------------------------------------------------------------------------

/// One link in the chain: a typed binding plus a shared parent pointer.
struct Node {
    parent: Option<Arc<Node>>,
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

/// Immutable, cheaply clonable carrier of call-scoped typed bindings.
///
/// Lookup walks from the newest binding towards the root, so the nearest
/// binding for a given type shadows older ones. Cloning shares the chain;
/// deriving via [`Context::with_value`] or [`Context::with_meta`] prepends a
/// new link and leaves every existing context untouched.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Node>>,
}

/// Reserved binding point for the metadata mapping. Private, so no caller
/// supplied `with_value` binding can collide with it.
struct MetaBinding(MetaMap);

impl Context {
    /// The empty root context: no bindings, no metadata.
    pub fn background() -> Self {
        Self { head: None }
    }

    /// Derive a child context carrying `value` under its type.
    ///
    /// A later binding of the same type shadows this one for descendants;
    /// this context and its ancestors are unaffected.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Node {
                parent: self.head.clone(),
                key: TypeId::of::<T>(),
                value: Arc::new(value),
            })),
        }
    }

    /// Look up the nearest binding of type `T`, walking towards the root.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            if node.key == TypeId::of::<T>() {
                return node.value.downcast_ref::<T>();
            }
            cursor = node.parent.as_deref();
        }
        None
    }

    /// Derive a child context with additional metadata.
    ///
    /// `pairs` is read as alternating key, value, key, value, …; an unpaired
    /// trailing element is silently discarded. With zero complete pairs the
    /// result is a plain clone of `self` and no binding is added. Otherwise
    /// the new pairs are merged over a copy of the nearest ancestor's
    /// mapping, new pairs winning per key.
    pub fn with_meta<I>(&self, pairs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let added = collect_pairs(pairs);
        if added.is_empty() {
            return self.clone();
        }
        let mut merged = self.meta().cloned().unwrap_or_default();
        merged.extend(added);
        self.with_value(MetaBinding(merged))
    }

    /// The effective metadata mapping, or `None` if no attachment exists
    /// anywhere in the chain.
    ///
    /// One lookup at the reserved binding point suffices: each attachment
    /// already flattened its ancestor's mapping into itself.
    pub fn meta(&self) -> Option<&MetaMap> {
        self.value::<MetaBinding>().map(|binding| &binding.0)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bindings = 0usize;
        let mut cursor = self.head.as_deref();
        while let Some(node) = cursor {
            bindings += 1;
            cursor = node.parent.as_deref();
        }
        let mut d = f.debug_struct("Context");
        d.field("bindings", &bindings);
        if let Some(meta) = self.meta() {
            d.field("meta", meta);
        }
        d.finish()
    }
}

// ---------------------------------------------------------------------------
// Key/value folding
// ---------------------------------------------------------------------------

/// Fold an alternating key, value, … sequence into a [`MetaMap`].
///
/// Total over any input: an unpaired trailing element is discarded, and a
/// later duplicate key overwrites an earlier one.
pub fn collect_pairs<I>(items: I) -> MetaMap
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut map = MetaMap::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        let Some(value) = iter.next() else {
            break;
        };
        map.insert(key.into(), value.into());
    }
    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
