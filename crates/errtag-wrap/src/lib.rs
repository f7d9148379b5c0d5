// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Error wrapping that freezes scoped-context metadata at failure time.
//!
//! [`TaggedError::wrap`] snapshots the metadata of an
//! [`errtag_context::Context`] onto an error the moment it is produced;
//! [`find_metadata`] reads the snapshot back out of the cause chain however
//! many layers wrap the error afterwards.
//!
//! ```
//! use errtag_context::Context;
//! use errtag_wrap::{TaggedError, find_metadata};
//!
//! let ctx = Context::background().with_meta(["request_id", "r-42"]);
//! let err = TaggedError::wrap(std::io::Error::other("a problem"), &ctx);
//!
//! let meta = find_metadata(&err).unwrap();
//! assert_eq!(meta["request_id"], "r-42");
//! ```

use errtag_context::{Context, MetaMap, collect_pairs};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

// ---------------------------------------------------------------------------
// TaggedError
// ---------------------------------------------------------------------------

/// An error carrying a frozen metadata snapshot.
///
/// Wrapping preserves the inner error's message (`Display` forwards it
/// verbatim) and its cause chain (`Error::source` exposes the inner error).
/// The snapshot is computed once, at wrap time, and never changes.
pub struct TaggedError {
    source: Box<dyn Error + Send + Sync>,
    meta: MetaMap,
}

impl TaggedError {
    /// Wrap `err` with a snapshot of `ctx`'s metadata.
    ///
    /// A context with no attachment anywhere yields an empty snapshot; the
    /// wrapped error is still queryable via [`TaggedError::metadata`].
    pub fn wrap<E>(err: E, ctx: &Context) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            source: err.into(),
            meta: ctx.meta().cloned().unwrap_or_default(),
        }
    }

    /// Wrap `err` with `ctx`'s metadata merged with `extras`.
    ///
    /// `extras` follows the same alternating key/value reading as
    /// [`Context::with_meta`], unpaired trailing element discarded; on key
    /// collision the extra pair wins over the context's.
    pub fn wrap_with<E, I>(err: E, ctx: &Context, extras: I) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut tagged = Self::wrap(err, ctx);
        tagged.meta.extend(collect_pairs(extras));
        tagged
    }

    /// The frozen metadata snapshot, possibly empty.
    pub fn metadata(&self) -> &MetaMap {
        &self.meta
    }

    /// Consume the wrapper and recover the inner error.
    pub fn into_source(self) -> Box<dyn Error + Send + Sync> {
        self.source
    }
}

impl fmt::Display for TaggedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl fmt::Debug for TaggedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("TaggedError");
        d.field("source", &self.source.to_string());
        if !self.meta.is_empty() {
            d.field("meta", &self.meta);
        }
        d.finish()
    }
}

impl Error for TaggedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref() as &(dyn Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Cause-chain reader
// ---------------------------------------------------------------------------

/// Read the metadata snapshot out of `err`'s cause chain.
///
/// Walks outward-in via [`Error::source`] and reports the nearest
/// [`TaggedError`] layer. Returns `None` for errors that were never wrapped
/// and for wrap layers whose snapshot is empty — "no metadata" is a normal
/// outcome, not a failure. Nested wrap layers are not merged: each wrap
/// already captured the full ambient context.
pub fn find_metadata<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a MetaMap> {
    let mut cursor: Option<&(dyn Error + 'static)> = Some(err);
    while let Some(layer) = cursor {
        if let Some(tagged) = layer.downcast_ref::<TaggedError>() {
            let meta = tagged.metadata();
            return if meta.is_empty() { None } else { Some(meta) };
        }
        cursor = layer.source();
    }
    None
}

// ---------------------------------------------------------------------------
// Serialisable snapshot
// ---------------------------------------------------------------------------

/// Serialisable snapshot of a [`TaggedError`] for reporting pipelines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaggedErrorDto {
    /// The wrapped error's message.
    pub message: String,
    /// The frozen metadata snapshot.
    pub metadata: MetaMap,
    /// String rendering of the inner error's own cause, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&TaggedError> for TaggedErrorDto {
    fn from(err: &TaggedError) -> Self {
        Self {
            message: err.to_string(),
            metadata: err.meta.clone(),
            source_message: err.source.source().map(|cause| cause.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
