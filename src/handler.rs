//! The pluggable navigation seam.
//!
//! The engine classifies and validates; handlers perform the actual side
//! effect (opening a browser, scrolling a viewport, opening a file-tree
//! node). Hosts construct handlers and register them in bulk; the engine
//! stores them for its lifetime and looks them up by exact link type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::types::{LinkContext, LinkResult, LinkType, ResolvedTarget};

/// A navigation action for one link kind.
///
/// Implementations must be safe for concurrent invocation: the engine
/// dispatches from whatever thread the caller is on, without locking.
pub trait LinkHandler: Send + Sync {
    /// Perform the navigation action for a classified (and, where the
    /// kind requires it, validated) link. `target` is present only for
    /// kinds that go through resolution or URL validation.
    ///
    /// # Errors
    ///
    /// Any error is caught at the dispatch boundary and converted into an
    /// `InternalError` result; it never reaches the engine's caller.
    fn handle(
        &self,
        ctx: &LinkContext,
        target: Option<&ResolvedTarget>,
    ) -> Result<LinkResult, Error>;
}

/// Registry mapping each link kind to its handler. Kinds without an entry
/// produce an `Unsupported` outcome when dispatch reaches handler lookup.
pub type HandlerMap = HashMap<LinkType, Arc<dyn LinkHandler>>;
