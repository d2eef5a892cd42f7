//! Dispatch orchestration: classify → resolve → validate → handle → log.
//!
//! The engine is stateless across calls. The only shared pieces are the
//! handler registry (set once, read-only during dispatch) and the policy
//! snapshot (swapped atomically, copied on read), so concurrent dispatch
//! needs no locking of its own.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::classifier;
use crate::config::Settings;
use crate::events::{EventEmitter, LogSink, SnapshotSink};
use crate::handler::HandlerMap;
use crate::policy::Policy;
use crate::resolver;
use crate::types::{ErrorKind, LinkContext, LinkResult, LinkType, ResolvedTarget};
use crate::validator;

/// Anchor file name synthesized when only a directory is known, so
/// relative resolution still has a file to anchor at.
const VIRTUAL_ANCHOR: &str = "index.md";

/// The single entry point external callers use for link interactions.
pub struct LinkEngine {
    emitter: EventEmitter,
    handlers: HandlerMap,
    policy: RwLock<Arc<Policy>>,
}

impl LinkEngine {
    /// An engine with the given policy, no handlers, and no sinks.
    pub fn new(policy: Policy) -> Self {
        Self {
            emitter: EventEmitter::disabled(),
            handlers: HandlerMap::new(),
            policy: RwLock::new(Arc::new(policy)),
        }
    }

    /// An engine whose policy is loaded from the settings store.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Policy::from_settings(settings))
    }

    /// Attach audit sinks. The engine functions correctly with either or
    /// both absent.
    #[must_use]
    pub fn with_sinks(
        mut self,
        log: Option<Arc<dyn LogSink>>,
        snapshot: Option<Arc<dyn SnapshotSink>>,
    ) -> Self {
        self.emitter = EventEmitter::new(log, snapshot);
        self
    }

    /// Bulk-set the handler registry, replacing any previous registration.
    pub fn set_handlers(&mut self, handlers: HandlerMap) {
        self.handlers = handlers;
    }

    /// Atomically swap the policy snapshot. In-flight dispatch calls keep
    /// the snapshot they took at entry.
    pub fn set_policy(&self, policy: Policy) {
        match self.policy.write() {
            Ok(mut guard) => *guard = Arc::new(policy),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(policy),
        }
    }

    /// The current policy snapshot.
    pub fn policy(&self) -> Arc<Policy> {
        match self.policy.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Classify, resolve, validate, and dispatch one link interaction.
    ///
    /// Each call is a fresh, independent state walk ending in a terminal
    /// result: success, validation-blocked, resolution-error, unsupported,
    /// or internal-error. Failure is always data — this method never
    /// returns an error and never panics past its own boundary.
    pub fn dispatch(&self, ctx: &LinkContext) -> LinkResult {
        let policy = self.policy();
        let link_type = classifier::classify(ctx);

        let result = catch_unwind(AssertUnwindSafe(|| self.walk(ctx, link_type, &policy)))
            .unwrap_or_else(|_| {
                LinkResult::error(ErrorKind::InternalError, "dispatch panicked")
            });

        self.emitter.emit(ctx, link_type, &result, &policy);
        result
    }

    /// The per-type transition table.
    fn walk(&self, ctx: &LinkContext, link_type: LinkType, policy: &Policy) -> LinkResult {
        if !policy.enabled {
            return LinkResult::unsupported("link processing is disabled");
        }

        match link_type {
            LinkType::Anchor => self.dispatch_anchor(ctx),
            LinkType::Directory => self.dispatch_resolved(ctx, LinkType::Directory, policy),
            LinkType::ExternalHttp => self.dispatch_external(ctx, policy),
            LinkType::FileProtocol => self.dispatch_file_protocol(ctx, policy),
            LinkType::Image => {
                self.dispatch_presentation(ctx, LinkType::Image, policy.allow_images, "image")
            },
            LinkType::Mermaid => {
                self.dispatch_presentation(ctx, LinkType::Mermaid, policy.allow_mermaid, "mermaid")
            },
            LinkType::RelativeMarkdown => {
                self.dispatch_resolved(ctx, LinkType::RelativeMarkdown, policy)
            },
            LinkType::TableOfContents => self.dispatch_toc(ctx),
            LinkType::Unknown => self.invoke(LinkType::Unknown, ctx, None),
        }
    }

    /// Anchors go straight to their handler; no resolution, no validation.
    fn dispatch_anchor(&self, ctx: &LinkContext) -> LinkResult {
        self.invoke(LinkType::Anchor, ctx, None)
    }

    /// Presentation-only kinds: gated by their policy flag, then straight
    /// to the handler with the raw href.
    fn dispatch_presentation(
        &self,
        ctx: &LinkContext,
        link_type: LinkType,
        allowed: bool,
        label: &str,
    ) -> LinkResult {
        if !allowed {
            return LinkResult::error(
                ErrorKind::SecurityBlocked,
                format!("{label} links are disabled by policy"),
            );
        }
        self.invoke(link_type, ctx, None)
    }

    /// External links validate the raw href unconditionally — a missing
    /// handler must not skip the security verdict.
    fn dispatch_external(&self, ctx: &LinkContext, policy: &Policy) -> LinkResult {
        if !policy.allow_external {
            return LinkResult::error(
                ErrorKind::SecurityBlocked,
                "external links are disabled by policy",
            );
        }

        let target = ResolvedTarget::Url(ctx.href.clone());
        let verdict = validator::validate(&target, policy);
        if !verdict.ok {
            return LinkResult::from_validation(verdict);
        }
        self.invoke(LinkType::ExternalHttp, ctx, Some(&target))
    }

    /// Relative markdown and directory links: resolve against the current
    /// document, validate the resolved path, then hand off.
    fn dispatch_resolved(
        &self,
        ctx: &LinkContext,
        link_type: LinkType,
        policy: &Policy,
    ) -> LinkResult {
        let anchor_file = ctx.current_file.clone().or_else(|| {
            ctx.current_dir
                .as_ref()
                .map(|dir| dir.join(VIRTUAL_ANCHOR))
        });
        let path = resolver::resolve_relative(
            anchor_file.as_deref(),
            ctx.current_dir.as_deref(),
            &ctx.href,
        );

        let target = ResolvedTarget::Path {
            path,
            raw: ctx.href.clone(),
        };
        let verdict = validator::validate(&target, policy);
        if !verdict.ok {
            return LinkResult::from_validation(verdict);
        }
        self.invoke(link_type, ctx, Some(&target))
    }

    /// `file:` URLs: decode, validate, hand off. Resolution failures are
    /// converted, never propagated.
    fn dispatch_file_protocol(&self, ctx: &LinkContext, policy: &Policy) -> LinkResult {
        if !policy.allow_file_protocol {
            return LinkResult::error(
                ErrorKind::SecurityBlocked,
                "file protocol links are disabled by policy",
            );
        }

        // Drive-letter absolute paths classify as FileProtocol without a
        // URL wrapper; only real `file:` hrefs go through URL decoding.
        let path = if ctx.href.to_lowercase().starts_with("file:") {
            match resolver::resolve_file_protocol(&ctx.href) {
                Ok(path) => path,
                Err(e) => return LinkResult::error(ErrorKind::ResolveError, e.to_string()),
            }
        } else {
            resolver::resolve_relative(None, None, &ctx.href)
        };

        let target = ResolvedTarget::Path {
            path,
            raw: ctx.href.clone(),
        };
        let verdict = validator::validate(&target, policy);
        if !verdict.ok {
            return LinkResult::from_validation(verdict);
        }
        self.invoke(LinkType::FileProtocol, ctx, Some(&target))
    }

    /// Cross-document anchor jumps. With no dedicated handler, the
    /// fragment is stripped and re-presented to the anchor handler as a
    /// bare `#fragment`.
    fn dispatch_toc(&self, ctx: &LinkContext) -> LinkResult {
        if self.handlers.contains_key(&LinkType::TableOfContents) {
            return self.invoke(LinkType::TableOfContents, ctx, None);
        }

        let fragment = ctx.href.split_once('#').map(|(_, fragment)| fragment);
        if let Some(fragment) = fragment {
            if self.handlers.contains_key(&LinkType::Anchor) {
                let mut anchored = ctx.clone();
                anchored.href = format!("#{fragment}");
                return self.invoke(LinkType::Anchor, &anchored, None);
            }
        }
        LinkResult::unsupported("no handler registered for table_of_contents")
    }

    /// Handler lookup and invocation. Absence is a normal outcome, not a
    /// crash path; handler errors become internal-error results.
    fn invoke(
        &self,
        link_type: LinkType,
        ctx: &LinkContext,
        target: Option<&ResolvedTarget>,
    ) -> LinkResult {
        let Some(handler) = self.handlers.get(&link_type) else {
            return LinkResult::unsupported(format!(
                "no handler registered for {}",
                link_type.as_str()
            ));
        };

        match handler.handle(ctx, target) {
            Ok(result) => result,
            Err(e) => LinkResult::error(
                ErrorKind::InternalError,
                format!("handler for {} failed: {e}", link_type.as_str()),
            )
            .with_payload("handler_error", Value::String(e.to_string())),
        }
    }
}
