//! Link classification, resolution, and security validation for markdown
//! viewers.
//!
//! Given a raw href extracted from rendered content and the document
//! context it appeared in, [`LinkEngine::dispatch`] classifies the link
//! into a semantic kind, resolves it to a concrete target, enforces a
//! fail-closed security policy, invokes the handler registered for that
//! kind, and emits an audit record. Failure is always data: dispatch
//! returns a [`LinkResult`], never an error, and never panics past its
//! own boundary.
//!
//! The viewer shell supplies the moving parts: handlers perform the
//! actual navigation side effects, the settings store feeds the policy,
//! and the audit sinks receive best-effort log and snapshot records.
//!
//! ```
//! use std::sync::Arc;
//!
//! use linkgate::{
//!     HandlerMap, LinkContext, LinkEngine, LinkHandler, LinkResult, LinkType, Policy,
//!     ResolvedTarget,
//! };
//!
//! struct OpenBrowser;
//!
//! impl LinkHandler for OpenBrowser {
//!     fn handle(
//!         &self,
//!         _ctx: &LinkContext,
//!         _target: Option<&ResolvedTarget>,
//!     ) -> Result<LinkResult, linkgate::Error> {
//!         Ok(LinkResult::success("open_browser"))
//!     }
//! }
//!
//! let mut policy = Policy::default();
//! policy.security.allowed_protocols = vec!["https".to_string()];
//! policy.security.allowed_domains = vec!["example.com".to_string()];
//!
//! let mut engine = LinkEngine::new(policy);
//! let mut handlers = HandlerMap::new();
//! handlers.insert(LinkType::ExternalHttp, Arc::new(OpenBrowser) as Arc<dyn LinkHandler>);
//! engine.set_handlers(handlers);
//!
//! let result = engine.dispatch(&LinkContext::new("https://example.com"));
//! assert!(result.success);
//! assert_eq!(result.action, "open_browser");
//! ```

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod handler;
pub mod policy;
pub mod resolver;
pub mod types;
pub mod validator;

pub use config::Settings;
pub use engine::LinkEngine;
pub use error::Error;
pub use events::{LogSink, NavigationSnapshot, ResultBucket, SnapshotSink, TracingLogSink};
pub use handler::{HandlerMap, LinkHandler};
pub use policy::{LoggingPolicy, PlatformPolicy, Policy, SecurityPolicy};
pub use types::{
    ErrorKind, LinkContext, LinkResult, LinkType, ResolvedTarget, ValidationResult,
};
