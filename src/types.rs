/// Core domain types for link classification, validation, and dispatch.
use std::path::PathBuf;

use serde_json::{Map, Value};

/// Everything the engine knows about one link interaction.
/// Constructed by the rendering surface, immutable once built; carries no
/// identity beyond structural equality.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkContext {
    /// Open-ended auxiliary signals. Keys the engine understands:
    /// `diagram_container` (bool) and `session_id` (string).
    pub aux: Map<String, Value>,
    /// Directory fallback anchor when no current file is known.
    pub current_dir: Option<PathBuf>,
    /// Document the link appeared in; anchors relative resolution.
    pub current_file: Option<PathBuf>,
    /// Raw href string exactly as extracted from rendered content.
    pub href: String,
    /// Free-form tag naming the component that produced the link.
    pub source: String,
}

impl LinkContext {
    /// Context for a bare href with no document anchors.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    /// Attach one auxiliary signal.
    #[must_use]
    pub fn with_aux(mut self, key: impl Into<String>, value: Value) -> Self {
        self.aux.insert(key.into(), value);
        self
    }

    /// Set the directory fallback anchor.
    #[must_use]
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set the document the link appeared in.
    #[must_use]
    pub fn with_current_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.current_file = Some(file.into());
        self
    }

    /// Set the source-component tag.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// True when the auxiliary signal `key` is present and truthy.
    pub fn aux_flag(&self, key: &str) -> bool {
        matches!(self.aux.get(key), Some(Value::Bool(true)))
    }

    /// Session identifier for log correlation, when the caller supplied one.
    pub fn session_id(&self) -> Option<&str> {
        self.aux.get("session_id").and_then(Value::as_str)
    }
}

/// Closed classification of a hyperlink's semantic category.
/// Exactly one variant applies per input; see `classifier::classify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// In-document fragment (`#intro`).
    Anchor,
    /// Trailing-separator path opening a file-tree node.
    Directory,
    /// `http://`, `https://`, or `mailto:` — anything leaving the viewer.
    ExternalHttp,
    /// `file:///` URL or drive-letter absolute path.
    FileProtocol,
    /// Raster or vector image by extension.
    Image,
    /// Diagram source, by extension or container signal.
    Mermaid,
    /// Markdown document resolved relative to the current one.
    RelativeMarkdown,
    /// `path#fragment` — a cross-document anchor jump.
    TableOfContents,
    /// Nothing matched; the terminal default.
    Unknown,
}

impl LinkType {
    /// Stable lowercase name used in audit records and snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Anchor => "anchor",
            LinkType::Directory => "directory",
            LinkType::ExternalHttp => "external_http",
            LinkType::FileProtocol => "file_protocol",
            LinkType::Image => "image",
            LinkType::Mermaid => "mermaid",
            LinkType::RelativeMarkdown => "relative_markdown",
            LinkType::TableOfContents => "table_of_contents",
            LinkType::Unknown => "unknown",
        }
    }
}

/// Closed error taxonomy for dispatch outcomes. Absence means OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unanticipated failure inside dispatch or a handler.
    InternalError,
    /// Path does not exist and the policy requires existence.
    NotFound,
    /// ACL/readability probe failed.
    PermissionDenied,
    /// Malformed URL or unresolvable path expression.
    ResolveError,
    /// Policy rejection: protocol, domain, pattern, depth, or drive.
    SecurityBlocked,
    /// No handler registered for a reachable, validated link type.
    Unsupported,
}

impl ErrorKind {
    /// Stable lowercase name used in audit records and snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InternalError => "internal_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::ResolveError => "resolve_error",
            ErrorKind::SecurityBlocked => "security_blocked",
            ErrorKind::Unsupported => "unsupported",
        }
    }
}

/// Concrete target a link maps to after resolution. Ephemeral: built and
/// consumed within one dispatch call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Normalized filesystem path.
    Path {
        /// The lexically normalized path.
        path: PathBuf,
        /// The original, unnormalized expression. Forbidden-pattern checks
        /// run against this so normalization cannot hide a `..` or `~`.
        raw: String,
    },
    /// URL string awaiting (or having passed) validation.
    Url(
        /// The URL as received from the context.
        String,
    ),
}

/// Accept/reject verdict from the security validator.
/// Invariant: `ok == true` implies `error_kind` is `None`; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Diagnostic details: offending pattern, computed depth, domain.
    pub details: Map<String, Value>,
    /// Which kind of rejection this is, when `ok` is false.
    pub error_kind: Option<ErrorKind>,
    /// Human-readable explanation of the verdict.
    pub message: String,
    /// The verdict itself.
    pub ok: bool,
}

impl ValidationResult {
    /// An accepting verdict.
    pub fn pass() -> Self {
        Self {
            details: Map::new(),
            error_kind: None,
            message: String::new(),
            ok: true,
        }
    }

    /// A rejecting verdict with its reason.
    pub fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            details: Map::new(),
            error_kind: Some(kind),
            message: message.into(),
            ok: false,
        }
    }

    /// Attach one diagnostic detail.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// Final outcome of one dispatch call, returned synchronously.
/// Invariant: `success == false` implies `action` is empty or
/// `"show_error"` and `error_kind` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkResult {
    /// Free-form name of the side effect the handler performed or
    /// attempted, e.g. `open_browser`, `scroll_to_anchor`, `show_error`.
    pub action: String,
    /// Which kind of failure occurred, when `success` is false.
    pub error_kind: Option<ErrorKind>,
    /// Human-readable outcome description.
    pub message: String,
    /// Kind-specific payload: resolved path, anchor id, URL, diagnostics.
    pub payload: Map<String, Value>,
    /// Whether the navigation action succeeded.
    pub success: bool,
}

impl LinkResult {
    /// A successful outcome named by its action.
    pub fn success(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            error_kind: None,
            message: String::new(),
            payload: Map::new(),
            success: true,
        }
    }

    /// A failed outcome surfaced to the user as an error display.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            action: "show_error".to_string(),
            error_kind: Some(kind),
            message: message.into(),
            payload: Map::new(),
            success: false,
        }
    }

    /// A failed outcome with no side effect attempted: nothing is
    /// registered or enabled for this link.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            action: String::new(),
            error_kind: Some(ErrorKind::Unsupported),
            message: message.into(),
            payload: Map::new(),
            success: false,
        }
    }

    /// Convert a validation rejection into a `show_error` outcome,
    /// carrying the verdict's details as payload.
    pub fn from_validation(verdict: ValidationResult) -> Self {
        let kind = verdict.error_kind.unwrap_or(ErrorKind::SecurityBlocked);
        Self {
            action: "show_error".to_string(),
            error_kind: Some(kind),
            message: verdict.message,
            payload: verdict.details,
            success: false,
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach one payload entry.
    #[must_use]
    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_pass_has_no_error_kind() {
        let v = ValidationResult::pass();
        assert!(v.ok);
        assert!(v.error_kind.is_none());
    }

    #[test]
    fn error_result_holds_invariant() {
        let r = LinkResult::error(ErrorKind::SecurityBlocked, "blocked");
        assert!(!r.success);
        assert_eq!(r.action, "show_error");
        assert_eq!(r.error_kind, Some(ErrorKind::SecurityBlocked));
    }

    #[test]
    fn unsupported_result_has_empty_action() {
        let r = LinkResult::unsupported("no handler");
        assert!(!r.success);
        assert!(r.action.is_empty());
        assert_eq!(r.error_kind, Some(ErrorKind::Unsupported));
    }

    #[test]
    fn aux_flag_requires_true_bool() {
        let ctx = LinkContext::new("x")
            .with_aux("diagram_container", serde_json::Value::Bool(true))
            .with_aux("other", serde_json::Value::String("true".to_string()));
        assert!(ctx.aux_flag("diagram_container"));
        assert!(!ctx.aux_flag("other"));
        assert!(!ctx.aux_flag("absent"));
    }
}
