/// Crate-level error types for linkgate operations.
///
/// Errors here are internal plumbing: the dispatch entry point never
/// surfaces them, it folds every failure into a `LinkResult`. Each variant
/// carries enough context to produce a useful diagnostic without a debugger.
#[allow(clippy::error_impl_error, reason = "crate-wide error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A registered handler reported a failure from its side effect.
    #[error("handler failed: {reason}")]
    HandlerFailed {
        /// Description of the handler failure.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// A URL reached the file-protocol resolver with a non-`file` scheme.
    #[error("not a file URL: `{url}` has scheme `{scheme}`")]
    NotFileScheme {
        /// The scheme that was actually present.
        scheme: String,
        /// The full URL as received.
        url: String,
    },

    /// TOML deserialization failed while loading settings.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A URL string could not be parsed at all.
    #[error("malformed URL `{url}`: {reason}")]
    UrlParse {
        /// Description of the parse failure.
        reason: String,
        /// The URL string as received.
        url: String,
    },
}
