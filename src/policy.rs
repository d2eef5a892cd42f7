//! Runtime policy snapshot governing which link kinds and targets are
//! permitted. Loaded once at engine construction and replaceable only by
//! swapping the whole snapshot; never mutated in place during a dispatch.

use crate::config::Settings;

/// Default forbidden substrings checked against raw path expressions.
/// `..` is deliberately absent: parent-relative links are ordinary
/// markdown navigation, and the depth check bounds traversal instead.
const DEFAULT_FORBIDDEN_PATTERNS: &[&str] = &["~"];

/// Default maximum number of path segments below the root/drive anchor.
const DEFAULT_MAX_PATH_DEPTH: usize = 10;

/// Default classifier/resolution cache sizing hint for embedders.
const DEFAULT_CACHE_SIZE: usize = 100;

/// The full policy consumed read-only by each dispatch call.
///
/// Defaults are permissive for presentation-only link kinds (images,
/// diagrams) and fail-closed for external network access: the protocol
/// and domain allowlists start empty, which rejects every external link
/// until the host configures them. That asymmetry is deliberate.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Permit dispatching `ExternalHttp` links at all.
    pub allow_external: bool,
    /// Permit dispatching `FileProtocol` links at all.
    pub allow_file_protocol: bool,
    /// Permit dispatching `Image` links at all.
    pub allow_images: bool,
    /// Permit dispatching `Mermaid` links at all.
    pub allow_mermaid: bool,
    /// Sizing hint for any caches the embedder layers on top.
    pub cache_size: usize,
    /// Require resolved paths to exist on disk.
    pub check_exists: bool,
    /// Additionally probe resolved paths for readability. Off by default:
    /// read-access semantics vary across platforms.
    pub check_readable: bool,
    /// Master switch; when false every dispatch is an unsupported no-op.
    pub enabled: bool,
    /// Audit logging shape.
    pub logging: LoggingPolicy,
    /// Platform-specific path limits.
    pub platform: PlatformPolicy,
    /// Network and path-pattern restrictions.
    pub security: SecurityPolicy,
}

/// Audit logging sub-policy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingPolicy {
    /// Emit structured field maps when true, one pre-serialized JSON
    /// string per record when false.
    pub structured: bool,
}

/// Platform-specific path sub-policy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct PlatformPolicy {
    /// Drive/volume letters permitted for paths with a drive component.
    /// Empty means any drive. Entries compare case-insensitively on the
    /// leading letter, so `"C"` and `"c:"` are equivalent.
    pub allowed_drives: Vec<String>,
    /// Maximum path segments counted below the root/drive anchor.
    pub max_path_depth: usize,
}

/// Network and path-pattern sub-policy. The allowlists are fail-closed:
/// empty rejects everything.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    /// Hosts external http(s) links may point at. Exact, case-insensitive
    /// host match.
    pub allowed_domains: Vec<String>,
    /// URL schemes external links may use.
    pub allowed_protocols: Vec<String>,
    /// Substrings rejected anywhere in a raw, unnormalized path
    /// expression.
    pub forbidden_patterns: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_external: true,
            allow_file_protocol: true,
            allow_images: true,
            allow_mermaid: true,
            cache_size: DEFAULT_CACHE_SIZE,
            check_exists: true,
            check_readable: false,
            enabled: true,
            logging: LoggingPolicy::default(),
            platform: PlatformPolicy::default(),
            security: SecurityPolicy::default(),
        }
    }
}

impl Default for LoggingPolicy {
    fn default() -> Self {
        Self { structured: true }
    }
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self {
            allowed_drives: Vec::new(),
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            allowed_protocols: Vec::new(),
            forbidden_patterns: DEFAULT_FORBIDDEN_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

impl Policy {
    /// Build a policy from the settings store, falling back to the
    /// documented default for every absent key.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        Self {
            allow_external: settings.get_bool("links.allow_external", defaults.allow_external),
            allow_file_protocol: settings
                .get_bool("links.allow_file_protocol", defaults.allow_file_protocol),
            allow_images: settings.get_bool("links.allow_images", defaults.allow_images),
            allow_mermaid: settings.get_bool("links.allow_mermaid", defaults.allow_mermaid),
            cache_size: settings.get_usize("links.cache_size", defaults.cache_size),
            check_exists: settings.get_bool("links.check_exists", defaults.check_exists),
            check_readable: settings.get_bool("links.check_readable", defaults.check_readable),
            enabled: settings.get_bool("links.enabled", defaults.enabled),
            logging: LoggingPolicy {
                structured: settings.get_bool("logging.structured", defaults.logging.structured),
            },
            platform: PlatformPolicy {
                allowed_drives: settings.get_string_list("platform.allowed_drives", &[]),
                max_path_depth: settings
                    .get_usize("platform.max_path_depth", defaults.platform.max_path_depth),
            },
            security: SecurityPolicy {
                allowed_domains: settings.get_string_list("security.allowed_domains", &[]),
                allowed_protocols: settings.get_string_list("security.allowed_protocols", &[]),
                forbidden_patterns: settings
                    .get_string_list("security.forbidden_patterns", DEFAULT_FORBIDDEN_PATTERNS),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_closed_for_network_only() {
        let policy = Policy::default();
        assert!(policy.security.allowed_protocols.is_empty());
        assert!(policy.security.allowed_domains.is_empty());
        assert!(policy.allow_images);
        assert!(policy.allow_mermaid);
        assert!(policy.allow_file_protocol);
        assert!(policy.check_exists);
        assert!(!policy.check_readable);
    }

    #[test]
    fn from_settings_reads_dotted_sections() {
        let toml_text = "\
[links]
check_exists = false
allow_external = false

[security]
allowed_protocols = [\"https\"]
allowed_domains = [\"example.com\"]

[platform]
max_path_depth = 4
allowed_drives = [\"C\", \"D\"]

[logging]
structured = false
";
        let settings = Settings::from_value(toml::from_str(toml_text).unwrap());
        let policy = Policy::from_settings(&settings);

        assert!(!policy.check_exists);
        assert!(!policy.allow_external);
        assert_eq!(policy.security.allowed_protocols, vec!["https".to_string()]);
        assert_eq!(policy.security.allowed_domains, vec!["example.com".to_string()]);
        assert_eq!(policy.platform.max_path_depth, 4);
        assert_eq!(policy.platform.allowed_drives.len(), 2);
        assert!(!policy.logging.structured);
    }

    #[test]
    fn from_settings_keeps_defaults_for_absent_keys() {
        let policy = Policy::from_settings(&Settings::empty());
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn deserializes_from_toml_table() {
        let policy: Policy = toml::from_str(
            "enabled = false\n[security]\nforbidden_patterns = [\"..\", \"~\"]\n",
        )
        .unwrap();
        assert!(!policy.enabled);
        assert_eq!(policy.security.forbidden_patterns.len(), 2);
        assert!(policy.check_exists);
    }
}
