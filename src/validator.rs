//! Policy enforcement over resolved targets.
//!
//! The network branch is fail-closed: an empty or absent allowlist rejects
//! every scheme and every domain. The path branch applies its checks in a
//! fixed order and stops at the first failure; the depth check runs before
//! any filesystem access so deep paths are rejected even when they don't
//! exist.

use std::path::{Component, Path};

use serde_json::Value;
use url::Url;

use crate::policy::Policy;
use crate::types::{ErrorKind, ResolvedTarget, ValidationResult};

/// Apply the policy to a resolved target, dispatched by target kind.
/// Never errors — a verdict is always produced.
pub fn validate(target: &ResolvedTarget, policy: &Policy) -> ValidationResult {
    match target {
        ResolvedTarget::Path { path, raw } => validate_path(raw, path, policy),
        ResolvedTarget::Url(url) => validate_url(url, policy),
    }
}

/// Protocol allowlist for any scheme; domain allowlist on top for http(s).
fn validate_url(raw: &str, policy: &Policy) -> ValidationResult {
    let Ok(url) = Url::parse(raw) else {
        return ValidationResult::rejected(
            ErrorKind::SecurityBlocked,
            format!("unparseable URL: `{raw}`"),
        );
    };

    let scheme = url.scheme();
    let scheme_allowed = policy
        .security
        .allowed_protocols
        .iter()
        .any(|p| p.eq_ignore_ascii_case(scheme));
    if !scheme_allowed {
        return ValidationResult::rejected(
            ErrorKind::SecurityBlocked,
            format!("protocol `{scheme}` is not in the allowed list"),
        )
        .with_detail("protocol", Value::String(scheme.to_string()));
    }

    if scheme == "http" || scheme == "https" {
        let host = url.host_str().unwrap_or("");
        let host_allowed = policy
            .security
            .allowed_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(host));
        if !host_allowed {
            return ValidationResult::rejected(
                ErrorKind::SecurityBlocked,
                format!("domain `{host}` is not in the allowed list"),
            )
            .with_detail("domain", Value::String(host.to_string()));
        }
    }

    ValidationResult::pass()
}

/// Fixed check order: forbidden patterns on the raw expression, depth,
/// drive allowlist, existence, readability.
fn validate_path(raw: &str, path: &Path, policy: &Policy) -> ValidationResult {
    // The raw expression is checked before anything else so normalization
    // cannot hide a forbidden segment from detection.
    for pattern in &policy.security.forbidden_patterns {
        if !pattern.is_empty() && raw.contains(pattern.as_str()) {
            return ValidationResult::rejected(
                ErrorKind::SecurityBlocked,
                format!("path contains forbidden pattern `{pattern}`"),
            )
            .with_detail("pattern", Value::String(pattern.clone()));
        }
    }

    let depth = path_depth(path);
    if depth > policy.platform.max_path_depth {
        return ValidationResult::rejected(
            ErrorKind::SecurityBlocked,
            format!(
                "path depth {depth} exceeds the maximum of {}",
                policy.platform.max_path_depth
            ),
        )
        .with_detail("depth", Value::from(depth))
        .with_detail("max_depth", Value::from(policy.platform.max_path_depth));
    }

    if let Some(verdict) = check_drive_allowlist(path, policy) {
        return verdict;
    }

    if policy.check_exists && !path.exists() {
        return ValidationResult::rejected(
            ErrorKind::NotFound,
            format!("path does not exist: {}", path.display()),
        );
    }

    if policy.check_readable && !probe_readable(path) {
        return ValidationResult::rejected(
            ErrorKind::PermissionDenied,
            format!("path is not readable: {}", path.display()),
        );
    }

    ValidationResult::pass()
}

/// Number of path segments excluding the root/drive anchor.
fn path_depth(path: &Path) -> usize {
    path.components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .count()
}

/// Drive allowlist verdict, or `None` when the check doesn't apply
/// (no allowlist configured, or the path has no drive component).
fn check_drive_allowlist(path: &Path, policy: &Policy) -> Option<ValidationResult> {
    if policy.platform.allowed_drives.is_empty() {
        return None;
    }
    let drive = drive_letter(path)?;
    let allowed = policy
        .platform
        .allowed_drives
        .iter()
        .filter_map(|entry| entry.chars().next())
        .any(|letter| letter.to_ascii_uppercase() == drive);
    if allowed {
        return None;
    }
    Some(
        ValidationResult::rejected(
            ErrorKind::SecurityBlocked,
            format!("drive `{drive}:` is not in the allowed list"),
        )
        .with_detail("drive", Value::String(drive.to_string())),
    )
}

/// Uppercased drive letter of a `X:`-prefixed path. Checked lexically so
/// drive-letter paths behave identically on every platform.
fn drive_letter(path: &Path) -> Option<char> {
    let text = path.to_string_lossy();
    let mut chars = text.chars();
    let letter = chars.next()?;
    if letter.is_ascii_alphabetic() && chars.next() == Some(':') {
        return Some(letter.to_ascii_uppercase());
    }
    None
}

/// Best-effort readability probe.
fn probe_readable(path: &Path) -> bool {
    if path.is_dir() {
        return std::fs::read_dir(path).is_ok();
    }
    std::fs::File::open(path).is_ok()
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::policy::Policy;

    fn path_target(raw: &str, path: &str) -> ResolvedTarget {
        ResolvedTarget::Path {
            path: PathBuf::from(path),
            raw: raw.to_string(),
        }
    }

    fn open_policy() -> Policy {
        let mut policy = Policy::default();
        policy.security.allowed_protocols = vec!["https".to_string()];
        policy.security.allowed_domains = vec!["example.com".to_string()];
        policy
    }

    #[test]
    fn empty_domain_allowlist_rejects_every_https_url() {
        let mut policy = Policy::default();
        policy.security.allowed_protocols = vec!["https".to_string()];
        let verdict = validate(&ResolvedTarget::Url("https://example.com".to_string()), &policy);
        assert!(!verdict.ok);
        assert_eq!(verdict.error_kind, Some(ErrorKind::SecurityBlocked));
    }

    #[test]
    fn empty_protocol_allowlist_rejects_every_scheme() {
        let policy = Policy::default();
        let verdict = validate(&ResolvedTarget::Url("https://example.com".to_string()), &policy);
        assert!(!verdict.ok);
        let verdict = validate(
            &ResolvedTarget::Url("mailto:team@example.com".to_string()),
            &policy,
        );
        assert!(!verdict.ok);
    }

    #[test]
    fn allowed_protocol_and_domain_pass() {
        let verdict = validate(
            &ResolvedTarget::Url("https://example.com/page".to_string()),
            &open_policy(),
        );
        assert!(verdict.ok);
        assert!(verdict.error_kind.is_none());
    }

    #[test]
    fn http_rejected_when_only_https_listed() {
        let verdict = validate(
            &ResolvedTarget::Url("http://example.com".to_string()),
            &open_policy(),
        );
        assert!(!verdict.ok);
        assert_eq!(
            verdict.details.get("protocol"),
            Some(&Value::String("http".to_string()))
        );
    }

    #[test]
    fn unlisted_domain_rejected_with_detail() {
        let verdict = validate(
            &ResolvedTarget::Url("https://evil.example.net".to_string()),
            &open_policy(),
        );
        assert!(!verdict.ok);
        assert_eq!(
            verdict.details.get("domain"),
            Some(&Value::String("evil.example.net".to_string()))
        );
    }

    #[test]
    fn mailto_passes_on_protocol_allowlist_alone() {
        let mut policy = Policy::default();
        policy.security.allowed_protocols = vec!["mailto".to_string()];
        let verdict = validate(
            &ResolvedTarget::Url("mailto:team@example.com".to_string()),
            &policy,
        );
        assert!(verdict.ok);
    }

    #[test]
    fn forbidden_pattern_checked_on_raw_expression() {
        let mut policy = Policy::default();
        policy.check_exists = false;
        policy.security.forbidden_patterns = vec!["~".to_string()];
        // The normalized path no longer contains the tilde segment; the
        // raw expression still does.
        let verdict = validate(&path_target("~/secret/doc.md", "/home/user/secret/doc.md"), &policy);
        assert!(!verdict.ok);
        assert_eq!(verdict.error_kind, Some(ErrorKind::SecurityBlocked));
        assert_eq!(
            verdict.details.get("pattern"),
            Some(&Value::String("~".to_string()))
        );
    }

    #[test]
    fn depth_check_runs_before_existence_check() {
        let mut policy = Policy::default();
        policy.platform.max_path_depth = 3;
        // Deep and nonexistent: must come back SecurityBlocked, not NotFound.
        let verdict = validate(
            &path_target("a/b/c/d/e.md", "/no/such/base/a/b/c/d/e.md"),
            &policy,
        );
        assert!(!verdict.ok);
        assert_eq!(verdict.error_kind, Some(ErrorKind::SecurityBlocked));
        assert_eq!(verdict.details.get("depth"), Some(&Value::from(8u64)));
    }

    #[test]
    fn missing_path_is_not_found_when_existence_required() {
        let policy = Policy::default();
        let verdict = validate(&path_target("docs/no_such.md", "docs/no_such.md"), &policy);
        assert!(!verdict.ok);
        assert_eq!(verdict.error_kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn existing_path_passes_existence_check() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# doc\n").unwrap();

        let target = ResolvedTarget::Path {
            path: file.clone(),
            raw: file.to_string_lossy().to_string(),
        };
        let verdict = validate(&target, &Policy::default());
        assert!(verdict.ok, "{}", verdict.message);
    }

    #[test]
    fn existence_check_skipped_when_disabled() {
        let mut policy = Policy::default();
        policy.check_exists = false;
        let verdict = validate(&path_target("docs/no_such.md", "docs/no_such.md"), &policy);
        assert!(verdict.ok);
    }

    #[test]
    fn drive_allowlist_rejects_unlisted_drive() {
        let mut policy = Policy::default();
        policy.check_exists = false;
        policy.platform.allowed_drives = vec!["C".to_string()];
        let verdict = validate(&path_target("E:/data/doc.md", "E:/data/doc.md"), &policy);
        assert!(!verdict.ok);
        assert_eq!(
            verdict.details.get("drive"),
            Some(&Value::String("E".to_string()))
        );
    }

    #[test]
    fn drive_allowlist_is_case_insensitive() {
        let mut policy = Policy::default();
        policy.check_exists = false;
        policy.platform.allowed_drives = vec!["c:".to_string()];
        let verdict = validate(&path_target("C:/data/doc.md", "C:/data/doc.md"), &policy);
        assert!(verdict.ok);
    }

    #[test]
    fn driveless_path_ignores_drive_allowlist() {
        let mut policy = Policy::default();
        policy.check_exists = false;
        policy.platform.allowed_drives = vec!["C".to_string()];
        let verdict = validate(&path_target("docs/a.md", "docs/a.md"), &policy);
        assert!(verdict.ok);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_permission_denied_when_probing_enabled() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("locked.md");
        std::fs::write(&file, "# locked\n").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged processes bypass mode bits; the probe only means
        // something when the OS actually enforces them.
        if std::fs::read(&file).is_ok() {
            return;
        }

        let mut policy = Policy::default();
        policy.check_readable = true;
        let target = ResolvedTarget::Path {
            path: file.clone(),
            raw: file.to_string_lossy().to_string(),
        };
        let verdict = validate(&target, &policy);
        assert!(!verdict.ok);
        assert_eq!(verdict.error_kind, Some(ErrorKind::PermissionDenied));
    }

    #[test]
    fn depth_excludes_root_and_drive_anchor() {
        assert_eq!(path_depth(Path::new("/a/b/c")), 3);
        assert_eq!(path_depth(Path::new("a/b/c")), 3);
    }
}
