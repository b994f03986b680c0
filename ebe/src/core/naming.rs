//! Staged file naming: `[<identity>][_<filename>][<suffix>]`.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(0);

/// Optional components of a staged file name.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    /// Scope token, usually the id of the caller that owns the file.
    pub identity: Option<String>,
    /// Name fragment appended after the identity, separated by `_`.
    pub filename: Option<String>,
    /// Appended verbatim, e.g. a file extension such as `.cfl`.
    pub suffix: Option<String>,
}

/// Return a token that no other call in this process will return.
///
/// The process id is included so concurrent processes sharing a temp
/// directory do not collide either.
pub fn unique_identity() -> String {
    let n = NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed);
    format!("ebe-{}-{n}", process::id())
}

/// Compose the base file name for `parts`.
///
/// Without an identity or filename the identity falls back to
/// [`unique_identity`], so the suffix alone never names a file.
pub fn compose_name(parts: &NameParts) -> String {
    let identity = non_empty(&parts.identity);
    let filename = non_empty(&parts.filename);

    let mut name = String::new();
    match (identity, filename) {
        (None, None) => name.push_str(&unique_identity()),
        (Some(identity), None) => name.push_str(identity),
        (None, Some(filename)) => name.push_str(filename),
        (Some(identity), Some(filename)) => {
            name.push_str(identity);
            name.push('_');
            name.push_str(filename);
        }
    }
    if let Some(suffix) = non_empty(&parts.suffix) {
        name.push_str(suffix);
    }
    name
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
