//! Remote path handling.
//!
//! FTP and SFTP paths are `/`-separated strings regardless of the host
//! platform, so they are handled as text rather than `std::path::Path`.

/// Normalize a remote path: collapse repeated `/`, resolve `.` and `..`.
///
/// Absolute paths stay absolute and `..` never climbs above `/`. Relative
/// paths keep leading `..` components and normalize to `.` when empty.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    if absolute {
        format!("/{}", parts.join("/"))
    } else if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Split a path into its parent directory and base name.
///
/// The root (`/`) and the current directory (`.`) have no base name.
pub fn split(path: &str) -> (String, Option<String>) {
    let normalized = normalize(path);
    if normalized == "/" || normalized == "." || normalized.ends_with("..") {
        return (normalized, None);
    }
    match normalized.rsplit_once('/') {
        Some(("", name)) => ("/".to_string(), Some(name.to_string())),
        Some((parent, name)) => (parent.to_string(), Some(name.to_string())),
        None => (".".to_string(), Some(normalized)),
    }
}

/// Join a directory and an entry name.
pub fn join(dir: &str, name: &str) -> String {
    match dir {
        "/" => format!("/{name}"),
        "" | "." => name.to_string(),
        _ => format!("{}/{name}", dir.trim_end_matches('/')),
    }
}

/// Every directory that must exist for `path` to exist, outermost first,
/// ending with `path` itself.
///
/// `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`.
pub fn ancestors(path: &str) -> Vec<String> {
    let normalized = normalize(path);
    let absolute = normalized.starts_with('/');
    let mut current = if absolute { "/".to_string() } else { ".".to_string() };
    let mut result = Vec::new();
    for part in normalized.split('/').filter(|p| !p.is_empty() && *p != ".") {
        current = join(&current, part);
        result.push(current.clone());
    }
    result
}
