//! Path normalization for client-supplied and archive-supplied names.
//!
//! Normalized paths use `/` as separator and carry no leading or trailing
//! separator. The root directory is the empty string.

/// Resolve a client path against the session's current directory.
///
/// Absolute input ignores `current_directory`. `.` segments and repeated
/// separators are dropped; `..` pops one segment and is a no-op at root.
pub fn resolve(current_directory: &str, input: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    if !input.starts_with('/') {
        segments.extend(current_directory.split('/').filter(|s| !s.is_empty()));
    }

    for segment in input.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    segments.join("/")
}

/// Normalize a raw archive member name.
///
/// Returns the normalized path and whether the name carried a trailing
/// separator (an explicit directory marker). Names that normalize to
/// nothing, or that climb out of their parent, are rejected.
pub(crate) fn normalize_entry_name(name: &str) -> Result<(String, bool), &'static str> {
    let marked_dir = name.ends_with('/');
    let trimmed = name.strip_suffix('/').unwrap_or(name);

    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err("name contains a parent directory segment"),
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        return Err("name is empty or only separators");
    }
    Ok((segments.join("/"), marked_dir))
}

/// Parent of a normalized path. Top-level paths have the root (`""`) as
/// parent; the root itself has none.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rfind('/').map_or("", |i| &path[..i]))
}

/// Final segment of a normalized path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Proper ancestors of a normalized path, nearest first, excluding root.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent(path), |&p| parent(p)).take_while(|p| !p.is_empty())
}

/// Render a normalized path the way a client sees it.
pub fn to_client_path(path: &str) -> String {
    format!("/{}", path)
}
