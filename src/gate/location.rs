/// Compute the `Location` a gate emits for an anonymous request.
///
/// Without a mount prefix the target is emitted verbatim. With one, the target
/// is anchored under the mount (unless it already lives there) and expressed
/// relative to the directory of `request_path`, so a gate installed once can
/// redirect correctly from any sub-application:
///
/// ```
/// use ensure_login::gate::compute_redirect_location;
///
/// assert_eq!(compute_redirect_location("/signin", "/app/foo", Some("/app")), "signin");
/// assert_eq!(compute_redirect_location("/signin", "/sub/foo", Some("/app")), "../app/signin");
/// assert_eq!(compute_redirect_location("/signin", "/sub/foo", None), "/signin");
/// ```
pub fn compute_redirect_location(
    target: &str,
    request_path: &str,
    gate_mount: Option<&str>,
) -> String {
    let Some(mount) = gate_mount.and_then(normalize_mount) else {
        return target.to_string();
    };

    // Absolute URLs point off-site; there is nothing to anchor.
    if target.contains("://") {
        return target.to_string();
    }

    let absolute = mounted_target(target, &mount);
    relative_to(&absolute, request_directory(request_path))
}

/// The target as an absolute path under the mount, e.g. `/app/signin`.
/// This is where a sign-in page belonging to the gate has to be served.
pub fn absolute_target(target: &str, gate_mount: Option<&str>) -> String {
    match gate_mount.and_then(normalize_mount) {
        Some(mount) if !target.contains("://") => mounted_target(target, &mount),
        _ => target.to_string(),
    }
}

/// `/app/` and `app` both mean `/app`. The root mount means no mount at all.
fn normalize_mount(mount: &str) -> Option<String> {
    let trimmed = mount.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

fn mounted_target(target: &str, mount: &str) -> String {
    let inside_mount = target == mount
        || target
            .strip_prefix(mount)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'));

    if inside_mount {
        target.to_string()
    } else if target.starts_with('/') {
        format!("{mount}{target}")
    } else {
        format!("{mount}/{target}")
    }
}

/// Everything up to and including the last `/` of the path, query and
/// fragment excluded. `/app/` is its own directory; `/app` lives in `/`.
fn request_directory(request_path: &str) -> &str {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    }
}

fn relative_to(absolute: &str, directory: &str) -> String {
    let (target_dir, file) = absolute.rsplit_once('/').unwrap_or(("", absolute));

    let from: Vec<&str> = directory.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target_dir.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.push(file);

    let joined = parts.join("/");
    if joined.is_empty() {
        "./".to_string()
    } else {
        joined
    }
}
