use std::cmp::Ordering;

/// Compares two upstream version strings numerically per dot-separated component.
///
/// Release tags in the wild are rarely clean semver (`v2.0`, `1.2.3-1ubuntu0.1`,
/// `0.57.0-musl`), so both inputs are normalized independently first:
/// a single leading `v` is stripped, everything from the first hyphen on is
/// discarded, and any remaining character that is not a digit or a dot is removed.
///
/// The normalized strings are split on `.` and compared pairwise as unsigned
/// integers; the shorter side is padded with zeros. `compare("v2.0", "2.0.0")`
/// is `Equal`, `compare("1.2.0", "1.10.0")` is `Less`. Malformed input never
/// panics: a component that normalizes to nothing counts as `0`.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = components(&normalize(a));
    let b = components(&normalize(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    Ordering::Equal
}

/// True if `candidate` is strictly newer than `installed`.
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    compare(candidate, installed) == Ordering::Greater
}

/// The normalized form of a version string, as stored in the package database.
/// `v0.57.0-1ubuntu1` -> `0.57.0`.
pub fn normalized(version: &str) -> String {
    normalize(version)
}

fn normalize(version: &str) -> String {
    let version = version.strip_prefix('v').unwrap_or(version);
    let version = version.split('-').next().unwrap_or("");
    version
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

fn components(normalized: &str) -> Vec<u64> {
    normalized
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}
