//! Shared validation helpers used by all domain validators.

use regex::Regex;
use std::sync::LazyLock;

static ICE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(stun|stuns|turn|turns):[^\s:/?]+(:\d{1,5})?(\?transport=(udp|tcp))?$")
        .expect("ICE URL regex is valid")
});

/// Push an error if `value` is outside `[min, max]` (integer).
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error for each entry that is not a `stun:`/`turn:` URL,
/// or that uses the wrong scheme family for its list.
pub(crate) fn validate_ice_urls(
    errors: &mut Vec<String>,
    name: &str,
    urls: &[String],
    schemes: &[&str],
) {
    for (i, url) in urls.iter().enumerate() {
        if !ICE_URL.is_match(url) {
            errors.push(format!("{name}[{i}] = {url:?} is not a valid ICE server URL"));
            continue;
        }
        let scheme = url.split(':').next().unwrap_or_default();
        if !schemes.contains(&scheme) {
            errors.push(format!(
                "{name}[{i}] = {url:?} must use one of: {}",
                schemes.join(", ")
            ));
        }
    }
}
