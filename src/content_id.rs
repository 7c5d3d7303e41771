// Content identifier handling for the metadata store.
//
// Accepted input forms, all normalized to the same bare content path:
//   - URI scheme:    ipfs://<cid>[/sub/path]   (also ipfs://ipfs/<cid>)
//   - gateway path:  https://host/ipfs/<cid>[/sub/path]
//   - bare:          <cid>[/sub/path]

use url::Url;

/// Extracts the bare content path (`<cid>[/sub/path]`) from any accepted
/// form. Returns `None` for empty input or URLs of unrelated schemes.
pub fn extract_content_path(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("ipfs://") {
        // ipfs://ipfs/<cid> shows up in the wild; collapse the double prefix
        let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
        return non_empty(rest.trim_start_matches('/'));
    }
    if let Some(idx) = trimmed.find("/ipfs/") {
        return non_empty(&trimmed[idx + "/ipfs/".len()..]);
    }
    if trimmed.contains("://") {
        // Some other scheme entirely; not content-addressed.
        return None;
    }
    non_empty(trimmed.trim_start_matches('/'))
}

/// The bare identifier alone, with any sub-path stripped.
pub fn extract_cid(input: &str) -> Option<String> {
    let path = extract_content_path(input)?;
    Some(path.split('/').next().unwrap_or(&path).to_string())
}

/// Derives the HTTPS gateway URL for any accepted identifier form.
pub fn gateway_url(input: &str, gateway_base: &str) -> Option<String> {
    let path = extract_content_path(input)?;
    let mut base = gateway_base.trim().to_string();
    if base.is_empty() {
        return None;
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base).ok()?;
    base.join(&path).ok().map(|u| u.to_string())
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
