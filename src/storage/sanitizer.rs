//! Stored-name generation for uploads.
//!
//! A sanitized name has the shape `{millis}-{hex8}-{encoded}{ext}`:
//! - `millis`: wall-clock time of the upload in milliseconds
//! - `hex8`: four random bytes, hex encoded
//! - `encoded`: the original base name, URL-safe base64 without padding
//! - `ext`: the original extension, unencoded (may be empty)
//!
//! The encoding alphabet excludes `/`, so the result is always a single
//! path segment. The timestamp plus random token keeps two uploads of the
//! same original name apart even when they arrive in the same millisecond.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::Rng;

/// Derive a collision-resistant, filesystem-safe name for `original`.
pub fn sanitize_file_name(original: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let token: [u8; 4] = rand::thread_rng().gen();
    sanitize_with(original, millis, token)
}

fn sanitize_with(original: &str, millis: i64, token: [u8; 4]) -> String {
    let (base, ext) = split_extension(final_component(original));
    format!(
        "{}-{}-{}{}",
        millis,
        hex::encode(token),
        URL_SAFE_NO_PAD.encode(base.as_bytes()),
        ext
    )
}

/// Recover `base + ext` from a name produced by [`sanitize_file_name`].
///
/// Returns `None` for names that do not have the sanitized shape.
pub fn decode_original(stored: &str) -> Option<String> {
    let mut parts = stored.splitn(3, '-');
    let millis = parts.next()?;
    let token = parts.next()?;
    let rest = parts.next()?;

    if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() != 8 || hex::decode(token).is_err() {
        return None;
    }

    // The encoded base never contains '.', so the first dot starts the extension.
    let (encoded, ext) = match rest.find('.') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    let base = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    let base = String::from_utf8(base).ok()?;
    Some(format!("{}{}", base, ext))
}

/// Last path component, treating both separators as boundaries.
fn final_component(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Split `name` into base and extension; a leading dot is not an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
