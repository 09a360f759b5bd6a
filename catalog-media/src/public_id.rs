//! Recovering an asset's public id from its stored delivery URL.
//!
//! Delivery URLs look like
//! `https://res.cloudinary.com/<cloud>/image/upload/v1712345678/products/lamp.jpg`.
//! The public id is everything after `upload` (and after the optional
//! version segment) without the file extension: `products/lamp`.

use tracing::warn;

use crate::error::{MediaError, MediaResult};

pub const DEFAULT_FALLBACK_FOLDER: &str = "products";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicIdSource {
    /// Parsed from a well-formed delivery URL.
    Canonical,
    /// Guessed from the basename; may name the wrong asset.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicId {
    pub value: String,
    pub source: PublicIdSource,
}

impl PublicId {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_guess(&self) -> bool {
        self.source == PublicIdSource::Fallback
    }
}

fn strip_query(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(i) => &url[..i],
        None => url,
    }
}

/// `v` followed by at least one ASCII digit, nothing else.
fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Drops the last extension only: `lamp.v2.jpg` becomes `lamp.v2`, not
/// `lamp` as cutting at the first dot would give. Public ids may contain
/// dots, so a fallback guess for such a file keeps them.
fn strip_extension(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(i) => &segment[..i],
        None => segment,
    }
}

/// Strict parse of a delivery URL.
///
/// Fails with `InvalidUrl` when there is no `upload` segment or nothing
/// follows it.
pub fn parse_public_id(url: &str) -> MediaResult<String> {
    let path = strip_query(url);
    let segments: Vec<&str> = path.split('/').collect();

    let upload_at = segments
        .iter()
        .position(|s| *s == "upload")
        .ok_or_else(|| MediaError::invalid_url(url))?;

    let mut rest = &segments[upload_at + 1..];
    if rest.first().is_some_and(|s| is_version_segment(s)) {
        rest = &rest[1..];
    }

    let Some((last, folders)) = rest.split_last() else {
        return Err(MediaError::invalid_url(url));
    };

    let stem = strip_extension(last);
    if stem.is_empty() {
        return Err(MediaError::invalid_url(url));
    }

    let mut parts: Vec<&str> = folders.to_vec();
    parts.push(stem);
    Ok(parts.join("/"))
}

/// Strict parse, falling back to `<fallback_folder>/<basename>`.
///
/// The fallback matches how assets are laid out when they are uploaded into
/// a single folder, but it is a guess: the caller gets it tagged as
/// [`PublicIdSource::Fallback`].
pub fn recover_public_id(url: &str, fallback_folder: &str) -> MediaResult<PublicId> {
    match parse_public_id(url) {
        Ok(value) => Ok(PublicId {
            value,
            source: PublicIdSource::Canonical,
        }),
        Err(err) => {
            let basename = strip_query(url).rsplit('/').next().unwrap_or_default();
            let stem = strip_extension(basename);
            if stem.is_empty() {
                return Err(err);
            }

            let folder = fallback_folder.trim_matches('/');
            let value = if folder.is_empty() {
                stem.to_string()
            } else {
                format!("{folder}/{stem}")
            };

            warn!(url, public_id = %value, "no upload segment in media URL, guessing public id");
            Ok(PublicId {
                value,
                source: PublicIdSource::Fallback,
            })
        }
    }
}
