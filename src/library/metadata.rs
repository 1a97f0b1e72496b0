//! Track metadata: embedded tags first, file name as a fallback.
//!
//! File names are parsed with a best-effort heuristic. Many real names are
//! ambiguous, so the result is only used for fields the tags leave empty.

use std::path::Path;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;

/// Values that taggers write when they know nothing.
const PLACEHOLDERS: &[&str] = &[
    "unknown",
    "unknown artist",
    "unknown album",
    "unknown title",
    "<unknown>",
    "未知",
    "未知艺术家",
    "未知专辑",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Duration,
}

#[derive(Debug, Default)]
struct EmbeddedTags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration: Duration,
}

fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || PLACEHOLDERS.iter().any(|p| v.eq_ignore_ascii_case(p))
}

fn meaningful(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !is_placeholder(v))
}

fn read_embedded(path: &Path) -> Option<EmbeddedTags> {
    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no readable tags");
            return None;
        }
    };

    let mut tags = EmbeddedTags {
        duration: tagged.properties().duration(),
        ..EmbeddedTags::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        tags.title = meaningful(tag.title().map(|v| v.to_string()));
        tags.artist = meaningful(tag.artist().map(|v| v.to_string()));
        tags.album = meaningful(tag.album().map(|v| v.to_string()));
    }

    Some(tags)
}

/// Read metadata for the audio file at `path`.
///
/// Never fails: unreadable tags fall back to [`parse_filename`].
pub fn read_metadata(path: &Path, artist_keywords: &[String]) -> TrackMetadata {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let embedded = read_embedded(path).unwrap_or_default();

    let (title, artist) = match (embedded.title, embedded.artist) {
        (Some(title), Some(artist)) => (title, Some(artist)),
        (title, artist) => {
            let (file_title, file_artist) = parse_filename(&stem, artist_keywords);
            (title.unwrap_or(file_title), artist.or(file_artist))
        }
    };

    TrackMetadata {
        title,
        artist,
        album: embedded.album,
        duration: embedded.duration,
    }
}

fn both_sides<'a>((l, r): (&'a str, &'a str)) -> Option<(&'a str, &'a str)> {
    let (l, r) = (l.trim(), r.trim());
    (!l.is_empty() && !r.is_empty()).then_some((l, r))
}

/// Split `stem` at the first separator that leaves text on both sides.
///
/// Separators are tried in priority order: `" - "`, `"-"`, a colon (ASCII or
/// fullwidth), `"_"`, then the first run of whitespace.
fn split_stem(stem: &str) -> Option<(&str, &str)> {
    if let Some(parts) = stem.split_once(" - ").and_then(both_sides) {
        return Some(parts);
    }
    if let Some(parts) = stem.split_once('-').and_then(both_sides) {
        return Some(parts);
    }
    if let Some(parts) = stem.split_once([':', '：']).and_then(both_sides) {
        return Some(parts);
    }
    if let Some(parts) = stem.split_once('_').and_then(both_sides) {
        return Some(parts);
    }
    stem.trim()
        .split_once(char::is_whitespace)
        .and_then(both_sides)
}

/// Whether `side` names an artist according to `keywords`.
///
/// ASCII keywords match whole words, case-insensitively; other keywords
/// (e.g. CJK) match anywhere in the text.
fn has_artist_keyword(side: &str, keywords: &[String]) -> bool {
    let lower = side.to_lowercase();
    keywords.iter().any(|kw| {
        let kw = kw
            .trim()
            .trim_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        if kw.is_empty() {
            false
        } else if kw.is_ascii() {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == kw)
        } else {
            lower.contains(&kw)
        }
    })
}

/// Guess `(title, artist)` from a file stem.
///
/// A side containing an artist keyword is the artist. Without one, the first
/// part is the title and the second the artist. Without a usable separator the
/// whole stem is the title.
pub fn parse_filename(stem: &str, artist_keywords: &[String]) -> (String, Option<String>) {
    let Some((left, right)) = split_stem(stem) else {
        return (stem.trim().to_string(), None);
    };

    // A keyword on the right agrees with the title-first convention.
    if has_artist_keyword(left, artist_keywords) {
        (right.to_string(), Some(left.to_string()))
    } else {
        (left.to_string(), Some(right.to_string()))
    }
}
