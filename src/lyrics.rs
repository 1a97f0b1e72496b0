//! Timestamped lyric parsing and position lookup.
//!
//! Lyric files use the LRC convention: each line carries one or more leading
//! `[mm:ss.xx]` tags followed by the text shown from that moment on.

use std::time::Duration;

#[cfg(test)]
mod tests;

/// One timed line of lyrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub time: Duration,
    pub text: String,
}

/// Parse a `[mm:ss.xx]` (or `[mm:ss]`, `[mm:ss:xx]`) tag at the start of `src`.
///
/// Returns the number of bytes consumed and the timestamp.
fn parse_tag(src: &str) -> Option<(usize, Duration)> {
    let rest = src.strip_prefix('[')?;
    let end = rest.find(']')?;
    let body = &rest[..end];

    let (minutes, rest_of_body) = body.split_once(':')?;
    let (seconds, fraction) = match rest_of_body.find(['.', ':']) {
        Some(i) => (&rest_of_body[..i], Some(&rest_of_body[i + 1..])),
        None => (rest_of_body, None),
    };

    // Metadata tags like [ar:Artist] fail here.
    if minutes.is_empty() || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    let millis = match fraction {
        None => 0,
        Some(f) if f.is_empty() || f.len() > 3 || !f.bytes().all(|b| b.is_ascii_digit()) => {
            return None;
        }
        Some(f) => {
            let value: u64 = f.parse().ok()?;
            match f.len() {
                1 => value * 100,
                2 => value * 10,
                _ => value,
            }
        }
    };

    // Out-of-range tags are dropped rather than wrapped.
    let total = minutes
        .checked_mul(60_000)
        .and_then(|ms| ms.checked_add(seconds.checked_mul(1000)?))
        .and_then(|ms| ms.checked_add(millis))
        .map(Duration::from_millis)?;
    // '[' + body + ']'
    Some((end + 2, total))
}

/// Parse one source line into zero or more lyric lines (one per leading tag).
fn parse_line(line: &str, out: &mut Vec<LyricLine>) {
    let line = line.trim();
    let mut pos = 0;
    let mut times = Vec::new();

    while let Some((consumed, time)) = parse_tag(&line[pos..]) {
        times.push(time);
        pos += consumed;
    }

    if times.is_empty() {
        return;
    }

    let text = line[pos..].trim();
    out.extend(times.into_iter().map(|time| LyricLine {
        time,
        text: text.to_string(),
    }));
}

/// Parse lyric text into lines sorted by timestamp.
///
/// Lines without a recognized timestamp contribute nothing. Lines sharing a
/// timestamp keep the order in which they appeared in `text`.
pub fn parse(text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    // Covers "\n", "\r\n" and bare "\r" endings.
    for raw in text.split('\n').flat_map(|l| l.split('\r')) {
        parse_line(raw, &mut lines);
    }

    // Stable sort: ties keep encounter order.
    lines.sort_by_key(|l| l.time);
    lines
}

/// Index of the line active at `position`.
///
/// This is the last line whose timestamp is not after `position`, clamped to
/// the valid range: positions before the first line map to 0 and positions
/// past the last line map to the last index. Callers are expected to pass a
/// non-empty slice; an empty one yields 0.
pub fn current_index(position: Duration, lines: &[LyricLine]) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let after = lines.partition_point(|l| l.time <= position);
    after.saturating_sub(1).min(lines.len() - 1)
}
