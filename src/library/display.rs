/// Build the list label for a track: `Artist - Title`, or just the title.
pub fn display_name(title: &str, artist: Option<&str>) -> String {
    match artist.map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => format!("{} - {}", a, title.trim()),
        None => title.trim().to_string(),
    }
}
