use chrono::{DateTime, Local, TimeZone};

pub fn fmt_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.0} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Wall-clock time of a transcript row, in the local zone.
pub fn fmt_clock(ms: i64) -> String {
    fmt_clock_in(ms, &Local)
}

pub fn fmt_clock_in<Tz: TimeZone>(ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp_millis(ms) {
        Some(utc) => utc.with_timezone(tz).format("%H:%M:%S").to_string(),
        None => "--:--:--".into(),
    }
}

/// Links from the backend may be relative to it (the map page is served as
/// `/sos_map.html?t=...`).
pub fn resolve_link(base_url: &str, link: &str) -> String {
    let link = link.trim();
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if link.starts_with('/') {
        format!("{}{}", base, link)
    } else {
        format!("{}/{}", base, link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn bytes_pick_a_unit() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2 KB");
        assert_eq!(fmt_bytes(3 * 1_048_576), "3.0 MB");
    }

    #[test]
    fn clock_formats_epoch_millis() {
        // 2024-01-01T12:34:56.789Z
        assert_eq!(fmt_clock_in(1_704_112_496_789, &Utc), "12:34:56");
    }

    #[test]
    fn clock_handles_out_of_range() {
        assert_eq!(fmt_clock_in(i64::MAX, &Utc), "--:--:--");
    }

    #[test]
    fn relative_links_resolve_against_backend() {
        assert_eq!(
            resolve_link("http://127.0.0.1:5000/", "/sos_map.html?t=1"),
            "http://127.0.0.1:5000/sos_map.html?t=1"
        );
        assert_eq!(
            resolve_link("http://host", "maps/a.html"),
            "http://host/maps/a.html"
        );
        assert_eq!(
            resolve_link("http://host", "https://tiles.example.org/m"),
            "https://tiles.example.org/m"
        );
    }
}
