//! Unit-aware formatting of profile values.

/// Format a profile value for display according to the diagram unit.
pub fn format_value(value: u64, unit: &str) -> String {
    match unit {
        "nanoseconds" | "ns" => format_nanos(value),
        "bytes" => format_bytes(value),
        _ => format_count(value),
    }
}

/// Human time for a nanosecond amount ("1h2m", "3m4.50s", "12ms", "2.50s").
pub fn format_nanos(nanos: u64) -> String {
    let secs = nanos as f64 / 1_000_000_000.0;

    let hours = (secs / 3600.0).floor();
    if hours >= 1.0 {
        let minutes = ((secs % 3600.0) / 60.0).floor();
        return format!("{}h{}m", hours as u64, minutes as u64);
    }

    let minutes = (secs / 60.0).floor();
    if minutes >= 1.0 {
        return format!("{}m{:.2}s", minutes as u64, secs % 60.0);
    }

    let millis = secs * 1000.0;
    if millis >= 1000.0 {
        format!("{:.2}s", secs)
    } else if millis >= 1.0 {
        format!("{:.0}ms", millis)
    } else {
        format!("{:.0}µs", millis * 1000.0)
    }
}

/// Format a byte amount with binary prefixes.
pub fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    let n = n as f64;
    if n >= KB * KB * KB {
        format!("{:.1}GB", n / (KB * KB * KB))
    } else if n >= KB * KB {
        format!("{:.1}MB", n / (KB * KB))
    } else if n >= KB {
        format!("{:.1}KB", n / KB)
    } else {
        format!("{}B", n as u64)
    }
}

/// Format large numbers with K/M suffixes
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Share of `part` in `whole` as a percentage string.
pub fn format_ratio(part: u64, whole: u64) -> String {
    if whole == 0 {
        "0.00%".to_string()
    } else {
        format!("{:.2}%", part as f64 * 100.0 / whole as f64)
    }
}
