/// Human-readable byte formatting (B/K/M/G/T/P)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "K", "M", "G", "T", "P"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1}{}", size, UNITS[unit_index])
    }
}

/// Format bytes with both current and total (e.g., "46.3G/46.5G")
pub fn format_bytes_ratio(current: u64, total: u64) -> String {
    format!("{}/{}", format_bytes(current), format_bytes(total))
}

/// Format a counter with thousands grouping (e.g., "98,417,093")
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a percentage with one decimal
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}
