use std::path::Path;

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// The year of a data file, from the first four characters of its name
/// (`2012.csv`, `2012-2020.csv`).
pub fn year_from_file_name(path: &Path) -> Option<u32> {
    let name = simplify_file_name(path);
    name.get(..4)?.parse::<u32>().ok()
}

/// A vote count, possibly with thousands separators.
pub fn parse_count(s: &str) -> Option<u64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<u64>().ok()
}

/// `1234567` as `1,234,567`.
pub fn format_count(x: u64) -> String {
    let digits = x.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}
