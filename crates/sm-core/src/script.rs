//! Helpers for pointing at a location inside a script, used to give
//! execution errors some context.

/// 1-based line and column of byte `offset` in `data`.
///
/// Offsets past the end are clamped to the end of the data.
pub fn line_column_from_offset(data: &[u8], offset: usize) -> (usize, usize) {
    let offset = offset.min(data.len());
    let before = &data[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    (line, offset - line_start + 1)
}

/// The lines around 1-based `line`: up to `before` lines above it and
/// `after` lines below it. With `line_numbers`, each line is prefixed by its
/// right-aligned number and `": "`.
pub fn lines_before_and_after(
    data: &[u8],
    line: usize,
    before: usize,
    after: usize,
    line_numbers: bool,
) -> String {
    let text = String::from_utf8_lossy(data);
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.is_empty() || line == 0 {
        return String::new();
    }

    let first = line.saturating_sub(before).max(1);
    let last = (line + after).min(lines.len());
    if first > last {
        return String::new();
    }
    let width = last.to_string().len();

    lines[first - 1..last]
        .iter()
        .zip(first..)
        .map(|(l, n)| {
            if line_numbers {
                format!("{n:>width$}: {l}")
            } else {
                (*l).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
