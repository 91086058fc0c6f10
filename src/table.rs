//! Plain-text rendering of report tables for the console.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders `rows` under `headers`; columns without an entry in `align` are left-aligned.
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>], align: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(sanitize_cell(cell).chars().count());
        }
    }

    let mut output = String::new();
    if !title.is_empty() {
        let _ = writeln!(output, "{title}");
    }
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths, align));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, align));
    }
    output
}

pub fn print_table(title: &str, headers: &[&str], rows: &[Vec<String>], align: &[Align]) {
    print!("{}", render_table(title, headers, rows, align));
    println!();
}

fn format_row(values: &[String], widths: &[usize], align: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let width = *width;
            let cell = sanitize_cell(value);
            match align.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => format!("{cell:<width$}"),
                Align::Right => format!("{cell:>width$}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_table_aligns_numbers_right() {
        let rows = vec![
            vec!["Laptop".to_string(), "$1,200".to_string()],
            vec!["Cable".to_string(), "$20".to_string()],
        ];
        let rendered = render_table("", &["category", "total"], &rows, &[Align::Left, Align::Right]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "category   total",
                "--------  ------",
                "Laptop    $1,200",
                "Cable        $20",
            ]
        );
    }

    #[test]
    fn render_table_flattens_control_characters() {
        let rows = vec![vec!["line1\nline2\tvalue".to_string()]];
        let rendered = render_table("Notes", &["note"], &rows, &[]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Notes");
        assert_eq!(lines[3], "line1 line2 value");
    }
}
