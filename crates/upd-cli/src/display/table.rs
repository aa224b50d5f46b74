//! Upgrade report table.

use colored::{Color, Colorize};
use std::io::{self, Write};
use upd_deps::{DependencyState, Row, UpgradeReport};

/// Box-drawing characters for the table frame
mod box_chars {
    pub const HORIZONTAL: &str = "─";
    pub const VERTICAL: &str = "│";
    pub const TOP: [&str; 3] = ["┌", "┬", "┐"];
    pub const MIDDLE: [&str; 3] = ["├", "┼", "┤"];
    pub const BOTTOM: [&str; 3] = ["└", "┴", "┘"];
}

/// Minimum content widths of the four columns
const MIN_WIDTHS: [usize; 4] = [35, 12, 12, 7];

/// Content width of the all-up-to-date banner
const BANNER_WIDTH: usize = 75;

const UP_TO_DATE: &str = "ALL PACKAGE DEPENDENCIES UP-TO-DATE";

/// A table cell: the visible text and its colored rendering
#[derive(Debug, Clone)]
struct Cell {
    plain: String,
    styled: String,
}

impl Cell {
    fn new(plain: impl Into<String>, styled: impl ToString) -> Self {
        Self {
            plain: plain.into(),
            styled: styled.to_string(),
        }
    }

    fn width(&self) -> usize {
        self.plain.chars().count()
    }
}

/// Print the report: a table of updated and failed rows (all rows with
/// `show_all`), or a banner when there is nothing to show
pub fn render_report<W: Write>(
    writer: &mut W,
    report: &UpgradeReport,
    show_all: bool,
) -> io::Result<()> {
    if !(report.any_updates() || report.errors > 0 || show_all) {
        return print_banner(writer, UP_TO_DATE);
    }

    let rows: Vec<[Cell; 4]> = report
        .rows
        .iter()
        .filter(|row| show_all || is_highlighted(row.state))
        .map(row_cells)
        .collect();
    print_table(writer, &header_cells(), &rows)?;

    for row in report.rows.iter().filter(|row| row.state == DependencyState::Error) {
        if let Some(message) = &row.message {
            writeln!(writer, "{} {}: {}", "error".red(), row.name, message)?;
        }
    }
    Ok(())
}

fn is_highlighted(state: DependencyState) -> bool {
    matches!(state, DependencyState::Updated | DependencyState::Error)
}

fn header_cells() -> [Cell; 4] {
    [
        Cell::new("MODULE NAME", "MODULE NAME".bold()),
        Cell::new(
            "VERSION OLD",
            format!("{}{}", "VERSION ".bold(), "OLD".red().bold()),
        ),
        Cell::new(
            "VERSION NEW",
            format!("{}{}", "VERSION ".bold(), "NEW".green().bold()),
        ),
        Cell::new("STATE", "STATE".bold()),
    ]
}

fn row_cells(row: &Row) -> [Cell; 4] {
    let state = row.state.as_str();
    match row.state {
        DependencyState::Updated => [
            Cell::new(row.name.as_str(), row.name.as_str()),
            Cell::new(
                row.old_specifier.as_str(),
                mark(&row.new_specifier, &row.old_specifier, Color::Red),
            ),
            Cell::new(
                row.new_specifier.as_str(),
                mark(&row.old_specifier, &row.new_specifier, Color::Green),
            ),
            Cell::new(state, state.green()),
        ],
        _ => {
            let state_styled = if row.state == DependencyState::Error {
                state.red()
            } else {
                state.bright_black()
            };
            [
                Cell::new(row.name.as_str(), row.name.bright_black()),
                Cell::new(row.old_specifier.as_str(), row.old_specifier.bright_black()),
                Cell::new(row.new_specifier.as_str(), row.new_specifier.bright_black()),
                Cell::new(state, state_styled),
            ]
        }
    }
}

/// Render `to`, coloring the middle part that differs from `from`
fn mark(from: &str, to: &str, color: Color) -> String {
    let from: Vec<char> = from.chars().collect();
    let to: Vec<char> = to.chars().collect();

    let prefix = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let max_suffix = from.len().min(to.len()) - prefix;
    let suffix = from
        .iter()
        .rev()
        .zip(to.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let head: String = to[..prefix].iter().collect();
    let middle: String = to[prefix..to.len() - suffix].iter().collect();
    let tail: String = to[to.len() - suffix..].iter().collect();
    format!("{head}{}{tail}", middle.color(color))
}

fn print_table<W: Write>(writer: &mut W, header: &[Cell; 4], rows: &[[Cell; 4]]) -> io::Result<()> {
    let mut widths = MIN_WIDTHS;
    for cells in std::iter::once(header).chain(rows) {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.width());
        }
    }

    print_rule(writer, &widths, box_chars::TOP)?;
    print_cells(writer, &widths, header)?;
    print_rule(writer, &widths, box_chars::MIDDLE)?;
    for cells in rows {
        print_cells(writer, &widths, cells)?;
    }
    print_rule(writer, &widths, box_chars::BOTTOM)
}

fn print_rule<W: Write>(writer: &mut W, widths: &[usize], chars: [&str; 3]) -> io::Result<()> {
    let segments: Vec<String> = widths
        .iter()
        .map(|width| box_chars::HORIZONTAL.repeat(width + 2))
        .collect();
    let line = format!("{}{}{}", chars[0], segments.join(chars[1]), chars[2]);
    writeln!(writer, "{}", line.bright_black())
}

fn print_cells<W: Write>(writer: &mut W, widths: &[usize], cells: &[Cell]) -> io::Result<()> {
    let border = box_chars::VERTICAL.bright_black();
    write!(writer, "{border}")?;
    for (width, cell) in widths.iter().zip(cells) {
        let padding = " ".repeat(width - cell.width());
        write!(writer, " {}{padding} {border}", cell.styled)?;
    }
    writeln!(writer)
}

fn print_banner<W: Write>(writer: &mut W, text: &str) -> io::Result<()> {
    let width = BANNER_WIDTH.max(text.chars().count());
    let left = (width - text.chars().count()) / 2;
    let right = width - text.chars().count() - left;
    let rule = box_chars::HORIZONTAL.repeat(width + 2);

    writeln!(writer, "{}", format!("┌{rule}┐").bright_black())?;
    writeln!(
        writer,
        "{} {}{}{} {}",
        box_chars::VERTICAL.bright_black(),
        " ".repeat(left),
        text.green(),
        " ".repeat(right),
        box_chars::VERTICAL.bright_black()
    )?;
    writeln!(writer, "{}", format!("└{rule}┘").bright_black())
}

#[cfg(test)]
mod tests {
    use super::*;
    use upd_deps::DependencySection;

    fn row(name: &str, old: &str, new: &str, state: DependencyState) -> Row {
        Row {
            name: name.to_string(),
            section: DependencySection::Dependencies,
            old_specifier: old.to_string(),
            new_specifier: new.to_string(),
            state,
            message: None,
        }
    }

    fn report(rows: Vec<Row>) -> UpgradeReport {
        let count = |state| rows.iter().filter(|r| r.state == state).count();
        UpgradeReport {
            updated: count(DependencyState::Updated),
            errors: count(DependencyState::Error),
            rows,
            document: None,
            written: false,
        }
    }

    fn render(report: &UpgradeReport, show_all: bool) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        render_report(&mut out, report, show_all).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_only_updated_and_error_rows_by_default() {
        let mut failed = row("ghost", "1.0.0", "", DependencyState::Error);
        failed.message = Some("package not found: ghost".to_string());
        let report = report(vec![
            row("react", "^17.0.2", "^18.2.0", DependencyState::Updated),
            row("lodash", "4.17.21", "4.17.21", DependencyState::Kept),
            failed,
        ]);

        let output = render(&report, false);
        assert!(output.contains("MODULE NAME"));
        assert!(output.contains("react"));
        assert!(output.contains("^18.2.0"));
        assert!(output.contains("ghost"));
        assert!(!output.contains("lodash"));
        assert!(output.contains("error ghost: package not found: ghost"));
    }

    #[test]
    fn test_show_all_includes_every_row() {
        let report = report(vec![
            row("lodash", "4.17.21", "4.17.21", DependencyState::Kept),
            row("left-pad", "1.0.0", "1.0.0", DependencyState::Ignored),
        ]);

        let output = render(&report, true);
        assert!(output.contains("lodash"));
        assert!(output.contains("left-pad"));
        assert!(output.contains("ignored"));
        assert!(!output.contains(UP_TO_DATE));
    }

    #[test]
    fn test_banner_when_nothing_changed() {
        let report = report(vec![row("lodash", "4.17.21", "4.17.21", DependencyState::Kept)]);

        let output = render(&report, false);
        assert!(output.contains(UP_TO_DATE));
        assert!(!output.contains("lodash"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_lines_are_aligned() {
        let long_name = "@some-scope/a-package-name-longer-than-the-column";
        let report = report(vec![
            row("react", "^17.0.2", "^18.2.0", DependencyState::Updated),
            row(long_name, "1.0.0", "2.0.0", DependencyState::Updated),
        ]);

        let output = render(&report, false);
        let widths: Vec<usize> = output.lines().map(|line| line.chars().count()).collect();
        assert_eq!(widths.len(), 6);
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(output.contains(long_name));
    }

    #[test]
    fn test_mark_without_colors_is_identity() {
        colored::control::set_override(false);
        assert_eq!(mark("^17.0.2", "^18.2.0", Color::Green), "^18.2.0");
        assert_eq!(mark("1.0.0", "1.0.0", Color::Green), "1.0.0");
        assert_eq!(mark("", "2.0.0", Color::Red), "2.0.0");
    }
}
