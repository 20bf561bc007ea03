//! Header protection for decimal-aligned columns.
//!
//! siunitx tries to parse every cell of an `S` column as a number, including
//! the header. Wrapping the header cell in braces makes it text.

use super::{find_header_row, map_lines, RowLine};

/// Wrap the header cells at the given 1-indexed `positions` in a brace group.
///
/// Every other byte of `markup` is left untouched. Positions beyond the last
/// column are ignored, as is markup without a recognizable header row.
pub fn protect_header(markup: &str, positions: &[usize]) -> String {
    if positions.is_empty() {
        return markup.to_string();
    }
    map_lines(markup, |mut lines| {
        let Some(index) = find_header_row(&lines) else {
            log::debug!("no header row found, leaving markup unchanged");
            return lines;
        };
        let Some(mut row) = RowLine::parse(&lines[index]) else {
            return lines;
        };
        for &position in positions {
            if position == 0 {
                continue;
            }
            if let Some(cell) = row.cells.get_mut(position - 1) {
                *cell = wrap_cell(cell);
            }
        }
        lines[index] = row.to_line();
        lines
    })
}

fn wrap_cell(cell: &str) -> String {
    let core = cell.trim();
    let start = cell.len() - cell.trim_start().len();
    let end = start + core.len();
    format!("{}{{{core}}}{}", &cell[..start], &cell[end..])
}
