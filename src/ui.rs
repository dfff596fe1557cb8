#![cfg(feature = "std")]

//! Terminal rendering for the binaries. Columns are lettered `A`–`J`, rows
//! numbered from 1, so `B7` is row 6, column 1.

use std::fmt::Write;

use crate::{
    common::Coord,
    config::GRID_SIZE,
    grid::{BoardView, CellView},
};

fn glyph(cell: CellView) -> char {
    match cell {
        CellView::Empty => '.',
        CellView::Ship => 'S',
        CellView::Hit => 'X',
        CellView::Miss => 'o',
    }
}

fn header(out: &mut String) {
    out.push_str("   ");
    for y in 0..GRID_SIZE {
        out.push(' ');
        out.push((b'A' + y as u8) as char);
    }
}

/// One board as text, a trailing newline after every row.
pub fn render_board(view: &BoardView) -> String {
    let mut out = String::new();
    header(&mut out);
    out.push('\n');
    for (x, row) in view.iter().enumerate() {
        let _ = write!(out, "{:2} ", x + 1);
        for &cell in row {
            out.push(' ');
            out.push(glyph(cell));
        }
        out.push('\n');
    }
    out
}

/// Own board on the left, the opponent's on the right.
pub fn render_boards(own: &BoardView, opponent: &BoardView) -> String {
    let left: Vec<String> = render_board(own).lines().map(str::to_owned).collect();
    let right: Vec<String> = render_board(opponent).lines().map(str::to_owned).collect();
    let mut out = format!("{:<26}{}\n", "YOUR FLEET", "ENEMY WATERS");
    for (l, r) in left.iter().zip(&right) {
        let _ = writeln!(out, "{:<26}{}", l, r);
    }
    out
}

/// Parse input like `B7` or `j10`. Returns `None` for anything off the board.
pub fn parse_coord(input: &str) -> Option<Coord> {
    let input = input.trim();
    let mut chars = input.chars();
    let col = chars.next()?.to_ascii_uppercase();
    if !col.is_ascii_uppercase() {
        return None;
    }
    let y = (col as u8 - b'A') as usize;
    let row: usize = chars.as_str().parse().ok()?;
    let coord = Coord::new(row.checked_sub(1)?, y);
    coord.in_bounds().then_some(coord)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letter_number_pairs() {
        assert_eq!(parse_coord("A1"), Some(Coord::new(0, 0)));
        assert_eq!(parse_coord(" b7 "), Some(Coord::new(6, 1)));
        assert_eq!(parse_coord("J10"), Some(Coord::new(9, 9)));
        assert_eq!(parse_coord("K1"), None);
        assert_eq!(parse_coord("A0"), None);
        assert_eq!(parse_coord("A11"), None);
        assert_eq!(parse_coord("7"), None);
    }

    #[test]
    fn board_rows_use_stable_glyphs() {
        let mut view: BoardView = [[CellView::Empty; GRID_SIZE]; GRID_SIZE];
        view[0][0] = CellView::Ship;
        view[0][1] = CellView::Hit;
        view[0][2] = CellView::Miss;
        let text = render_board(&view);
        let first_row = text.lines().nth(1).unwrap();
        assert!(first_row.starts_with(" 1  S X o ."));
    }
}
