/*!
 * Geometric reading-order sorting for detected text fragments.
 *
 * Ordering is a pure function of fragment geometry and direction tags. The
 * page's dominant direction decides the convention: vertical pages read in
 * right-to-left columns with top-to-bottom order inside a column, horizontal
 * pages read in top-to-bottom rows with left-to-right order inside a row.
 * Overlap ties are broken by smallest top-left y, then x.
 */

use std::cmp::Ordering;

use crate::page::{TextDirection, TextFragment};

/// Sort fragments into reading order.
///
/// The dominant direction across the fragments picks the page convention;
/// vertical wins a tie, matching right-to-left source material where
/// vertical lettering is the norm.
pub fn reorder(fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    if fragments.len() <= 1 {
        return fragments;
    }

    if dominant_direction(&fragments) == TextDirection::Vertical {
        order_vertical(fragments)
    } else {
        order_horizontal(fragments)
    }
}

fn dominant_direction(fragments: &[TextFragment]) -> TextDirection {
    let vertical = fragments
        .iter()
        .filter(|f| f.direction == TextDirection::Vertical)
        .count();
    if vertical * 2 >= fragments.len() {
        TextDirection::Vertical
    } else {
        TextDirection::Horizontal
    }
}

/// Right-to-left columns, top-to-bottom within a column
fn order_vertical(mut fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    // Rightmost fragments first so columns build in reading order
    fragments.sort_by(|a, b| {
        b.bbox
            .right()
            .cmp(&a.bbox.right())
            .then(tie_break(a, b))
    });

    let mut columns: Vec<Vec<TextFragment>> = Vec::new();
    for fragment in fragments {
        let column = columns
            .iter_mut()
            .find(|col| col.iter().any(|other| overlaps_horizontally(&fragment, other)));
        match column {
            Some(col) => col.push(fragment),
            None => columns.push(vec![fragment]),
        }
    }

    let mut ordered = Vec::new();
    for mut column in columns {
        column.sort_by(|a, b| a.bbox.y.cmp(&b.bbox.y).then(tie_break(a, b)));
        ordered.append(&mut column);
    }
    ordered
}

/// Top-to-bottom rows, left-to-right within a row
fn order_horizontal(mut fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    fragments.sort_by(|a, b| a.bbox.y.cmp(&b.bbox.y).then(tie_break(a, b)));

    let mut rows: Vec<Vec<TextFragment>> = Vec::new();
    for fragment in fragments {
        let row = rows
            .iter_mut()
            .find(|row| row.iter().any(|other| overlaps_vertically(&fragment, other)));
        match row {
            Some(row) => row.push(fragment),
            None => rows.push(vec![fragment]),
        }
    }

    let mut ordered = Vec::new();
    for mut row in rows {
        row.sort_by(|a, b| a.bbox.x.cmp(&b.bbox.x).then(tie_break(a, b)));
        ordered.append(&mut row);
    }
    ordered
}

fn overlaps_horizontally(a: &TextFragment, b: &TextFragment) -> bool {
    a.bbox.x < b.bbox.right() && b.bbox.x < a.bbox.right()
}

fn overlaps_vertically(a: &TextFragment, b: &TextFragment) -> bool {
    a.bbox.y < b.bbox.bottom() && b.bbox.y < a.bbox.bottom()
}

fn tie_break(a: &TextFragment, b: &TextFragment) -> Ordering {
    a.bbox.y.cmp(&b.bbox.y).then(a.bbox.x.cmp(&b.bbox.x))
}
