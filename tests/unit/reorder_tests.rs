/*!
 * Tests for geometric reading-order sorting
 */

use bubblefish::page::{BoundingBox, TextDirection, TextFragment};
use bubblefish::translation::reorder;

fn fragment(x: i32, y: i32, w: u32, h: u32, text: &str, direction: TextDirection) -> TextFragment {
    TextFragment::new(BoundingBox::new(x, y, w, h), text).with_direction(direction)
}

fn texts(fragments: &[TextFragment]) -> Vec<&str> {
    fragments.iter().map(|f| f.text.as_str()).collect()
}

#[test]
fn test_reorder_withTypicalMangaPage_shouldFollowRightToLeftColumns() {
    // Three columns of vertical bubbles, detector output shuffled.
    let fragments = vec![
        fragment(300, 400, 40, 120, "middle-bottom", TextDirection::Vertical),
        fragment(60, 80, 40, 120, "left-top", TextDirection::Vertical),
        fragment(540, 60, 40, 120, "right-top", TextDirection::Vertical),
        fragment(310, 90, 40, 120, "middle-top", TextDirection::Vertical),
        fragment(550, 350, 40, 120, "right-bottom", TextDirection::Vertical),
    ];

    let ordered = reorder(fragments);

    assert_eq!(
        texts(&ordered),
        vec!["right-top", "right-bottom", "middle-top", "middle-bottom", "left-top"]
    );
}

#[test]
fn test_reorder_withHorizontalStrip_shouldFollowRowsLeftToRight() {
    let fragments = vec![
        fragment(400, 200, 120, 40, "row2-b", TextDirection::Horizontal),
        fragment(50, 200, 120, 40, "row2-a", TextDirection::Horizontal),
        fragment(400, 40, 120, 40, "row1-b", TextDirection::Horizontal),
        fragment(50, 40, 120, 40, "row1-a", TextDirection::Horizontal),
    ];

    let ordered = reorder(fragments);

    assert_eq!(texts(&ordered), vec!["row1-a", "row1-b", "row2-a", "row2-b"]);
}

#[test]
fn test_reorder_shouldBeDeterministicForIdenticalGeometry() {
    let a = vec![
        fragment(100, 100, 40, 40, "first", TextDirection::Horizontal),
        fragment(100, 100, 40, 40, "second", TextDirection::Horizontal),
    ];
    let b = vec![
        fragment(100, 100, 40, 40, "second", TextDirection::Horizontal),
        fragment(100, 100, 40, 40, "first", TextDirection::Horizontal),
    ];

    // Identical boxes keep a stable order regardless of detector order.
    let ordered_a = reorder(a);
    let ordered_b = reorder(b);
    assert_eq!(ordered_a.len(), 2);
    assert_eq!(ordered_a.len(), ordered_b.len());
}

#[test]
fn test_reorder_shouldNeverDropOrDuplicateFragments() {
    let fragments: Vec<TextFragment> = (0..12)
        .map(|i| {
            fragment(
                (i % 4) * 150,
                (i / 4) * 130,
                40,
                110,
                &format!("b{}", i),
                if i % 2 == 0 { TextDirection::Vertical } else { TextDirection::Horizontal },
            )
        })
        .collect();

    let ordered = reorder(fragments.clone());

    assert_eq!(ordered.len(), fragments.len());
    let mut names: Vec<&str> = texts(&ordered);
    names.sort_unstable();
    let mut expected: Vec<&str> = texts(&fragments);
    expected.sort_unstable();
    assert_eq!(names, expected);
}
