#![cfg(feature = "web")]

use std::f64::consts::TAU;

use sunburst::graph::{render_sunburst_png, ring_segments, GraphOptions};
use sunburst::ingest::NormalizedRow;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn row(l1: &str, l2: &str, l3: &str, value: f64) -> NormalizedRow {
    NormalizedRow {
        level1: l1.to_string(),
        level2: l2.to_string(),
        level3: l3.to_string(),
        value,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_ring_totals() {
    let rows = vec![
        row("A", "B", "C", 10.0),
        row("A", "B", "D", 5.0),
        row("A", "E", "F", 5.0),
        row("G", "H", "I", 20.0),
    ];
    let segments = ring_segments(&rows);

    let inner: Vec<_> = segments.iter().filter(|s| s.depth == 0).collect();
    assert_eq!(inner.len(), 2);
    assert_eq!(inner[0].key, "A");
    assert_eq!(inner[0].value, 20.0);
    assert_eq!(inner[1].key, "G");
    assert!(close(inner[0].end - inner[0].start, TAU / 2.0));

    let middle: Vec<_> = segments.iter().filter(|s| s.depth == 1).collect();
    let keys: Vec<&str> = middle.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["A - B", "A - E", "G - H"]);
    assert_eq!(middle[0].value, 15.0);

    let leaves: Vec<_> = segments.iter().filter(|s| s.depth == 2).collect();
    assert_eq!(leaves.len(), rows.len());
    assert_eq!(leaves[0].key, "A - B - C");
    println!("✓ Rings aggregate values in first-appearance order");
}

#[test]
fn test_each_ring_covers_the_circle() {
    let rows = vec![
        row("A", "B", "C", 1.0),
        row("X", "Y", "Z", 3.0),
        row("A", "B", "C", 2.0),
    ];
    let segments = ring_segments(&rows);

    for depth in 0..3 {
        let span: f64 = segments
            .iter()
            .filter(|s| s.depth == depth)
            .map(|s| s.end - s.start)
            .sum();
        assert!(close(span, TAU), "ring {} spans {}", depth, span);
    }

    // Leaves sit inside their parent sector
    for leaf in segments.iter().filter(|s| s.depth == 2) {
        let parent = segments
            .iter()
            .find(|s| s.depth == 1 && leaf.key.starts_with(&format!("{} - ", s.key)))
            .expect("leaf should have a parent sector");
        assert!(leaf.start >= parent.start - 1e-9 && leaf.end <= parent.end + 1e-9);
    }
    println!("✓ Every ring spans the full circle");
}

#[test]
fn test_zero_and_negative_values() {
    assert!(ring_segments(&[]).is_empty());
    assert!(ring_segments(&[row("A", "B", "C", 0.0), row("A", "B", "D", -4.0)]).is_empty());

    let segments = ring_segments(&[row("A", "B", "C", -4.0), row("A", "B", "D", 1.0)]);
    let leaves: Vec<_> = segments.iter().filter(|s| s.depth == 2).collect();
    assert_eq!(leaves[0].value, 0.0);
    assert!(close(leaves[1].end - leaves[1].start, TAU));
    println!("✓ Negative values clamped, zero total draws nothing");
}

#[test]
fn test_png_rendering() {
    let options = GraphOptions {
        width: 200,
        height: 160,
        margin: 5,
    };

    let png = render_sunburst_png(&[row("A", "B", "C", 3.0), row("D", "E", "F", 1.0)], &options)
        .unwrap();
    assert!(png.starts_with(PNG_SIGNATURE));

    let blank = render_sunburst_png(&[], &options).unwrap();
    assert!(blank.starts_with(PNG_SIGNATURE));
    println!("✓ PNG preview encoded");
}

#[test]
fn test_oversized_image_is_an_error() {
    let options = GraphOptions {
        width: u32::MAX,
        height: u32::MAX,
        margin: 0,
    };

    let result = render_sunburst_png(&[row("A", "B", "C", 1.0)], &options);
    assert!(result.is_err());
    println!("✓ Oversized image rejected without overflow");
}
