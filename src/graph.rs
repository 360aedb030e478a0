#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use crate::ingest::NormalizedRow;
use plotters::prelude::*;
use std::f64::consts::TAU;
use std::io::Cursor;

/// Number of rings drawn: level1, level2, leaf
pub const RINGS: usize = 3;

/// Configuration options for the static preview
///
/// # Fields
/// * `width`, `height` - Image size in pixels
/// * `margin` - Blank border around the chart in pixels
#[derive(Clone, Debug)]
pub struct GraphOptions {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            margin: 10,
        }
    }
}

/// An annular sector of the chart
///
/// Angles are radians, clockwise from twelve o'clock.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Ring index, 0 for the innermost (level1) ring
    pub depth: usize,
    /// Identifier of the sector, built like hierarchy ids
    pub key: String,
    /// Index of the level1 group, used for colouring
    pub group: usize,
    pub value: f64,
    pub start: f64,
    pub end: f64,
}

struct Branch {
    name: String,
    total: f64,
    children: Vec<Twig>,
}

struct Twig {
    name: String,
    total: f64,
    leaves: Vec<(String, f64)>,
}

/// Lay out rows as three concentric rings.
///
/// Level1 and level2 sectors sum the values beneath them, in first-appearance order. Every row
/// is its own leaf sector, so repeated rows are drawn side by side. Negative values count as 0.
///
/// # Returns
/// * Segments ordered ring by ring, empty when the total value is 0
pub fn ring_segments(rows: &[NormalizedRow]) -> Vec<Segment> {
    let mut branches: Vec<Branch> = Vec::new();

    for row in rows {
        let value = row.value.max(0.0);

        let b = match branches.iter().position(|b| b.name == row.level1) {
            Some(i) => i,
            None => {
                branches.push(Branch {
                    name: row.level1.clone(),
                    total: 0.0,
                    children: Vec::new(),
                });
                branches.len() - 1
            }
        };
        let branch = &mut branches[b];
        branch.total += value;

        let t = match branch.children.iter().position(|t| t.name == row.level2) {
            Some(i) => i,
            None => {
                branch.children.push(Twig {
                    name: row.level2.clone(),
                    total: 0.0,
                    leaves: Vec::new(),
                });
                branch.children.len() - 1
            }
        };
        let twig = &mut branch.children[t];
        twig.total += value;
        twig.leaves.push((row.level3.clone(), value));
    }

    let total: f64 = branches.iter().map(|b| b.total).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let scale = TAU / total;

    let mut rings: [Vec<Segment>; RINGS] = Default::default();
    let mut cursor = 0.0;

    for (group, branch) in branches.iter().enumerate() {
        let span = branch.total * scale;
        rings[0].push(Segment {
            depth: 0,
            key: branch.name.clone(),
            group,
            value: branch.total,
            start: cursor,
            end: cursor + span,
        });

        let mut twig_cursor = cursor;
        for twig in &branch.children {
            let twig_key = format!("{} - {}", branch.name, twig.name);
            let twig_span = twig.total * scale;
            rings[1].push(Segment {
                depth: 1,
                key: twig_key.clone(),
                group,
                value: twig.total,
                start: twig_cursor,
                end: twig_cursor + twig_span,
            });

            let mut leaf_cursor = twig_cursor;
            for (leaf, value) in &twig.leaves {
                let leaf_span = value * scale;
                rings[2].push(Segment {
                    depth: 2,
                    key: format!("{} - {}", twig_key, leaf),
                    group,
                    value: *value,
                    start: leaf_cursor,
                    end: leaf_cursor + leaf_span,
                });
                leaf_cursor += leaf_span;
            }
            twig_cursor += twig_span;
        }
        cursor += span;
    }

    rings.into_iter().flatten().collect()
}

// Plotly's default qualitative palette
const PALETTE: [RGBColor; 10] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
    RGBColor(255, 102, 146),
    RGBColor(182, 232, 128),
    RGBColor(255, 151, 255),
    RGBColor(254, 203, 82),
];

fn segment_color(segment: &Segment) -> RGBColor {
    let RGBColor(r, g, b) = PALETTE[segment.group % PALETTE.len()];
    let mix = 0.25 * segment.depth as f64;
    let lighten = |c: u8| (c as f64 + (255.0 - c as f64) * mix).round() as u8;
    RGBColor(lighten(r), lighten(g), lighten(b))
}

fn arc_points(
    center: (f64, f64),
    radius: f64,
    start: f64,
    end: f64,
    steps: usize,
) -> impl Iterator<Item = (i32, i32)> {
    (0..=steps).map(move |i| {
        let angle = start + (end - start) * i as f64 / steps as f64;
        (
            (center.0 + radius * angle.sin()).round() as i32,
            (center.1 - radius * angle.cos()).round() as i32,
        )
    })
}

fn segment_polygon(segment: &Segment, center: (f64, f64), radius: f64) -> Vec<(i32, i32)> {
    let band = radius / (RINGS as f64 + 0.5);
    let inner = band * (segment.depth as f64 + 0.5);
    let outer = inner + band;
    let steps = (((segment.end - segment.start) / 0.02).ceil() as usize).max(2);

    let mut points: Vec<(i32, i32)> =
        arc_points(center, outer, segment.start, segment.end, steps).collect();
    points.extend(arc_points(center, inner, segment.end, segment.start, steps));
    points
}

/// Render the rows as a PNG sunburst
///
/// Draws every segment from [`ring_segments`] as a filled polygon on an in-memory bitmap and
/// encodes the result as PNG. An empty or all-zero dataset gives a blank image.
///
/// # Arguments
/// * `rows` - Normalized rows
/// * `options` - Image size and margin
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn render_sunburst_png(
    rows: &[NormalizedRow],
    options: &GraphOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let (width, height) = (options.width, options.height);
    let size = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| format!("image size {}x{} is too large", width, height))?;
    let mut buffer = vec![0u8; size];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let center = (width as f64 / 2.0, height as f64 / 2.0);
        let radius = (width.min(height) as f64 / 2.0 - options.margin as f64).max(1.0);

        for segment in ring_segments(rows) {
            let points = segment_polygon(&segment, center, radius);
            root.draw(&Polygon::new(points.clone(), segment_color(&segment).filled()))?;

            let mut outline = points;
            if let Some(first) = outline.first().copied() {
                outline.push(first);
            }
            root.draw(&PathElement::new(outline, &WHITE))?;
        }

        root.present()?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer)
        .ok_or("bitmap buffer does not match the image size")?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;

    Ok(png)
}
