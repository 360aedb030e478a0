use crate::ingest::NormalizedRow;
use serde::Serialize;

/// Separator between levels in node identifiers
pub const ID_SEPARATOR: &str = " - ";

/// Ring depth shown by the chart
pub const MAX_DEPTH: u32 = 4;

/// One leaf entry of the sunburst
///
/// # Fields
/// * `id` - `level1 - level2 - level3`
/// * `parent_id` - `level1 - level2`
/// * `label` - `level3`
/// * `value` - Segment size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub id: String,
    pub parent_id: String,
    pub label: String,
    pub value: f64,
}

impl From<&NormalizedRow> for HierarchyNode {
    fn from(row: &NormalizedRow) -> Self {
        let parent_id = format!("{}{}{}", row.level1, ID_SEPARATOR, row.level2);
        Self {
            id: format!("{}{}{}", parent_id, ID_SEPARATOR, row.level3),
            parent_id,
            label: row.level3.clone(),
            value: row.value,
        }
    }
}

/// Build one node per row, in row order.
///
/// Repeated `(level1, level2, level3)` triples are kept as separate nodes sharing an `id`; their
/// values are not merged. No root or intermediate nodes are added.
///
/// # Examples
/// ```
/// use sunburst::hierarchy::build;
/// use sunburst::ingest::NormalizedRow;
///
/// let rows = vec![NormalizedRow {
///     level1: "A".into(),
///     level2: "B".into(),
///     level3: "C".into(),
///     value: 10.0,
/// }];
/// let nodes = build(&rows);
/// assert_eq!(nodes[0].id, "A - B - C");
/// assert_eq!(nodes[0].parent_id, "A - B");
/// ```
pub fn build(rows: &[NormalizedRow]) -> Vec<HierarchyNode> {
    rows.iter().map(HierarchyNode::from).collect()
}

/// Plotly `sunburst` trace: four parallel sequences, one entry per node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunburstTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub ids: Vec<String>,
    pub labels: Vec<String>,
    pub parents: Vec<String>,
    pub values: Vec<f64>,
    pub maxdepth: u32,
    pub insidetextorientation: &'static str,
}

impl SunburstTrace {
    pub fn from_nodes(nodes: &[HierarchyNode]) -> Self {
        Self {
            kind: "sunburst",
            ids: nodes.iter().map(|n| n.id.clone()).collect(),
            labels: nodes.iter().map(|n| n.label.clone()).collect(),
            parents: nodes.iter().map(|n| n.parent_id.clone()).collect(),
            values: nodes.iter().map(|n| n.value).collect(),
            maxdepth: MAX_DEPTH,
            insidetextorientation: "radial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub l: u32,
    pub r: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub margin: Margin,
}

/// Figure handed to Plotly.js as `Plotly.newPlot(el, figure.data, figure.layout)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<SunburstTrace>,
    pub layout: Layout,
}

impl Figure {
    pub fn sunburst(nodes: &[HierarchyNode]) -> Self {
        Self {
            data: vec![SunburstTrace::from_nodes(nodes)],
            layout: Layout {
                title: "Sunburst Chart Example".to_string(),
                margin: Margin {
                    t: 10,
                    l: 10,
                    r: 10,
                    b: 10,
                },
            },
        }
    }
}
