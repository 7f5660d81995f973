//! Panel Layout Engine
//!
//! Tiles a mounting frame with panels. The nominal panel length/depth only
//! decides how many columns and rows fit; the panels are then stretched so
//! that they fill the frame exactly, leaving a fixed gap between neighbours.
//!
//! All coordinates of a placement are local to the frame group, whose origin
//! sits at the frame centre lifted by `height_from_ground`.

use serde::Serialize;

use crate::faults::FaultRegistry;

// ===================== CONSTANTS =====================

/// Spacing between adjacent panels, in both horizontal axes (metres)
pub const PANEL_GAP: f64 = 1.0;

/// Height of the glass surface above the frame mid-plane, on top of half the
/// frame height
const GLASS_CLEARANCE: f64 = 0.1;

// ===================== INPUTS =====================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSpec {
    pub length: f64,
    pub depth: f64,
    pub height: f64,
    pub height_from_ground: f64,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self { length: 50.0, depth: 50.0, height: 10.0, height_from_ground: 3.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelSpec {
    pub length: f64,
    pub depth: f64,
    pub height: f64,
}

impl Default for PanelSpec {
    fn default() -> Self {
        Self { length: 10.0, depth: 10.0, height: 3.0 }
    }
}

// ===================== OUTPUTS =====================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelPlacement {
    /// Row-major index, also the fault registry key
    pub index: usize,
    pub row: usize,
    pub column: usize,
    /// Centre (x, y, z) relative to the frame group
    pub position: [f64; 3],
    /// (length, height, depth) after stretching
    pub size: [f64; 3],
    pub faulted: bool,
}

impl PanelPlacement {
    /// Horizontal footprint as (x_min, x_max, z_min, z_max).
    pub fn footprint(&self) -> (f64, f64, f64, f64) {
        let [x, _, z] = self.position;
        let [l, _, d] = self.size;
        (x - l / 2.0, x + l / 2.0, z - d / 2.0, z + d / 2.0)
    }

    /// True when the horizontal footprints share a region of positive area.
    pub fn overlaps(&self, other: &PanelPlacement) -> bool {
        let (ax0, ax1, az0, az1) = self.footprint();
        let (bx0, bx1, bz0, bz1) = other.footprint();
        let eps = 1e-9;
        ax0 < bx1 - eps && bx0 < ax1 - eps && az0 < bz1 - eps && bz0 < az1 - eps
    }

    pub fn world_position(&self, height_from_ground: f64) -> [f64; 3] {
        let [x, y, z] = self.position;
        [x, y + height_from_ground, z]
    }
}

/// Axis-aligned box, centre plus (length, height, depth).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxGeometry {
    pub center: [f64; 3],
    pub size: [f64; 3],
}

/// Horizontal plane, centre plus (width, depth).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaneGeometry {
    pub center: [f64; 3],
    pub size: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub columns: usize,
    pub rows: usize,
    /// Frame bounding box in world space
    pub frame: BoxGeometry,
    /// Glass surface over the frame, in world space
    pub glass: PlaneGeometry,
    pub height_from_ground: f64,
    pub placements: Vec<PanelPlacement>,
}

impl Layout {
    pub fn capacity(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }

    pub fn faulted(&self) -> impl Iterator<Item = &PanelPlacement> {
        self.placements.iter().filter(|p| p.faulted)
    }
}

// ===================== ENGINE =====================

/// How many nominal panels fit along one axis. Non-positive or non-finite
/// dimensions fit none; a ratio beyond `usize` saturates.
fn fit_count(frame: f64, panel: f64) -> usize {
    if !(frame > 0.0 && panel > 0.0 && frame.is_finite() && panel.is_finite()) {
        return 0;
    }
    (frame / panel).floor() as usize
}

/// Stretched cell size along one axis once `(count - 1)` gaps are reserved.
/// Frames too small for their gaps give zero-sized cells.
fn cell_size(span: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let available = span - (count - 1) as f64 * PANEL_GAP;
    (available / count as f64).max(0.0)
}

/// Lay panels out over the frame in row-major order, stopping after
/// `min(columns * rows, requested)` placements.
pub fn compute_layout(
    frame: &FrameSpec,
    panel: &PanelSpec,
    requested: usize,
    registry: &FaultRegistry,
) -> Layout {
    let columns = fit_count(frame.length, panel.length);
    let rows = fit_count(frame.depth, panel.depth);
    let total = columns.saturating_mul(rows).min(requested);

    let cell_length = cell_size(frame.length, columns);
    let cell_depth = cell_size(frame.depth, rows);

    // total > 0 implies columns > 0
    let placements: Vec<PanelPlacement> = (0..total)
        .map(|index| {
            let (row, column) = (index / columns, index % columns);
            let x = column as f64 * (cell_length + PANEL_GAP) - frame.length / 2.0 + cell_length / 2.0;
            let z = row as f64 * (cell_depth + PANEL_GAP) - frame.depth / 2.0 + cell_depth / 2.0;
            let y = panel.height / 2.0;

            PanelPlacement {
                index,
                row,
                column,
                position: [x, y, z],
                size: [cell_length, panel.height, cell_depth],
                faulted: registry.is_faulted(index),
            }
        })
        .collect();

    log::debug!(
        "layout: {}x{} grid, {} of {} requested panels placed, cell {:.3}x{:.3}",
        columns,
        rows,
        placements.len(),
        requested,
        cell_length,
        cell_depth
    );

    let lift = frame.height_from_ground;
    Layout {
        columns,
        rows,
        frame: BoxGeometry {
            center: [0.0, lift, 0.0],
            size: [frame.length, frame.height, frame.depth],
        },
        glass: PlaneGeometry {
            center: [0.0, lift + frame.height / 2.0 + GLASS_CLEARANCE, 0.0],
            size: [frame.length, frame.depth],
        },
        height_from_ground: lift,
        placements,
    }
}

// ===================== TESTS =====================
