//! Material shapes
//!
//! A shape is a set of polygons (vectorized from a chunk texture) that
//! describes how one map pixel of a material is drawn into the landscape.
//! For a given map zoom every polygon gets a coverage list: the map cells,
//! relative to the chunk, that the polygon overlaps.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sub-sample step when testing whether a polygon touches a map cell
const SAMPLE_STEP: usize = 3;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("failed to parse shape: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("shape size must be positive, got {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
    #[error("polygon {0} has no points")]
    EmptyPolygon(usize),
}

/// On-disk form of a shape
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ShapeSource {
    width: i32,
    height: i32,
    polygons: Vec<Vec<(i32, i32)>>,
}

/// One closed polygon plus data derived from it
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub points: Vec<IVec2>,
    pub center: IVec2,
    pub min: IVec2,
    pub max: IVec2,
    /// Covered map cells for the prepared zoom; the center cell is always first
    pub coverage: Vec<IVec2>,
}

impl Polygon {
    fn new(points: Vec<IVec2>) -> Self {
        let n = points.len() as i32;
        let sum = points.iter().fold(IVec2::ZERO, |acc, p| acc + *p);
        let mut min = points[0];
        let mut max = points[0];
        for p in &points[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self {
            center: IVec2::new(sum.x / n, sum.y / n),
            min,
            max,
            points,
            coverage: Vec::new(),
        }
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    /// Even-odd test with a ray towards +x
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let n = self.points.len();
        let mut crossings = 0;
        for i in 0..n {
            let p1 = self.points[i];
            let p2 = self.points[(i + 1) % n];
            // horizontal edges never straddle y
            if (p1.y < y) != (p2.y < y) {
                let (x1, y1, x2, y2) = (p1.x as i64, p1.y as i64, p2.x as i64, p2.y as i64);
                let intercept = x1 - (y1 - y as i64) * (x2 - x1) / (y2 - y1);
                if intercept > x as i64 {
                    crossings += 1;
                }
            }
        }
        crossings % 2 == 1
    }

    fn prepare_for_zoom(&mut self, zoom: i32) {
        self.coverage.clear();
        let center_cell = self.center / zoom;
        self.coverage.push(center_cell);

        for y in (self.min.y / zoom)..=(self.max.y / zoom) {
            for x in (self.min.x / zoom)..=(self.max.x / zoom) {
                let cell = IVec2::new(x, y);
                if cell == center_cell {
                    continue;
                }
                if self.touches_cell(cell, zoom) {
                    self.coverage.push(cell);
                }
            }
        }
    }

    fn touches_cell(&self, cell: IVec2, zoom: i32) -> bool {
        (0..=zoom).step_by(SAMPLE_STEP).any(|ty| {
            (0..=zoom)
                .step_by(SAMPLE_STEP)
                .any(|tx| self.contains(cell.x * zoom + tx, cell.y * zoom + ty))
        })
    }
}

/// A named chunk shape with zoom-dependent coverage data
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialShape {
    pub width: i32,
    pub height: i32,
    pub polygons: Vec<Polygon>,
    /// How far polygons reach outside `[0, width] x [0, height]`
    pub overlap_left: i32,
    pub overlap_top: i32,
    pub overlap_right: i32,
    pub overlap_bottom: i32,
    pub max_poly_width: i32,
    pub max_poly_height: i32,
    /// Zoom the coverage lists were computed for; 0 if never prepared
    pub prepared_for_zoom: i32,
}

impl MaterialShape {
    /// Parse a shape from RON and compute centers, bounds and overlaps
    pub fn load(source: &str) -> Result<Self, ShapeError> {
        let source: ShapeSource = ron::from_str(source)?;
        if source.width <= 0 || source.height <= 0 {
            return Err(ShapeError::InvalidSize {
                width: source.width,
                height: source.height,
            });
        }

        let mut shape = MaterialShape {
            width: source.width,
            height: source.height,
            polygons: Vec::with_capacity(source.polygons.len()),
            overlap_left: 0,
            overlap_top: 0,
            overlap_right: 0,
            overlap_bottom: 0,
            max_poly_width: 0,
            max_poly_height: 0,
            prepared_for_zoom: 0,
        };

        for (i, points) in source.polygons.into_iter().enumerate() {
            if points.is_empty() {
                return Err(ShapeError::EmptyPolygon(i));
            }
            let polygon = Polygon::new(points.into_iter().map(|(x, y)| IVec2::new(x, y)).collect());
            for p in &polygon.points {
                shape.overlap_left = shape.overlap_left.max(-p.x);
                shape.overlap_top = shape.overlap_top.max(-p.y);
                shape.overlap_right = shape.overlap_right.max(p.x - shape.width);
                shape.overlap_bottom = shape.overlap_bottom.max(p.y - shape.height);
            }
            let size = polygon.size();
            shape.max_poly_width = shape.max_poly_width.max(size.x);
            shape.max_poly_height = shape.max_poly_height.max(size.y);
            shape.polygons.push(polygon);
        }

        Ok(shape)
    }

    pub fn is_prepared_for(&self, zoom: i32) -> bool {
        self.prepared_for_zoom != 0 && self.prepared_for_zoom == zoom
    }

    /// Make sure coverage lists match `zoom`
    ///
    /// Only works if the shape size is a multiple of the zoom. On failure the
    /// previous coverage data is kept.
    pub fn prepare_for_zoom(&mut self, zoom: i32) -> bool {
        if self.is_prepared_for(zoom) {
            return true;
        }
        if zoom <= 0 || self.width % zoom != 0 || self.height % zoom != 0 {
            log::debug!(
                "Shape {}x{} cannot be prepared for zoom {}",
                self.width,
                self.height,
                zoom
            );
            return false;
        }
        for polygon in &mut self.polygons {
            polygon.prepare_for_zoom(zoom);
        }
        self.prepared_for_zoom = zoom;
        true
    }
}
