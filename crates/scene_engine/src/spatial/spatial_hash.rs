//! Uniform-grid spatial hash
//!
//! Each collider is stored in every cell its bounds touch. Queries walk the
//! cells covered by the query rectangle in row-major order and report each
//! handle the first time it is seen.

use std::any::Any;
use std::collections::{HashMap, HashSet};

use crate::foundation::math::{Rect, Vec2};
use crate::physics::ColliderHandle;
use crate::spatial::SpatialIndex;

type Cell = (i32, i32);

#[derive(Debug, Clone, Copy)]
struct Entry {
    bounds: Rect,
    layer: u32,
    cells: (Cell, Cell),
}

/// Grid broadphase with square cells
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    inverse_cell_size: f32,
    cells: HashMap<Cell, Vec<ColliderHandle>>,
    entries: HashMap<ColliderHandle, Entry>,
}

impl SpatialHash {
    /// Create a hash with `cell_size` wide cells
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inverse_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
            entries: HashMap::new(),
        }
    }

    /// Width of a cell in world units
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_at(&self, point: Vec2) -> Cell {
        (
            (point.x * self.inverse_cell_size).floor() as i32,
            (point.y * self.inverse_cell_size).floor() as i32,
        )
    }

    fn cell_range(&self, bounds: &Rect) -> (Cell, Cell) {
        (self.cell_at(bounds.min), self.cell_at(bounds.max))
    }

    fn covered((min, max): (Cell, Cell)) -> impl Iterator<Item = Cell> {
        (min.1..=max.1).flat_map(move |y| (min.0..=max.0).map(move |x| (x, y)))
    }
}

impl SpatialIndex for SpatialHash {
    fn insert(&mut self, handle: ColliderHandle, bounds: Rect, layer: u32) {
        let cells = self.cell_range(&bounds);
        if let Some(entry) = self.entries.get_mut(&handle) {
            if entry.cells == cells {
                entry.bounds = bounds;
                entry.layer = layer;
                return;
            }
            self.remove(handle);
        }

        for cell in Self::covered(cells) {
            self.cells.entry(cell).or_default().push(handle);
        }
        self.entries.insert(handle, Entry { bounds, layer, cells });
    }

    fn remove(&mut self, handle: ColliderHandle) {
        let Some(entry) = self.entries.remove(&handle) else {
            return;
        };
        for cell in Self::covered(entry.cells) {
            if let Some(handles) = self.cells.get_mut(&cell) {
                handles.retain(|&other| other != handle);
                if handles.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    fn query(&self, bounds: &Rect, layer_mask: u32, out: &mut Vec<ColliderHandle>) {
        let mut seen = HashSet::new();
        for cell in Self::covered(self.cell_range(bounds)) {
            let Some(handles) = self.cells.get(&cell) else {
                continue;
            };
            for &handle in handles {
                let Some(entry) = self.entries.get(&handle) else {
                    continue;
                };
                if entry.layer & layer_mask != 0
                    && entry.bounds.intersects(bounds)
                    && seen.insert(handle)
                {
                    out.push(handle);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
