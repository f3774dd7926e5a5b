use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, PartialOrd)]
pub struct BvrBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub w: f32,
    pub h: f32,
}

impl BvrBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            w: x2 - x1,
            h: y2 - y1,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Computes the area of the bounding box.
    pub fn area(&self) -> f32 {
        self.h * self.w
    }

    /// Area on the pixel grid, counting both edge pixels: `(x2-x1+1)*(y2-y1+1)`.
    pub fn area_inclusive(&self) -> f32 {
        (self.x2 - self.x1 + 1.) * (self.y2 - self.y1 + 1.)
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &BvrBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Pixel-grid intersection, the counterpart of [`BvrBox::area_inclusive`].
    pub fn intersect_inclusive(&self, other: &BvrBox) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1) + 1.).max(0.);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1) + 1.).max(0.);
        w * h
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &BvrBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Computes the intersection over union (IoU) between this bounding box and another.
    pub fn iou(&self, other: &BvrBox) -> f32 {
        let union = self.union(other);
        if union <= 0. {
            return 0.;
        }
        self.intersect(other) / union
    }

    /// IoU on the pixel grid. Degenerate boxes still have an area of one pixel.
    pub fn iou_inclusive(&self, other: &BvrBox) -> f32 {
        let inter = self.intersect_inclusive(other);
        let union = self.area_inclusive() + other.area_inclusive() - inter;
        if union <= 0. {
            return 0.;
        }
        inter / union
    }

    /// Translates the box by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Moves the box onto its class tile so boxes of different classes never overlap.
    pub fn on_class_tile(&self, class_id: usize, tile: (f32, f32)) -> Self {
        let class = class_id as f32;
        self.offset(class * tile.0, class * tile.1)
    }

    /// Unweighted coordinate mean of `boxes`. `None` for an empty slice.
    pub fn mean(boxes: &[BvrBox]) -> Option<Self> {
        if boxes.is_empty() {
            return None;
        }
        let n = boxes.len() as f32;
        let mut acc = [0f32; 4];
        for b in boxes {
            for (a, v) in acc.iter_mut().zip(b.to_array()) {
                *a += v;
            }
        }
        Some(Self::new(acc[0] / n, acc[1] / n, acc[2] / n, acc[3] / n))
    }

    /// Coordinate mean weighted by `weights`, normalised to sum to one.
    ///
    /// Returns `None` when the slices differ in length, are empty, or the weights sum to zero.
    pub fn weighted_mean(boxes: &[BvrBox], weights: &[f32]) -> Option<Self> {
        if boxes.is_empty() || boxes.len() != weights.len() {
            return None;
        }
        let total: f32 = weights.iter().sum();
        if total <= 0. || !total.is_finite() {
            return None;
        }
        let mut acc = [0f32; 4];
        for (b, w) in boxes.iter().zip(weights) {
            let w = w / total;
            for (a, v) in acc.iter_mut().zip(b.to_array()) {
                *a += w * v;
            }
        }
        Some(Self::new(acc[0], acc[1], acc[2], acc[3]))
    }

    /// Sets the bounding box's coordinates using `(x1, y1, x2, y2)` and calculates width and height.
    ///
    /// # Arguments
    ///
    /// * `x1` - The x-coordinate of the top-left corner.
    /// * `y1` - The y-coordinate of the top-left corner.
    /// * `x2` - The x-coordinate of the bottom-right corner.
    /// * `y2` - The y-coordinate of the bottom-right corner.
    ///
    /// # Returns
    ///
    /// A `BvrBox` instance with updated coordinates and dimensions.
    pub fn with_x1y1_x2y2(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;

        self.w = x2 - x1;
        self.h = y2 - y1;
        self
    }
}
