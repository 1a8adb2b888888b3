//! Axis-aligned rectangles and the pixel patches stored under them

/// Axis-aligned pixel rectangle, `x`/`y` inclusive, `right`/`bottom` exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rectangle {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rectangle {
    /// Create a rectangle from its top-left corner and size
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the last column, saturating at `u32::MAX`
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// One past the last row, saturating at `u32::MAX`
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Number of pixels covered
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the rectangle covers no pixels
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the two rectangles share at least one pixel
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Smallest rectangle containing both
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Whether the rectangle lies entirely inside a `width x height` image
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        // Widened to avoid overflow on hostile input
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    /// Portion of the rectangle inside a `width x height` image
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Self> {
        let right = self.x.saturating_add(self.width).min(width);
        let bottom = self.y.saturating_add(self.height).min(height);
        (self.x < right && self.y < bottom)
            .then(|| Self::new(self.x, self.y, right - self.x, bottom - self.y))
    }
}

/// Rectangle of pixel data copied from a variant image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    /// Region of the image this data covers
    pub rect: Rectangle,
    /// Row-contiguous pixel bytes, `rect.width * rect.height * channels` long
    pub data: Vec<u8>,
}

impl Patch {
    /// Payload size expected for this patch's rectangle
    pub const fn expected_len(&self, channels: u8) -> usize {
        self.rect.width as usize * self.rect.height as usize * channels as usize
    }
}
