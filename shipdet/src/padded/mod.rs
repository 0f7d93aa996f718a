//! Buffers extended with a constant zero border.
//!
//! Windowed operators read neighbours through the border instead of clamping
//! coordinates, then write results only for interior pixels.


use common::Buffer2;

#[derive(Debug, Clone)]
pub struct PaddedBuffer<T> {
    data: Buffer2<T>,
    margin: usize,
    width: usize,
    height: usize,
}

impl<T: Copy + Default> PaddedBuffer<T> {
    /// Copies `src` into the interior of a buffer with `margin` zero pixels on every side.
    pub fn from_buffer(src: &Buffer2<T>, margin: usize) -> Self {
        let width = src.width();
        let height = src.height();
        let padded_width = width + 2 * margin;
        let mut data = Buffer2::new_default(padded_width, height + 2 * margin);
        for (y, row) in src.rows().enumerate() {
            let start = (y + margin) * padded_width + margin;
            data.pixels_mut()[start..start + width].copy_from_slice(row);
        }
        Self {
            data,
            margin,
            width,
            height,
        }
    }

    /// Copies the interior back out, dropping the border.
    pub fn strip(&self) -> Buffer2<T> {
        self.data
            .crop(self.margin, self.margin, self.width, self.height)
    }
}

impl<T> PaddedBuffer<T> {
    #[inline]
    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Interior width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Interior height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Full buffer including the border.
    #[inline]
    pub fn padded(&self) -> &Buffer2<T> {
        &self.data
    }

    /// Sample at interior coordinate `(x, y)` shifted by `(dx, dy)`.
    ///
    /// `|dx|` and `|dy|` must not exceed the margin.
    #[inline]
    pub fn at(&self, x: usize, y: usize, dx: isize, dy: isize) -> &T {
        debug_assert!(dx.unsigned_abs() <= self.margin && dy.unsigned_abs() <= self.margin);
        let px = (x + self.margin).wrapping_add_signed(dx);
        let py = (y + self.margin).wrapping_add_signed(dy);
        self.data.get(px, py)
    }

    /// Padded-buffer row holding interior row `y`.
    #[inline]
    pub fn padded_row(&self, y: usize, dy: isize) -> &[T] {
        self.data.row((y + self.margin).wrapping_add_signed(dy))
    }
}
