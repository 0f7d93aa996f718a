//! Binary morphology with square structuring elements.
//!
//! A `size` x `size` element is anchored at `size / 2`, so it covers offsets
//! `-size/2 ..= size - 1 - size/2` on each axis. Pixels outside the mask never
//! contribute to a dilation and never break an erosion.
//!
//! Closing dilates with the reflected element, so it stays extensive for even
//! sizes as well: every input pixel survives.


use common::BitBuffer2;
use common::parallel::par_rows_mut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Dilate,
    Erode,
}

/// Inclusive offset range of a square element along one axis.
#[derive(Debug, Clone, Copy)]
struct Window {
    lo: isize,
    hi: isize,
}

impl Window {
    fn new(size: usize) -> Self {
        let anchor = (size / 2) as isize;
        Self {
            lo: -anchor,
            hi: size as isize - 1 - anchor,
        }
    }

    /// Point reflection through the anchor.
    fn reflected(self) -> Self {
        Self {
            lo: -self.hi,
            hi: -self.lo,
        }
    }

    /// In-bounds index range `[a, b]` covered around `i` on an axis of length `len`.
    #[inline]
    fn clip(self, i: usize, len: usize) -> (usize, usize) {
        let a = (i as isize + self.lo).max(0) as usize;
        let b = (i as isize + self.hi).min(len as isize - 1) as usize;
        (a, b)
    }
}

#[inline]
fn decide(op: Op, count: u32, span: usize) -> bool {
    match op {
        Op::Dilate => count > 0,
        Op::Erode => count as usize == span,
    }
}

/// Morphological closing (dilation followed by erosion) with a `size` x `size`
/// square. Bridges gaps narrower than the element between nearby fragments.
///
/// `size` 0 or 1 returns the mask unchanged.
pub fn close(mask: &BitBuffer2, size: usize) -> BitBuffer2 {
    if size <= 1 || mask.is_empty() {
        return mask.clone();
    }
    let window = Window::new(size);
    let dilated = apply(mask, window.reflected(), Op::Dilate);
    apply(&dilated, window, Op::Erode)
}

/// Dilation with a `size` x `size` square.
pub fn dilate(mask: &BitBuffer2, size: usize) -> BitBuffer2 {
    if size <= 1 || mask.is_empty() {
        return mask.clone();
    }
    apply(mask, Window::new(size), Op::Dilate)
}

/// Erosion with a `size` x `size` square.
pub fn erode(mask: &BitBuffer2, size: usize) -> BitBuffer2 {
    if size <= 1 || mask.is_empty() {
        return mask.clone();
    }
    apply(mask, Window::new(size), Op::Erode)
}

/// The square is separable: a horizontal pass then a vertical pass.
fn apply(mask: &BitBuffer2, window: Window, op: Op) -> BitBuffer2 {
    let horizontal = horizontal_pass(mask, window, op);
    vertical_pass(&horizontal, window, op)
}

fn horizontal_pass(mask: &BitBuffer2, window: Window, op: Op) -> BitBuffer2 {
    let width = mask.width();
    let mut out = BitBuffer2::new_default(width, mask.height());
    let words_per_row = out.words_per_row();

    par_rows_mut(out.words_mut(), words_per_row, |y, row| {
        let mut prefix = Vec::with_capacity(width + 1);
        prefix.push(0u32);
        let mut acc = 0u32;
        for x in 0..width {
            acc += mask.get_xy(x, y) as u32;
            prefix.push(acc);
        }

        for x in 0..width {
            let (a, b) = window.clip(x, width);
            let count = prefix[b + 1] - prefix[a];
            if decide(op, count, b - a + 1) {
                row[x / 64] |= 1u64 << (x % 64);
            }
        }
    });
    out
}

fn vertical_pass(mask: &BitBuffer2, window: Window, op: Op) -> BitBuffer2 {
    let width = mask.width();
    let height = mask.height();

    // Column prefix counts, row `y` holds counts of rows `0..y`.
    let mut prefix = vec![0u32; (height + 1) * width];
    for y in 0..height {
        for x in 0..width {
            prefix[(y + 1) * width + x] = prefix[y * width + x] + mask.get_xy(x, y) as u32;
        }
    }

    let mut out = BitBuffer2::new_default(width, height);
    let words_per_row = out.words_per_row();
    par_rows_mut(out.words_mut(), words_per_row, |y, row| {
        let (a, b) = window.clip(y, height);
        for x in 0..width {
            let count = prefix[(b + 1) * width + x] - prefix[a * width + x];
            if decide(op, count, b - a + 1) {
                row[x / 64] |= 1u64 << (x % 64);
            }
        }
    });
    out
}
