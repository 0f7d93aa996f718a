//! Connected component labeling using union-find over run-length encoded rows.
//!
//! Rows are scanned word by word so background words cost one comparison.
//! Provisional labels are unioned towards the smaller root, which makes the
//! final labels follow raster discovery order: label 1 is the component whose
//! first pixel comes first in row-major order.


use common::{BitBuffer2, Buffer2};
use glam::DVec2;

use super::{Centroid, Connectivity};

/// A horizontal run of foreground pixels.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: u32, // inclusive
    end: u32,   // exclusive
    label: u32,
}

impl Run {
    /// Range of previous-row x coordinates that can touch this run.
    #[inline]
    fn search_window(&self, connectivity: Connectivity) -> (u32, u32) {
        match connectivity {
            Connectivity::Four => (self.start, self.end),
            Connectivity::Eight => (self.start.saturating_sub(1), self.end + 1),
        }
    }
}

#[inline]
fn runs_connected(prev: &Run, curr: &Run, connectivity: Connectivity) -> bool {
    match connectivity {
        Connectivity::Four => prev.start < curr.end && prev.end > curr.start,
        Connectivity::Eight => prev.start < curr.end + 1 && prev.end + 1 > curr.start,
    }
}

/// Appends the runs of one mask row to `runs`.
fn extract_runs(row_words: &[u64], width: usize, runs: &mut Vec<Run>) {
    let width = width as u32;
    let mut run_start: Option<u32> = None;

    for (word_idx, &word) in row_words.iter().enumerate() {
        let base_x = word_idx as u32 * 64;
        match word {
            0 => {
                if let Some(start) = run_start.take() {
                    runs.push(Run {
                        start,
                        end: base_x.min(width),
                        label: 0,
                    });
                }
            }
            u64::MAX => {
                run_start.get_or_insert(base_x);
            }
            _ => extract_runs_from_mixed_word(word, base_x, width, &mut run_start, runs),
        }
    }

    if let Some(start) = run_start {
        runs.push(Run {
            start,
            end: width,
            label: 0,
        });
    }
}

/// Walks run transitions inside one word using trailing-zero counts.
fn extract_runs_from_mixed_word(
    word: u64,
    base_x: u32,
    width: u32,
    run_start: &mut Option<u32>,
    runs: &mut Vec<Run>,
) {
    let word_end = (base_x + 64).min(width);
    let mut pos = base_x;

    while pos < word_end {
        let remaining = word >> (pos - base_x);
        match *run_start {
            Some(start) => {
                // Next zero bit closes the run. Ones up to the top bit carry over.
                let ones = (!remaining).trailing_zeros();
                let end = pos + ones;
                if ones >= 64 - (pos - base_x) || end >= word_end {
                    break;
                }
                runs.push(Run {
                    start,
                    end,
                    label: 0,
                });
                *run_start = None;
                pos = end;
            }
            None => {
                if remaining == 0 {
                    break;
                }
                let start = pos + remaining.trailing_zeros();
                if start >= word_end {
                    break;
                }
                *run_start = Some(start);
                pos = start;
            }
        }
    }
}

/// Assigns labels to `curr_runs`, unioning every previous-row run they touch.
fn merge_runs_with_prev(
    curr_runs: &mut [Run],
    prev_runs: &[Run],
    connectivity: Connectivity,
    uf: &mut UnionFind,
) {
    let mut prev_idx = 0;
    for run in curr_runs.iter_mut() {
        let (search_start, search_end) = run.search_window(connectivity);

        while prev_idx < prev_runs.len() && prev_runs[prev_idx].end <= search_start {
            prev_idx += 1;
        }

        let mut assigned = None;
        for prev in prev_runs[prev_idx..]
            .iter()
            .take_while(|prev| prev.start < search_end)
        {
            if !runs_connected(prev, run, connectivity) {
                continue;
            }
            match assigned {
                Some(label) if label != prev.label => uf.union(label, prev.label),
                None => assigned = Some(prev.label),
                _ => {}
            }
        }

        run.label = assigned.unwrap_or_else(|| uf.make_set());
    }
}

/// Union-find over provisional labels `1..`. Label 0 is background.
#[derive(Debug, Default)]
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn make_set(&mut self) -> u32 {
        let label = self.parent.len() as u32 + 1;
        self.parent.push(label);
        label
    }

    /// Root lookup with two-pass path compression.
    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[(root - 1) as usize] != root {
            root = self.parent[(root - 1) as usize];
        }

        let mut current = label;
        while current != root {
            let next = self.parent[(current - 1) as usize];
            self.parent[(current - 1) as usize] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (smaller, larger) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[(larger - 1) as usize] = smaller;
        }
    }

    /// Rewrites provisional labels to sequential `1..=n` and returns `n`.
    fn flatten_labels(&mut self, labels: &mut [u32]) -> usize {
        let len = self.parent.len();
        let mut label_map = vec![0u32; len + 1];
        let mut num_labels = 0u32;

        for label in 1..=len as u32 {
            let root = self.find(label);
            if label_map[root as usize] == 0 {
                num_labels += 1;
                label_map[root as usize] = num_labels;
            }
            label_map[label as usize] = label_map[root as usize];
        }

        for label in labels.iter_mut().filter(|label| **label != 0) {
            *label = label_map[*label as usize];
        }
        num_labels as usize
    }
}

/// Per-pixel component labels of a binary mask. 0 is background.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Buffer2<u32>,
    num_labels: usize,
}

impl LabelMap {
    pub fn from_mask(mask: &BitBuffer2, connectivity: Connectivity) -> Self {
        let width = mask.width();
        let height = mask.height();
        let mut labels = Buffer2::new_default(width, height);

        let mut uf = UnionFind::default();
        let mut prev_runs: Vec<Run> = Vec::with_capacity(width / 4);
        let mut curr_runs: Vec<Run> = Vec::with_capacity(width / 4);

        for y in 0..height {
            curr_runs.clear();
            extract_runs(mask.row_words(y), width, &mut curr_runs);
            if curr_runs.is_empty() {
                prev_runs.clear();
                continue;
            }

            merge_runs_with_prev(&mut curr_runs, &prev_runs, connectivity, &mut uf);

            let row = labels.row_mut(y);
            for run in &curr_runs {
                row[run.start as usize..run.end as usize].fill(run.label);
            }
            std::mem::swap(&mut prev_runs, &mut curr_runs);
        }

        let num_labels = uf.flatten_labels(labels.pixels_mut());
        Self { labels, num_labels }
    }

    /// Number of components, excluding background.
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.labels.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.labels.height()
    }

    #[inline]
    pub fn labels(&self) -> &Buffer2<u32> {
        &self.labels
    }

    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        *self.labels.get(x, y)
    }

    /// One centroid per label, in label order. Each is the rounded mean of its
    /// member pixel coordinates.
    pub fn centroids(&self) -> Vec<Centroid> {
        let mut sums = vec![(0u64, 0u64, 0usize); self.num_labels];
        for (y, row) in self.labels.rows().enumerate() {
            for (x, &label) in row.iter().enumerate() {
                if label == 0 {
                    continue;
                }
                let acc = &mut sums[(label - 1) as usize];
                acc.0 += x as u64;
                acc.1 += y as u64;
                acc.2 += 1;
            }
        }

        sums.into_iter()
            .map(|(sx, sy, count)| {
                let mean = DVec2::new(sx as f64, sy as f64) / count as f64;
                Centroid::from_mean(mean, count)
            })
            .collect()
    }
}
