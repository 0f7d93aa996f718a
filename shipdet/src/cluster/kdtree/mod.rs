//! 2D k-d tree over pixel coordinates for bandwidth neighbourhood queries.

#[cfg(test)]
mod tests;

use glam::DVec2;

/// Static k-d tree, built once and queried many times.
#[derive(Debug)]
pub(crate) struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<DVec2>,
}

#[derive(Debug, Clone)]
struct KdNode {
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// 0 = x, 1 = y
    split_dim: usize,
}

impl KdTree {
    /// Median-split build. Returns `None` for an empty point set.
    pub fn build(points: &[DVec2]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let points = points.to_vec();
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        Self::build_recursive(&points, &mut indices, 0, &mut nodes);

        Some(Self { nodes, points })
    }

    fn build_recursive(
        points: &[DVec2],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % 2;
        let median = indices.len() / 2;
        indices.select_nth_unstable_by(median, |&a, &b| {
            points[a][split_dim].total_cmp(&points[b][split_dim])
        });

        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx: indices[median],
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, &mut right_part[1..], depth + 1, nodes);

        nodes[node_idx].left = left;
        nodes[node_idx].right = right;
        Some(node_idx)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Calls `f(index, point)` for every point strictly closer than `sqrt(radius_sq)` to `query`.
    pub fn for_each_within(&self, query: DVec2, radius_sq: f64, mut f: impl FnMut(usize, DVec2)) {
        self.visit(0, query, radius_sq, &mut f);
    }

    fn visit(&self, node_idx: usize, query: DVec2, radius_sq: f64, f: &mut impl FnMut(usize, DVec2)) {
        let node = &self.nodes[node_idx];
        let point = self.points[node.point_idx];

        if query.distance_squared(point) < radius_sq {
            f(node.point_idx, point);
        }

        let diff = query[node.split_dim] - point[node.split_dim];
        let diff_sq = diff * diff;

        if let Some(left) = node.left
            && (diff <= 0.0 || diff_sq < radius_sq)
        {
            self.visit(left, query, radius_sq, f);
        }
        if let Some(right) = node.right
            && (diff >= 0.0 || diff_sq < radius_sq)
        {
            self.visit(right, query, radius_sq, f);
        }
    }

    /// Mean of the points strictly within the radius, with their count.
    pub fn mean_within(&self, query: DVec2, radius_sq: f64) -> Option<(DVec2, usize)> {
        let mut sum = DVec2::ZERO;
        let mut count = 0usize;
        self.for_each_within(query, radius_sq, |_, p| {
            sum += p;
            count += 1;
        });
        (count > 0).then(|| (sum / count as f64, count))
    }
}
