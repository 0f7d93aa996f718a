use super::*;

fn within_sorted(tree: &KdTree, query: DVec2, radius: f64) -> Vec<usize> {
    let mut found = Vec::new();
    tree.for_each_within(query, radius * radius, |i, _| found.push(i));
    found.sort_unstable();
    found
}

fn grid_points(n: usize) -> Vec<DVec2> {
    (0..n * n)
        .map(|i| DVec2::new((i % n) as f64, (i / n) as f64))
        .collect()
}

#[test]
fn test_build_empty() {
    assert!(KdTree::build(&[]).is_none());
}

#[test]
fn test_build_keeps_all_points() {
    let tree = KdTree::build(&grid_points(7)).unwrap();
    assert_eq!(tree.len(), 49);
}

#[test]
fn test_radius_is_strict() {
    let points = vec![DVec2::new(0.0, 0.0), DVec2::new(3.0, 0.0), DVec2::new(0.0, 2.9)];
    let tree = KdTree::build(&points).unwrap();
    // Exactly on the radius is excluded.
    assert_eq!(within_sorted(&tree, DVec2::ZERO, 3.0), vec![0, 2]);
    assert_eq!(within_sorted(&tree, DVec2::ZERO, 3.0001), vec![0, 1, 2]);
}

#[test]
fn test_matches_brute_force() {
    let points: Vec<DVec2> = (0..300)
        .map(|i| {
            let t = i as f64;
            DVec2::new((t * 7.31).sin() * 50.0 + 50.0, (t * 3.17).cos() * 40.0 + 40.0)
        })
        .collect();
    let tree = KdTree::build(&points).unwrap();

    for (qi, radius) in [(0, 5.0), (17, 12.5), (123, 0.5), (299, 30.0)] {
        let query = points[qi] + DVec2::new(0.25, -0.75);
        let mut expected: Vec<usize> = (0..points.len())
            .filter(|&i| query.distance_squared(points[i]) < radius * radius)
            .collect();
        expected.sort_unstable();
        assert_eq!(within_sorted(&tree, query, radius), expected, "query {qi}");
    }
}

#[test]
fn test_duplicate_coordinates() {
    let points = vec![DVec2::new(5.0, 5.0); 10];
    let tree = KdTree::build(&points).unwrap();
    assert_eq!(within_sorted(&tree, DVec2::new(5.0, 5.0), 0.1).len(), 10);
}

#[test]
fn test_mean_within() {
    let tree = KdTree::build(&grid_points(5)).unwrap();
    let (mean, count) = tree.mean_within(DVec2::new(2.0, 2.0), 1.5 * 1.5).unwrap();
    assert_eq!(count, 9);
    assert!((mean - DVec2::new(2.0, 2.0)).length() < 1e-12);

    assert!(tree.mean_within(DVec2::new(100.0, 100.0), 4.0).is_none());
}
