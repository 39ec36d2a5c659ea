//! Density-based clustering (DBSCAN) over unit-norm vectors.
//!
//! Distance is cosine distance. A point's neighborhood includes the point
//! itself and every point within `eps`. Points with at least `min_points`
//! neighbors are core points; clusters grow outward from core points in input
//! order, and everything unreachable from a core point is noise.

use std::collections::VecDeque;

use crate::semantic::vector::cosine_distance;

/// Cluster label per input point, `None` for noise. Labels start at 0 and are
/// assigned in the order clusters are discovered.
pub fn dbscan(points: &[&[f32]], eps: f32, min_points: usize) -> Vec<Option<usize>> {
    let n = points.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut next_label = 0;

    let region = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| cosine_distance(points[i], points[j]) <= eps)
            .collect()
    };

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbors = region(i);
        if neighbors.len() < min_points {
            continue;
        }

        let label = next_label;
        next_label += 1;
        labels[i] = Some(label);

        let mut queue: VecDeque<usize> = neighbors.into();
        while let Some(j) = queue.pop_front() {
            if !visited[j] {
                visited[j] = true;
                let expansion = region(j);
                if expansion.len() >= min_points {
                    queue.extend(expansion);
                }
            }
            // Border points join the first cluster that reaches them.
            if labels[j].is_none() {
                labels[j] = Some(label);
            }
        }
    }

    labels
}
