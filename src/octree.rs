//! Point octree for decoration placement queries
//!
//! General-purpose 3D point index supporting insert, box query, sphere query
//! and nearest-neighbor lookup. Insertion order does not affect query
//! correctness, only tree shape. Descent is iterative (insert) or driven by
//! an explicit stack (queries); together with the minimum cell size this
//! bounds tree depth even for degenerate point clusters.

use glam::Vec3;

// =============================================================================
// TREE PARAMETERS
// =============================================================================

/// A leaf splits once it holds more than this many points
const MAX_POINTS_PER_LEAF: usize = 8;

/// Leaves at or below this half-extent never split, whatever they hold
const MIN_HALF_SIZE: f32 = 0.01;

/// Nearest-neighbor search starts at this fraction of the root size
const NEAREST_START_FRACTION: f32 = 0.1;

// =============================================================================
// POINTS AND NODES
// =============================================================================

/// A point stored in the octree. `id` is a caller-defined payload; the
/// vegetation planner stores the originating vertex index there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialPoint {
    pub position: Vec3,
    pub id: u32,
}

impl SpatialPoint {
    pub fn new(position: Vec3, id: u32) -> Self {
        Self { position, id }
    }
}

/// One octree cell. A node is either a leaf (points, no children) or
/// interior (no points, exactly 8 children) — never both after a split.
#[derive(Debug)]
pub struct OctreeNode {
    center: Vec3,
    half_size: f32,
    points: Vec<SpatialPoint>,
    children: Option<Box<[OctreeNode; 8]>>,
}

impl OctreeNode {
    fn new(center: Vec3, half_size: f32) -> Self {
        Self {
            center,
            half_size,
            points: Vec::new(),
            children: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    /// Divide into 8 equal octants and redistribute the held points into
    /// whichever child contains them.
    fn split(&mut self) {
        let center = self.center;
        let quarter = self.half_size * 0.5;
        let mut children: Box<[OctreeNode; 8]> = Box::new(std::array::from_fn(|octant| {
            OctreeNode::new(center + octant_offset(octant, quarter), quarter)
        }));

        for point in self.points.drain(..) {
            let octant = child_octant(center, point.position);
            children[octant].points.push(point);
        }

        self.children = Some(children);
    }
}

/// Offset of an octant center from its parent center. Octants are keyed by
/// sign combinations of (x, y, z): bit 0 = +x, bit 1 = +y, bit 2 = +z.
fn octant_offset(octant: usize, quarter: f32) -> Vec3 {
    Vec3::new(
        if octant & 1 != 0 { quarter } else { -quarter },
        if octant & 2 != 0 { quarter } else { -quarter },
        if octant & 4 != 0 { quarter } else { -quarter },
    )
}

/// Octant index of a position relative to a cell center. Matches
/// `octant_offset`: boundary points land on the positive side.
fn child_octant(center: Vec3, position: Vec3) -> usize {
    (position.x >= center.x) as usize
        | ((position.y >= center.y) as usize) << 1
        | ((position.z >= center.z) as usize) << 2
}

fn aabb_overlap(center_a: Vec3, half_a: Vec3, center_b: Vec3, half_b: Vec3) -> bool {
    let d = (center_a - center_b).abs();
    let reach = half_a + half_b;
    d.x <= reach.x && d.y <= reach.y && d.z <= reach.z
}

fn point_in_box(position: Vec3, center: Vec3, half_extents: Vec3) -> bool {
    let d = (position - center).abs();
    d.x <= half_extents.x && d.y <= half_extents.y && d.z <= half_extents.z
}

// =============================================================================
// OCTREE
// =============================================================================

/// Octree over a fixed cubic volume. Constructed with bounds covering the
/// expected placement volume (the vegetation planner uses 2.5x the planet
/// radius); grows in depth via splits; `clear` resets to an empty root with
/// the same bounds.
#[derive(Debug)]
pub struct Octree {
    root: OctreeNode,
    center: Vec3,
    half_size: f32,
    count: usize,
}

impl Octree {
    pub fn new(center: Vec3, half_size: f32) -> Self {
        Self {
            root: OctreeNode::new(center, half_size),
            center,
            half_size,
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Insert a point. Positions outside the root bounds are clamped onto
    /// the boundary so every point lands in exactly one leaf.
    pub fn insert(&mut self, point: SpatialPoint) {
        let low = self.center - Vec3::splat(self.half_size);
        let high = self.center + Vec3::splat(self.half_size);
        let point = SpatialPoint {
            position: point.position.clamp(low, high),
            id: point.id,
        };

        let mut node = &mut self.root;
        loop {
            let n = node;
            if n.children.is_none() {
                node = n;
                break;
            }
            let octant = child_octant(n.center, point.position);
            node = &mut n.children.as_deref_mut().unwrap()[octant];
        }

        node.points.push(point);
        if node.points.len() > MAX_POINTS_PER_LEAF && node.half_size > MIN_HALF_SIZE {
            node.split();
        }
        self.count += 1;
    }

    /// All points inside the axis-aligned box, boundary inclusive. Subtrees
    /// whose bounds miss the box are pruned before descending.
    pub fn query_box(&self, center: Vec3, half_extents: Vec3) -> Vec<SpatialPoint> {
        let mut results = Vec::new();
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            if !aabb_overlap(node.center, Vec3::splat(node.half_size), center, half_extents) {
                continue;
            }
            match node.children.as_deref() {
                Some(children) => stack.extend(children.iter()),
                None => {
                    for point in &node.points {
                        if point_in_box(point.position, center, half_extents) {
                            results.push(*point);
                        }
                    }
                }
            }
        }

        results
    }

    /// All points within `radius` of `center`. Implemented as a box query
    /// over the bounding cube of side `2 * radius` followed by an exact
    /// distance filter (cube superset, then precise filter).
    pub fn query_sphere(&self, center: Vec3, radius: f32) -> Vec<SpatialPoint> {
        let radius_sq = radius * radius;
        self.query_box(center, Vec3::splat(radius))
            .into_iter()
            .filter(|p| p.position.distance_squared(center) <= radius_sq)
            .collect()
    }

    /// Closest point within `max_distance`, if any. The search starts from a
    /// small radius and doubles it until a candidate appears, so the result
    /// is approximate near the boundary of a doubling step rather than
    /// globally optimal; it never returns a point farther than
    /// `max_distance`.
    pub fn find_nearest(&self, position: Vec3, max_distance: f32) -> Option<SpatialPoint> {
        if self.count == 0 || max_distance.is_nan() || max_distance <= 0.0 {
            return None;
        }

        let mut radius = (self.half_size * NEAREST_START_FRACTION).min(max_distance);
        loop {
            let candidates = self.query_sphere(position, radius);
            let mut best: Option<(f32, SpatialPoint)> = None;
            for point in candidates {
                let d = point.position.distance_squared(position);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, point));
                }
            }
            if let Some((_, point)) = best {
                return Some(point);
            }
            if radius >= max_distance {
                return None;
            }
            radius = (radius * 2.0).min(max_distance);
        }
    }

    /// Discard all points and rebuild an empty root with the same bounds.
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.center, self.half_size);
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic scatter of points inside the given bounds.
    fn scatter(n: u32, half: f32) -> Vec<SpatialPoint> {
        (0..n)
            .map(|i| {
                let f = i as f32;
                let x = ((f * 0.731).sin() * 0.9) * half;
                let y = ((f * 1.137).cos() * 0.9) * half;
                let z = (((f + 3.0) * 0.389).sin() * 0.9) * half;
                SpatialPoint::new(Vec3::new(x, y, z), i)
            })
            .collect()
    }

    #[test]
    fn test_box_round_trip_returns_all_points_once() {
        let mut tree = Octree::new(Vec3::ZERO, 10.0);
        let points = scatter(50, 10.0);
        for p in &points {
            tree.insert(*p);
        }
        assert_eq!(tree.len(), 50);

        let mut found = tree.query_box(Vec3::ZERO, Vec3::splat(10.0));
        assert_eq!(found.len(), 50);
        found.sort_by_key(|p| p.id);
        let mut ids: Vec<u32> = found.iter().map(|p| p.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 50, "every point exactly once");
    }

    #[test]
    fn test_sphere_query_superset_then_filter() {
        let mut tree = Octree::new(Vec3::ZERO, 10.0);
        let points = scatter(80, 10.0);
        for p in &points {
            tree.insert(*p);
        }

        let center = Vec3::new(1.0, -2.0, 0.5);
        let radius = 4.0;
        let found = tree.query_sphere(center, radius);

        // Every returned point is genuinely inside the sphere
        for p in &found {
            assert!(p.position.distance(center) <= radius + 1e-5);
        }

        // No point inside the sphere is missing (brute-force cross-check)
        let expected: Vec<u32> = points
            .iter()
            .filter(|p| p.position.distance(center) <= radius)
            .map(|p| p.id)
            .collect();
        let mut got: Vec<u32> = found.iter().map(|p| p.id).collect();
        got.sort_unstable();
        let mut want = expected.clone();
        want.sort_unstable();
        assert_eq!(got, want);
    }

    #[test]
    fn test_nearest_single_point_within_reach() {
        let mut tree = Octree::new(Vec3::ZERO, 10.0);
        let target = SpatialPoint::new(Vec3::new(3.0, 0.0, 0.0), 7);
        tree.insert(target);

        // d = 3.0 from the origin
        let hit = tree.find_nearest(Vec3::ZERO, 3.5);
        assert_eq!(hit, Some(target));

        let exact = tree.find_nearest(Vec3::ZERO, 3.0);
        assert_eq!(exact, Some(target));
    }

    #[test]
    fn test_nearest_none_beyond_max_distance() {
        let mut tree = Octree::new(Vec3::ZERO, 10.0);
        tree.insert(SpatialPoint::new(Vec3::new(3.0, 0.0, 0.0), 7));
        assert_eq!(tree.find_nearest(Vec3::ZERO, 2.9), None);
    }

    #[test]
    fn test_nearest_on_empty_tree() {
        let tree = Octree::new(Vec3::ZERO, 10.0);
        assert_eq!(tree.find_nearest(Vec3::ZERO, 100.0), None);
    }

    #[test]
    fn test_nine_points_in_one_octant_trigger_exactly_one_split() {
        let mut tree = Octree::new(Vec3::ZERO, 10.0);
        // All points in the (+x, +y, +z) octant
        for i in 0..9 {
            let offset = 1.0 + i as f32 * 0.4;
            tree.insert(SpatialPoint::new(Vec3::new(offset, 2.0, 3.0), i));
        }

        let root = tree.root();
        assert!(!root.is_leaf(), "root should have split");
        assert_eq!(root.point_count(), 0, "interior nodes hold no points");

        let children = root.children().expect("interior root has children");
        let total: usize = children.iter().map(|c| c.point_count()).sum();
        assert_eq!(total, 9);
        for child in children.iter() {
            assert!(child.is_leaf(), "one insert causes exactly one split");
        }
    }

    #[test]
    fn test_eight_points_do_not_split() {
        let mut tree = Octree::new(Vec3::ZERO, 10.0);
        for i in 0..8 {
            tree.insert(SpatialPoint::new(Vec3::new(i as f32 * 0.1, 0.0, 0.0), i));
        }
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_minimum_cell_size_stops_splitting() {
        let mut tree = Octree::new(Vec3::ZERO, 0.008);
        for i in 0..30 {
            tree.insert(SpatialPoint::new(Vec3::splat(0.001), i));
        }
        assert!(tree.root().is_leaf(), "cells at the minimum size never split");
        assert_eq!(tree.root().point_count(), 30);
    }

    #[test]
    fn test_out_of_bounds_points_are_clamped_and_found() {
        let mut tree = Octree::new(Vec3::ZERO, 5.0);
        tree.insert(SpatialPoint::new(Vec3::new(100.0, 0.0, 0.0), 1));
        let all = tree.query_box(Vec3::ZERO, Vec3::splat(5.0));
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].position.x, 5.0);
    }

    #[test]
    fn test_clear_resets_to_empty_root_with_same_bounds() {
        let mut tree = Octree::new(Vec3::ZERO, 10.0);
        for p in scatter(20, 10.0) {
            tree.insert(p);
        }
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.root().is_leaf());
        assert!(tree.query_box(Vec3::ZERO, Vec3::splat(10.0)).is_empty());

        // Still usable after the reset
        tree.insert(SpatialPoint::new(Vec3::ONE, 0));
        assert_eq!(tree.len(), 1);
    }
}
