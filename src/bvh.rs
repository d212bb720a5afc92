use super::*;

// Implementation based on PBRT's bounding volume hierarchy.

const TRAVERSAL_STACK_SIZE: usize = 64;

#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Default, Debug)]
pub struct Node {
    pub bounds_mn: Point3,
    pub bounds_mx: Point3,
    /// First primitive for leaves, second child for interior nodes. The first
    /// child always directly follows its parent.
    pub offset: u32,
    pub primitive_count: u8,
    pub axis: u8,
    pub pad: u16,
}

impl Node {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.primitive_count > 0
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_min_max(&self.bounds_mn, &self.bounds_mx)
    }
}

/// What a traversal callback reports for one primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Visit {
    Miss,
    /// Hit at this parameter. Traversal keeps going with `t_max` shrunk to it.
    Hit(f32),
    /// End traversal immediately.
    Stop,
}

#[derive(Clone, Debug, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    primitive_indices: Vec<u32>,
}

impl Bvh {
    /// Builds a hierarchy over primitives given by their bounds. Leaves refer
    /// back to positions in `bounds`.
    pub fn create(bounds: &[Aabb]) -> Self {
        if bounds.is_empty() {
            return Self::default();
        }

        // Primitives.
        let mut primitives = bounds
            .iter()
            .enumerate()
            .map(|(primitive_id, bounds)| BuildPrimitive::from(primitive_id, *bounds))
            .collect::<Vec<_>>();

        // Build.
        let mut build_nodes = vec![];
        let mut ordered_primitives = vec![];
        build_recursive(&mut primitives, &mut build_nodes, &mut ordered_primitives);

        // Flatten.
        let mut nodes = vec![];
        flatten(&build_nodes, 0, &mut nodes);

        debug!(
            "Built bvh with {} nodes over {} primitives",
            nodes.len(),
            ordered_primitives.len()
        );

        Self {
            nodes,
            primitive_indices: ordered_primitives
                .into_iter()
                .map(|primitive| primitive as u32)
                .collect(),
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn primitive_indices(&self) -> &[u32] {
        &self.primitive_indices
    }

    /// Flat node buffer, ready to be uploaded as-is.
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or_else(Aabb::new, Node::bounds)
    }

    /// Visits every primitive whose leaf box the ray overlaps, near child
    /// first. `visit` receives the primitive index and the ray with its range
    /// clamped to the closest hit reported so far. Returns `false` when the
    /// traversal was stopped by the callback.
    pub fn traverse<F>(&self, ray: &Ray, stats: &mut QueryStats, mut visit: F) -> bool
    where
        F: FnMut(u32, &Ray) -> Visit,
    {
        if self.nodes.is_empty() {
            return true;
        }

        let mut ray = *ray;
        let ray_aabb = RayAabbIntersector::new(&ray);

        let mut node_index = 0;
        let mut todo_offset = 0;
        let mut todo = [0; TRAVERSAL_STACK_SIZE];

        loop {
            // Unpack bvh node.
            let bvh_node = &self.nodes[node_index];

            stats.ray_aabb_tests += 1;
            if ray_aabb.hit(&ray, &bvh_node.bounds()) {
                stats.ray_aabb_hits += 1;
                let offset = bvh_node.offset as usize;
                if bvh_node.is_leaf() {
                    // Visit leaf node primitives.
                    let primitive_count = usize::from(bvh_node.primitive_count);
                    for &primitive in &self.primitive_indices[offset..offset + primitive_count] {
                        match visit(primitive, &ray) {
                            Visit::Miss => {}
                            Visit::Hit(t) => ray.t_max = ray.t_max.min(t),
                            Visit::Stop => return false,
                        }
                    }

                    // End traversal.
                    if todo_offset == 0 {
                        break;
                    }

                    // Pop.
                    todo_offset -= 1;
                    node_index = todo[todo_offset];
                } else if ray_aabb.is_dir_negative(usize::from(bvh_node.axis)) {
                    todo[todo_offset] = node_index + 1;
                    todo_offset += 1;
                    node_index = offset;
                } else {
                    todo[todo_offset] = offset;
                    todo_offset += 1;
                    node_index += 1;
                }
            } else {
                // End traversal.
                if todo_offset == 0 {
                    break;
                }

                // Pop.
                todo_offset -= 1;
                node_index = todo[todo_offset];
            }
        }

        true
    }
}

fn build_recursive(
    primitives: &mut [BuildPrimitive],
    build_nodes: &mut Vec<BuildNode>,
    ordered_primitives: &mut Vec<usize>,
) -> usize {
    const BUCKET_COUNT: usize = 12;
    const NODE_MAX_PRIMITIVE_COUNT: usize = 255;

    #[derive(Clone, Copy)]
    struct Bucket {
        count: usize,
        bounds: Aabb,
    }

    impl Default for Bucket {
        fn default() -> Self {
            Self {
                count: 0,
                bounds: Aabb::new(),
            }
        }
    }

    // Validation.
    assert!(!primitives.is_empty());

    // Make a new node.
    build_nodes.push(BuildNode::default());
    let curr = build_nodes.len() - 1;

    // Current bounds.
    let bounds = primitives.iter().fold(Aabb::new(), |bounds, primitive| {
        bounds.merged(&primitive.bounds)
    });

    // Only one primitive left, terminate as leaf.
    let primitive_count = primitives.len();
    if primitive_count == 1 {
        build_nodes[curr].set_leaf(ordered_primitives.len(), primitive_count, bounds);
        ordered_primitives.extend(primitives.iter().map(|primitive| primitive.id));
        return curr;
    }

    // Build inner node.
    let centroid_bounds = Aabb::from_points(primitives.iter().map(|primitive| &primitive.centroid));
    let (split_axis, _) = centroid_bounds.extents().argmax();

    // Degenerate bounds, terminate as leaf.
    if primitive_count <= NODE_MAX_PRIMITIVE_COUNT
        && approx::ulps_eq!(
            centroid_bounds.max()[split_axis],
            centroid_bounds.min()[split_axis],
            max_ulps = 0
        )
    {
        build_nodes[curr].set_leaf(ordered_primitives.len(), primitive_count, bounds);
        ordered_primitives.extend(primitives.iter().map(|primitive| primitive.id));
        return curr;
    }

    let by_centroid = |primitive_a: &BuildPrimitive, primitive_b: &BuildPrimitive| {
        primitive_a.centroid[split_axis].total_cmp(&primitive_b.centroid[split_axis])
    };

    // Initial split point.
    let mut split = primitive_count / 2;

    // Reorder primitives according to SAH.
    let bounds_area = bounds.surface_area();
    if primitive_count <= 4 || bounds_area <= 0.0 {
        // SAH computation is excessive, sort by centroid instead.
        primitives.sort_by(by_centroid);
    } else {
        // Initialize buckets.
        let mut buckets = [Bucket::default(); BUCKET_COUNT];
        let find_bucket = |primitive: &BuildPrimitive| -> usize {
            let numer = primitive.centroid[split_axis] - centroid_bounds.min()[split_axis];
            let denom = centroid_bounds.max()[split_axis] - centroid_bounds.min()[split_axis];
            let bucket = (BUCKET_COUNT as f32 * numer / denom) as usize;
            bucket.min(BUCKET_COUNT - 1)
        };
        for primitive in primitives.iter() {
            let bucket = &mut buckets[find_bucket(primitive)];
            bucket.count += 1;
            bucket.bounds.merge(&primitive.bounds);
        }

        // Bruteforce SAH cost at every possible split point.
        let mut costs = [0.0; BUCKET_COUNT - 1];
        costs.iter_mut().enumerate().for_each(|(i, cost)| {
            let split_side = |buckets: &[Bucket]| {
                buckets
                    .iter()
                    .fold((0.0, Aabb::new()), |(count, bounds), bucket| {
                        (count + bucket.count as f32, bounds.merged(&bucket.bounds))
                    })
            };
            let left = split_side(&buckets[0..=i]);
            let right = split_side(&buckets[(i + 1)..BUCKET_COUNT]);

            *cost = 0.125
                + (left.0 * left.1.surface_area() + right.0 * right.1.surface_area())
                    / bounds_area;
        });

        // Find the bucket with the minimum SAH cost.
        let (min_cost_index, min_cost) = costs
            .iter()
            .copied()
            .enumerate()
            .min_by(|(_, x), (_, y)| x.total_cmp(y))
            .unwrap_or((0, f32::MAX));

        // Partition or terminate as leaf?
        let leaf_cost = primitive_count as f32;
        if primitive_count > NODE_MAX_PRIMITIVE_COUNT || min_cost < leaf_cost {
            // Partition around the best bucket.
            split = itertools::partition(primitives.iter_mut(), |primitive| {
                find_bucket(primitive) <= min_cost_index
            });

            // All primitives on one side, fall back to a median split.
            if split == 0 || split == primitive_count {
                split = primitive_count / 2;
                primitives.select_nth_unstable_by(split, by_centroid);
            }
        } else {
            // Splitting is too expensive, terminate as leaf.
            build_nodes[curr].set_leaf(ordered_primitives.len(), primitive_count, bounds);
            ordered_primitives.extend(primitives.iter().map(|primitive| primitive.id));
            return curr;
        }
    }

    // Recurse.
    let left = build_recursive(&mut primitives[0..split], build_nodes, ordered_primitives);
    let right = build_recursive(&mut primitives[split..], build_nodes, ordered_primitives);
    let children_bounds = build_nodes[left].bounds.merged(&build_nodes[right].bounds);
    build_nodes[curr].set_interior(split_axis, [left, right], children_bounds);

    curr
}

fn flatten(build_nodes: &[BuildNode], parent: usize, nodes: &mut Vec<Node>) -> usize {
    // Make a new node.
    let curr = nodes.len();
    nodes.push(Node::default());

    // Copy bounds.
    let build_node = &build_nodes[parent];
    nodes[curr].bounds_mn = build_node.bounds.min();
    nodes[curr].bounds_mx = build_node.bounds.max();

    // Leaf or interior.
    match build_node.kind {
        BuildNodeKind::Leaf {
            first_primitive_offset,
            primitive_count,
        } => {
            nodes[curr].offset = first_primitive_offset as u32;
            nodes[curr].primitive_count = primitive_count as u8;
        }
        BuildNodeKind::Interior {
            split_axis,
            children,
        } => {
            nodes[curr].axis = split_axis as u8;

            // Recurse.
            flatten(build_nodes, children[0], nodes);
            nodes[curr].offset = flatten(build_nodes, children[1], nodes) as u32;
        }
        BuildNodeKind::Unset => unreachable!("Bvh build node was never assigned"),
    }

    curr
}

#[derive(Debug)]
struct BuildPrimitive {
    id: usize,
    centroid: Point3,
    bounds: Aabb,
}

impl BuildPrimitive {
    fn from(id: usize, bounds: Aabb) -> Self {
        Self {
            id,
            centroid: bounds.center(),
            bounds,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BuildNodeKind {
    Unset,
    Leaf {
        first_primitive_offset: usize,
        primitive_count: usize,
    },
    Interior {
        split_axis: usize,
        children: [usize; 2],
    },
}

#[derive(Clone, Copy, Debug)]
struct BuildNode {
    bounds: Aabb,
    kind: BuildNodeKind,
}

impl Default for BuildNode {
    fn default() -> Self {
        Self {
            bounds: Aabb::new(),
            kind: BuildNodeKind::Unset,
        }
    }
}

impl BuildNode {
    fn set_leaf(&mut self, first_primitive_offset: usize, primitive_count: usize, bounds: Aabb) {
        assert_eq!(self.kind, BuildNodeKind::Unset);
        self.bounds = bounds;
        self.kind = BuildNodeKind::Leaf {
            first_primitive_offset,
            primitive_count,
        };
    }

    fn set_interior(&mut self, split_axis: usize, children: [usize; 2], bounds: Aabb) {
        assert_eq!(self.kind, BuildNodeKind::Unset);
        self.bounds = bounds;
        self.kind = BuildNodeKind::Interior {
            split_axis,
            children,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_bounds(n: usize) -> Vec<Aabb> {
        let mut bounds = vec![];
        for x in 0..n {
            for z in 0..n {
                let min = Point3::new(x as f32 * 2.0, 0.0, z as f32 * 2.0);
                let max = min + Vec3::repeat(1.0);
                bounds.push(Aabb::from_min_max(&min, &max));
            }
        }
        bounds
    }

    #[test]
    fn test_every_primitive_referenced_once() {
        crate::init_test_logger();
        let bounds = grid_bounds(10);
        let bvh = Bvh::create(&bounds);
        let mut indices = bvh.primitive_indices().to_vec();
        indices.sort_unstable();
        assert_eq!(indices, (0..bounds.len() as u32).collect::<Vec<_>>());

        let leaf_total = bvh
            .nodes()
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| usize::from(node.primitive_count))
            .sum::<usize>();
        assert_eq!(leaf_total, bounds.len());
    }

    #[test]
    fn test_root_contains_all() {
        let bounds = grid_bounds(4);
        let bvh = Bvh::create(&bounds);
        let root = bvh.bounds();
        for b in &bounds {
            assert!(root.contains(&b.min()));
            assert!(root.contains(&b.max()));
        }
    }

    #[test]
    fn test_identical_primitives_make_leaf() {
        let unit = Aabb::from_min_max(&Point3::origin(), &Point3::new(1.0, 1.0, 1.0));
        let bvh = Bvh::create(&[unit; 8]);
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.nodes()[0].primitive_count, 8);
    }

    #[test]
    fn test_empty() {
        let bvh = Bvh::create(&[]);
        assert!(bvh.nodes().is_empty());
        let ray = Ray::new(Point3::origin(), normal![0.0, 0.0, 1.0]);
        let mut stats = QueryStats::default();
        assert!(bvh.traverse(&ray, &mut stats, |_, _| Visit::Stop));
        assert_eq!(stats.ray_aabb_tests, 0);
    }

    #[test]
    fn test_node_bytes() {
        assert_eq!(std::mem::size_of::<Node>(), 32);
        let bvh = Bvh::create(&grid_bounds(3));
        assert_eq!(bvh.node_bytes().len(), 32 * bvh.nodes().len());
    }

    #[test]
    fn test_traverse_visits_overlapping_leaves_only() {
        let bounds = grid_bounds(8);
        let bvh = Bvh::create(&bounds);

        // Straight down onto the box at grid cell (3, 5).
        let ray = Ray::new(Point3::new(6.5, 10.0, 10.5), normal![0.0, -1.0, 0.0]);
        let mut stats = QueryStats::default();
        let mut visited = vec![];
        bvh.traverse(&ray, &mut stats, |primitive, _| {
            visited.push(primitive);
            Visit::Miss
        });
        assert!(visited.contains(&(3 * 8 + 5)));
        assert!(visited.len() < bounds.len());
        assert!(stats.ray_aabb_tests >= stats.ray_aabb_hits);
    }

    #[test]
    fn test_traverse_stop() {
        let bvh = Bvh::create(&grid_bounds(4));
        let ray = Ray::new(Point3::new(-1.0, 0.5, 0.5), normal![1.0, 0.0, 0.0]);
        let mut stats = QueryStats::default();
        let mut visits = 0;
        let finished = bvh.traverse(&ray, &mut stats, |_, _| {
            visits += 1;
            Visit::Stop
        });
        assert!(!finished);
        assert_eq!(visits, 1);
    }
}
