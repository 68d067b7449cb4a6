use crate::{
    config::VectorConfig,
    diagnostics::Diagnostics,
    error::Result,
    traits::RoomProducer,
    types::{signed_area, RoomPolygon, RoomSource, Segment, SegmentPool},
};
use drawing::Point2;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::debug;

/// Rooms as the bounded faces of the de-doored wall arrangement.
#[derive(Debug, Clone, Default)]
pub struct VectorRoomAssembler {
    config: VectorConfig,
}

impl VectorRoomAssembler {
    pub fn new(config: VectorConfig) -> Self {
        Self { config }
    }

    pub fn assemble(&self, segments: &SegmentPool) -> Vec<RoomPolygon> {
        let tolerance = self.config.snap_tolerance.max(f64::EPSILON);
        let residues = subtract_openings(&segments.walls, &segments.doors, tolerance);
        debug!(
            "{} wall segments left {} residues after removing {} door segments",
            segments.walls.len(),
            residues.len(),
            segments.doors.len()
        );

        let graph = PlanarGraph::build(&residues, tolerance);
        graph
            .faces()
            .into_iter()
            .filter(|ring| signed_area(ring) > self.config.min_face_area)
            .map(|ring| RoomPolygon::new(ring, RoomSource::Vector))
            .collect()
    }
}

impl RoomProducer for VectorRoomAssembler {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn produce(&self, segments: &SegmentPool, _diagnostics: &mut Diagnostics) -> Result<Vec<RoomPolygon>> {
        Ok(self.assemble(segments))
    }
}

fn sub(a: Point2, b: Point2) -> Point2 {
    Point2::new(a.x - b.x, a.y - b.y)
}

fn dot(a: Point2, b: Point2) -> f64 {
    a.x * b.x + a.y * b.y
}

fn cross(a: Point2, b: Point2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Remove the collinear overlap of every door from every wall.
///
/// A door that only crosses a wall removes a single point, which leaves the
/// wall whole.
pub fn subtract_openings(walls: &[Segment], doors: &[Segment], tolerance: f64) -> Vec<(Point2, Point2)> {
    let mut residues = Vec::new();

    for wall in walls {
        let dir = sub(wall.end, wall.start);
        let len2 = dot(dir, dir);
        if len2 <= 0.0 {
            continue;
        }
        let len = len2.sqrt();
        let mut kept = vec![(0.0_f64, 1.0_f64)];

        for door in doors {
            let ds = sub(door.start, wall.start);
            let de = sub(door.end, wall.start);
            if cross(dir, ds).abs() / len > tolerance || cross(dir, de).abs() / len > tolerance {
                continue;
            }
            let (t0, t1) = (dot(ds, dir) / len2, dot(de, dir) / len2);
            let lo = t0.min(t1).max(0.0);
            let hi = t0.max(t1).min(1.0);
            if (hi - lo) * len <= tolerance {
                continue;
            }
            kept = kept
                .into_iter()
                .flat_map(|(a, b)| {
                    if hi <= a || lo >= b {
                        vec![(a, b)]
                    } else {
                        let mut parts = Vec::with_capacity(2);
                        if lo > a {
                            parts.push((a, lo));
                        }
                        if hi < b {
                            parts.push((hi, b));
                        }
                        parts
                    }
                })
                .collect();
        }

        for (a, b) in kept {
            if (b - a) * len > tolerance {
                residues.push((wall.start.lerp(&wall.end, a), wall.start.lerp(&wall.end, b)));
            }
        }
    }

    residues
}

/// Noded, snapped and de-duplicated segment arrangement.
#[derive(Debug, Clone, Default)]
pub struct PlanarGraph {
    pub vertices: Vec<Point2>,
    pub edges: Vec<(usize, usize)>,
}

impl PlanarGraph {
    pub fn build(segments: &[(Point2, Point2)], tolerance: f64) -> Self {
        let mut splits: Vec<Vec<f64>> = vec![vec![0.0, 1.0]; segments.len()];

        // Sweep along x: only segments whose x-ranges overlap are compared.
        let mut order: Vec<usize> = (0..segments.len()).collect();
        order.sort_by(|x, y| min_x(segments[*x]).total_cmp(&min_x(segments[*y])));

        for (pos, &i) in order.iter().enumerate() {
            let reach = max_x(segments[i]) + tolerance;
            for &j in &order[pos + 1..] {
                if min_x(segments[j]) > reach {
                    break;
                }
                let (a, b) = segments[i];
                let (c, d) = segments[j];
                if !boxes_touch(a, b, c, d, tolerance) {
                    continue;
                }
                let r = sub(b, a);
                let s = sub(d, c);
                let (r_len, s_len) = (dot(r, r).sqrt(), dot(s, s).sqrt());
                if r_len <= 0.0 || s_len <= 0.0 {
                    continue;
                }
                let qp = sub(c, a);
                let denom = cross(r, s);

                if denom.abs() > 1e-12 * r_len * s_len {
                    let t = cross(qp, s) / denom;
                    let u = cross(qp, r) / denom;
                    let (tt, tu) = (tolerance / r_len, tolerance / s_len);
                    if (-tt..=1.0 + tt).contains(&t) && (-tu..=1.0 + tu).contains(&u) {
                        splits[i].push(t.clamp(0.0, 1.0));
                        splits[j].push(u.clamp(0.0, 1.0));
                    }
                } else if cross(qp, r).abs() / r_len <= tolerance {
                    // Collinear: each segment is split where the other one ends.
                    for p in [c, d] {
                        let t = dot(sub(p, a), r) / (r_len * r_len);
                        if (0.0..=1.0).contains(&t) {
                            splits[i].push(t);
                        }
                    }
                    for p in [a, b] {
                        let u = dot(sub(p, c), s) / (s_len * s_len);
                        if (0.0..=1.0).contains(&u) {
                            splits[j].push(u);
                        }
                    }
                }
            }
        }

        let mut snapper = VertexSnapper::new(tolerance);
        let mut edges = BTreeSet::new();
        for ((a, b), mut params) in segments.iter().zip(splits) {
            params.sort_by(|x, y| x.total_cmp(y));
            params.dedup_by(|x, y| (*x - *y).abs() <= f64::EPSILON);
            let ids: Vec<usize> = params.iter().map(|t| snapper.insert(a.lerp(b, *t))).collect();
            for pair in ids.windows(2) {
                let (u, v) = (pair[0], pair[1]);
                if u != v {
                    edges.insert((u.min(v), u.max(v)));
                }
            }
        }

        Self {
            vertices: snapper.vertices,
            edges: edges.into_iter().collect(),
        }
    }

    /// Bounded faces as counter-clockwise rings; dangling edges are ignored.
    pub fn faces(&self) -> Vec<Vec<Point2>> {
        let alive = self.prune_filaments();
        let live: Vec<(usize, usize)> = self
            .edges
            .iter()
            .zip(&alive)
            .filter(|(_, keep)| **keep)
            .map(|(e, _)| *e)
            .collect();
        if live.is_empty() {
            return Vec::new();
        }

        // Half-edge 2k runs u->v of live[k], 2k+1 runs v->u.
        let origin = |h: usize| if h % 2 == 0 { live[h / 2].0 } else { live[h / 2].1 };
        let target = |h: usize| if h % 2 == 0 { live[h / 2].1 } else { live[h / 2].0 };
        let half_edges = live.len() * 2;

        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.vertices.len()];
        for h in 0..half_edges {
            outgoing[origin(h)].push(h);
        }
        let angle = |h: usize| {
            let d = sub(self.vertices[target(h)], self.vertices[origin(h)]);
            d.y.atan2(d.x)
        };
        let mut slot = vec![0usize; half_edges];
        for out in &mut outgoing {
            out.sort_by(|x, y| angle(*x).total_cmp(&angle(*y)));
            for (i, h) in out.iter().enumerate() {
                slot[*h] = i;
            }
        }

        // Arriving at v along h, leave along the edge just clockwise of twin(h),
        // which keeps the face on the left.
        let next: Vec<usize> = (0..half_edges)
            .map(|h| {
                let twin = h ^ 1;
                let out = &outgoing[target(h)];
                out[(slot[twin] + out.len() - 1) % out.len()]
            })
            .collect();

        let mut visited = vec![false; half_edges];
        let mut faces = Vec::new();
        for start in 0..half_edges {
            if visited[start] {
                continue;
            }
            let mut ring = Vec::new();
            let mut h = start;
            let mut closed = false;
            for _ in 0..half_edges {
                visited[h] = true;
                ring.push(self.vertices[origin(h)]);
                h = next[h];
                if h == start {
                    closed = true;
                    break;
                }
            }
            if closed && ring.len() >= 3 && signed_area(&ring) > 0.0 {
                faces.push(ring);
            }
        }
        faces
    }

    /// Repeatedly drop edges with a degree-one endpoint.
    fn prune_filaments(&self) -> Vec<bool> {
        let mut alive = vec![true; self.edges.len()];
        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); self.vertices.len()];
        for (k, (u, v)) in self.edges.iter().enumerate() {
            incident[*u].push(k);
            incident[*v].push(k);
        }
        let mut degree: Vec<usize> = incident.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..self.vertices.len()).filter(|v| degree[*v] == 1).collect();

        while let Some(v) = queue.pop_front() {
            if degree[v] != 1 {
                continue;
            }
            let Some(&k) = incident[v].iter().find(|k| alive[**k]) else {
                continue;
            };
            alive[k] = false;
            let (a, b) = self.edges[k];
            for end in [a, b] {
                degree[end] -= 1;
                if degree[end] == 1 {
                    queue.push_back(end);
                }
            }
        }
        alive
    }
}

fn min_x((a, b): (Point2, Point2)) -> f64 {
    a.x.min(b.x)
}

fn max_x((a, b): (Point2, Point2)) -> f64 {
    a.x.max(b.x)
}

fn boxes_touch(a: Point2, b: Point2, c: Point2, d: Point2, tolerance: f64) -> bool {
    a.x.min(b.x) <= c.x.max(d.x) + tolerance
        && c.x.min(d.x) <= a.x.max(b.x) + tolerance
        && a.y.min(b.y) <= c.y.max(d.y) + tolerance
        && c.y.min(d.y) <= a.y.max(b.y) + tolerance
}

/// Merges points that fall within `tolerance` of an existing vertex.
struct VertexSnapper {
    tolerance: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
    vertices: Vec<Point2>,
}

impl VertexSnapper {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cells: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn cell(&self, p: Point2) -> (i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
        )
    }

    fn insert(&mut self, p: Point2) -> usize {
        let (cx, cy) = self.cell(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.cells.get(&(cx + dx, cy + dy)) {
                    if let Some(id) = ids.iter().find(|id| self.vertices[**id].distance(&p) <= self.tolerance) {
                        return *id;
                    }
                }
            }
        }
        let id = self.vertices.len();
        self.vertices.push(p);
        self.cells.entry((cx, cy)).or_default().push(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Segment> {
        vec![
            Segment::wall((0.0, 0.0), (size, 0.0)),
            Segment::wall((size, 0.0), (size, size)),
            Segment::wall((size, size), (0.0, size)),
            Segment::wall((0.0, size), (0.0, 0.0)),
        ]
    }

    fn assemble(walls: Vec<Segment>, doors: Vec<Segment>) -> Vec<RoomPolygon> {
        VectorRoomAssembler::default().assemble(&SegmentPool::new(walls, doors))
    }

    #[test]
    fn test_closed_square_yields_one_room() {
        let rooms = assemble(square(10.0), vec![]);
        assert_eq!(rooms.len(), 1);
        let room = &rooms[0];
        assert_eq!(room.vertices.len(), 4);
        assert!((room.signed_area() - 100.0).abs() < 1e-9);
        for corner in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            assert!(room.vertices.contains(&Point2::from(corner)));
        }
        assert_eq!(room.source, RoomSource::Vector);
    }

    #[test]
    fn test_shared_wall_with_t_junctions() {
        let walls = vec![
            Segment::wall((0.0, 0.0), (20.0, 0.0)),
            Segment::wall((20.0, 0.0), (20.0, 10.0)),
            Segment::wall((20.0, 10.0), (0.0, 10.0)),
            Segment::wall((0.0, 10.0), (0.0, 0.0)),
            Segment::wall((10.0, 0.0), (10.0, 10.0)),
        ];
        let rooms = assemble(walls, vec![]);
        assert_eq!(rooms.len(), 2);
        assert!(rooms.iter().all(|r| (r.area() - 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_crossing_walls_are_noded() {
        let mut walls = square(10.0);
        walls.push(Segment::wall((5.0, 0.0), (5.0, 10.0)));
        walls.push(Segment::wall((0.0, 5.0), (10.0, 5.0)));
        let rooms = assemble(walls, vec![]);
        assert_eq!(rooms.len(), 4);
        assert!(rooms.iter().all(|r| (r.area() - 25.0).abs() < 1e-9));
    }

    #[test]
    fn test_faces_are_counter_clockwise_rooms() {
        let walls = vec![
            Segment::wall((0.0, 0.0), (30.0, 0.0)),
            Segment::wall((30.0, 0.0), (30.0, 10.0)),
            Segment::wall((30.0, 10.0), (0.0, 10.0)),
            Segment::wall((0.0, 10.0), (0.0, 0.0)),
            Segment::wall((10.0, 0.0), (10.0, 10.0)),
            Segment::wall((20.0, 10.0), (20.0, 0.0)),
        ];
        let rooms = assemble(walls, vec![]);
        assert_eq!(rooms.len(), 3);
        for room in &rooms {
            assert!((room.signed_area() - 100.0).abs() < 1e-9);
            assert_eq!(room.vertices.len(), 4);
        }
        let mut lefts: Vec<f64> = rooms
            .iter()
            .map(|r| r.vertices.iter().map(|p| p.x).fold(f64::INFINITY, f64::min))
            .collect();
        lefts.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(lefts, [0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_grid_of_long_walls() {
        // 11 horizontal and 11 vertical walls spanning the whole grid.
        let mut walls = Vec::new();
        for k in 0..=10 {
            let c = k as f64 * 5.0;
            walls.push(Segment::wall((0.0, c), (50.0, c)));
            walls.push(Segment::wall((c, 0.0), (c, 50.0)));
        }
        let rooms = assemble(walls, vec![]);
        assert_eq!(rooms.len(), 100);
        assert!(rooms.iter().all(|r| (r.area() - 25.0).abs() < 1e-9));
    }

    #[test]
    fn test_gap_breaks_the_cycle() {
        let walls = vec![
            Segment::wall((0.0, 0.0), (10.0, 0.0)),
            Segment::wall((10.0, 0.0), (10.0, 10.0)),
            Segment::wall((10.0, 10.0), (5.5, 10.0)),
            Segment::wall((4.5, 10.0), (0.0, 10.0)),
            Segment::wall((0.0, 10.0), (0.0, 0.0)),
        ];
        assert!(assemble(walls, vec![]).is_empty());
    }

    #[test]
    fn test_door_opening_is_removed() {
        let doors = vec![Segment::door((4.0, 10.0), (6.0, 10.0))];
        assert!(assemble(square(10.0), doors).is_empty());
    }

    #[test]
    fn test_crossing_door_leaves_wall_intact() {
        let doors = vec![Segment::door((5.0, 9.0), (5.0, 11.0))];
        assert_eq!(assemble(square(10.0), doors).len(), 1);
    }

    #[test]
    fn test_filaments_and_duplicates_are_ignored() {
        let mut walls = square(10.0);
        walls.push(Segment::wall((0.0, 5.0), (3.0, 5.0)));
        walls.push(Segment::wall((10.0, 0.0), (0.0, 0.0)));
        walls.push(Segment::wall((2.0, 0.0), (8.0, 0.0)));
        let rooms = assemble(walls, vec![]);
        assert_eq!(rooms.len(), 1);
        assert!((rooms[0].area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_fully_consumed_wall_has_no_residue() {
        let walls = vec![Segment::wall((0.0, 0.0), (2.0, 0.0))];
        let doors = vec![Segment::door((-1.0, 0.0), (3.0, 0.0))];
        assert!(subtract_openings(&walls, &doors, 1e-6).is_empty());

        let partial = subtract_openings(&walls, &[Segment::door((0.5, 0.0), (1.0, 0.0))], 1e-6);
        assert_eq!(partial.len(), 2);
    }
}
