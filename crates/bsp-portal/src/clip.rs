//! 2D polygon clipping used to resolve portal adjacency and coverage.
//!
//! [`ClipKernel`] is the boundary the tree talks to: flat point lists with
//! per-polygon vertex counts in, index pairs and covered indices out.
//! [`GeoClipKernel`] implements it in-process on top of `geo` booleans.

use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use nalgebra::Point2;

use crate::BuildConfig;

/// What a polygon slot of a [`ClipInput`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonOwner {
    /// A portal face; the payload is the caller's index for it.
    Portal(usize),
    /// A model face; the payload is the caller's index for it.
    Model(usize),
}

/// Polygons of one splitting plane, in plane coordinates.
#[derive(Debug, Clone, Default)]
pub struct ClipInput {
    points: Vec<Point2<f32>>,
    counts: Vec<usize>,
    owners: Vec<PolygonOwner>,
}

impl ClipInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a polygon slot.
    pub fn push(&mut self, owner: PolygonOwner, ring: impl IntoIterator<Item = Point2<f32>>) {
        let before = self.points.len();
        self.points.extend(ring);
        self.counts.push(self.points.len() - before);
        self.owners.push(owner);
    }

    /// Flat vertex list of all slots.
    pub fn points(&self) -> &[Point2<f32>] {
        &self.points
    }

    /// Vertex count of each slot.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Owner of each slot.
    pub fn owners(&self) -> &[PolygonOwner] {
        &self.owners
    }

    /// Iterates `(owner, ring)` per slot.
    pub fn polygons(&self) -> impl Iterator<Item = (PolygonOwner, &[Point2<f32>])> {
        let mut start = 0;
        self.counts.iter().zip(&self.owners).map(move |(&count, &owner)| {
            let ring = &self.points[start..start + count];
            start += count;
            (owner, ring)
        })
    }
}

/// Two portal faces whose polygons overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedPair {
    pub a: usize,
    pub b: usize,
    /// The overlap is entirely covered by model faces.
    pub blocked: bool,
}

/// Overlap region of two portal faces that only partially coincide.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub a: usize,
    pub b: usize,
    pub polygon: Vec<Point2<f32>>,
}

/// Output of [`ClipKernel::clip_polygons`]. Indices are portal owner payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipOutput {
    pub connected: Vec<ConnectedPair>,
    pub covered: Vec<usize>,
    pub intersected: Vec<Overlap>,
}

/// Polygon boolean engine for one splitting plane at a time.
pub trait ClipKernel {
    /// Resolves overlap between portal polygons after subtracting the area
    /// covered by model polygons.
    fn clip_polygons(&self, input: &ClipInput) -> ClipOutput;

    /// Merges polygons into their union, returned as outer rings.
    fn union_polygons(&self, polygons: &[Vec<Point2<f32>>]) -> Vec<Vec<Point2<f32>>>;
}

/// [`ClipKernel`] backed by `geo`'s boolean operations.
///
/// Booleans of f32 walls that only share an edge leave slivers along that
/// edge. A polygon only counts when it is wider than epsilon, measured as
/// `2 * area / perimeter`, so those slivers vanish at any orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoClipKernel {
    epsilon: f64,
}

impl GeoClipKernel {
    /// Polygons narrower than `epsilon`, or with area at most `epsilon²`,
    /// count as empty.
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(f64::from(config.epsilon))
    }

    fn is_solid(&self, poly: &Polygon<f64>) -> bool {
        let area = poly.unsigned_area();
        area > self.epsilon * self.epsilon && 2.0 * area > self.epsilon * perimeter(poly)
    }

    fn is_empty(&self, region: &MultiPolygon<f64>) -> bool {
        !region.0.iter().any(|poly| self.is_solid(poly))
    }

    fn solid_area(&self, region: &MultiPolygon<f64>) -> f64 {
        region
            .0
            .iter()
            .filter(|poly| self.is_solid(poly))
            .map(|poly| poly.unsigned_area())
            .sum()
    }
}

impl Default for GeoClipKernel {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}

impl ClipKernel for GeoClipKernel {
    fn clip_polygons(&self, input: &ClipInput) -> ClipOutput {
        let mut portals: Vec<(usize, MultiPolygon<f64>)> = Vec::new();
        let mut model = MultiPolygon::new(Vec::new());

        for (owner, ring) in input.polygons() {
            if ring.len() < 3 {
                continue;
            }
            let region = MultiPolygon::new(vec![to_geo(ring)]);
            match owner {
                PolygonOwner::Portal(idx) => portals.push((idx, region)),
                PolygonOwner::Model(_) => model = model.union(&region),
            }
        }

        let uncovered: Vec<MultiPolygon<f64>> = portals
            .iter()
            .map(|(_, region)| {
                if model.0.is_empty() {
                    region.clone()
                } else {
                    region.difference(&model)
                }
            })
            .collect();

        let mut out = ClipOutput::default();
        for (i, (idx, region)) in portals.iter().enumerate() {
            if !self.is_empty(region) && self.is_empty(&uncovered[i]) {
                out.covered.push(*idx);
            }
        }

        for i in 0..portals.len() {
            for j in i + 1..portals.len() {
                let (a, region_a) = &portals[i];
                let (b, region_b) = &portals[j];
                let overlap = region_a.intersection(region_b);
                if self.is_empty(&overlap) {
                    continue;
                }
                let open = uncovered[i].intersection(&uncovered[j]);
                out.connected.push(ConnectedPair {
                    a: *a,
                    b: *b,
                    blocked: self.is_empty(&open),
                });

                // the smaller polygon decides whether the overlap is all of it
                let smaller = if region_a.unsigned_area() <= region_b.unsigned_area() {
                    region_a
                } else {
                    region_b
                };
                let slack = self.epsilon * smaller.0.iter().map(perimeter).sum::<f64>();
                if self.solid_area(&overlap) < smaller.unsigned_area() - slack {
                    out.intersected.extend(
                        overlap
                            .0
                            .iter()
                            .filter(|poly| self.is_solid(poly))
                            .map(|poly| Overlap {
                                a: *a,
                                b: *b,
                                polygon: from_geo(poly),
                            }),
                    );
                }
            }
        }
        out
    }

    fn union_polygons(&self, polygons: &[Vec<Point2<f32>>]) -> Vec<Vec<Point2<f32>>> {
        let merged = polygons
            .iter()
            .filter(|ring| ring.len() >= 3)
            .fold(MultiPolygon::new(Vec::new()), |acc, ring| {
                acc.union(&MultiPolygon::new(vec![to_geo(ring)]))
            });
        merged
            .0
            .iter()
            .filter(|poly| self.is_solid(poly))
            .map(from_geo)
            .collect()
    }
}

/// Boundary length, holes included.
fn perimeter(poly: &Polygon<f64>) -> f64 {
    std::iter::once(poly.exterior())
        .chain(poly.interiors())
        .map(|ring| {
            ring.0
                .windows(2)
                .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
                .sum::<f64>()
        })
        .sum()
}

fn to_geo(ring: &[Point2<f32>]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|p| Coord {
            x: f64::from(p.x),
            y: f64::from(p.y),
        })
        .collect();
    Polygon::new(LineString::new(coords), Vec::new())
}

/// Exterior ring without the closing duplicate.
fn from_geo(poly: &Polygon<f64>) -> Vec<Point2<f32>> {
    let ring = &poly.exterior().0;
    let open = if ring.len() > 1 && ring.first() == ring.last() {
        &ring[..ring.len() - 1]
    } else {
        &ring[..]
    };
    open.iter()
        .map(|c| Point2::new(c.x as f32, c.y as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Point2<f32>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    fn ring_area(ring: &[Point2<f32>]) -> f32 {
        let n = ring.len();
        (0..n)
            .map(|i| {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f32>()
            .abs()
            * 0.5
    }

    #[test]
    fn input_slots_round_trip() {
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(7), rect(0.0, 0.0, 1.0, 1.0));
        input.push(PolygonOwner::Model(2), rect(0.0, 0.0, 2.0, 2.0)[..3].to_vec());

        assert_eq!(input.counts(), &[4, 3]);
        assert_eq!(input.points().len(), 7);
        let slots: Vec<_> = input.polygons().collect();
        assert_eq!(slots[0].0, PolygonOwner::Portal(7));
        assert_eq!(slots[1].1.len(), 3);
    }

    #[test]
    fn overlapping_open_portals_connect() {
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(0), rect(0.0, 0.0, 2.0, 2.0));
        input.push(PolygonOwner::Portal(1), rect(1.0, 0.0, 3.0, 2.0));

        let out = GeoClipKernel::default().clip_polygons(&input);
        assert_eq!(
            out.connected,
            vec![ConnectedPair {
                a: 0,
                b: 1,
                blocked: false
            }]
        );
        assert!(out.covered.is_empty());
        assert_eq!(out.intersected.len(), 1);
        assert_relative_eq!(ring_area(&out.intersected[0].polygon), 2.0, epsilon = 1e-4);
    }

    #[test]
    fn touching_portals_do_not_connect() {
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(0), rect(0.0, 0.0, 1.0, 1.0));
        input.push(PolygonOwner::Portal(1), rect(1.0, 0.0, 2.0, 1.0));

        let out = GeoClipKernel::default().clip_polygons(&input);
        assert!(out.connected.is_empty());
    }

    #[test]
    fn edge_noise_does_not_connect() {
        // 0.99999994 is one f32 step below 1: a strip of about 6e-8 wide
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(0), rect(0.0, 0.0, 1.0, 1.0));
        input.push(PolygonOwner::Portal(1), rect(0.99999994, 0.0, 2.0, 1.0));
        let out = GeoClipKernel::default().clip_polygons(&input);
        assert!(out.connected.is_empty());
        assert!(out.intersected.is_empty());

        // a strip ten times epsilon wide is a real opening
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(0), rect(0.0, 0.0, 1.0, 1.0));
        input.push(PolygonOwner::Portal(1), rect(0.999, 0.0, 2.0, 1.0));
        let out = GeoClipKernel::default().clip_polygons(&input);
        assert_eq!(out.connected.len(), 1);
        assert!(!out.connected[0].blocked);
    }

    #[test]
    fn slanted_edge_noise_does_not_connect() {
        // two triangles splitting a square along its diagonal, the second
        // nudged across the shared edge by rounding-sized amounts
        let mut input = ClipInput::new();
        input.push(
            PolygonOwner::Portal(0),
            vec![Point2::new(0.0, 0.0), Point2::new(3.0, 0.0), Point2::new(0.0, 3.0)],
        );
        input.push(
            PolygonOwner::Portal(1),
            vec![
                Point2::new(2.9999998, 0.0),
                Point2::new(3.0, 3.0),
                Point2::new(0.0, 2.9999998),
            ],
        );
        let out = GeoClipKernel::default().clip_polygons(&input);
        assert!(out.connected.is_empty());
    }

    #[test]
    fn model_face_short_of_the_wall_by_noise_still_covers() {
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(0), rect(0.0, 0.0, 1.0, 1.0));
        input.push(PolygonOwner::Portal(1), rect(0.0, 0.0, 1.0, 1.0));
        input.push(PolygonOwner::Model(0), rect(2e-6, 2e-6, 0.99999994, 0.99999994));

        let out = GeoClipKernel::default().clip_polygons(&input);
        assert_eq!(out.covered, vec![0, 1]);
        assert_eq!(out.connected.len(), 1);
        assert!(out.connected[0].blocked);
    }

    #[test]
    fn model_face_covers_and_blocks() {
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(0), rect(0.0, 0.0, 1.0, 1.0));
        input.push(PolygonOwner::Portal(1), rect(-1.0, -1.0, 2.0, 2.0));
        input.push(PolygonOwner::Model(0), rect(0.0, 0.0, 1.0, 1.0));

        let out = GeoClipKernel::default().clip_polygons(&input);
        assert_eq!(out.covered, vec![0]);
        assert_eq!(out.connected.len(), 1);
        assert!(out.connected[0].blocked);
        // portal 0 lies entirely inside portal 1: a full, not partial, overlap
        assert!(out.intersected.is_empty());
    }

    #[test]
    fn partial_cover_leaves_pair_open() {
        let mut input = ClipInput::new();
        input.push(PolygonOwner::Portal(3), rect(0.0, 0.0, 2.0, 1.0));
        input.push(PolygonOwner::Portal(4), rect(0.0, 0.0, 2.0, 1.0));
        input.push(PolygonOwner::Model(0), rect(0.0, 0.0, 1.0, 1.0));

        let out = GeoClipKernel::default().clip_polygons(&input);
        assert!(out.covered.is_empty());
        assert_eq!(out.connected.len(), 1);
        assert!(!out.connected[0].blocked);
        assert_eq!((out.connected[0].a, out.connected[0].b), (3, 4));
    }

    #[test]
    fn union_merges_adjacent_squares() {
        let kernel = GeoClipKernel::default();
        let merged = kernel.union_polygons(&[rect(0.0, 0.0, 1.0, 1.0), rect(1.0, 0.0, 2.0, 1.0)]);
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(ring_area(&merged[0]), 2.0, epsilon = 1e-4);

        let apart = kernel.union_polygons(&[rect(0.0, 0.0, 1.0, 1.0), rect(3.0, 0.0, 4.0, 1.0)]);
        assert_eq!(apart.len(), 2);
    }
}
