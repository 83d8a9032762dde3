//! Index-based triangle and edge records.

use nalgebra::Vector3;

/// A triangle referencing three vertices of the owning mesh.
///
/// Vertices are ordered counter-clockwise when viewed from outside. The
/// cached normal `n` is only meaningful after normal derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex indices.
    pub v: [usize; 3],
    /// Cached outward unit normal.
    pub n: Vector3<f64>,
}

impl Triangle {
    /// Create a triangle with a zero normal.
    pub fn new(v: [usize; 3]) -> Self {
        Self {
            v,
            n: Vector3::zeros(),
        }
    }

    /// The three directed edges `v0→v1`, `v1→v2`, `v2→v0`.
    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.v;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// True if two of the indices coincide.
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.v;
        a == b || b == c || a == c
    }

    /// True if `vertex` is one of the corners.
    pub fn contains(&self, vertex: usize) -> bool {
        self.v.contains(&vertex)
    }

    /// Same corners with the winding flipped.
    pub fn reversed(&self) -> Self {
        let [a, b, c] = self.v;
        Self {
            v: [a, c, b],
            n: -self.n,
        }
    }
}

/// A directed edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Start and end vertex.
    pub v: [usize; 2],
}

impl Edge {
    /// Create the edge `a → b`.
    pub fn new(a: usize, b: usize) -> Self {
        Self { v: [a, b] }
    }

    /// Direction-independent key `(min, max)`.
    pub fn key(&self) -> (usize, usize) {
        let [a, b] = self.v;
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// How two edges relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMatch {
    /// Different endpoints.
    Distinct,
    /// Same endpoints, same direction.
    Same,
    /// Same endpoints, traversed in opposite directions.
    Opposite,
}

/// Compare two edges by endpoints and report the traversal direction.
///
/// Adjacent triangles of a consistently wound manifold share every edge in
/// [`EdgeMatch::Opposite`] direction.
pub fn same_edge(e1: &Edge, e2: &Edge) -> EdgeMatch {
    if e1.v == e2.v {
        EdgeMatch::Same
    } else if e1.v[0] == e2.v[1] && e1.v[1] == e2.v[0] {
        EdgeMatch::Opposite
    } else {
        EdgeMatch::Distinct
    }
}
