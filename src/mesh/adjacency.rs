//! Edge and vertex adjacency built from a triangle list.
//!
//! Provides efficient lookups for edge-to-face, vertex-to-face and
//! vertex-to-vertex relationships. Edges are keyed by `(min, max)` so both
//! traversal directions land in the same entry; the directed edge each face
//! uses is kept alongside for winding checks.

use std::collections::BTreeMap;

use super::triangle::{Edge, Triangle};

/// Adjacency information for a mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    /// Undirected edge key to `(face, directed edge)` incidences.
    edge_to_faces: BTreeMap<(usize, usize), Vec<(usize, Edge)>>,
    /// Vertex index to incident faces.
    vertex_to_faces: Vec<Vec<usize>>,
    /// Vertex index to edge-connected neighbours, sorted.
    neighbours: Vec<Vec<usize>>,
}

impl MeshAdjacency {
    /// Build adjacency for `num_vertices` vertices.
    ///
    /// Triangles referencing out-of-range vertices are skipped.
    pub fn build(num_vertices: usize, triangles: &[Triangle]) -> Self {
        let mut edge_to_faces: BTreeMap<(usize, usize), Vec<(usize, Edge)>> = BTreeMap::new();
        let mut vertex_to_faces = vec![Vec::new(); num_vertices];
        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];

        for (face, t) in triangles.iter().enumerate() {
            if t.v.iter().any(|&i| i >= num_vertices) {
                continue;
            }
            for &v in &t.v {
                if !vertex_to_faces[v].contains(&face) {
                    vertex_to_faces[v].push(face);
                }
            }
            for e in t.edges() {
                let [a, b] = e.v;
                if a != b {
                    neighbours[a].push(b);
                    neighbours[b].push(a);
                }
                edge_to_faces.entry(e.key()).or_default().push((face, e));
            }
        }
        for list in &mut neighbours {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            edge_to_faces,
            vertex_to_faces,
            neighbours,
        }
    }

    /// Faces incident to vertex `v`.
    pub fn faces_for_vertex(&self, v: usize) -> &[usize] {
        self.vertex_to_faces.get(v).map_or(&[], Vec::as_slice)
    }

    /// Vertices sharing an edge with `v`.
    pub fn neighbours(&self, v: usize) -> &[usize] {
        self.neighbours.get(v).map_or(&[], Vec::as_slice)
    }

    /// All undirected edges with their incidences, in key order.
    pub fn edges(&self) -> impl Iterator<Item = ((usize, usize), &[(usize, Edge)])> + '_ {
        self.edge_to_faces.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Total face–edge incidences (three per triangle).
    pub fn incidence_count(&self) -> usize {
        self.edge_to_faces.values().map(Vec::len).sum()
    }

    /// Edges used by exactly one face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Edges used by more than two faces.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(&edge, _)| edge)
    }

    /// True if no edge is a boundary edge.
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() >= 2)
    }
}
