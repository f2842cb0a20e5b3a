use std::f32::consts::PI;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use crate::error::{Result, ViewerError};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// xyz along +u, w the handedness of the bitangent
    pub tangent: [f32; 4],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
        wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
        wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
        wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x2 },
        wgpu::VertexAttribute { offset: 32, shader_location: 3, format: wgpu::VertexFormat::Float32x4 },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// GPU copy of a mesh. The buffers are destroyed when this is dropped.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl Drop for MeshBuffer {
    fn drop(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Axis-aligned bounds as (min, max). `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.vertices.iter().map(|v| Vec3::from_array(v.pos));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Shift vertices so the bounding-box centre sits at the model origin.
    pub fn recenter(&mut self) {
        let Some((lo, hi)) = self.bounds() else {
            return;
        };
        let centre = (lo + hi) * 0.5;
        for v in self.vertices.iter_mut() {
            v.pos = (Vec3::from_array(v.pos) - centre).to_array();
        }
    }

    /// Fill in smooth normals from the triangle list.
    fn compute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from_array(self.vertices[a].pos);
            let pb = Vec3::from_array(self.vertices[b].pos);
            let pc = Vec3::from_array(self.vertices[c].pos);
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        for (v, n) in self.vertices.iter_mut().zip(acc) {
            v.normal = n.try_normalize().unwrap_or(Vec3::Y).to_array();
        }
    }

    /// Per-vertex tangents from positions and uvs, for normal mapping.
    pub fn compute_tangents(&mut self) {
        let mut tangents = vec![Vec3::ZERO; self.vertices.len()];
        let mut bitangents = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (va, vb, vc) = (self.vertices[a], self.vertices[b], self.vertices[c]);
            let e1 = Vec3::from_array(vb.pos) - Vec3::from_array(va.pos);
            let e2 = Vec3::from_array(vc.pos) - Vec3::from_array(va.pos);
            let (du1, dv1) = (vb.uv[0] - va.uv[0], vb.uv[1] - va.uv[1]);
            let (du2, dv2) = (vc.uv[0] - va.uv[0], vc.uv[1] - va.uv[1]);

            let det = du1 * dv2 - du2 * dv1;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = det.recip();
            let t = (e1 * dv2 - e2 * dv1) * r;
            let bt = (e2 * du1 - e1 * du2) * r;
            for i in [a, b, c] {
                tangents[i] += t;
                bitangents[i] += bt;
            }
        }

        for ((v, t), bt) in self.vertices.iter_mut().zip(tangents).zip(bitangents) {
            let n = Vec3::from_array(v.normal);
            // Gram-Schmidt against the normal; degenerate uvs get any perpendicular
            let t = (t - n * n.dot(t))
                .try_normalize()
                .unwrap_or_else(|| n.any_orthonormal_vector());
            let w = if n.cross(t).dot(bt) < 0.0 { -1.0 } else { 1.0 };
            v.tangent = t.extend(w).to_array();
        }
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Load every model in an OBJ file into one mesh. Materials are ignored.
pub fn load_obj(path: &Path) -> Result<Mesh> {
    let input = std::fs::read_to_string(path)?;
    let load_opts = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) =
        tobj::load_obj_buf(&mut input.as_bytes(), &load_opts, |_| Ok((Vec::new(), Default::default())))
            .map_err(|source| ViewerError::Obj { path: path.to_path_buf(), source })?;

    let mut mesh = Mesh { vertices: Vec::new(), indices: Vec::new() };
    let mut missing_normals = false;
    for model in models {
        let m = model.mesh;
        let start = mesh.vertices.len() as u32;
        let count = m.positions.len() / 3;
        missing_normals |= m.normals.len() < m.positions.len();

        for i in 0..count {
            let normal = m
                .normals
                .get(3 * i..3 * i + 3)
                .map(|n| [n[0], n[1], n[2]])
                .unwrap_or([0.0, 1.0, 0.0]);
            // OBJ texture space has v pointing up
            let uv = m
                .texcoords
                .get(2 * i..2 * i + 2)
                .map(|t| [t[0], 1.0 - t[1]])
                .unwrap_or([0.0, 0.0]);
            mesh.vertices.push(Vertex {
                pos: [m.positions[3 * i], m.positions[3 * i + 1], m.positions[3 * i + 2]],
                normal,
                uv,
                tangent: [1.0, 0.0, 0.0, 1.0],
            });
        }
        mesh.indices.extend(m.indices.iter().map(|&idx| start + idx));
    }

    if mesh.is_empty() {
        return Err(ViewerError::EmptyMesh(path.to_path_buf()));
    }
    if missing_normals {
        mesh.compute_normals();
    }
    mesh.compute_tangents();
    debug!(path = %path.display(), vertices = mesh.vertices.len(), "Loaded mesh");
    Ok(mesh)
}

/// Load and recentre a model, or fall back to a sphere so the scene still draws.
pub fn load_or_fallback(path: &Path) -> Mesh {
    let mut mesh = match load_obj(path) {
        Ok(mesh) => mesh,
        Err(err) => {
            warn!(path = %path.display(), "{err}. Using a placeholder sphere.");
            uv_sphere(1.0, 16, 24)
        }
    };
    mesh.recenter();
    mesh
}

/// Unit-ish sphere used when a model file is missing.
pub fn uv_sphere(radius: f32, stacks: u32, sectors: u32) -> Mesh {
    let stacks = stacks.max(2);
    let sectors = sectors.max(3);
    let mut vertices = Vec::with_capacity(((stacks + 1) * (sectors + 1)) as usize);

    for i in 0..=stacks {
        let v = i as f32 / stacks as f32;
        let phi = PI * v;
        for j in 0..=sectors {
            let u = j as f32 / sectors as f32;
            let theta = 2.0 * PI * u;
            let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            vertices.push(Vertex {
                pos: (n * radius).to_array(),
                normal: n.to_array(),
                uv: [u, v],
                tangent: [1.0, 0.0, 0.0, 1.0],
            });
        }
    }

    let row = sectors + 1;
    let mut indices = Vec::with_capacity((stacks * sectors * 6) as usize);
    for i in 0..stacks {
        for j in 0..sectors {
            let a = i * row + j;
            let b = a + row;
            // Counter-clockwise seen from outside
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    let mut mesh = Mesh { vertices, indices };
    mesh.compute_tangents();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use std::fs;

    const QUAD_OBJ: &str = "\
v 1.0 2.0 3.0
v 3.0 2.0 3.0
v 3.0 4.0 3.0
v 1.0 4.0 3.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("submersible-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        assert_eq!(Vertex::layout().array_stride, 48);
    }

    #[test]
    fn test_tangents_follow_u_direction() {
        let path = write_temp("tangents.obj", QUAD_OBJ);
        let mesh = load_obj(&path).unwrap();
        fs::remove_file(&path).ok();

        // u grows along +X; v was flipped so the bitangent runs down -Y
        for v in &mesh.vertices {
            assert!(Vec4::from_array(v.tangent).abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, -1.0), 1e-5));
        }
    }

    #[test]
    fn test_sphere_tangents_are_perpendicular_to_normals() {
        let mesh = uv_sphere(1.0, 8, 12);
        for v in &mesh.vertices {
            let t = Vec3::new(v.tangent[0], v.tangent[1], v.tangent[2]);
            assert!((t.length() - 1.0).abs() < 1e-4);
            assert!(t.dot(Vec3::from_array(v.normal)).abs() < 1e-4);
            assert!(v.tangent[3].abs() == 1.0);
        }
    }

    #[test]
    fn test_load_obj_triangulates_and_flips_v() {
        let path = write_temp("quad.obj", QUAD_OBJ);
        let mesh = load_obj(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(mesh.vertices[2].uv, [1.0, 0.0]);
        // No normals in the file, so they are derived from the face
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_recenter_moves_bounds_to_origin() {
        let path = write_temp("recenter.obj", QUAD_OBJ);
        let mut mesh = load_obj(&path).unwrap();
        fs::remove_file(&path).ok();

        mesh.recenter();
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(hi, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_missing_file_falls_back_to_sphere() {
        let mesh = load_or_fallback(Path::new("definitely/not/here.obj"));
        assert!(!mesh.is_empty());
        let (lo, hi) = mesh.bounds().unwrap();
        assert!((lo + hi).abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn test_empty_obj_is_an_error() {
        let path = write_temp("empty.obj", "# nothing here\n");
        let result = load_obj(&path);
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_sphere_indices_stay_in_range() {
        let mesh = uv_sphere(2.0, 4, 6);
        assert_eq!(mesh.vertices.len(), 5 * 7);
        assert_eq!(mesh.indices.len(), 4 * 6 * 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.pos).length() - 2.0).abs() < 1e-5);
        }
    }
}
