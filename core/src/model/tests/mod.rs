use crate::mesh::MeshVariant;
use crate::model::EXTENDED_HEADER_MARKER;


/// Bone as written to a test file.
#[derive(Clone)]
struct TestBone {
    name: String,
    parent: i16,
    position: [f32; 3],
}

impl TestBone {
    fn new(name: &str, parent: i16, position: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            parent,
            position,
        }
    }
}

/// Vertex as written to a test file.
///
/// `bones` holds up to four influences for fixed layouts and any number for
/// the variable layout.
#[derive(Clone)]
struct TestVertex {
    position: [f32; 3],
    normal: [f32; 3],
    color: [u8; 4],
    uvs: Vec<[f32; 2]>,
    tangents: Vec<[f32; 4]>,
    bones: Vec<(u16, f32)>,
}

impl TestVertex {
    fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal: [0.0, 0.0, 1.0],
            color: [255; 4],
            uvs: vec![uv],
            tangents: vec![[0.0, 1.0, 0.0, 1.0]],
            bones: vec![(0, 1.0)],
        }
    }

    fn with_bones(mut self, bones: &[(u16, f32)]) -> Self {
        self.bones = bones.to_vec();
        self
    }
}

/// Mesh as written to a test file.
#[derive(Clone)]
struct TestMesh {
    name: String,
    uv_layers: usize,
    textures: Vec<String>,
    vertices: Vec<TestVertex>,
    triangles: Vec<[u32; 3]>,
}

impl TestMesh {
    fn new(name: &str, vertices: Vec<TestVertex>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            name: name.to_string(),
            uv_layers: 1,
            textures: vec!["C:\\xps\\textures\\diffuse.png".to_string()],
            vertices,
            triangles,
        }
    }
}

/// In-memory model file writer for both container formats.
#[derive(Clone, Default)]
struct TestModel {
    bones: Vec<TestBone>,
    meshes: Vec<TestMesh>,
}

impl TestModel {
    fn with_bone(mut self, bone: TestBone) -> Self {
        self.bones.push(bone);
        self
    }

    fn with_mesh(mut self, mesh: TestMesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Encode as a binary file. Versions above 0 get the extended header.
    fn to_binary(&self, version: u32) -> Vec<u8> {
        let mut out = Vec::new();
        if version > 0 {
            put_u32(&mut out, EXTENDED_HEADER_MARKER);
            put_u16(&mut out, (version - 1) as u16);
            put_u16(&mut out, 15);
            put_string(&mut out, "XNAaraL");
            put_u32(&mut out, 2);
            put_string(&mut out, "machine");
            put_string(&mut out, "user");
            put_string(&mut out, "C:\\models\\hero.xps");
            out.extend_from_slice(&[0u8; 8]);
        }

        put_u32(&mut out, self.bones.len() as u32);
        for bone in &self.bones {
            put_string(&mut out, &bone.name);
            out.extend_from_slice(&bone.parent.to_le_bytes());
            for v in bone.position {
                put_f32(&mut out, v);
            }
        }

        let variant = MeshVariant::binary(version);
        let has_bones = !self.bones.is_empty();
        put_u32(&mut out, self.meshes.len() as u32);
        for mesh in &self.meshes {
            put_string(&mut out, &mesh.name);
            put_u32(&mut out, mesh.uv_layers as u32);
            put_u32(&mut out, mesh.textures.len() as u32);
            for texture in &mesh.textures {
                put_string(&mut out, texture);
                put_u32(&mut out, 0);
            }
            put_u32(&mut out, mesh.vertices.len() as u32);
            for vertex in &mesh.vertices {
                for v in vertex.position.iter().chain(&vertex.normal) {
                    put_f32(&mut out, *v);
                }
                out.extend_from_slice(&vertex.color);
                for uv in vertex.uvs.iter().take(mesh.uv_layers) {
                    put_f32(&mut out, uv[0]);
                    put_f32(&mut out, uv[1]);
                }
                if variant.has_tangents_in_file {
                    for tangent in vertex.tangents.iter().take(mesh.uv_layers) {
                        for v in tangent {
                            put_f32(&mut out, *v);
                        }
                    }
                } else if variant.has_variable_bones_per_vertex {
                    out.extend_from_slice(&[0u8; 4]);
                }
                if variant.has_fixed_bones(has_bones) {
                    let slots = fixed_slots(&vertex.bones);
                    for (bone, _) in slots {
                        put_u16(&mut out, bone);
                    }
                    for (_, weight) in slots {
                        put_f32(&mut out, weight);
                    }
                }
                if variant.has_variable_bones_per_vertex {
                    put_u16(&mut out, vertex.bones.len() as u16);
                    for (bone, _) in &vertex.bones {
                        put_u16(&mut out, *bone);
                    }
                    for (_, weight) in &vertex.bones {
                        put_f32(&mut out, *weight);
                    }
                }
            }
            put_u32(&mut out, mesh.triangles.len() as u32);
            for triangle in &mesh.triangles {
                for index in triangle {
                    put_u32(&mut out, *index);
                }
            }
        }
        out
    }

    /// Encode as a `.mesh.ascii` file.
    fn to_ascii(&self) -> String {
        let mut out = format!("{} # bones\n", self.bones.len());
        for bone in &self.bones {
            out += &format!("{}\n{} # parent index\n", bone.name, bone.parent);
            out += &format!("{} {} {}\n", bone.position[0], bone.position[1], bone.position[2]);
        }

        let has_bones = !self.bones.is_empty();
        out += &format!("{} # meshes\n", self.meshes.len());
        for mesh in &self.meshes {
            out += &format!("{}\n{} # uv layers\n", mesh.name, mesh.uv_layers);
            out += &format!("{}\n", mesh.textures.len());
            for texture in &mesh.textures {
                out += &format!("{texture}\n0\n");
            }
            out += &format!("{}\n", mesh.vertices.len());
            for vertex in &mesh.vertices {
                let [x, y, z] = vertex.position;
                let [nx, ny, nz] = vertex.normal;
                let [r, g, b, a] = vertex.color;
                out += &format!("{x} {y} {z}\n{nx} {ny} {nz}\n{r} {g} {b} {a}\n");
                for uv in vertex.uvs.iter().take(mesh.uv_layers) {
                    out += &format!("{} {}\n", uv[0], uv[1]);
                }
                if has_bones {
                    let slots = fixed_slots(&vertex.bones);
                    let indices: Vec<String> = slots.iter().map(|(b, _)| b.to_string()).collect();
                    let weights: Vec<String> = slots.iter().map(|(_, w)| w.to_string()).collect();
                    out += &format!("{}\n{}\n", indices.join(" "), weights.join(" "));
                }
            }
            out += &format!("{}\n", mesh.triangles.len());
            for [a, b, c] in &mesh.triangles {
                out += &format!("{a} {b} {c}\n");
            }
        }
        out
    }
}

fn fixed_slots(bones: &[(u16, f32)]) -> [(u16, f32); 4] {
    let mut slots = [(0u16, 0f32); 4];
    for (slot, bone) in slots.iter_mut().zip(bones) {
        *slot = *bone;
    }
    slots
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    let mut len = s.len();
    while len >= 0x80 {
        out.push((len as u8 & 0x7f) | 0x80);
        len >>= 7;
    }
    out.push(len as u8);
    out.extend_from_slice(s.as_bytes());
}

/// Two bones and one triangle with UVs (0,0), (1,0), (0,1) on the
/// XY plane, facing +Z.
fn triangle_model() -> TestModel {
    TestModel::default()
        .with_bone(TestBone::new("root", i16::MAX, [0.0, 0.0, 0.0]))
        .with_bone(TestBone::new("arm", 0, [0.0, 1.0, 0.0]))
        .with_mesh(TestMesh::new(
            "body",
            vec![
                TestVertex::new([0.0, 0.0, 0.0], [0.0, 0.0]),
                TestVertex::new([1.0, 0.0, 0.0], [1.0, 0.0]).with_bones(&[(1, 1.0)]),
                TestVertex::new([0.0, 1.0, 0.0], [0.0, 1.0]).with_bones(&[(0, 0.5), (1, 0.5)]),
            ],
            vec![[0, 1, 2]],
        ))
}
