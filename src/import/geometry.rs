//! Geometry assembly.
//!
//! COLLADA primitives index every attribute independently; the scene wants
//! one shared index. This module walks a primitive batch's interleaved
//! index stream, applies the document's up-axis convention and deduplicates
//! the resulting (position, normal, texcoord) triples into flat
//! shared-index buffers, fan-triangulating polygon lists on the way.
//!
//! A lookup table from original position index to the set of assembled
//! indices is kept for the skin binder, which scatters per-source-vertex
//! influences onto every assembled duplicate.

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::document::{
    GeometryData, GeometryElement, MeshElement, PrimitiveKind, Primitives, UpAxis,
};
use crate::errors::{ImportError, Result};
use crate::scene::{FaceGroup, Mesh, MeshKey, SceneGraph, Skin};

/// One resolved attribute: where its index lives in the interleaved
/// stream, and the source floats it indexes.
struct AttributeStream<'a> {
    offset: usize,
    stride: usize,
    data: &'a [f32],
}

/// Per-batch input resolution, the shape of a primitive's `<p>` stream.
struct Offsets<'a> {
    /// Indices per vertex: `max(input offset) + 1`.
    index_stride: usize,
    position: AttributeStream<'a>,
    /// Number of source positions; sizes the lookup table.
    position_count: usize,
    normal: Option<AttributeStream<'a>>,
    texcoord: Option<AttributeStream<'a>>,
}

impl<'a> Offsets<'a> {
    fn resolve(mesh: &'a MeshElement, primitives: &Primitives) -> Result<Self> {
        let index_stride = primitives
            .inputs
            .iter()
            .map(|i| i.offset)
            .max()
            .map_or(1, |max| max + 1);

        let mut position_offset = None;
        let mut normal = None;
        let mut texcoord = None;

        // Inputs with explicit offsets on the primitive batch.
        for input in &primitives.inputs {
            match input.semantic.as_str() {
                "VERTEX" => position_offset = Some(input.offset),
                "NORMAL" => {
                    let source = mesh.source_by_id(&input.source).ok_or_else(|| {
                        ImportError::InvalidFormat(format!("Undefined source {}", input.source))
                    })?;
                    normal = Some(AttributeStream {
                        offset: input.offset,
                        stride: source.stride,
                        data: source.float_data().unwrap_or(&[]),
                    });
                }
                "TEXCOORD" | "UV" if texcoord.is_none() => {
                    let source = mesh.source_by_id(&input.source).ok_or_else(|| {
                        ImportError::InvalidFormat(format!("Undefined source {}", input.source))
                    })?;
                    texcoord = Some(AttributeStream {
                        offset: input.offset,
                        stride: source.stride,
                        data: source.float_data().unwrap_or(&[]),
                    });
                }
                _ => {}
            }
        }

        let position_offset = position_offset.ok_or_else(|| {
            ImportError::InvalidFormat("Primitive batch has no VERTEX input".into())
        })?;

        // Inputs without offsets, declared on <vertices>; they ride the
        // VERTEX index.
        let mut position = None;
        let mut position_count = 0;
        for input in &mesh.vertices.inputs {
            let source = mesh.source_by_id(&input.source).ok_or_else(|| {
                ImportError::InvalidFormat(format!("Undefined source {}", input.source))
            })?;
            let data = source.float_data().unwrap_or(&[]);
            match input.semantic.as_str() {
                "POSITION" => {
                    position_count = data.len() / source.stride.max(1);
                    position = Some(AttributeStream {
                        offset: position_offset,
                        stride: source.stride,
                        data,
                    });
                }
                "NORMAL" => {
                    normal = Some(AttributeStream {
                        offset: position_offset,
                        stride: source.stride,
                        data,
                    });
                }
                "TEXCOORD" | "UV" => {
                    texcoord = Some(AttributeStream {
                        offset: position_offset,
                        stride: source.stride,
                        data,
                    });
                }
                _ => {}
            }
        }

        let position = position.ok_or_else(|| {
            ImportError::InvalidFormat("Mesh vertices declare no POSITION input".into())
        })?;

        Ok(Self {
            index_stride,
            position,
            position_count,
            normal,
            texcoord,
        })
    }
}

/// Dedup key: the bit patterns of every attribute present. Equality is
/// bit-exact; the first vertex inserted with a pattern wins.
#[derive(Debug, Hash, PartialEq, Eq)]
struct VertexKey {
    position: [u32; 3],
    normal: Option<[u32; 3]>,
    texcoord: Option<[u32; 2]>,
}

fn bits3(v: [f32; 3]) -> [u32; 3] {
    [v[0].to_bits(), v[1].to_bits(), v[2].to_bits()]
}

fn read_attribute<'a>(stream: &AttributeStream<'a>, index: usize, n: usize) -> Result<&'a [f32]> {
    let base = index * stream.stride;
    stream.data.get(base..base + n).ok_or_else(|| {
        ImportError::InvalidFormat("Attribute source is shorter than its indices".into())
    })
}

/// The intermediate geometry model: assembled shared-index buffers plus
/// the original-index lookup table, built during the import pass and
/// materialized into the scene by [`GeometryImport::to_scene`].
#[derive(Debug)]
pub struct GeometryImport {
    pub id: String,
    pub name: String,
    up_axis: UpAxis,

    positions: Vec<f32>,
    normals: Vec<f32>,
    texcoords: Vec<f32>,
    groups: Vec<FaceGroup>,

    /// Original position index -> assembled indices it was merged into.
    lookup: Vec<Vec<u32>>,
    /// First assembled index per exact attribute triple.
    index_of: FxHashMap<VertexKey, u32>,
}

impl GeometryImport {
    /// Assembles a geometry element into shared-index buffers.
    ///
    /// Triangle batches pass through; polygon lists are fan-triangulated.
    /// Every other primitive flavor, and spline geometry, is a format
    /// error.
    pub fn import(element: &GeometryElement, up_axis: UpAxis) -> Result<Self> {
        let mesh = match &element.data {
            GeometryData::Spline => {
                return Err(ImportError::InvalidFormat(
                    "Unsupported spline feature".into(),
                ));
            }
            GeometryData::Mesh(mesh) => mesh,
        };

        let mut geometry = Self {
            id: element.id.clone(),
            name: element.name.clone(),
            up_axis,
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            groups: Vec::new(),
            lookup: Vec::new(),
            index_of: FxHashMap::default(),
        };

        for primitives in &mesh.primitives {
            match primitives.kind {
                PrimitiveKind::Triangles => geometry.build_triangles(mesh, primitives)?,
                PrimitiveKind::Polylist => geometry.build_polygon_list(mesh, primitives)?,
                kind => {
                    return Err(ImportError::InvalidFormat(format!(
                        "Unsupported {} feature",
                        kind.name()
                    )));
                }
            }
        }

        Ok(geometry)
    }

    /// Number of deduplicated vertices assembled so far.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// The original-position-index -> assembled-indices table.
    #[must_use]
    pub fn lookup(&self) -> &[Vec<u32>] {
        &self.lookup
    }

    #[must_use]
    pub fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    fn build_triangles(&mut self, mesh: &MeshElement, primitives: &Primitives) -> Result<()> {
        let offsets = Offsets::resolve(mesh, primitives)?;
        self.ensure_lookup(offsets.position_count);

        if primitives.count == 0 {
            return Ok(());
        }

        let mut faces = Vec::with_capacity(primitives.count * 3);
        for ivertex in 0..primitives.count * 3 {
            faces.push(self.push_vertex(&offsets, &primitives.indices, ivertex)?);
        }

        self.groups.push(FaceGroup {
            material: primitives.material.clone(),
            indices: faces,
        });
        Ok(())
    }

    /// Fan-triangulates each polygon around its first vertex: a polygon of
    /// k vertices yields k-2 triangles in original winding order.
    fn build_polygon_list(&mut self, mesh: &MeshElement, primitives: &Primitives) -> Result<()> {
        let offsets = Offsets::resolve(mesh, primitives)?;
        self.ensure_lookup(offsets.position_count);

        let mut faces = Vec::new();
        let mut v = 0usize;
        for &vcount in &primitives.vcounts {
            if vcount < 3 {
                return Err(ImportError::InvalidFormat(format!(
                    "Polygon with {vcount} vertices"
                )));
            }
            let count = vcount as usize - 2;
            let a = v;
            for ivertex in 0..count {
                let b = v + ivertex + 1;
                let c = v + ivertex + 2;

                faces.push(self.push_vertex(&offsets, &primitives.indices, a)?);
                faces.push(self.push_vertex(&offsets, &primitives.indices, b)?);
                faces.push(self.push_vertex(&offsets, &primitives.indices, c)?);
            }
            v += count + 2;
        }

        self.groups.push(FaceGroup {
            material: primitives.material.clone(),
            indices: faces,
        });
        Ok(())
    }

    fn ensure_lookup(&mut self, position_count: usize) {
        if self.lookup.len() < position_count {
            self.lookup.resize(position_count, Vec::new());
        }
    }

    /// Reads one vertex from the interleaved index stream, applies the
    /// up-axis convention and returns its assembled index, deduplicating
    /// against every vertex assembled so far.
    fn push_vertex(&mut self, offsets: &Offsets, indices: &[u32], ivertex: usize) -> Result<u32> {
        let fetch = |offset: usize| -> Result<usize> {
            indices
                .get(ivertex * offsets.index_stride + offset)
                .map(|&v| v as usize)
                .ok_or_else(|| {
                    ImportError::InvalidFormat("Primitive index stream is truncated".into())
                })
        };

        let original = fetch(offsets.position.offset)?;
        let p = read_attribute(&offsets.position, original, 3)?;
        let mut position = [p[0], p[1], p[2]];
        match self.up_axis {
            UpAxis::X => position.swap(0, 1),
            UpAxis::Y => {}
            UpAxis::Z => position = [position[0], position[2], -position[1]],
        }

        let normal = match &offsets.normal {
            Some(stream) => {
                let n = read_attribute(stream, fetch(stream.offset)?, 3)?;
                let mut normal = [n[0], n[1], n[2]];
                match self.up_axis {
                    UpAxis::X => normal.swap(0, 1),
                    UpAxis::Y => {}
                    UpAxis::Z => normal = [normal[0], normal[2], -normal[1]],
                }
                Some(normal)
            }
            None => None,
        };

        let texcoord = match &offsets.texcoord {
            Some(stream) => {
                let t = read_attribute(stream, fetch(stream.offset)?, 2)?;
                let mut texcoord = [t[0], t[1]];
                // The X-up convention flips U instead of V.
                match self.up_axis {
                    UpAxis::X => texcoord[0] = 1.0 - texcoord[0],
                    UpAxis::Y | UpAxis::Z => texcoord[1] = 1.0 - texcoord[1],
                }
                Some(texcoord)
            }
            None => None,
        };

        if self.lookup.len() <= original {
            self.lookup.resize(original + 1, Vec::new());
        }

        let key = VertexKey {
            position: bits3(position),
            normal: normal.map(bits3),
            texcoord: texcoord.map(|t| [t[0].to_bits(), t[1].to_bits()]),
        };

        if let Some(&existing) = self.index_of.get(&key) {
            let matches = &mut self.lookup[original];
            if !matches.contains(&existing) {
                matches.push(existing);
            }
            return Ok(existing);
        }

        let assembled = (self.positions.len() / 3) as u32;
        self.positions.extend_from_slice(&position);
        if let Some(normal) = normal {
            self.normals.extend_from_slice(&normal);
        }
        if let Some(texcoord) = texcoord {
            self.texcoords.extend_from_slice(&texcoord);
        }
        self.index_of.insert(key, assembled);
        self.lookup[original].push(assembled);
        Ok(assembled)
    }

    /// Materializes the assembled buffers into the scene mesh pool.
    ///
    /// Skinned geometry is pre-transformed by the skin's shape matrix
    /// before deformation applies.
    pub fn to_scene(&self, graph: &mut SceneGraph, skin: Option<Skin>) -> MeshKey {
        log::info!("Found geometry: {}", self.name);

        let mut positions = self.positions.clone();
        if let Some(skin) = &skin {
            for chunk in positions.chunks_exact_mut(3) {
                let v = skin
                    .shape_matrix
                    .transform_point3(Vec3::new(chunk[0], chunk[1], chunk[2]));
                chunk.copy_from_slice(&v.to_array());
            }
        }

        graph.meshes.insert(Mesh {
            name: self.name.clone(),
            positions,
            normals: self.normals.clone(),
            texcoords: self.texcoords.clone(),
            groups: self.groups.clone(),
            skin,
        })
    }
}
