//! Block graph types and the decoders for the block types with structured fields.
//!
//! Blocks point at each other through [`BlockRef`] indices into the owning file's block list, so
//! cycles between blocks need no special handling.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    error::{Error, Result},
    header::{Header, NifVersion},
    stream::NifStream,
};

const NULL_REF: i32 = -1;
const NULL_STRING: u32 = u32::MAX;

/// Index of a block inside the file it was decoded from
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRef(pub(crate) u32);

impl BlockRef {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A decoded block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Type name from the header's block type table
    pub type_name: Arc<str>,
    /// Declared payload length
    pub size: u32,
    pub data: BlockData,
}

/// Payload of a block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    Node(Node),
    Geometry(Geometry),
    StringExtraData(StringExtraData),
    IntegerExtraData(IntegerExtraData),
    BooleanExtraData(BooleanExtraData),
    AlphaProperty(AlphaProperty),
    /// A block type without structured decoding, kept as its raw payload
    Unsupported(Box<[u8]>),
}

impl BlockData {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, BlockData::Unsupported(_))
    }

    /// Every block this one points at, in field order
    pub fn references(&self) -> Vec<BlockRef> {
        let mut refs = Vec::new();
        match self {
            BlockData::Node(node) => {
                node.av.collect_refs(&mut refs);
                refs.extend(&node.children);
                refs.extend(&node.effects);
            }
            BlockData::Geometry(geometry) => {
                geometry.av.collect_refs(&mut refs);
                refs.extend(geometry.data);
                refs.extend(geometry.skin_instance);
                refs.extend(geometry.shader_property);
                refs.extend(geometry.alpha_property);
            }
            BlockData::AlphaProperty(property) => property.net.collect_refs(&mut refs),
            BlockData::StringExtraData(_)
            | BlockData::IntegerExtraData(_)
            | BlockData::BooleanExtraData(_)
            | BlockData::Unsupported(_) => {}
        }
        refs
    }
}

/// Name, extra data and controller shared by most blocks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNet {
    pub name: Option<Arc<str>>,
    pub extra_data: Vec<BlockRef>,
    pub controller: Option<BlockRef>,
}

impl ObjectNet {
    fn collect_refs(&self, refs: &mut Vec<BlockRef>) {
        refs.extend(&self.extra_data);
        refs.extend(self.controller);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    pub rotation: [[f32; 3]; 3],
    pub scale: f32,
}

/// Scene graph object with a transform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvObject {
    pub net: ObjectNet,
    pub flags: u32,
    pub transform: Transform,
    pub properties: Vec<BlockRef>,
    pub collision: Option<BlockRef>,
}

impl AvObject {
    fn collect_refs(&self, refs: &mut Vec<BlockRef>) {
        self.net.collect_refs(refs);
        refs.extend(&self.properties);
        refs.extend(self.collision);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub av: AvObject,
    pub children: Vec<BlockRef>,
    pub effects: Vec<BlockRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub name: Option<Arc<str>>,
    pub extra_data: u32,
}

/// `NiTriShape` and `NiTriStrips`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub av: AvObject,
    pub data: Option<BlockRef>,
    pub skin_instance: Option<BlockRef>,
    pub materials: Vec<Material>,
    pub active_material: i32,
    pub material_needs_update: bool,
    pub shader_property: Option<BlockRef>,
    pub alpha_property: Option<BlockRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringExtraData {
    pub name: Option<Arc<str>>,
    pub value: Option<Arc<str>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegerExtraData {
    pub name: Option<Arc<str>>,
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanExtraData {
    pub name: Option<Arc<str>>,
    pub value: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlphaProperty {
    pub net: ObjectNet,
    pub flags: u16,
    pub threshold: u8,
}

/// Block types with structured decoding
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum KnownType {
    Node,
    Geometry,
    StringExtraData,
    IntegerExtraData,
    BooleanExtraData,
    AlphaProperty,
}

impl KnownType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "NiNode" | "BSFadeNode" | "BSLeafAnimNode" | "RootCollisionNode" | "AvoidNode" => {
                KnownType::Node
            }
            "NiTriShape" | "NiTriStrips" => KnownType::Geometry,
            "NiStringExtraData" => KnownType::StringExtraData,
            "NiIntegerExtraData" => KnownType::IntegerExtraData,
            "NiBooleanExtraData" => KnownType::BooleanExtraData,
            "NiAlphaProperty" => KnownType::AlphaProperty,
            _ => return None,
        })
    }
}

/// What a block decoder needs to know about the file
pub(crate) struct BlockContext<'h> {
    pub header: &'h Header,
    pub index: usize,
}

impl BlockContext<'_> {
    fn origin(&self) -> String {
        format!("block {}", self.index)
    }

    fn read_ref(&self, stream: &mut NifStream<'_>) -> Result<Option<BlockRef>> {
        read_ref(stream, self.header.block_count(), || self.origin())
    }

    /// `u32` count then that many refs; null entries are dropped
    fn read_ref_list(&self, stream: &mut NifStream<'_>) -> Result<Vec<BlockRef>> {
        let count = stream.read_u32()?;
        stream.ensure(count as u64, 4)?;
        let mut refs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            refs.extend(self.read_ref(stream)?);
        }
        Ok(refs)
    }

    fn read_string(&self, stream: &mut NifStream<'_>) -> Result<Option<Arc<str>>> {
        let index = stream.read_u32()?;
        if index == NULL_STRING {
            return Ok(None);
        }
        let strings = &self.header.strings;
        strings
            .get(index as usize)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::InvalidStringIndex {
                origin: self.origin(),
                index,
                count: strings.len(),
            })
    }

    fn read_net(&self, stream: &mut NifStream<'_>) -> Result<ObjectNet> {
        Ok(ObjectNet {
            name: self.read_string(stream)?,
            extra_data: self.read_ref_list(stream)?,
            controller: self.read_ref(stream)?,
        })
    }

    fn read_transform(&self, stream: &mut NifStream<'_>) -> Result<Transform> {
        let mut transform = Transform::default();
        for value in transform.translation.iter_mut() {
            *value = stream.read_f32()?;
        }
        for value in transform.rotation.iter_mut().flatten() {
            *value = stream.read_f32()?;
        }
        transform.scale = stream.read_f32()?;
        Ok(transform)
    }

    fn read_av(&self, stream: &mut NifStream<'_>) -> Result<AvObject> {
        let bs_version = self.header.bs_version();
        let net = self.read_net(stream)?;
        let flags = if bs_version > 26 {
            stream.read_u32()?
        } else {
            stream.read_u16()? as u32
        };
        let transform = self.read_transform(stream)?;
        let properties = if bs_version <= 34 {
            self.read_ref_list(stream)?
        } else {
            Vec::new()
        };
        let collision = self.read_ref(stream)?;

        Ok(AvObject {
            net,
            flags,
            transform,
            properties,
            collision,
        })
    }

    fn read_node(&self, stream: &mut NifStream<'_>) -> Result<Node> {
        let av = self.read_av(stream)?;
        let children = self.read_ref_list(stream)?;
        let effects = if self.header.bs_version() < 130 {
            self.read_ref_list(stream)?
        } else {
            Vec::new()
        };
        Ok(Node {
            av,
            children,
            effects,
        })
    }

    fn read_geometry(&self, stream: &mut NifStream<'_>) -> Result<Geometry> {
        let av = self.read_av(stream)?;
        let data = self.read_ref(stream)?;
        let skin_instance = self.read_ref(stream)?;

        let material_count = stream.read_u32()?;
        // a name and an extra data word per material
        stream.ensure(material_count as u64, 8)?;
        let names = (0..material_count)
            .map(|_| self.read_string(stream))
            .collect::<Result<Vec<_>>>()?;
        let mut materials = Vec::with_capacity(names.len());
        for name in names {
            materials.push(Material {
                name,
                extra_data: stream.read_u32()?,
            });
        }
        let active_material = stream.read_i32()?;
        let material_needs_update = if self.header.version >= NifVersion::V20_2_0_7 {
            stream.read_u8()? != 0
        } else {
            false
        };

        let (shader_property, alpha_property) = if self.header.bs_version() > 34 {
            (self.read_ref(stream)?, self.read_ref(stream)?)
        } else {
            (None, None)
        };

        Ok(Geometry {
            av,
            data,
            skin_instance,
            materials,
            active_material,
            material_needs_update,
            shader_property,
            alpha_property,
        })
    }

    #[instrument(skip(self, stream), fields(block = self.index), err)]
    pub fn read(&self, kind: KnownType, stream: &mut NifStream<'_>) -> Result<BlockData> {
        let data = match kind {
            KnownType::Node => BlockData::Node(self.read_node(stream)?),
            KnownType::Geometry => BlockData::Geometry(self.read_geometry(stream)?),
            KnownType::StringExtraData => BlockData::StringExtraData(StringExtraData {
                name: self.read_string(stream)?,
                value: self.read_string(stream)?,
            }),
            KnownType::IntegerExtraData => BlockData::IntegerExtraData(IntegerExtraData {
                name: self.read_string(stream)?,
                value: stream.read_u32()?,
            }),
            KnownType::BooleanExtraData => BlockData::BooleanExtraData(BooleanExtraData {
                name: self.read_string(stream)?,
                value: stream.read_u8()? != 0,
            }),
            KnownType::AlphaProperty => BlockData::AlphaProperty(AlphaProperty {
                net: self.read_net(stream)?,
                flags: stream.read_u16()?,
                threshold: stream.read_u8()?,
            }),
        };

        if stream.remaining() > 0 {
            debug!(
                block = self.index,
                trailing = stream.remaining(),
                "block payload has trailing bytes"
            );
        }

        Ok(data)
    }
}

/// Reads an `i32` reference; `-1` is null, anything else must index a block
pub(crate) fn read_ref(
    stream: &mut NifStream<'_>,
    count: usize,
    origin: impl FnOnce() -> String,
) -> Result<Option<BlockRef>> {
    let index = stream.read_i32()?;
    if index == NULL_REF {
        return Ok(None);
    }
    if index < 0 || index as usize >= count {
        return Err(Error::DanglingReference {
            origin: origin(),
            index,
            count,
        });
    }
    Ok(Some(BlockRef(index as u32)))
}
