//! Material parameters.

use std::fmt;

use crate::core::Record;
use crate::util::Result;
use crate::view::ByteView;

/// Size of the fixed parameter header.
pub const PARAMETER_HEADER_SIZE: usize = 16;

/// D3DX parameter class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterClass {
    Scalar,
    Vector,
    MatrixRows,
    MatrixColumns,
    Object,
    Struct,
    Unknown(u32),
}

impl From<u32> for ParameterClass {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Scalar,
            1 => Self::Vector,
            2 => Self::MatrixRows,
            3 => Self::MatrixColumns,
            4 => Self::Object,
            5 => Self::Struct,
            other => Self::Unknown(other),
        }
    }
}

/// D3DX parameter type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Void,
    Bool,
    Int,
    Float,
    String,
    Texture,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Sampler,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    PixelShader,
    VertexShader,
    PixelFragment,
    VertexFragment,
    Unsupported,
    Unknown(u32),
}

impl ParameterType {
    /// Any of the texture types.
    pub fn is_texture(self) -> bool {
        matches!(
            self,
            Self::Texture | Self::Texture1D | Self::Texture2D | Self::Texture3D | Self::TextureCube
        )
    }
}

impl From<u32> for ParameterType {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Void,
            1 => Self::Bool,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::String,
            5 => Self::Texture,
            6 => Self::Texture1D,
            7 => Self::Texture2D,
            8 => Self::Texture3D,
            9 => Self::TextureCube,
            10 => Self::Sampler,
            11 => Self::Sampler1D,
            12 => Self::Sampler2D,
            13 => Self::Sampler3D,
            14 => Self::SamplerCube,
            15 => Self::PixelShader,
            16 => Self::VertexShader,
            17 => Self::PixelFragment,
            18 => Self::VertexFragment,
            19 => Self::Unsupported,
            other => Self::Unknown(other),
        }
    }
}

/// Known texture-slot semantics, keyed by their hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    BaseColor1,
    BaseColor2,
    BaseColor3,
    BaseColor4,
    Emissive1,
    NormalMap1,
    NormalMap2,
    BumpMap1,
    Specular1,
    Specular2,
    Specular3,
    Specular4,
    DetailSelect,
    DetailCube1,
    DetailCube2,
    Overlay0,
    Overlay1,
    Overlay2,
    Overlay3,
    BaseCamo,
    Unknown(i32),
}

/// Every known semantic with its hash.
const SEMANTIC_HASHES: [(Semantic, i32); 20] = [
    (Semantic::BaseColor1, -1295769314),
    (Semantic::BaseColor2, -842571984),
    (Semantic::BaseColor3, 1735042216),
    (Semantic::BaseColor4, -930107671),
    (Semantic::Emissive1, 668925675),
    (Semantic::NormalMap1, 789998085),
    (Semantic::NormalMap2, 678189709),
    (Semantic::BumpMap1, -1662952723),
    (Semantic::Specular1, 67211600),
    (Semantic::Specular2, -1393304010),
    (Semantic::Specular3, -773254801),
    (Semantic::Specular4, -117089512),
    (Semantic::DetailSelect, 1716414136),
    (Semantic::DetailCube1, -125639093),
    (Semantic::DetailCube2, -1856785929),
    (Semantic::Overlay0, -1260182040),
    (Semantic::Overlay1, 1449224430),
    (Semantic::Overlay2, 339833724),
    (Semantic::Overlay3, -1261849043),
    (Semantic::BaseCamo, -305773271),
];

impl Semantic {
    /// All named semantics, in declaration order.
    pub fn known() -> impl Iterator<Item = Semantic> {
        SEMANTIC_HASHES.iter().map(|&(s, _)| s)
    }

    pub fn from_hash(hash: i32) -> Self {
        SEMANTIC_HASHES
            .iter()
            .find(|&&(_, h)| h == hash)
            .map(|&(s, _)| s)
            .unwrap_or(Self::Unknown(hash))
    }

    pub fn to_hash(self) -> i32 {
        match self {
            Self::Unknown(h) => h,
            known => SEMANTIC_HASHES
                .iter()
                .find(|&&(s, _)| s == known)
                .map(|&(_, h)| h)
                .unwrap_or_default(),
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Texture role shared by the numbered variants.
    pub fn texture_type(self) -> &'static str {
        match self {
            Self::BaseColor1 | Self::BaseColor2 | Self::BaseColor3 | Self::BaseColor4 => "Base Color",
            Self::Emissive1 => "Emissive",
            Self::NormalMap1 | Self::NormalMap2 => "Normal Map",
            Self::BumpMap1 => "Bump Map",
            Self::Specular1 | Self::Specular2 | Self::Specular3 | Self::Specular4 => "Specular",
            Self::DetailSelect => "Detail Select",
            Self::DetailCube1 | Self::DetailCube2 => "Detail Cube",
            Self::Overlay0 | Self::Overlay1 | Self::Overlay2 | Self::Overlay3 => "Overlay",
            Self::BaseCamo => "Base Camo",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl From<i32> for Semantic {
    fn from(hash: i32) -> Self {
        Self::from_hash(hash)
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(h) => write!(f, "Unknown ({})", h),
            known => write!(f, "{:?}", known),
        }
    }
}

/// One material parameter: typed header plus raw value bytes.
#[derive(Clone, Copy, Debug)]
pub struct Parameter<'a> {
    view: ByteView<'a>,
    semantic_hash: i32,
    class: ParameterClass,
    param_type: ParameterType,
    data: ByteView<'a>,
}

impl<'a> Parameter<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Parameter");
        let length = view.len32(12)?;
        let data = view.window(PARAMETER_HEADER_SIZE, length)?;
        Ok(Self {
            view: view.truncate(PARAMETER_HEADER_SIZE + length)?,
            semantic_hash: view.i32(0)?,
            class: view.u32(4)?.into(),
            param_type: view.u32(8)?.into(),
            data,
        })
    }

    #[inline]
    pub fn semantic_hash(&self) -> i32 {
        self.semantic_hash
    }

    #[inline]
    pub fn semantic(&self) -> Semantic {
        Semantic::from_hash(self.semantic_hash)
    }

    #[inline]
    pub fn class(&self) -> ParameterClass {
        self.class
    }

    #[inline]
    pub fn param_type(&self) -> ParameterType {
        self.param_type
    }

    #[inline]
    pub fn data(&self) -> ByteView<'a> {
        self.data
    }

    /// First data word: for texture slots, the OAAT hash of the upper-cased
    /// texture name.
    pub fn texture_hash(&self) -> Option<u32> {
        self.data.u32(0).ok()
    }
}

impl<'a> Record<'a> for Parameter<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_hashes() {
        assert_eq!(Semantic::from_hash(-1295769314), Semantic::BaseColor1);
        assert_eq!(Semantic::from_hash(789998085), Semantic::NormalMap1);
        assert_eq!(Semantic::from_hash(42), Semantic::Unknown(42));
        for s in Semantic::known() {
            assert_eq!(Semantic::from_hash(s.to_hash()), s);
        }
        assert_eq!(Semantic::known().count(), 20);
        assert_eq!(Semantic::Specular3.texture_type(), "Specular");
        assert_eq!(Semantic::Unknown(7).to_string(), "Unknown (7)");
        assert_eq!(Semantic::DetailCube2.to_string(), "DetailCube2");
    }

    #[test]
    fn test_class_and_type() {
        assert_eq!(ParameterClass::from(3), ParameterClass::MatrixColumns);
        assert_eq!(ParameterClass::from(0x7fff_ffff), ParameterClass::Unknown(0x7fff_ffff));
        assert_eq!(ParameterType::from(7), ParameterType::Texture2D);
        assert!(ParameterType::TextureCube.is_texture());
        assert!(!ParameterType::Sampler2D.is_texture());
    }

    #[test]
    fn test_parse_parameter() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(-305773271i32).to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes()); // object
        buf.extend_from_slice(&7u32.to_le_bytes()); // texture2d
        buf.extend_from_slice(&8u32.to_le_bytes());
        buf.extend_from_slice(&0x45a6_0234u32.to_le_bytes());
        buf.extend_from_slice(&[0xAA; 4]);
        buf.extend_from_slice(b"next");

        let param = Parameter::parse(ByteView::new(&buf)).unwrap();
        assert_eq!(param.semantic(), Semantic::BaseCamo);
        assert_eq!(param.class(), ParameterClass::Object);
        assert_eq!(param.param_type(), ParameterType::Texture2D);
        assert_eq!(param.size(), 24);
        assert_eq!(param.texture_hash(), Some(0x45a6_0234));
    }
}
