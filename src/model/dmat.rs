//! DMAT material tables.
//!
//! A DMAT carries the texture file names its materials reference, then the
//! materials themselves. Texture parameters store only the OAAT hash of the
//! upper-cased name, so resolving a slot means hashing every declared name.

use tracing::debug;

use super::material::Material;
use super::parameter::Semantic;
use crate::core::{Header, Record, parse_sequence};
use crate::util::{Error, Result};
use crate::view::ByteView;

/// Magic of a material table.
pub const DMAT_MAGIC: &[u8; 4] = b"DMAT";

/// Offset of the texture name block.
const NAMES_OFFSET: usize = 12;

/// Parsed material table.
#[derive(Clone, Debug)]
pub struct Dmat<'a> {
    view: ByteView<'a>,
    header: Header,
    texture_names: Vec<&'a str>,
    texture_hashes: Vec<u32>,
    materials: Vec<Material<'a>>,
}

/// Split a NUL-separated name block; a trailing terminator ends the list.
fn split_names<'a>(block: ByteView<'a>) -> Result<Vec<&'a str>> {
    let mut names = Vec::new();
    let mut offset = 0;
    while offset < block.size() {
        let rest = &block.as_bytes()[offset..];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        let name = std::str::from_utf8(&rest[..len]).map_err(|_| Error::InvalidString {
            record: block.label(),
            offset: block.base() + offset,
        })?;
        names.push(name);
        offset += len + 1;
    }
    Ok(names)
}

impl<'a> Dmat<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("DMAT");
        let header = Header::parse(view, DMAT_MAGIC)?;
        let names_len = view.len32(8)?;
        let texture_names = split_names(view.window(NAMES_OFFSET, names_len)?)?;
        let texture_hashes = texture_names.iter().map(|n| jenkins::oaat_uppercase(n)).collect();

        let materials_offset = NAMES_OFFSET + names_len;
        let count = view.len32(materials_offset)?;
        let (materials, end) = parse_sequence(view, materials_offset + 4, count, Material::parse)?;
        debug!(textures = texture_names.len(), materials = materials.len(), "parsed DMAT");

        Ok(Self { view: view.truncate(end)?, header, texture_names, texture_hashes, materials })
    }

    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    #[inline]
    pub fn texture_names(&self) -> &[&'a str] {
        &self.texture_names
    }

    #[inline]
    pub fn materials(&self) -> &[Material<'a>] {
        &self.materials
    }

    pub fn material(&self, index: usize) -> Option<&Material<'a>> {
        self.materials.get(index)
    }

    /// Declared texture name whose upper-cased OAAT hash is `hash`.
    pub fn texture_by_hash(&self, hash: u32) -> Option<&'a str> {
        self.texture_hashes
            .iter()
            .position(|&h| h == hash)
            .map(|i| self.texture_names[i])
    }

    /// Texture bound to `semantic` on material `material`.
    pub fn texture_for_semantic(&self, material: usize, semantic: Semantic) -> Option<&'a str> {
        let hash = self.materials.get(material)?.texture_hash(semantic)?;
        self.texture_by_hash(hash)
    }

    /// Every known semantic of material `material` that resolves to a name,
    /// in parameter order.
    pub fn resolve_textures(&self, material: usize) -> Vec<(Semantic, &'a str)> {
        let Some(mat) = self.materials.get(material) else {
            return Vec::new();
        };
        mat.parameters()
            .iter()
            .filter(|p| p.semantic().is_known())
            .filter_map(|p| Some((p.semantic(), self.texture_by_hash(p.texture_hash()?)?)))
            .collect()
    }
}

impl<'a> Record<'a> for Dmat<'a> {
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

    const SHIELD: &str = "Common_Structures_Warpgate_Shield_C.dds";

    fn texture_param(semantic: Semantic, hash: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&semantic.to_hash().to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&hash.to_le_bytes());
        buf
    }

    fn dmat_bytes() -> Vec<u8> {
        let names = format!("{}\0other_N.dds\0", SHIELD);
        let params = [
            texture_param(Semantic::BaseColor1, 0x45a6_0234),
            texture_param(Semantic::Unknown(5), 0x45a6_0234),
            texture_param(Semantic::NormalMap1, jenkins::oaat_uppercase("other_N.dds")),
            texture_param(Semantic::Specular1, 0x0bad_f00d),
        ]
        .concat();

        let mut buf = b"DMAT".to_vec();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&(names.len() as u32).to_le_bytes());
        buf.extend_from_slice(names.as_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&0x77u32.to_le_bytes());
        buf.extend_from_slice(&(8 + params.len() as u32).to_le_bytes());
        buf.extend_from_slice(&0x99u32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&params);
        buf
    }

    #[test]
    fn test_texture_names() {
        let buf = dmat_bytes();
        let dmat = Dmat::parse(ByteView::new(&buf)).unwrap();
        assert_eq!(dmat.texture_names(), &[SHIELD, "other_N.dds"]);
        assert_eq!(dmat.materials().len(), 1);
        assert_eq!(dmat.size(), buf.len());
    }

    #[test]
    fn test_resolve_textures() {
        let buf = dmat_bytes();
        let dmat = Dmat::parse(ByteView::new(&buf)).unwrap();
        assert_eq!(dmat.texture_for_semantic(0, Semantic::BaseColor1), Some(SHIELD));
        assert_eq!(dmat.texture_for_semantic(0, Semantic::Specular1), None);
        assert_eq!(dmat.texture_for_semantic(3, Semantic::BaseColor1), None);
        assert_eq!(
            dmat.resolve_textures(0),
            vec![(Semantic::BaseColor1, SHIELD), (Semantic::NormalMap1, "other_N.dds")]
        );
    }

    #[test]
    fn test_split_names() {
        let names = split_names(ByteView::new(b"a\0\0bc")).unwrap();
        assert_eq!(names, vec!["a", "", "bc"]);
        assert!(split_names(ByteView::new(b"")).unwrap().is_empty());
    }
}
