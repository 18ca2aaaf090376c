//! Zone ecosystems: texture settings and flora layers.

use tracing::trace;

use super::format::EcoTint;
use crate::core::{Record, parse_sequence};
use crate::util::Result;
use crate::view::{ByteView, PodArray};

/// Terrain texture settings of an eco.
#[derive(Clone, Copy, Debug)]
pub struct TextureInfo<'a> {
    view: ByteView<'a>,
    name: &'a str,
    color_nx_map: &'a str,
    spec_blend_ny_map: &'a str,
    detail_repeat: u32,
    blend_strength: f32,
    specular: (f32, f32),
    smoothness: (f32, f32),
    physics_material: &'a str,
}

impl<'a> TextureInfo<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("TextureInfo");
        let name = view.cstr(0)?;
        let mut offset = name.len() + 1;
        let color_nx_map = view.cstr(offset)?;
        offset += color_nx_map.len() + 1;
        let spec_blend_ny_map = view.cstr(offset)?;
        offset += spec_blend_ny_map.len() + 1;

        let detail_repeat = view.u32(offset)?;
        let blend_strength = view.f32(offset + 4)?;
        let specular = (view.f32(offset + 8)?, view.f32(offset + 12)?);
        let smoothness = (view.f32(offset + 16)?, view.f32(offset + 20)?);
        offset += 24;
        let physics_material = view.cstr(offset)?;
        offset += physics_material.len() + 1;

        Ok(Self {
            view: view.truncate(offset)?,
            name,
            color_nx_map,
            spec_blend_ny_map,
            detail_repeat,
            blend_strength,
            specular,
            smoothness,
            physics_material,
        })
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Color / normal-x map.
    #[inline]
    pub fn color_nx_map(&self) -> &'a str {
        self.color_nx_map
    }

    /// Specular blend / normal-y map.
    #[inline]
    pub fn spec_blend_ny_map(&self) -> &'a str {
        self.spec_blend_ny_map
    }

    #[inline]
    pub fn detail_repeat(&self) -> u32 {
        self.detail_repeat
    }

    #[inline]
    pub fn blend_strength(&self) -> f32 {
        self.blend_strength
    }

    /// `(min, max)`.
    #[inline]
    pub fn specular(&self) -> (f32, f32) {
        self.specular
    }

    /// `(min, max)`.
    #[inline]
    pub fn smoothness(&self) -> (f32, f32) {
        self.smoothness
    }

    #[inline]
    pub fn physics_material(&self) -> &'a str {
        self.physics_material
    }
}

impl<'a> Record<'a> for TextureInfo<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

/// Flora placement rules for one flora type.
#[derive(Clone, Copy, Debug)]
pub struct EcoLayer<'a> {
    view: ByteView<'a>,
    params: [f32; 7],
    min_alpha: u8,
    flora_name: &'a str,
    tints: PodArray<'a, EcoTint>,
}

impl<'a> EcoLayer<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("EcoLayer");
        let params = view.read::<[f32; 7]>(0)?;
        let min_alpha = view.u8(28)?;
        let flora_name = view.cstr(29)?;
        let (tints, end) = view.counted_array::<EcoTint>(29 + flora_name.len() + 1)?;
        Ok(Self { view: view.truncate(end)?, params, min_alpha, flora_name, tints })
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.params[0]
    }

    #[inline]
    pub fn min_scale(&self) -> f32 {
        self.params[1]
    }

    #[inline]
    pub fn max_scale(&self) -> f32 {
        self.params[2]
    }

    #[inline]
    pub fn slope_peak(&self) -> f32 {
        self.params[3]
    }

    #[inline]
    pub fn slope_extent(&self) -> f32 {
        self.params[4]
    }

    #[inline]
    pub fn min_elevation(&self) -> f32 {
        self.params[5]
    }

    #[inline]
    pub fn max_elevation(&self) -> f32 {
        self.params[6]
    }

    #[inline]
    pub fn min_alpha(&self) -> u8 {
        self.min_alpha
    }

    #[inline]
    pub fn flora_name(&self) -> &'a str {
        self.flora_name
    }

    #[inline]
    pub fn tints(&self) -> PodArray<'a, EcoTint> {
        self.tints
    }
}

impl<'a> Record<'a> for EcoLayer<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

#[derive(Clone, Debug)]
pub struct FloraInfo<'a> {
    view: ByteView<'a>,
    layers: Vec<EcoLayer<'a>>,
}

impl<'a> FloraInfo<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("FloraInfo");
        let count = view.len32(0)?;
        let (layers, end) = parse_sequence(view, 4, count, EcoLayer::parse)?;
        Ok(Self { view: view.truncate(end)?, layers })
    }

    #[inline]
    pub fn layers(&self) -> &[EcoLayer<'a>] {
        &self.layers
    }
}

impl<'a> Record<'a> for FloraInfo<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}

#[derive(Clone, Debug)]
pub struct Eco<'a> {
    view: ByteView<'a>,
    index: u32,
    texture_info: TextureInfo<'a>,
    flora_info: FloraInfo<'a>,
}

impl<'a> Eco<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Eco");
        let index = view.u32(0)?;
        let texture_info = TextureInfo::parse(view.tail(4)?)?;
        let flora_info = FloraInfo::parse(view.tail(4 + texture_info.size())?)?;
        let size = 4 + texture_info.size() + flora_info.size();
        trace!(index, name = texture_info.name(), layers = flora_info.layers().len(), "eco");
        Ok(Self { view: view.truncate(size)?, index, texture_info, flora_info })
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn texture_info(&self) -> &TextureInfo<'a> {
        &self.texture_info
    }

    #[inline]
    pub fn flora_info(&self) -> &FloraInfo<'a> {
        &self.flora_info
    }
}

impl<'a> Record<'a> for Eco<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
