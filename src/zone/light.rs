//! Zone lights.

use std::fmt;

use super::format::ColorArgb;
use crate::core::Record;
use crate::util::{Float2, Float4, Result};
use crate::view::ByteView;

/// Opaque bytes closing every light record.
const LIGHT_TRAILER: usize = 26;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightType {
    Point,
    Spot,
    Other(u32),
}

impl From<u32> for LightType {
    fn from(v: u32) -> Self {
        match v {
            1 => Self::Point,
            2 => Self::Spot,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for LightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => f.write_str("point"),
            Self::Spot => f.write_str("spot"),
            Self::Other(v) => write!(f, "type {}", v),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Light<'a> {
    view: ByteView<'a>,
    name: &'a str,
    color_name: &'a str,
    light_type: LightType,
    unk_bool: bool,
    translation: Float4,
    rotation: Float4,
    unk_floats: Float2,
    color: ColorArgb,
    unk_data: &'a [u8],
}

impl<'a> Light<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Light");
        let name = view.cstr(0)?;
        let color_name = view.cstr(name.len() + 1)?;
        let offset = name.len() + color_name.len() + 2;

        let light_type = LightType::from(view.u32(offset)?);
        let unk_bool = view.bool(offset + 4)?;
        let translation = view.read::<Float4>(offset + 5)?;
        let rotation = view.read::<Float4>(offset + 21)?;
        let unk_floats = view.read::<Float2>(offset + 37)?;
        let color = view.read::<ColorArgb>(offset + 45)?;
        let data_offset = offset + 49;
        let unk_data = view.bytes(data_offset, LIGHT_TRAILER)?;

        Ok(Self {
            view: view.truncate(data_offset + LIGHT_TRAILER)?,
            name,
            color_name,
            light_type,
            unk_bool,
            translation,
            rotation,
            unk_floats,
            color,
            unk_data,
        })
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[inline]
    pub fn color_name(&self) -> &'a str {
        self.color_name
    }

    #[inline]
    pub fn light_type(&self) -> LightType {
        self.light_type
    }

    #[inline]
    pub fn unk_bool(&self) -> bool {
        self.unk_bool
    }

    #[inline]
    pub fn translation(&self) -> Float4 {
        self.translation
    }

    #[inline]
    pub fn rotation(&self) -> Float4 {
        self.rotation
    }

    #[inline]
    pub fn unk_floats(&self) -> Float2 {
        self.unk_floats
    }

    #[inline]
    pub fn color(&self) -> ColorArgb {
        self.color
    }

    #[inline]
    pub fn unk_data(&self) -> &'a [u8] {
        self.unk_data
    }
}

impl<'a> Record<'a> for Light<'a> {
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
    fn test_light() {
        let mut buf = b"lamp\0warm\0".to_vec();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.push(1);
        for f in [10.0f32, 20.0, 30.0, 1.0, 0.0, 0.0, 0.0, 1.0, 4.0, 8.0] {
            buf.extend_from_slice(&f.to_le_bytes());
        }
        buf.extend_from_slice(&[255, 200, 100, 50]);
        buf.extend_from_slice(&[0xCC; 26]);

        let light = Light::parse(ByteView::new(&buf)).unwrap();
        assert_eq!(light.size(), buf.len());
        assert_eq!(light.size(), 10 + 49 + 26);
        assert_eq!(light.light_type(), LightType::Spot);
        assert_eq!(light.color_name(), "warm");
        assert_eq!(light.translation().z, 30.0);
        assert_eq!(light.unk_floats().y, 8.0);
        assert_eq!(light.color(), ColorArgb { a: 255, r: 200, g: 100, b: 50 });
        assert_eq!(LightType::from(7), LightType::Other(7));
    }
}
