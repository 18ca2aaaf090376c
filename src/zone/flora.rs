//! Zone flora definitions.

use crate::core::Record;
use crate::util::Result;
use crate::view::ByteView;

/// Opaque tail added in version 4.
const FLORA_V4_EXTRA: usize = 12;

#[derive(Clone, Copy, Debug)]
pub struct Flora<'a> {
    view: ByteView<'a>,
    name: &'a str,
    texture: &'a str,
    model: &'a str,
    unk_bool: bool,
    unk_floats: [f32; 2],
    extra: Option<ByteView<'a>>,
}

impl<'a> Flora<'a> {
    pub fn parse(view: ByteView<'a>, version: u32) -> Result<Self> {
        let view = view.with_label("Flora");
        let name = view.cstr(0)?;
        let texture = view.cstr(name.len() + 1)?;
        let model = view.cstr(name.len() + texture.len() + 2)?;
        let offset = name.len() + texture.len() + model.len() + 3;

        let unk_bool = view.bool(offset)?;
        let unk_floats = [view.f32(offset + 1)?, view.f32(offset + 5)?];
        let mut end = offset + 9;
        let extra = if version > 3 {
            let extra = view.window(end, FLORA_V4_EXTRA)?;
            end += FLORA_V4_EXTRA;
            Some(extra)
        } else {
            None
        };

        Ok(Self { view: view.truncate(end)?, name, texture, model, unk_bool, unk_floats, extra })
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[inline]
    pub fn texture(&self) -> &'a str {
        self.texture
    }

    #[inline]
    pub fn model(&self) -> &'a str {
        self.model
    }

    #[inline]
    pub fn unk_bool(&self) -> bool {
        self.unk_bool
    }

    #[inline]
    pub fn unk_floats(&self) -> [f32; 2] {
        self.unk_floats
    }

    /// Twelve opaque bytes, version 4 and later.
    #[inline]
    pub fn extra(&self) -> Option<&'a [u8]> {
        self.extra.map(|v| v.as_bytes())
    }
}

impl<'a> Record<'a> for Flora<'a> {
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

    fn flora_bytes() -> Vec<u8> {
        let mut buf = b"bush\0bush.dds\0bush.adr\0".to_vec();
        buf.push(1);
        buf.extend_from_slice(&1.5f32.to_le_bytes());
        buf.extend_from_slice(&2.5f32.to_le_bytes());
        buf.extend_from_slice(&[0xAB; 12]);
        buf
    }

    #[test]
    fn test_flora_versions() {
        let buf = flora_bytes();
        let v3 = Flora::parse(ByteView::new(&buf), 3).unwrap();
        assert_eq!(v3.size(), 23 + 9);
        assert!(v3.extra().is_none());
        assert_eq!(v3.model(), "bush.adr");
        assert!(v3.unk_bool());
        assert_eq!(v3.unk_floats(), [1.5, 2.5]);

        let v5 = Flora::parse(ByteView::new(&buf), 5).unwrap();
        assert_eq!(v5.size(), buf.len());
        assert_eq!(v5.extra(), Some(&[0xAB; 12][..]));
    }
}
