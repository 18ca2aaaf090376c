//! Material records inside a DMAT table.

use tracing::trace;

use super::parameter::{Parameter, Semantic};
use crate::core::{Record, parse_sequence};
use crate::util::Result;
use crate::view::ByteView;

/// Offset of the first parameter.
const PARAMS_OFFSET: usize = 16;

/// A material: definition hash plus its parameters.
#[derive(Clone, Debug)]
pub struct Material<'a> {
    view: ByteView<'a>,
    namehash: u32,
    definition: u32,
    parameters: Vec<Parameter<'a>>,
}

impl<'a> Material<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Material");
        let length = view.len32(4)?;
        // The declared length excludes the namehash and length fields.
        let view = view.truncate(length + 8)?;
        let count = view.len32(12)?;
        let (parameters, _) = parse_sequence(view, PARAMS_OFFSET, count, Parameter::parse)?;
        trace!(params = parameters.len(), size = view.size(), "material");
        Ok(Self {
            view,
            namehash: view.u32(0)?,
            definition: view.u32(8)?,
            parameters,
        })
    }

    #[inline]
    pub fn namehash(&self) -> u32 {
        self.namehash
    }

    /// Hash of the material definition this material instantiates.
    #[inline]
    pub fn definition(&self) -> u32 {
        self.definition
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter<'a>] {
        &self.parameters
    }

    /// First parameter bound to `semantic`.
    pub fn parameter(&self, semantic: Semantic) -> Option<&Parameter<'a>> {
        let hash = semantic.to_hash();
        self.parameters.iter().find(|p| p.semantic_hash() == hash)
    }

    /// Texture-name hash stored for `semantic`, if the slot is bound.
    pub fn texture_hash(&self, semantic: Semantic) -> Option<u32> {
        self.parameter(semantic).and_then(|p| p.texture_hash())
    }
}

impl<'a> Record<'a> for Material<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
