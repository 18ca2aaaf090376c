//! Zone files.

use tracing::{debug, info_span, warn};

use super::eco::Eco;
use super::flora::Flora;
use super::header::ZoneHeader;
use super::light::Light;
use super::object::RuntimeObject;
use crate::core::{Record, parse_sequence};
use crate::util::{Error, Result};
use crate::view::ByteView;

/// Count-prefixed run of records at `offset`.
fn counted<'a, R, F>(view: ByteView<'a>, offset: usize, parse: F) -> Result<Vec<R>>
where
    R: Record<'a>,
    F: FnMut(ByteView<'a>) -> Result<R>,
{
    let count = view.len32(offset)?;
    parse_sequence(view, offset + 4, count, parse).map(|(records, _)| records)
}

/// Parsed zone: ecosystems, flora, objects and lights.
#[derive(Clone, Debug)]
pub struct Zone<'a> {
    view: ByteView<'a>,
    header: ZoneHeader,
    ecos: Vec<Eco<'a>>,
    floras: Vec<Flora<'a>>,
    objects: Vec<RuntimeObject<'a>>,
    lights: Vec<Light<'a>>,
    unknown_count: u32,
    unknown_data: ByteView<'a>,
    decals_count: Option<u32>,
}

impl<'a> Zone<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Zone");
        let header = ZoneHeader::parse(view)?;
        let version = header.version();
        let offsets = header.offsets();
        let _span = info_span!("zone", version).entered();

        let ecos = counted(view, offsets.ecos, Eco::parse)?;
        let floras = counted(view, offsets.floras, |v| Flora::parse(v, version))?;

        let invis_walls = view.u32(offsets.invis_walls)?;
        if invis_walls > 0 {
            warn!(count = invis_walls, "zone has invisible walls");
            return Err(Error::UnimplementedFormat("invisible walls"));
        }

        let objects = counted(view, offsets.objects, |v| RuntimeObject::parse(v, version))?;
        let lights = counted(view, offsets.lights, Light::parse)?;
        let unknown_count = view.u32(offsets.unknown)?;
        let unknown_data = view.tail(offsets.unknown + 4)?;
        let decals_count = offsets.decals.map(|o| view.u32(o)).transpose()?;

        debug!(
            ecos = ecos.len(),
            floras = floras.len(),
            objects = objects.len(),
            instances = objects.iter().map(|o| o.instances().len()).sum::<usize>(),
            lights = lights.len(),
            "parsed zone"
        );
        Ok(Self { view, header, ecos, floras, objects, lights, unknown_count, unknown_data, decals_count })
    }

    #[inline]
    pub fn header(&self) -> &ZoneHeader {
        &self.header
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.header.version()
    }

    #[inline]
    pub fn ecos(&self) -> &[Eco<'a>] {
        &self.ecos
    }

    #[inline]
    pub fn floras(&self) -> &[Flora<'a>] {
        &self.floras
    }

    #[inline]
    pub fn objects(&self) -> &[RuntimeObject<'a>] {
        &self.objects
    }

    #[inline]
    pub fn lights(&self) -> &[Light<'a>] {
        &self.lights
    }

    #[inline]
    pub fn unknown_count(&self) -> u32 {
        self.unknown_count
    }

    /// Everything after the unknown section's count.
    #[inline]
    pub fn unknown_data(&self) -> ByteView<'a> {
        self.unknown_data
    }

    /// Decal count, version 4 and later.
    #[inline]
    pub fn decals_count(&self) -> Option<u32> {
        self.decals_count
    }

    /// The extra header field, version 4 and later.
    #[inline]
    pub fn header_unknown(&self) -> Option<u32> {
        self.header.unknown()
    }
}

impl<'a> Record<'a> for Zone<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
