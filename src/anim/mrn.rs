//! MRN animation network files.
//!
//! An MRN is a flat run of packets, each starting on a 16-byte boundary.
//! Skeletons, the FileNames index, the skeleton name table, and every NSA
//! clip each arrive as their own packet.

use tracing::{info, info_span};

use super::file_data::FileData;
use super::nsa::NsaFile;
use super::packet::{Packet, PacketKind};
use super::skeleton::SkeletonData;
use super::string_table::ExpandedStringTable;
use crate::core::Record;
use crate::util::{align_up, Result};
use crate::view::ByteView;

/// Packets start on this boundary.
pub const PACKET_ALIGNMENT: usize = 16;

#[derive(Clone, Debug)]
pub struct Mrn<'a> {
    view: ByteView<'a>,
    packets: Vec<Packet<'a>>,
    file_names: Option<usize>,
    skeleton_names: Option<usize>,
}

impl<'a> Mrn<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("MRN");
        let _span = info_span!("mrn", size = view.size()).entered();

        let mut packets = Vec::new();
        let mut file_names = None;
        let mut skeleton_names = None;
        let mut offset = 0;
        while offset < view.size() {
            let packet = Packet::parse(view.tail(offset)?)?;
            match packet.kind() {
                PacketKind::FileNames(_) => file_names = Some(packets.len()),
                PacketKind::SkeletonNames(_) => skeleton_names = Some(packets.len()),
                _ => {}
            }
            offset = align_up(offset + packet.size(), PACKET_ALIGNMENT);
            packets.push(packet);
        }

        let mrn = Self { view, packets, file_names, skeleton_names };
        info!(
            packets = mrn.packets.len(),
            skeletons = mrn.skeletons().count(),
            animations = mrn.animations().count(),
            "parsed MRN"
        );
        Ok(mrn)
    }

    #[inline]
    pub fn packets(&self) -> &[Packet<'a>] {
        &self.packets
    }

    pub fn file_names(&self) -> Option<&FileData<'a>> {
        match self.packets.get(self.file_names?)?.kind() {
            PacketKind::FileNames(files) => Some(files),
            _ => None,
        }
    }

    pub fn skeleton_names(&self) -> Option<&ExpandedStringTable<'a>> {
        match self.packets.get(self.skeleton_names?)?.kind() {
            PacketKind::SkeletonNames(names) => Some(names),
            _ => None,
        }
    }

    /// Packet indices of every Skeleton packet.
    pub fn skeleton_indices(&self) -> Vec<usize> {
        self.packets
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p.kind(), PacketKind::Skeleton(_)))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn skeletons(&self) -> impl Iterator<Item = &SkeletonData<'a>> + '_ {
        self.packets.iter().filter_map(|p| match p.kind() {
            PacketKind::Skeleton(s) => Some(s),
            _ => None,
        })
    }

    pub fn animations(&self) -> impl Iterator<Item = &NsaFile<'a>> + '_ {
        self.packets.iter().filter_map(|p| match p.kind() {
            PacketKind::Nsa(nsa) => Some(nsa),
            _ => None,
        })
    }

    /// Clip whose file or animation name is `name`, matched through the
    /// FileNames CRC-32 column.
    pub fn animation(&self, name: &str) -> Option<&NsaFile<'a>> {
        let crc = self.file_names()?.crc32_of(name)?;
        self.animations().find(|nsa| nsa.crc32() == crc)
    }
}

impl<'a> Record<'a> for Mrn<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
