//! MRN packets: a fixed header followed by a typed payload.

use std::fmt;

use tracing::{trace, warn};

use super::file_data::FileData;
use super::nsa::NsaFile;
use super::skeleton::SkeletonData;
use super::string_table::ExpandedStringTable;
use crate::core::Record;
use crate::util::Result;
use crate::view::ByteView;

/// Unpadded header size.
pub const PACKET_HEADER_SIZE: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketType {
    Skeleton,
    SkeletonMap,
    EventTrack,
    EventTrackIK,
    UnknownData,
    NetworkData,
    PluginList,
    FileNames,
    SkeletonNames,
    NsaData,
    Unknown(u32),
}

impl From<u32> for PacketType {
    fn from(v: u32) -> Self {
        match v {
            0x01 => Self::Skeleton,
            0x02 => Self::SkeletonMap,
            0x03 => Self::EventTrack,
            0x04 => Self::EventTrackIK,
            0x07 => Self::UnknownData,
            0x0A => Self::NetworkData,
            0x0C => Self::PluginList,
            0x0E => Self::FileNames,
            0x0F => Self::SkeletonNames,
            0x10 => Self::NsaData,
            other => Self::Unknown(other),
        }
    }
}

impl From<PacketType> for u32 {
    fn from(t: PacketType) -> u32 {
        match t {
            PacketType::Skeleton => 0x01,
            PacketType::SkeletonMap => 0x02,
            PacketType::EventTrack => 0x03,
            PacketType::EventTrackIK => 0x04,
            PacketType::UnknownData => 0x07,
            PacketType::NetworkData => 0x0A,
            PacketType::PluginList => 0x0C,
            PacketType::FileNames => 0x0E,
            PacketType::SkeletonNames => 0x0F,
            PacketType::NsaData => 0x10,
            PacketType::Unknown(v) => v,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "Unknown({:#x})", v),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub magic: u64,
    pub packet_type: PacketType,
    /// Packet index, or a name hash for some types.
    pub index: u32,
    pub reserved: [u32; 4],
    pub data_length: u32,
    pub alignment: u32,
}

impl PacketHeader {
    pub fn parse(view: ByteView<'_>) -> Result<Self> {
        Ok(Self {
            magic: view.u64(0)?,
            packet_type: view.u32(8)?.into(),
            index: view.u32(12)?,
            reserved: view.read(16)?,
            data_length: view.u32(32)?,
            alignment: view.u32(36)?,
        })
    }

    /// Header bytes including padding up to `alignment`.
    pub fn size(&self) -> usize {
        let align = self.alignment as usize;
        match align {
            0 => PACKET_HEADER_SIZE,
            _ => match PACKET_HEADER_SIZE % align {
                0 => PACKET_HEADER_SIZE,
                rem => PACKET_HEADER_SIZE + align - rem,
            },
        }
    }
}

/// Decoded payload of a packet.
#[derive(Clone, Debug)]
pub enum PacketKind<'a> {
    Skeleton(SkeletonData<'a>),
    FileNames(FileData<'a>),
    SkeletonNames(ExpandedStringTable<'a>),
    Nsa(NsaFile<'a>),
    /// Types without a decoder.
    Raw,
}

#[derive(Clone, Debug)]
pub struct Packet<'a> {
    view: ByteView<'a>,
    header: PacketHeader,
    data: ByteView<'a>,
    kind: PacketKind<'a>,
}

impl<'a> Packet<'a> {
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let view = view.with_label("Packet");
        let header = PacketHeader::parse(view)?;
        let header_size = header.size();
        let data = view.window(header_size, header.data_length as usize)?;

        let kind = match header.packet_type {
            PacketType::Skeleton => PacketKind::Skeleton(SkeletonData::parse(data)?),
            PacketType::FileNames => PacketKind::FileNames(FileData::parse(data)?),
            PacketType::SkeletonNames => {
                PacketKind::SkeletonNames(ExpandedStringTable::parse(data.tail(data.ptr64(0)?)?)?)
            }
            PacketType::NsaData => PacketKind::Nsa(NsaFile::parse(data)?),
            PacketType::Unknown(t) => {
                warn!(packet_type = format_args!("{:#x}", t), offset = view.base(), "unknown MRN packet type");
                PacketKind::Raw
            }
            _ => PacketKind::Raw,
        };
        trace!(packet_type = %header.packet_type, index = header.index, len = header.data_length, "packet");

        Ok(Self {
            view: view.truncate(header_size + data.size())?,
            header,
            data,
            kind,
        })
    }

    #[inline]
    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    #[inline]
    pub fn packet_type(&self) -> PacketType {
        self.header.packet_type
    }

    /// Payload bytes after the (padded) header.
    #[inline]
    pub fn data(&self) -> ByteView<'a> {
        self.data
    }

    #[inline]
    pub fn kind(&self) -> &PacketKind<'a> {
        &self.kind
    }
}

impl<'a> Record<'a> for Packet<'a> {
    fn size(&self) -> usize {
        self.view.size()
    }

    fn view(&self) -> ByteView<'a> {
        self.view
    }
}
