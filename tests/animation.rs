//! MRN containers: skeleton, names and a static clip, parsed together.

mod common;

use std::f32::consts::FRAC_PI_2;

use common::Writer;
use warpgate::anim::dequant::{pack_rotation, pack_translation};
use warpgate::anim::{DequantizationFactors, Mrn, PacketType, Skeleton};
use warpgate::core::Record;
use warpgate::util::{Mat4, Quat, Vec3};
use warpgate::ByteView;

const CLIP_CRC: u32 = 0xC0FF_EE01;

fn offsets() -> [Vec3; 3] {
    [Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.5, 0.0)]
}

fn rotations() -> [Quat; 3] {
    [Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2), Quat::IDENTITY]
}

fn clip_translations() -> [Vec3; 3] {
    [Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 0.25, 0.5)]
}

fn clip_rotations() -> [Quat; 3] {
    [Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2), Quat::from_rotation_x(FRAC_PI_2)]
}

fn translation_factors() -> DequantizationFactors {
    DequantizationFactors::new([-2.0; 3], [4.0 / 65535.0; 3])
}

fn rotation_factors() -> DequantizationFactors {
    DequantizationFactors::new([-1.0; 3], [2.0 / 65535.0; 3])
}

fn factors(w: &mut Writer, f: &DequantizationFactors) {
    w.f32s(&f.min).f32s(&f.scaled_extent);
}

fn string_table(strings: &[&str]) -> Vec<u8> {
    let mut block = Vec::new();
    let mut offs = Vec::new();
    for s in strings {
        offs.push(block.len() as u32);
        block.extend_from_slice(s.as_bytes());
        block.push(0);
    }
    let n = strings.len() as u64;
    let mut w = Writer::new();
    w.u32(n as u32).u32(block.len() as u32).u64(24).u64(24 + 4 * n);
    for o in offs {
        w.u32(o);
    }
    w.bytes(&block);
    w.finish()
}

fn packet(w: &mut Writer, packet_type: u32, payload: &[u8]) {
    w.u64(0x4E52_4D00).u32(packet_type).u32(0).zeros(16);
    w.u32(payload.len() as u32).u32(16).zeros(8);
    w.bytes(payload);
    let end = (w.len() + 15) & !15;
    w.pad_to(end);
}

fn file_names() -> Vec<u8> {
    let tables = [
        string_table(&["run.nsa"]),
        string_table(&["nsa"]),
        string_table(&["run.fbx"]),
        string_table(&["Run"]),
    ];
    let mut w = Writer::new();
    let mut ptr = 40u64;
    for t in &tables {
        w.u64(ptr);
        ptr += t.len() as u64;
    }
    w.u64(ptr);
    for t in &tables {
        w.bytes(t);
    }
    w.u32_be(CLIP_CRC);
    w.finish()
}

fn skeleton_names() -> Vec<u8> {
    let mut w = Writer::new();
    w.u64(8);
    w.u32(2).u32(11).u64(40).u64(48).u64(56).u64(64);
    w.u32(1).u32(2); // ids
    w.u32(6).u32(0); // offsets, not in string order
    w.u32(0).u32(0);
    w.bytes(b"alpha\0zeta\0");
    w.finish()
}

fn skeleton() -> Vec<u8> {
    let mut w = Writer::new();
    w.f32s(&[0.0, 0.0, 0.0, 1.0]).f32s(&[0.0, 0.0, 0.0, 1.0]);
    w.u32(2).pad_to(48);
    w.u64(160).u64(0).u64(168).u64(208).u64(0).u64(0xDEAD);
    w.pad_to(128);
    w.i32(0).i32(-1).i32(0).i32(2);
    w.i32(0).i32(1).i32(2).i32(1);
    w.u32(3).pad_to(168);
    w.bytes(&string_table(&["root", "spine", "head"]));
    w.pad_to(224);

    // Orientation block; its pointers count from 16 bytes in.
    let base = w.len();
    w.zeros(16).u32(160).u32(16).u32(3).u8(1).pad_to(base + 32);
    w.u32(2).pad_to(base + 48);
    w.u64(48).pad_to(base + 64);
    w.u64(64).u64(112).pad_to(base + 80);
    for o in offsets() {
        w.f32s(&[o.x, o.y, o.z, 0.0]);
    }
    for r in rotations() {
        w.f32s(&r.to_array());
    }
    w.finish()
}

fn clip() -> Vec<u8> {
    let mut w = Writer::new();
    w.u32_be(CLIP_CRC).u32(1).pad_to(16);
    w.u32(144).u32(16).f32(1.0).f32(30.0).u32(3).u32(0);
    w.u64(184).u64(192).u64(0).u64(0).u64(0).u64(0);
    w.zeros(24).pad_to(120);
    w.u32(0).u32(0).u32(0).pad_to(136);
    w.u64(0).u64(0).u64(0);
    w.u64(208).u64(0).u64(0);
    w.u16(3).u16(0).u16(1).u16(2);
    w.u16(3).u16(0).u16(1).u16(2);
    w.pad_to(208);

    // Static segment.
    let (tf, rf) = (translation_factors(), rotation_factors());
    w.u32(3).u32(3).u32(0);
    factors(&mut w, &tf);
    factors(&mut w, &rf);
    w.pad_to(208 + 72);
    w.u64(96).u64(114).u64(0);
    for t in clip_translations() {
        for q in pack_translation(t, &tf) {
            w.u16(q);
        }
    }
    for r in clip_rotations() {
        for q in pack_rotation(r, &rf) {
            w.u16(q);
        }
    }
    w.pad_to(208 + 144);
    w.finish()
}

fn mrn() -> Vec<u8> {
    let mut w = Writer::new();
    packet(&mut w, 0x0E, &file_names());
    packet(&mut w, 0x0F, &skeleton_names());
    packet(&mut w, 0x01, &skeleton());
    packet(&mut w, 0x10, &clip());
    w.finish()
}

#[test]
fn test_packet_walk() {
    let buf = mrn();
    let mrn = Mrn::parse(ByteView::new(&buf)).unwrap();
    let types: Vec<PacketType> = mrn.packets().iter().map(|p| p.packet_type()).collect();
    assert_eq!(
        types,
        vec![PacketType::FileNames, PacketType::SkeletonNames, PacketType::Skeleton, PacketType::NsaData]
    );
    for packet in mrn.packets() {
        assert_eq!(packet.view().base() % 16, 0);
        assert_eq!(packet.header().size(), 48);
    }
    assert_eq!(mrn.skeleton_indices(), vec![2]);
    assert_eq!(mrn.skeleton_names().unwrap().strings(), &["alpha", "zeta"]);

    let files = mrn.file_names().unwrap();
    assert_eq!(files.filenames().strings(), &["run.nsa"]);
    assert_eq!(files.source_filenames().get(0), Some("run.fbx"));
    assert_eq!(files.crc32_hashes(), &[CLIP_CRC]);
    assert_eq!(files.size(), file_names().len());
}

#[test]
fn test_skeleton_hierarchy() {
    let buf = mrn();
    let mrn = Mrn::parse(ByteView::new(&buf)).unwrap();
    let data = mrn.skeletons().next().unwrap();
    assert_eq!(data.bone_count(), 3);
    assert_eq!(data.end_data_ptr(), 0xDEAD);
    assert_eq!(data.orientations().element_count(), 3);
    assert!(data.orientations().full());

    let skeleton = Skeleton::build(data).unwrap();
    assert_eq!(skeleton.len(), 3);
    assert_eq!(skeleton.roots().count(), 1);
    assert_eq!(skeleton.order(), &[0, 1, 2]);
    let head = skeleton.find("head").unwrap();
    assert_eq!(head.parent, Some(1));
    assert_eq!(skeleton.bone(1).unwrap().children.as_slice(), &[2]);

    let bones = skeleton.bones();
    let chain = bones[0].local_transform() * bones[1].local_transform() * bones[2].local_transform();
    assert!(head.global_transform.abs_diff_eq(chain, 1e-6));
    // Spine turns +Y into -X, so the head sits one unit up and half a unit left.
    let tip = head.global_transform.transform_point3(Vec3::ZERO);
    assert!(tip.abs_diff_eq(Vec3::new(-0.5, 1.0, 0.0), 1e-6));
}

#[test]
fn test_static_clip() {
    let buf = mrn();
    let mrn = Mrn::parse(ByteView::new(&buf)).unwrap();
    let clip = mrn.animation("Run").unwrap();
    assert!(mrn.animation("run.nsa").is_some());
    assert!(mrn.animation("walk.nsa").is_none());
    assert_eq!(clip.crc32(), CLIP_CRC);
    assert_eq!(clip.sample_rate(), 30.0);
    assert!(clip.dynamic_segment().is_none());
    assert!(clip.root_segment().is_none());
    assert_eq!(clip.static_segment().unwrap().size(), 144);

    let decoded = clip.dequantize().unwrap();
    assert_eq!(decoded.static_translation.len(), 3);
    assert_eq!(decoded.static_rotation.len(), 3);
    for (got, want) in decoded.static_translation.iter().zip(clip_translations()) {
        assert!(got.abs_diff_eq(want, 1e-3), "{:?} vs {:?}", got, want);
    }
    for (got, want) in decoded.static_rotation.iter().zip(clip_rotations()) {
        assert!(got.abs_diff_eq(want, 1e-3), "{:?} vs {:?}", got, want);
    }
    assert!(decoded.dynamic_translation.is_empty());
}

#[test]
fn test_pose_globals() {
    let buf = mrn();
    let mrn = Mrn::parse(ByteView::new(&buf)).unwrap();
    let skeleton = Skeleton::build(mrn.skeletons().next().unwrap()).unwrap();
    let clip = mrn.animation("Run").unwrap();

    let pose = clip.pose(&skeleton, 0).unwrap();
    assert_eq!(pose.len(), 3);
    assert_eq!(clip.pose(&skeleton, 1000).unwrap(), pose);

    let globals = skeleton.global_transforms(&pose).unwrap();
    let chain: Mat4 = pose.iter().map(|t| t.to_mat4()).fold(Mat4::IDENTITY, |acc, m| acc * m);
    assert!(globals[2].abs_diff_eq(chain, 1e-5));
    assert!(globals[0].transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-3));
    assert!(skeleton.global_transforms(&pose[..2]).is_err());
}
