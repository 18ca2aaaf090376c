//! DME models with their embedded and external material tables.

mod common;

use common::Writer;
use warpgate::core::Record;
use warpgate::model::{Dmat, Dme, IndexBuffer, ParameterClass, ParameterType, Semantic};
use warpgate::util::Vec3;
use warpgate::{ByteView, Error};

const DIFFUSE: &str = "Vehicle_Sunderer_Base_C.dds";
const NORMAL: &str = "Vehicle_Sunderer_Base_N.dds";

fn texture_param(w: &mut Writer, semantic: Semantic, name: &str) {
    w.i32(semantic.to_hash()).u32(4).u32(7).u32(4).u32(jenkins::oaat_uppercase(name));
}

fn dmat(names: &[&str]) -> Vec<u8> {
    let block: String = names.iter().map(|n| format!("{}\0", n)).collect();
    let mut params = Writer::new();
    texture_param(&mut params, Semantic::BaseColor1, names[0]);
    texture_param(&mut params, Semantic::NormalMap1, names[1]);
    // Scalar float, not a texture.
    params.i32(0x1234).u32(0).u32(3).u32(4).f32(0.5);
    let params = params.finish();

    let mut w = Writer::new();
    w.bytes(b"DMAT").u32(1).u32(block.len() as u32).bytes(block.as_bytes());
    w.u32(1); // materials
    w.u32(0xAAAA).u32(8 + params.len() as u32).u32(0xDEF).u32(3).bytes(&params);
    w.finish()
}

fn mesh(w: &mut Writer, index_size: u32) {
    let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    w.u32(0).u32(1).u32(2).u32(0);
    w.u32(2).u32(index_size).u32(3).u32(3);
    w.u32(12);
    for p in positions {
        w.f32s(&p);
    }
    w.u32(4).bytes(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    if index_size & 0xFF == 2 {
        w.u16(0).u16(1).u16(2);
    } else {
        w.u32(0).u32(1).u32(2);
    }
}

fn dme(names: &[&str]) -> Vec<u8> {
    let table = dmat(names);
    let mut w = Writer::new();
    w.bytes(b"DMOD").u32(4).u32(table.len() as u32).bytes(&table);
    w.f32s(&[-1.0, -2.0, -3.0, 1.0, 2.0, 3.0]);
    w.u32(2);
    mesh(&mut w, 0x0002);
    mesh(&mut w, 0x0104);
    w.u32(1); // draw calls
    for v in [0u32, 0, 2, 0, 0, 0, 3, 0, 3] {
        w.u32(v);
    }
    w.u32(2); // bone map
    w.u16(5).u16(0).u16(9).u16(1);
    w.u32(2); // bones
    for tx in [0.0f32, 2.0] {
        w.f32s(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, tx, 0.0, 0.0]);
    }
    w.f32s(&[0.0; 12]);
    w.u32(jenkins::oaat_uppercase("ROOT")).u32(jenkins::oaat_uppercase("Spine"));
    w.finish()
}

#[test]
fn test_full_model() {
    let buf = dme(&[DIFFUSE, NORMAL]);
    let model = Dme::parse(ByteView::new(&buf)).unwrap();
    assert_eq!(model.header().version, 4);
    assert_eq!(model.size(), buf.len());
    assert_eq!(model.aabb().max, Vec3::new(1.0, 2.0, 3.0));

    let meshes = model.meshes();
    assert_eq!(meshes.len(), 2);
    assert_eq!(meshes[0].vertex_count(), 3);
    assert_eq!(meshes[0].bytes_per_vertex(1), Some(4));
    assert!(matches!(meshes[0].indices(), IndexBuffer::U16(_)));
    assert!(matches!(meshes[1].indices(), IndexBuffer::U32(_)));
    assert_eq!(meshes[1].indices().to_vec(), vec![0, 1, 2]);
    assert_eq!(meshes[1].view().base(), meshes[0].view().base() + meshes[0].size());

    assert_eq!(model.drawcalls().get(0).unwrap().bone_count, 2);
    assert_eq!(model.map_bone(1), 9);
    assert_eq!(model.map_bone(40), 0);
    assert_eq!(model.bone_count(), 2);
    assert_eq!(model.find_bone("spine"), Some(1));
    let spine = model.bone(1).unwrap();
    assert!(spine.is_named("SPINE"));
    assert_eq!(spine.inverse_bind_matrix.to_mat4().transform_point3(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn test_embedded_material_resolution() {
    let buf = dme(&[DIFFUSE, NORMAL]);
    let model = Dme::parse(ByteView::new(&buf)).unwrap();
    let table = model.dmat();
    assert_eq!(table.texture_for_semantic(0, Semantic::BaseColor1), Some(DIFFUSE));
    assert_eq!(table.texture_for_semantic(0, Semantic::NormalMap1), Some(NORMAL));

    let material = &table.materials()[0];
    assert_eq!(material.definition(), 0xDEF);
    assert_eq!(material.parameters().len(), 3);
    assert_eq!(material.parameters()[2].param_type(), ParameterType::Float);
    assert_eq!(material.parameters()[2].class(), ParameterClass::Scalar);
    assert_eq!(material.parameters()[2].data().f32(0).unwrap(), 0.5);
    assert!(!material.parameters()[2].semantic().is_known());
}

#[test]
fn test_external_material_table() {
    let buf = dme(&[DIFFUSE, NORMAL]);
    let other = dmat(&["alt_C.dds", "alt_N.dds"]);
    let table = Dmat::parse(ByteView::new(&other)).unwrap();
    let model = Dme::with_material_table(ByteView::new(&buf), table).unwrap();
    assert_eq!(model.dmat().texture_for_semantic(0, Semantic::BaseColor1), Some("alt_C.dds"));
    // Geometry is located the same way either way.
    assert_eq!(model.meshes().len(), 2);
    assert_eq!(model.size(), buf.len());
}

#[test]
fn test_rejects_bad_index_width() {
    let mut buf = dme(&[DIFFUSE, NORMAL]);
    // First mesh's index size field.
    let table_len = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
    let mesh_start = 12 + table_len + 24 + 4;
    buf[mesh_start + 20] = 3;
    assert!(matches!(Dme::parse(ByteView::new(&buf)), Err(Error::InvalidStructure(_))));
}
