//! warpgate CLI - inspect and unpack Forgelight assets.

use std::env;
use std::fs;
use std::path::Path;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use warpgate::anim::{Mrn, Skeleton};
use warpgate::core::{extract_asset, is_archive_compressed, AssetBuffer, ChunkContainer, Record};
use warpgate::model::{Dmat, Dme, DMAT_MAGIC, DME_MAGIC};
use warpgate::terrain::{Cnk0, Cnk1, CNK0_MAGIC, CNK1_MAGIC};
use warpgate::zone::{Zone, ZONE_MAGIC};
use warpgate::{ByteView, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_DATE: &str = env!("WARPGATE_BUILD_DATE");
const BUILD_TIME: &str = env!("WARPGATE_BUILD_TIME");

fn init_logging(level: &str) {
    // RUST_LOG wins over the flags when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut level = "warn";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "-V" | "--version" => {
                println!("warpgate-cli {} (built {} {})", VERSION, BUILD_DATE, BUILD_TIME);
                return;
            }
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => match filtered_args.get(1) {
            Some(path) => cmd_info(path),
            None => usage("warpgate-cli info <file>"),
        },
        "decompress" | "d" => match (filtered_args.get(1), filtered_args.get(2)) {
            (Some(input), Some(output)) => cmd_decompress(input, output),
            _ => usage("warpgate-cli decompress <in> <out>"),
        },
        "extract" | "x" => match (filtered_args.get(1), filtered_args.get(2)) {
            (Some(input), Some(output)) => cmd_extract(input, output),
            _ => usage("warpgate-cli extract <in> <out>"),
        },
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(other)
            } else {
                eprintln!("Unknown command: {}", other);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn usage(text: &str) -> Result<()> {
    eprintln!("Error: missing arguments");
    eprintln!("Usage: {}", text);
    std::process::exit(1);
}

fn print_help() {
    println!("warpgate-cli - Forgelight asset inspector");
    println!();
    println!("USAGE:");
    println!("    warpgate-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info       <file>        Detect the format and print a summary");
    println!("    d, decompress <in> <out>    Inflate a chunk container (CNK0/CNK1)");
    println!("    x, extract    <in> <out>    Unwrap an archive-compressed asset");
    println!("    h, help                     Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only report errors");
    println!("    -V, --version    Print version and build time");
    println!();
    println!("NOTES:");
    println!("    - Passing a file directly is equivalent to 'info'");
    println!("    - RUST_LOG overrides the verbosity flags");
}

fn cmd_info(path: &str) -> Result<()> {
    info!(path, "opening asset");
    let buffer = AssetBuffer::open(path)?;
    let unwrapped;
    let bytes: &[u8] = if is_archive_compressed(buffer.as_bytes()) {
        debug!("archive framing detected");
        unwrapped = extract_asset(buffer.as_bytes())?;
        &unwrapped
    } else {
        buffer.as_bytes()
    };

    println!("File: {}", path);
    let view = ByteView::labeled(bytes, "asset");
    match view.magic().ok().as_ref() {
        Some(m) if m == CNK0_MAGIC || m == CNK1_MAGIC => info_chunk(view),
        Some(m) if m == DME_MAGIC => info_dme(view),
        Some(m) if m == DMAT_MAGIC => info_dmat(view),
        Some(m) if m == ZONE_MAGIC => info_zone(view),
        // MRN files have no signature of their own.
        _ => info_mrn(view),
    }
}

fn info_chunk(view: ByteView<'_>) -> Result<()> {
    let container = ChunkContainer::parse(view)?;
    let header = container.header();
    println!("Format:  {} v{} (compressed {} -> {} bytes)",
        header.magic_str(), header.version, container.compressed_size(), container.decompressed_size());

    let data = container.decompress()?;
    let view = ByteView::labeled(&data, "chunk");
    if &header.magic == CNK0_MAGIC {
        let chunk = Cnk0::parse(view)?;
        println!("Tiles:    {}", chunk.tile_count());
        println!("Vertices: {}", chunk.vertices().len());
        println!("Indices:  {}", chunk.indices().len());
        println!("Batches:  {}", chunk.render_batch_count());
        if chunk.trailing_bytes() > 0 {
            println!("Trailing: {} bytes", chunk.trailing_bytes());
        }
    } else {
        let chunk = Cnk1::parse(view)?;
        println!("Textures: {}", chunk.texture_count());
    }
    Ok(())
}

fn info_dme(view: ByteView<'_>) -> Result<()> {
    let dme = Dme::parse(view)?;
    let aabb = dme.aabb();
    println!("Format:    DMOD v{}", dme.header().version);
    println!("Materials: {}", dme.dmat().materials().len());
    println!("Textures:  {}", dme.dmat().texture_names().len());
    println!("Meshes:    {}", dme.meshes().len());
    for (i, mesh) in dme.meshes().iter().enumerate() {
        println!("  [{}] {} vertices, {} indices", i, mesh.vertex_count(), mesh.indices().len());
    }
    println!("Bones:     {}", dme.bone_count());
    println!("Bounds:    {:?} .. {:?}", aabb.min, aabb.max);
    Ok(())
}

fn info_dmat(view: ByteView<'_>) -> Result<()> {
    let dmat = Dmat::parse(view)?;
    println!("Format:    DMAT v{}", dmat.header().version);
    println!("Textures:  {}", dmat.texture_names().len());
    for name in dmat.texture_names() {
        println!("  {}", name);
    }
    println!("Materials: {}", dmat.materials().len());
    Ok(())
}

fn info_zone(view: ByteView<'_>) -> Result<()> {
    let zone = Zone::parse(view)?;
    let instances: usize = zone.objects().iter().map(|o| o.instances().len()).sum();
    println!("Format:  ZONE v{}", zone.version());
    println!("Ecos:    {}", zone.ecos().len());
    println!("Floras:  {}", zone.floras().len());
    println!("Objects: {} ({} instances)", zone.objects().len(), instances);
    println!("Lights:  {}", zone.lights().len());
    if let Some(decals) = zone.decals_count() {
        println!("Decals:  {}", decals);
    }
    Ok(())
}

fn info_mrn(view: ByteView<'_>) -> Result<()> {
    let mrn = Mrn::parse(view)?;
    println!("Format:     MRN ({} bytes)", mrn.size());
    println!("Packets:    {}", mrn.packets().len());
    for (i, packet) in mrn.packets().iter().enumerate() {
        println!("  [{}] {} ({} bytes)", i, packet.packet_type(), packet.size());
    }
    for data in mrn.skeletons() {
        let skeleton = Skeleton::build(data)?;
        let roots: Vec<&str> = skeleton.roots().map(|b| b.name.as_str()).collect();
        println!("Skeleton:   {} bones, roots {:?}", skeleton.len(), roots);
    }
    for nsa in mrn.animations() {
        println!("Animation:  crc {:08x}, {:.2}s @ {} Hz, {} bones",
            nsa.crc32(), nsa.duration(), nsa.sample_rate(), nsa.bone_count());
    }
    Ok(())
}

fn cmd_decompress(input: &str, output: &str) -> Result<()> {
    let buffer = AssetBuffer::open(input)?;
    let container = ChunkContainer::parse(buffer.view("chunk container"))?;
    let data = container.decompress()?;
    fs::write(output, &data)?;
    info!(input, output, bytes = data.len(), "decompressed chunk");
    println!("{} -> {} ({} bytes)", input, output, data.len());
    Ok(())
}

fn cmd_extract(input: &str, output: &str) -> Result<()> {
    let buffer = AssetBuffer::open(input)?;
    let data = extract_asset(buffer.as_bytes())?;
    fs::write(output, &data)?;
    info!(input, output, bytes = data.len(), "extracted asset");
    println!("{} -> {} ({} bytes)", input, output, data.len());
    Ok(())
}
