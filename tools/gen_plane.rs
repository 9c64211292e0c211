//! gen_plane.rs - write the built-in level plane as a `.w` walk-mesh bundle.
//!
//! USAGE:
//! ```bash
//! cargo run --bin gen_plane -- --out plane.w
//! ```

use std::path::PathBuf;

use clap::Parser;

use walkplane::assets::{BOARD_HALF_EXTENT, LEVEL_MESH_NAME, WalkMeshes, quad_plane};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Bundle to create (overwritten if present)
    #[arg(long, value_name = "FILE", default_value = "plane.w")]
    out: PathBuf,

    /// Half the side of the square plane
    #[arg(long, default_value_t = BOARD_HALF_EXTENT)]
    half_extent: f32,

    /// Name stored in the bundle index
    #[arg(long, default_value = LEVEL_MESH_NAME)]
    name: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let plane = quad_plane(opts.half_extent)?;
    WalkMeshes::write_file(&opts.out, &[(opts.name.as_str(), &plane)])?;

    // read it back so a broken file never goes unnoticed
    let check = WalkMeshes::from_file(&opts.out)?;
    let mesh = check.lookup(&opts.name)?;
    log::info!(
        "wrote '{}' ({} vertices, {} triangles) to {}",
        opts.name,
        mesh.vertices().len(),
        mesh.triangles().len(),
        opts.out.display()
    );
    Ok(())
}
