use std::{fs, path::Path};

use wgsl_to_wgpu::{MatrixVectorTypes, WriteOptions, create_shader_module};

/// Trail shaders embedded with `include_str!`; checked here so WGSL errors
/// surface at build time instead of at pipeline creation
const SHADERS: [&str; 2] = ["src/shaders/trail_base.wgsl", "src/shaders/trail_textured.wgsl"];

fn validate_shader(shader_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", shader_path.display());

    let source = fs::read_to_string(shader_path)?;
    let shader_name = shader_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let options = WriteOptions {
        derive_bytemuck_vertex: true,
        derive_bytemuck_host_shareable: true,
        matrix_vector_types: MatrixVectorTypes::Glam,
        ..Default::default()
    };

    // Parses and validates the module; the generated bindings are not used
    create_shader_module(&source, &shader_name, options)?;
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=src/shaders");

    for shader_path_str in SHADERS {
        let shader_path = Path::new(shader_path_str);
        if let Err(e) = validate_shader(shader_path) {
            println!(
                "cargo:warning=Shader {} failed validation: {}",
                shader_path.display(),
                e
            );
        }
    }
}
