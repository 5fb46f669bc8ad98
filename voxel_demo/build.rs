// build.rs
// Compiles the GLSL shaders in shaders/ to SPIR-V with glslc

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const STAGES: [&str; 2] = ["vert", "frag"];

fn glslc() -> PathBuf {
    match env::var("VULKAN_SDK") {
        Ok(sdk) if cfg!(target_os = "windows") => Path::new(&sdk).join("Bin").join("glslc.exe"),
        Ok(sdk) => Path::new(&sdk).join("bin").join("glslc"),
        // Fall back to PATH lookup
        Err(_) => PathBuf::from("glslc"),
    }
}

fn main() {
    println!("cargo:rerun-if-changed=shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir).join("shaders"),
        Err(_) => PathBuf::from("shaders"),
    };
    println!("cargo:rustc-env=VOXEL_SHADER_DIR={}", out_dir.display());

    if env::var("SKIP_SHADERS").is_ok() {
        println!("cargo:warning=SKIP_SHADERS set, shader compilation skipped");
        return;
    }
    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        println!("cargo:warning=Failed to create {}: {}", out_dir.display(), e);
        return;
    }

    let entries = match std::fs::read_dir("shaders") {
        Ok(entries) => entries,
        Err(e) => {
            println!("cargo:warning=No shader directory: {}", e);
            return;
        }
    };

    let compiler = glslc();
    for path in entries.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
        let is_shader = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| STAGES.contains(&ext));
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !is_shader {
            continue;
        }

        let output = out_dir.join(format!("{}.spv", file_name));
        match Command::new(&compiler).arg(&path).arg("-o").arg(&output).status() {
            Ok(status) if status.success() => {}
            Ok(status) => panic!("glslc failed for {} ({})", path.display(), status),
            Err(e) => {
                // No compiler installed: the demo reports missing .spv files at startup
                println!("cargo:warning=Could not run {}: {}", compiler.display(), e);
                return;
            }
        }
    }
}
