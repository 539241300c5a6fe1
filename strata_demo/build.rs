// build.rs
// Compiles the GLSL shaders in `shaders/` to SPIR-V with glslc from the Vulkan SDK

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

fn compile_shader(glslc: &str, source: &Path, target_dir: &Path) {
    let Some(stem) = source.file_stem() else {
        return;
    };
    let out_file = target_dir.join(stem).with_extension("spv");

    let status = Command::new(glslc).arg(source).arg("-o").arg(&out_file).status();
    match status {
        Ok(s) if s.success() => {
            eprintln!("info: Compiled {:?} -> {:?}", source, out_file);
        }
        Ok(s) => {
            eprintln!("error: glslc failed for {:?} with exit code: {}", source, s.code().unwrap_or(-1));
            panic!("Shader compilation failed");
        }
        Err(e) => {
            eprintln!("error: Failed to run glslc for {:?}: {}", source, e);
            panic!("Failed to execute shader compiler");
        }
    }
}

fn main() {
    println!("cargo:rerun-if-changed=shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| "target".to_string()));
    let target_dir = out_dir.join("shaders");
    if let Err(e) = std::fs::create_dir_all(&target_dir) {
        eprintln!("warning: Failed to create shader output directory: {}", e);
    }
    // The demo reads its shaders from here at runtime
    println!("cargo:rustc-env=STRATA_SHADER_DIR={}", target_dir.display());

    if env::var("SKIP_SHADERS").is_ok() {
        eprintln!("info: Skipping shader compilation (SKIP_SHADERS set)");
        return;
    }

    let vulkan_sdk = match env::var("VULKAN_SDK") {
        Ok(sdk) => sdk,
        Err(_) => {
            eprintln!("warning: VULKAN_SDK not set, shader compilation skipped");
            eprintln!("hint: Install Vulkan SDK and set VULKAN_SDK environment variable");
            return;
        }
    };

    let glslc = if cfg!(target_os = "windows") {
        format!("{}\\Bin\\glslc.exe", vulkan_sdk)
    } else {
        format!("{}/bin/glslc", vulkan_sdk)
    };
    if !Path::new(&glslc).exists() {
        eprintln!("error: glslc not found at: {}", glslc);
        panic!("Shader compiler not found");
    }

    let Ok(entries) = std::fs::read_dir("shaders") else {
        eprintln!("info: No shader directory found");
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("vert") | Some("frag") => compile_shader(&glslc, &path, &target_dir),
            _ => {}
        }
    }
}
