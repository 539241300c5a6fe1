//! Strata demo: a ring of tumbling cubes recorded in parallel by worker threads
//!
//! WASD moves the camera, the mouse looks around, Escape quits.

mod fps_camera;
mod window_input;

use std::path::PathBuf;
use std::process::ExitCode;
use strata_engine::strata::{EngineConfig, FrameOrchestrator, Result};
use strata_engine::strata::scene::MeshData;
use strata_engine::{engine_error, engine_info};
use strata_engine_renderer_vulkan::create_render_backend;

use window_input::WindowInput;

const SOURCE: &str = "strata::demo";

fn demo_config() -> EngineConfig {
    EngineConfig {
        app_name: "Strata Demo".to_string(),
        window_width: 1280,
        window_height: 720,
        objects_per_worker: 4,
        shader_directory: PathBuf::from(env!("STRATA_SHADER_DIR")),
        ..EngineConfig::default()
    }
}

fn run() -> Result<u64> {
    let mut config = demo_config();
    config.validate()?;

    let mut input = WindowInput::new(&config)?;

    // The surface may not match the requested size (HiDPI scaling)
    let (width, height) = input.size();
    if width > 0 && height > 0 {
        config.window_width = width;
        config.window_height = height;
    }

    engine_info!(
        SOURCE,
        "Starting with {} workers x {} objects",
        config.worker_count,
        config.objects_per_worker
    );

    let backend = create_render_backend(input.window(), &config, &MeshData::cube())?;
    let mut orchestrator = FrameOrchestrator::new(config);
    orchestrator.initialize(backend)?;
    orchestrator.run(&mut input)
}

fn main() -> ExitCode {
    let result = run();

    #[cfg(feature = "vulkan-validation")]
    strata_engine_renderer_vulkan::print_validation_stats_report();

    match result {
        Ok(frames) => {
            engine_info!(SOURCE, "Rendered {} frames", frames);
            ExitCode::SUCCESS
        }
        Err(e) => {
            engine_error!(SOURCE, "Fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
