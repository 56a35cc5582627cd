use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use fps_overlay_core::overlay::config::OverlayConfig;
use fps_overlay_core::overlay::fps_overlay_reader::FpsOverlayReader;
use fps_overlay_core::overlay::infrastructure::svg_text_renderer::SvgTextRenderer;
use fps_overlay_core::shared::read_context::ReadContext;
use fps_overlay_core::sink::domain::image_writer::ImageWriter;
use fps_overlay_core::sink::infrastructure::image_file_writer::ImageFileWriter;
use fps_overlay_core::source::domain::dependencies::Dependencies;
use fps_overlay_core::source::domain::frame_source::FrameSource;
use fps_overlay_core::source::infrastructure::image_file_source::ImageFileSource;
use fps_overlay_core::source::infrastructure::test_pattern_source::TestPattern;

/// Streams frames through the FPS overlay and writes them as PNG files.
#[derive(Parser)]
#[command(name = "fps-overlay")]
struct Cli {
    /// Still image to serve as the camera. Omit to use a synthetic test pattern.
    input: Option<PathBuf>,

    /// Directory the overlaid frames are written to.
    #[arg(long, short)]
    output_dir: PathBuf,

    /// Number of frames to read.
    #[arg(long, default_value = "30")]
    frames: usize,

    /// Frame rate of the synthetic test pattern.
    #[arg(long, default_value = "30.0")]
    source_fps: f64,

    /// Test pattern width in pixels.
    #[arg(long, default_value = "640")]
    width: u32,

    /// Test pattern height in pixels.
    #[arg(long, default_value = "480")]
    height: u32,

    /// Name the camera is registered under.
    #[arg(long, default_value = "camera")]
    camera_name: String,

    /// JSON overlay config (e.g. {"camera_name": "camera"}); overrides --camera-name.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-frame read timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = load_config(&cli)?;

    let mut deps = Dependencies::new();
    deps.insert_frame_source(config.camera_name.clone(), open_source(&cli)?);

    let background = ReadContext::background();
    let reader = FpsOverlayReader::from_config(
        &background,
        &config,
        &mut deps,
        Box::new(SvgTextRenderer::new()),
    )?;
    let writer: Box<dyn ImageWriter> = Box::new(ImageFileWriter::new());

    let result = stream_frames(&cli, &reader, writer.as_ref());
    eprintln!();
    let close_result = reader.close(&background);
    result?;
    close_result?;

    let stats = reader.stats();
    match stats.fps {
        Some(fps) => log::info!(
            "Read {} frames, average latency {:.1}ms ({fps:.2} fps)",
            stats.sample_count,
            stats.average_secs * 1000.0
        ),
        None => log::info!("Read {} frames", stats.sample_count),
    }
    log::info!("Frames written to {}", cli.output_dir.display());
    Ok(())
}

fn stream_frames(
    cli: &Cli,
    reader: &FpsOverlayReader,
    writer: &dyn ImageWriter,
) -> Result<(), Box<dyn std::error::Error>> {
    for i in 0..cli.frames {
        let ctx = match cli.timeout_ms {
            Some(ms) => ReadContext::background().with_timeout(Duration::from_millis(ms)),
            None => ReadContext::background(),
        };
        let (frame, release) = reader.read_frame(&ctx)?.into_parts();
        let written = writer.write(&frame_path(&cli.output_dir, i), &frame);
        release();
        written?;
        eprint!("\rWrote frame {}/{}", i + 1, cli.frames);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<OverlayConfig, Box<dyn std::error::Error>> {
    match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
            Ok(OverlayConfig::from_json(&json)?)
        }
        None => Ok(OverlayConfig::new(cli.camera_name.clone())),
    }
}

fn open_source(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    match &cli.input {
        Some(path) => {
            log::info!("Serving {} as the camera", path.display());
            Ok(Box::new(ImageFileSource::open(path)?))
        }
        None => {
            let pattern = TestPattern::new(cli.width, cli.height, cli.source_fps)?;
            log::info!(
                "Streaming {}x{} test pattern at {} fps",
                pattern.width,
                pattern.height,
                pattern.fps
            );
            Ok(Box::new(pattern.spawn()))
        }
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if cli.frames == 0 {
        return Err("--frames must be at least 1".into());
    }
    if cli.timeout_ms == Some(0) {
        return Err("--timeout-ms must be positive".into());
    }
    Ok(())
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:05}.png"))
}
