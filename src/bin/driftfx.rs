use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "driftfx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one image through the effect chain and write a single stage as PNG.
    Stage(StageArgs),
    /// Drive the engine headless: feed images on a schedule and write captures.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct StageArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Stage to write.
    #[arg(long, value_enum, default_value_t = StageChoice::Composite)]
    stage: StageChoice,

    /// Engine config JSON; its canvas and pass parameters are used. Without it the canvas
    /// matches the input image.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Effect intensity in [0, 1].
    #[arg(long, default_value_t = 1.0)]
    ratio: f32,

    /// Clock value in seconds for the time-dependent passes.
    #[arg(long, default_value_t = 0.0)]
    time: f32,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input images, applied in order.
    #[arg(long = "in", required = true)]
    inputs: Vec<PathBuf>,

    /// Frames to drive.
    #[arg(long, default_value_t = 240)]
    frames: u64,

    /// Frame rate of the simulated clock.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Seconds between inputs.
    #[arg(long, default_value_t = 2.0)]
    every: f64,

    /// Directory for captures and the final frame.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StageChoice {
    Original,
    Mask,
    MaskBlur,
    Edge,
    Shift,
    Saturation,
    SaturationBlur,
    Composite,
}

impl From<StageChoice> for driftfx::OutputStage {
    fn from(v: StageChoice) -> Self {
        match v {
            StageChoice::Original => Self::Original,
            StageChoice::Mask => Self::Mask,
            StageChoice::MaskBlur => Self::MaskBlur,
            StageChoice::Edge => Self::Edge,
            StageChoice::Shift => Self::Shift,
            StageChoice::Saturation => Self::Saturation,
            StageChoice::SaturationBlur => Self::SaturationBlur,
            StageChoice::Composite => Self::Composite,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Stage(args) => cmd_stage(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn read_config(path: Option<&PathBuf>) -> anyhow::Result<Option<driftfx::EngineConfig>> {
    path.map(|p| {
        driftfx::EngineConfig::from_json_file(p)
            .with_context(|| format!("load config '{}'", p.display()))
    })
    .transpose()
}

fn cmd_stage(args: StageArgs) -> anyhow::Result<()> {
    let src = driftfx::load_image(&args.in_path)?;
    let mut pipeline_cfg = match read_config(args.config.as_ref())? {
        Some(cfg) => cfg.pipeline,
        None => driftfx::PipelineConfig {
            canvas: driftfx::Canvas::new(src.width, src.height)?,
            ..driftfx::PipelineConfig::default()
        },
    };
    pipeline_cfg.output_stage = args.stage.into();

    let blur = Arc::new(driftfx::BlurProgram::new());
    let mut pipeline = driftfx::EffectPipeline::new(&pipeline_cfg, Some(blur))?;
    pipeline.update(src.view(), args.ratio, args.time);
    let out = pipeline
        .output()
        .context("pipeline produced no output")?;
    driftfx::save_png(&args.out, out)?;

    let stats = pipeline.stats();
    if stats.stage_failures > 0 {
        eprintln!("warning: {} stage(s) failed", stats.stage_failures);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be a positive number"
    );
    anyhow::ensure!(
        args.every.is_finite() && args.every > 0.0,
        "--every must be a positive number of seconds"
    );

    let mut cfg = read_config(args.config.as_ref())?.unwrap_or_default();
    cfg.capture.output_folder = args.out.clone();
    let mut engine = driftfx::Engine::new(cfg)?;
    engine.set_reporter(Some(Box::new(driftfx::LogReporter)));

    let dt = 1.0 / args.fps;
    let every_frames = ((args.every * args.fps).round() as u64).max(1);
    let mut inputs = args.inputs.iter();
    let mut captures = 0usize;

    for frame in 0..args.frames {
        if frame % every_frames == 0
            && let Some(path) = inputs.next()
        {
            // Decoded inline so the schedule is frame-exact.
            let img = driftfx::load_image(path)?;
            engine.start_transition(Arc::new(img))?;
        }
        for event in engine.frame(dt) {
            match event {
                driftfx::EngineEvent::Captured { path } => {
                    captures += 1;
                    eprintln!("captured {}", path.display());
                }
                driftfx::EngineEvent::Error { stage, error } => {
                    eprintln!("warning: {stage}: {error}");
                }
                driftfx::EngineEvent::TransitionStarted { .. }
                | driftfx::EngineEvent::TransitionCompleted(_) => {}
            }
        }
    }

    let final_path = args.out.join("final.png");
    driftfx::save_png(&final_path, engine.output())?;
    eprintln!(
        "ran {} frames, {} transition(s), {captures} capture(s); wrote {}",
        args.frames,
        engine.manager().completed(),
        final_path.display()
    );
    Ok(())
}
