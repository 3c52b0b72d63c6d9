use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use clap::{Args, Parser, Subcommand};
use pld_core::{
    create_animation, Action, ActionLibrary, Animation, AnimationStatus, AppConfig, AsciiSurface,
    BodyProfile, DisplayConfig, PointPainter,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const ANALYSIS_FRAMES: usize = 128;

fn main() -> pld_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { target, frames } => run_play(&target, frames),
        Commands::Preview {
            target,
            frames,
            columns,
            rows,
        } => run_preview(&target, frames, columns, rows),
        Commands::Analyse { target, frames } => run_analyse(&target, frames),
        Commands::List => run_list(),
    }
}

fn run_play(target: &Target, frames: Option<usize>) -> pld_core::Result<()> {
    let (mut animation, _) = target.load()?;
    let count = frames.unwrap_or_else(|| default_frames(&animation));
    tracing::info!(action = %animation.action(), frames = count, "playing animation");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let header = json!({
        "action": animation.action(),
        "profile": animation.profile(),
        "fps": animation.options().fps,
        "timing": animation.spec().timing,
        "joints": animation.joint_names(),
    });
    writeln!(out, "{header}")?;

    animation.start();
    for index in 0..count {
        if index > 0 {
            animation.step();
        }
        let frame = json!({
            "frame": index,
            "time": animation.elapsed(),
            "phase": animation.phase(),
            "status": animation.status(),
            "travel": animation.travel(),
            "positions": animation.current_positions(),
        });
        writeln!(out, "{frame}")?;
        if animation.status() == AnimationStatus::Completed {
            tracing::debug!(frame = index, "stopping at completion");
            break;
        }
    }

    out.flush()?;
    Ok(())
}

fn run_preview(
    target: &Target,
    frames: Option<usize>,
    columns: usize,
    rows: usize,
) -> pld_core::Result<()> {
    let (mut animation, config) = target.load()?;
    let count = frames.unwrap_or_else(|| default_frames(&animation));
    tracing::info!(action = %animation.action(), columns, rows, "previewing animation");

    let display = DisplayConfig {
        width: columns as u32,
        height: rows as u32,
        // Fit a standing figure into the grid with a little headroom.
        scale: rows as f32 / (animation.spec().skeleton.dimensions().height() * 1.2),
        ..config.display
    };
    let painter = PointPainter::from_config(&display);
    let mut surface = AsciiSurface::new(columns, rows);
    let delay = Duration::from_secs_f32(animation.frame_interval());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    animation.start();
    for index in 0..count {
        if index > 0 {
            animation.step();
        }
        painter.paint(&animation.current_pose(), &mut surface);
        write!(
            out,
            "\x1b[2J\x1b[H{} {:.2} {:?}\n{}",
            animation.action(),
            animation.phase(),
            animation.status(),
            surface.render()
        )?;
        out.flush()?;
        if animation.status() == AnimationStatus::Completed {
            break;
        }
        thread::sleep(delay);
    }
    Ok(())
}

fn run_analyse(target: &Target, frames: Option<usize>) -> pld_core::Result<()> {
    let (animation, _) = target.load()?;
    let frames = frames.unwrap_or(ANALYSIS_FRAMES);
    tracing::info!(action = %animation.action(), frames, "analysing motion");

    let report = pld_core::analyse(animation.spec(), frames)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_list() -> pld_core::Result<()> {
    let library = ActionLibrary::new();
    for action in Action::ALL {
        let spec = library.spec(action)?;
        println!(
            "{:<16} {:<13} {:<9} {:.2}s",
            action.name(),
            format!("{:?}", spec.kind()).to_lowercase(),
            format!("{:?}", action.view()).to_lowercase(),
            spec.timing
        );
    }
    Ok(())
}

/// One complete cycle (or the whole duration) plus the closing frame.
fn default_frames(animation: &Animation) -> usize {
    (animation.spec().timing / animation.frame_interval()).ceil() as usize + 1
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Point-light display stimulus generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print joint positions for each frame as JSON lines.
    Play {
        #[command(flatten)]
        target: Target,
        /// Number of frames to emit; defaults to one cycle.
        #[arg(short = 'n', long)]
        frames: Option<usize>,
    },
    /// Draw the figure in the terminal in real time.
    Preview {
        #[command(flatten)]
        target: Target,
        #[arg(short = 'n', long)]
        frames: Option<usize>,
        #[arg(long, default_value_t = 60)]
        columns: usize,
        #[arg(long, default_value_t = 30)]
        rows: usize,
    },
    /// Report rigidity, loop seams and torso tempo for an action.
    Analyse {
        #[command(flatten)]
        target: Target,
        /// Samples taken across one cycle or duration.
        #[arg(short = 'n', long)]
        frames: Option<usize>,
    },
    /// List the built-in actions.
    List,
}

/// Action, profile and playback options shared by every command.
#[derive(Args, Debug)]
struct Target {
    /// Action name, e.g. `walking` or `sitting-down`.
    action: String,
    #[arg(long, default_value = "man")]
    gender: String,
    #[arg(long, default_value = "light")]
    weight: String,
    #[arg(long, default_value = "happy")]
    emotion: String,
    /// Optional JSON preset with animation and display settings.
    #[arg(short, long)]
    preset: Option<PathBuf>,
    #[arg(long)]
    fps: Option<f32>,
    /// Overrides the cycle length or duration, in seconds.
    #[arg(long)]
    duration: Option<f32>,
    /// Restart transitional actions instead of holding the last frame.
    #[arg(long = "loop")]
    looping: bool,
}

impl Target {
    fn load(&self) -> pld_core::Result<(Animation, AppConfig)> {
        let mut config = match &self.preset {
            Some(path) => {
                tracing::info!(?path, "loading preset");
                AppConfig::load(path)?
            }
            None => AppConfig::default(),
        };
        if let Some(fps) = self.fps {
            config.animation.fps = fps;
        }
        if let Some(seconds) = self.duration {
            config.animation.duration_override = Some(seconds);
        }
        config.animation.looping |= self.looping;

        let profile = BodyProfile::parse(&self.gender, &self.weight, &self.emotion)?;
        let animation = create_animation(&self.action, profile, config.animation.clone())?;
        Ok((animation, config))
    }
}
