//! strideview demo viewer
//!
//! Feeds a whole-body trajectory (synthetic gait or a JSON file) through
//! the visualization pipeline and renders the result with Rerun when the
//! `visualization` feature is enabled.

mod gait;

use std::path::{Path, PathBuf};

use clap::Parser;
use nalgebra::Vector3;
use strideview_core::{
    Appearance, PrimitiveBuffer, RenderStyle, Rgba, StaticFrameProvider, TrajectoryStep,
    WholeBodyPipeline, WholeBodyTrajectory,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gait::GaitParams;

#[derive(Parser, Debug)]
#[command(name = "strideview-viewer")]
#[command(about = "Render a whole-body motion plan as 3D primitives", long_about = None)]
struct Args {
    /// JSON trajectory file; omit to generate a synthetic gait
    #[arg(long)]
    input: Option<PathBuf>,

    /// Number of synthetic gait steps
    #[arg(short, long, default_value = "120")]
    steps: usize,

    /// Seed for the synthetic gait jitter
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Position jitter amplitude in meters
    #[arg(long, default_value = "0.0")]
    noise: f64,

    /// Base trajectory style (lines, billboards, points)
    #[arg(long, default_value = "points", value_parser = parse_style)]
    base_style: RenderStyle,

    /// Contact trajectory style (lines, billboards, points)
    #[arg(long, default_value = "lines", value_parser = parse_style)]
    contact_style: RenderStyle,

    /// Line width / point radius in meters
    #[arg(long, default_value = "0.01")]
    line_width: f64,

    /// Scale of the base orientation-frame annotations
    #[arg(long, default_value = "1.0")]
    axes_scale: f64,

    /// Save the Rerun recording to a file instead of spawning the viewer
    #[arg(long)]
    save: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_style(s: &str) -> Result<RenderStyle, String> {
    match s {
        "lines" | "polyline" => Ok(RenderStyle::Polyline),
        "billboards" | "ribbon" => Ok(RenderStyle::Ribbon),
        "points" => Ok(RenderStyle::PointSamples),
        other => Err(format!(
            "unknown style '{}', expected lines, billboards or points",
            other
        )),
    }
}

fn load_trajectory(path: &Path) -> Result<WholeBodyTrajectory, Box<dyn std::error::Error>> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

/// Ad-hoc primitives for one step: support lines from the base to each
/// active contact, a CoM sphere and a time label.
fn draw_step_markers(buffer: &mut PrimitiveBuffer, step: &TrajectoryStep, stamp: f64, frame: &str) {
    let pose = step.base_pose();

    buffer.draw_sphere(pose.position, 0.03, Rgba::new(1.0, 0.8, 0.0, 1.0), frame);
    for contact in &step.contacts {
        let foot = pose.position + pose.orientation * contact.position;
        buffer.draw_line(
            pose.position,
            foot,
            0.005,
            Rgba::new(0.6, 0.6, 0.6, 0.6),
            frame,
        );
        buffer.draw_point(foot, 0.015, Rgba::new(0.0, 1.0, 0.5, 1.0), frame);
    }
    buffer.draw_text(
        format!("t={:.2}", stamp),
        pose.position + Vector3::new(0.0, 0.0, 0.3),
        0.05,
        Rgba::new(1.0, 1.0, 1.0, 1.0),
        frame,
    );
}

#[cfg(feature = "visualization")]
fn render(
    args: &Args,
    pipeline: &WholeBodyPipeline<StaticFrameProvider>,
    trajectory: &WholeBodyTrajectory,
) {
    use strideview_core::scene::RerunScene;
    use tracing::warn;

    let scene = match &args.save {
        Some(path) => RerunScene::new_to_file("strideview", path),
        None => RerunScene::new("strideview"),
    };
    let mut scene = match scene {
        Ok(scene) => scene,
        Err(err) => {
            warn!("failed to initialize Rerun: {}", err);
            return;
        }
    };

    if let Some(build) = pipeline.base_build() {
        if let Err(err) = scene.log_base(build) {
            warn!("failed to log base trajectory: {}", err);
        }
    }
    if let Err(err) = scene.log_contacts(pipeline.contact_builds()) {
        warn!("failed to log contact trajectories: {}", err);
    }

    let mut buffer = PrimitiveBuffer::new("viewer");
    for (i, step) in trajectory.steps.iter().enumerate() {
        let stamp = trajectory.stamp + i as f64 * 0.05;
        scene.set_frame(i as u64);
        draw_step_markers(&mut buffer, step, stamp, &trajectory.frame_id);
        buffer.flush(stamp, &mut scene);
    }

    match &args.save {
        Some(path) => info!("recording saved to {}", path),
        None => info!("scene logged - open the Rerun viewer to inspect it"),
    }
}

#[cfg(not(feature = "visualization"))]
fn render(
    _args: &Args,
    _pipeline: &WholeBodyPipeline<StaticFrameProvider>,
    trajectory: &WholeBodyTrajectory,
) {
    use strideview_core::draw::CollectingSink;

    let mut sink = CollectingSink::default();
    let mut buffer = PrimitiveBuffer::new("viewer");
    let mut published = 0;
    for (i, step) in trajectory.steps.iter().enumerate() {
        let stamp = trajectory.stamp + i as f64 * 0.05;
        draw_step_markers(&mut buffer, step, stamp, &trajectory.frame_id);
        published += buffer.flush(stamp, &mut sink);
    }
    info!(
        "{} markers over {} cycles (compile with --features visualization to see them)",
        published,
        sink.batches.len()
    );
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let trajectory = match &args.input {
        Some(path) => load_trajectory(path).unwrap_or_else(|err| {
            eprintln!("Error: cannot load {}: {}", path.display(), err);
            std::process::exit(1);
        }),
        None => gait::generate(&GaitParams {
            steps: args.steps,
            seed: args.seed,
            noise: args.noise,
            ..Default::default()
        }),
    };
    info!(
        "trajectory: {} steps in frame '{}'",
        trajectory.steps.len(),
        trajectory.frame_id
    );

    let mut provider = StaticFrameProvider::new();
    provider.insert(trajectory.frame_id.clone(), Default::default());

    let base_appearance = Appearance {
        style: args.base_style,
        line_width: args.line_width,
        axes_scale: args.axes_scale,
        ..Default::default()
    };
    let contact_appearance = Appearance {
        style: args.contact_style,
        line_width: args.line_width,
        color: Rgba::new(0.9, 0.3, 0.1, 1.0),
        ..Default::default()
    };

    let mut pipeline =
        WholeBodyPipeline::with_appearance(provider, base_appearance, contact_appearance);
    pipeline.process(trajectory.clone());

    if let Some(build) = pipeline.base_build() {
        info!(
            "base: {} samples, {} axis annotations",
            build.geometry.len(),
            build.annotations.len()
        );
    }
    for contact in pipeline.contact_builds() {
        info!(
            "contact '{}': {} samples",
            contact.slot.name,
            contact.geometry.len()
        );
    }

    render(&args, &pipeline, &trajectory);
}
