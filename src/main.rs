use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pose_engine::{
    decode::{heatmap, landmarks},
    input::{HeatmapReader, LandmarkReader, Recorded},
    Engine, FrameRate, FrameSize, Joint, Skeleton, Topology,
};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;

#[derive(structopt::StructOpt)]
enum Source {
    /// Replay normalized landmarks, one frame per line
    Landmarks {
        #[structopt(flatten)]
        normalizer: landmarks::Normalizer,

        /// Landmark recording.
        path: PathBuf,
    },
    /// Replay raw little-endian f32 heatmap tensors
    Heatmap {
        #[structopt(flatten)]
        decoder: heatmap::Decoder,

        /// Number of channels of each recorded tensor.
        #[structopt(long, default_value = "19")]
        channels: usize,

        /// Height of each recorded heatmap.
        #[structopt(long, default_value = "46")]
        heatmap_height: usize,

        /// Width of each recorded heatmap.
        #[structopt(long, default_value = "46")]
        heatmap_width: usize,

        /// Heatmap recording.
        path: PathBuf,
    },
}

#[derive(structopt::StructOpt)]
struct Opt {
    /// The width of the frames the detections were produced from.
    #[structopt(short, long)]
    width: u32,

    /// The height of the frames the detections were produced from.
    #[structopt(short = "H", long)]
    height: u32,

    /// Keypoint ids of a joint angle to report: first, vertex, last.
    #[structopt(short, long, number_of_values = 3)]
    angle: Option<Vec<usize>>,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,

    #[structopt(subcommand)]
    source: Source,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).with_context(|| {
        format!("failed to open recording {}", path.display())
    })?))
}

fn report(
    frame: usize,
    skeleton: &Skeleton,
    topology: &Topology,
    joint: Option<Joint>,
) -> Result<(), pose_engine::Error> {
    info!(
        message = "frame",
        frame = frame,
        keypoints = skeleton.keypoints().present().count(),
        bones = skeleton.bones().len()
    );

    for bone in skeleton.bones() {
        debug!(
            message = "bone",
            from = topology.name(bone.from.id).unwrap_or("?"),
            to = topology.name(bone.to.id).unwrap_or("?"),
            from_x = bone.from.x,
            from_y = bone.from.y,
            to_x = bone.to.x,
            to_y = bone.to.y
        );
    }

    if let Some(joint) = joint {
        match skeleton.angle(joint) {
            Ok(angle) => info!(message = "joint angle", frame = frame, degrees = angle),
            Err(e) if e.is_recoverable() => {
                debug!(message = "skipping joint angle", frame = frame, error = %e)
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    let size = FrameSize::new(opt.width, opt.height);
    let joint = match opt.angle.as_deref() {
        None => None,
        Some(&[first, vertex, last]) => Some(Joint::new(first, vertex, last)),
        Some(ids) => bail!("expected three keypoint ids for --angle, got {}", ids.len()),
    };

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrl_c = running.clone();

    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    type Frames = Box<dyn Iterator<Item = Result<Recorded, pose_engine::Error>>>;
    let (mut engine, frames): (Engine, Frames) = match opt.source {
        Source::Landmarks { normalizer, path } => (
            Engine::new(normalizer, heatmap::Decoder::default())
                .context("failed constructing engine")?,
            Box::new(LandmarkReader::new(open(&path)?).map(|frame| frame.map(Recorded::Landmarks))),
        ),
        Source::Heatmap {
            decoder,
            channels,
            heatmap_height,
            heatmap_width,
            path,
        } => {
            let model_input = decoder.model_input();
            info!(
                message = "replaying heatmaps",
                model_width = model_input.width,
                model_height = model_input.height,
                channels = channels,
                heatmap_height = heatmap_height,
                heatmap_width = heatmap_width,
                threshold = decoder.confidence_threshold
            );
            (
                Engine::new(landmarks::Normalizer::default(), decoder)
                    .context("failed constructing engine")?,
                Box::new(
                    HeatmapReader::new(open(&path)?, (channels, heatmap_height, heatmap_width))
                        .map(|frame| frame.map(Recorded::Heatmap)),
                ),
            )
        }
    };

    let progress = if opt.show_progress {
        Some(
            ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                    .template("{prefix:.bold.dim} {spinner} {wide_msg}"),
            ),
        )
    } else {
        None
    };

    let mut frame_rate = FrameRate::default();

    for (frame, recorded) in frames.enumerate() {
        if !running.load(Ordering::SeqCst) {
            info!(message = "interrupted", frame = frame);
            break;
        }

        let recorded = recorded.with_context(|| format!("failed reading frame {}", frame))?;
        let skeleton = engine
            .process(recorded.as_detection(), size)
            .with_context(|| format!("failed decoding frame {}", frame))?;
        let topology = match recorded {
            Recorded::Landmarks(_) => engine.landmark_topology(),
            Recorded::Heatmap(_) => engine.heatmap_topology(),
        };
        report(frame, &skeleton, topology, joint)
            .with_context(|| format!("failed measuring frame {}", frame))?;

        if let Some(progress) = progress.as_ref() {
            let fps = frame_rate.tick().unwrap_or_default();
            progress.set_message(format!(
                "frame {} => bones: {}, FPS: {:.1}",
                frame,
                skeleton.bones().len(),
                fps
            ));
            progress.inc(1);
        }
    }

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    let timing = engine.timing();
    info!(
        message = "done",
        frames = timing.frames,
        decode_ms = timing.decode.as_secs_f64() * 1e3,
        decode_fps = timing.decode_fps()?.unwrap_or_default()
    );

    Ok(())
}
