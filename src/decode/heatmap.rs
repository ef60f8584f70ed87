use crate::{
    error::Error,
    pose::{constants, FrameSize, Keypoint, KeypointFrame},
    topology::Topology,
};
use ndarray::{s, ArrayView2, ArrayView4, Axis};
use num_traits::ToPrimitive;
use ordered_float::NotNan;
use std::cmp::Reverse;
use tracing::{debug, trace};

const DEFAULT_CONFIDENCE_THRESHOLD: &str = "0.2";
const DEFAULT_INPUT_SIZE: &str = "368";

/// Single person decoder for per body part confidence maps.
///
/// Each channel contributes at most one keypoint: its global maximum. Multiple
/// people in the same frame produce a single mixed skeleton.
#[derive(Debug, Clone, Copy, PartialEq, structopt::StructOpt)]
pub struct Decoder {
    /// A heatmap peak must score strictly above this to count as a detection.
    #[structopt(short, long, default_value = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence_threshold: f32,
    /// Side length of the square image the model was run on.
    #[structopt(short, long, default_value = DEFAULT_INPUT_SIZE)]
    pub input_size: u32,
    /// Decode only the leading body part channels of tensors carrying additional
    /// channels, such as part affinity fields.
    #[structopt(long)]
    pub slice_extra_channels: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            confidence_threshold: constants::CONFIDENCE_THRESHOLD,
            input_size: constants::MODEL_INPUT_SIZE,
            slice_extra_channels: false,
        }
    }
}

/// The most confident heatmap cell of a body part.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Peak {
    pub part: usize,
    pub row: usize,
    pub col: usize,
    pub confidence: f32,
}

/// Location and value of the first global maximum in row-major order, ignoring NaN.
fn find_peak(heatmap: ArrayView2<f32>) -> Option<((usize, usize), NotNan<f32>)> {
    heatmap
        .indexed_iter()
        .filter_map(|(index, &value)| NotNan::new(value).ok().map(|value| (index, value)))
        .min_by_key(|&(_, value)| Reverse(value))
}

/// Map a heatmap grid index onto the matching image pixel, truncating.
fn rescale(index: usize, grid: usize, image: u32) -> Result<u32, Error> {
    let index = index.to_u64().ok_or(Error::ConvertToU64)?;
    let grid = grid.to_u64().ok_or(Error::ConvertToU64)?;
    (u64::from(image) * index / grid)
        .to_u32()
        .ok_or(Error::ConvertToU32)
}

impl Decoder {
    /// Square size images must be resized to before they are handed to the model.
    pub fn model_input(&self) -> FrameSize {
        FrameSize::new(self.input_size, self.input_size)
    }

    /// View of the body part channels of a validated tensor.
    fn body_part_channels<'a>(
        &self,
        topology: &Topology,
        heatmaps: ArrayView4<'a, f32>,
    ) -> Result<ArrayView4<'a, f32>, Error> {
        <Self as super::Decoder>::validate(self, topology, &heatmaps)?;
        Ok(heatmaps.slice_move(s![.., ..topology.len(), .., ..]))
    }

    /// The global maximum of every body part channel.
    ///
    /// Channels containing only NaN have no peak.
    pub fn peaks(&self, topology: &Topology, heatmaps: ArrayView4<f32>) -> Result<Vec<Peak>, Error> {
        let heatmaps = self.body_part_channels(topology, heatmaps)?;
        Ok(heatmaps
            .index_axis(Axis(0), 0)
            .axis_iter(Axis(0))
            .enumerate()
            .filter_map(|(part, heatmap)| {
                find_peak(heatmap).map(|((row, col), confidence)| Peak {
                    part,
                    row,
                    col,
                    confidence: confidence.into_inner(),
                })
            })
            .collect())
    }
}

impl super::Decoder for Decoder {
    type Input<'a> = ArrayView4<'a, f32>;

    fn validate(&self, topology: &Topology, heatmaps: &Self::Input<'_>) -> Result<(), Error> {
        let (batch, channels, height, width) = heatmaps.dim();
        if batch != 1 {
            return Err(Error::BatchSize(batch));
        }

        let expected = topology.len();
        if channels < expected || (channels > expected && !self.slice_extra_channels) {
            return Err(Error::ShapeMismatch {
                expected,
                actual: channels,
            });
        }

        if height == 0 || width == 0 {
            return Err(Error::EmptyHeatmap(height, width));
        }
        Ok(())
    }

    fn decode(
        &self,
        topology: &Topology,
        heatmaps: Self::Input<'_>,
        size: FrameSize,
    ) -> Result<KeypointFrame, Error> {
        let threshold = NotNan::new(self.confidence_threshold)
            .map_err(|e| Error::ConstructNotNan(e, self.confidence_threshold))?;
        let (.., height, width) = heatmaps.dim();
        let peaks = self.peaks(topology, heatmaps)?;

        if size.is_empty() {
            debug!(message = "empty frame, dropping heatmap peaks", peaks = peaks.len());
            return Ok(KeypointFrame::empty());
        }

        let mut keypoints = vec![None; topology.len()];
        for Peak {
            part,
            row,
            col,
            confidence,
        } in peaks
        {
            if NotNan::new(confidence).map_or(false, |confidence| confidence > threshold) {
                let x = rescale(col, width, size.width)?;
                let y = rescale(row, height, size.height)?;
                keypoints[part] = Some(Keypoint::new(part, x, y).with_score(confidence));
            } else {
                trace!(
                    message = "body part below threshold",
                    part = part,
                    confidence = confidence
                );
            }
        }

        Ok(KeypointFrame::new(keypoints))
    }
}
