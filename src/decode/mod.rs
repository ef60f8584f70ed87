use crate::{
    error::Error,
    pose::{FrameSize, KeypointFrame},
    skeleton::Skeleton,
    topology::Topology,
};
use ndarray::ArrayView4;

pub mod heatmap;
pub mod landmarks;

pub use landmarks::Landmark;

/// Raw output of an external pose detector for a single frame.
#[derive(Debug, Clone, Copy)]
pub enum Detection<'a> {
    /// Normalized per-landmark coordinates in detector order.
    Landmarks(&'a [Landmark]),
    /// A `[1, parts, height, width]` confidence tensor.
    Heatmap(ArrayView4<'a, f32>),
}

pub trait Decoder {
    /// The detector output the decoder operates on.
    type Input<'a>;

    /// Decode detector output into keypoints expressed in pixels of a `size` image.
    fn decode(
        &self,
        topology: &Topology,
        input: Self::Input<'_>,
        size: FrameSize,
    ) -> Result<KeypointFrame, Error>;

    /// Validate that the detector output matches the topology it is decoded against.
    fn validate(&self, _topology: &Topology, _input: &Self::Input<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Decode and connect the keypoints along the topology's edges.
    fn decode_skeleton(
        &self,
        topology: &Topology,
        input: Self::Input<'_>,
        size: FrameSize,
    ) -> Result<Skeleton, Error> {
        let keypoints = self.decode(topology, input, size)?;
        Ok(Skeleton::assemble(keypoints, topology))
    }
}
