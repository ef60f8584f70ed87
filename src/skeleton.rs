use crate::{
    angle::Joint,
    error::Error,
    pose::{Keypoint, KeypointFrame},
    topology::{Edge, Topology},
};
use tracing::trace;

/// A drawable connection between two detected keypoints.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bone {
    pub from: Keypoint,
    pub to: Keypoint,
}

/// The keypoints of a frame together with the bones that can be drawn between them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skeleton {
    keypoints: KeypointFrame,
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Connect every topology edge whose two endpoints are present in `keypoints`.
    pub fn assemble(keypoints: KeypointFrame, topology: &Topology) -> Self {
        let bones = topology
            .edges()
            .iter()
            .filter_map(|&Edge { from, to }| {
                match (keypoints.slot(from), keypoints.slot(to)) {
                    (Some(&from), Some(&to)) => Some(Bone { from, to }),
                    _ => {
                        trace!(message = "skipping bone with absent endpoint", from = from, to = to);
                        None
                    }
                }
            })
            .collect();
        Self { keypoints, bones }
    }

    pub fn keypoints(&self) -> &KeypointFrame {
        &self.keypoints
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn angle(&self, joint: Joint) -> Result<f64, Error> {
        joint.angle(&self.keypoints)
    }

    pub fn into_keypoints(self) -> KeypointFrame {
        self.keypoints
    }
}
