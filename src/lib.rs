//! Pose keypoint extraction and skeleton assembly.
//!
//! Two detector outputs are supported. Normalized landmark lists are scaled to
//! pixel keypoints by [`decode::landmarks`]; dense per body part confidence maps
//! are reduced to one keypoint per part by [`decode::heatmap`]. Both produce a
//! [`KeypointFrame`] that [`Skeleton::assemble`] connects along a [`Topology`]
//! and [`joint_angle`] measures.

pub mod angle;
pub mod decode;
pub mod engine;
pub mod error;
pub mod input;
pub mod pose;
pub mod skeleton;
pub mod topology;

pub use angle::{joint_angle, Joint};
pub use decode::{Decoder, Detection, Landmark};
pub use engine::{Engine, FrameRate, Timing};
pub use error::Error;
pub use pose::{BodyPart, FrameSize, Keypoint, KeypointFrame};
pub use skeleton::{Bone, Skeleton};
pub use topology::{Edge, Topology};
