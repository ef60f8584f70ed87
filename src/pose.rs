use crate::error::Error;
use num_traits::FromPrimitive;

/// Body parts in the channel order of the OpenPose COCO heatmap output.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, num_derive::FromPrimitive)]
pub enum BodyPart {
    Nose,
    Neck,
    RightShoulder,
    RightElbow,
    RightWrist,
    LeftShoulder,
    LeftElbow,
    LeftWrist,
    RightHip,
    RightKnee,
    RightAnkle,
    LeftHip,
    LeftKnee,
    LeftAnkle,
    RightEye,
    LeftEye,
    RightEar,
    LeftEar,
    Background,
}

pub const NUM_BODY_PARTS: usize = constants::BODY_PARTS.len();

impl BodyPart {
    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_idx(id: usize) -> Option<Self> {
        Self::from_usize(id)
    }

    /// The name used for this part in the body part table.
    pub fn name(self) -> &'static str {
        constants::BODY_PARTS[self.idx()]
    }
}

impl std::fmt::Display for BodyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for BodyPart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        constants::BODY_PARTS
            .iter()
            .position(|&name| name == s)
            .and_then(Self::from_idx)
            .ok_or_else(|| Error::UnknownBodyPart(s.to_owned()))
    }
}

/// Pixel dimensions of the image keypoints are expressed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A frame with no pixels carries no detections.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Keypoint {
    pub id: usize,
    pub x: u32,
    pub y: u32,
    pub score: Option<f32>,
}

impl Keypoint {
    pub fn new(id: usize, x: u32, y: u32) -> Self {
        Self {
            id,
            x,
            y,
            score: None,
        }
    }

    pub fn with_score(self, score: f32) -> Self {
        Self {
            score: Some(score),
            ..self
        }
    }

    #[inline]
    pub(crate) fn xy(&self) -> (f64, f64) {
        (f64::from(self.x), f64::from(self.y))
    }
}

/// Keypoints of a single frame, one slot per body part id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeypointFrame {
    keypoints: Box<[Option<Keypoint>]>,
}

impl KeypointFrame {
    pub fn new(keypoints: impl Into<Box<[Option<Keypoint>]>>) -> Self {
        Self {
            keypoints: keypoints.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of slots, present or not.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn slot(&self, id: usize) -> Option<&Keypoint> {
        self.keypoints.get(id).and_then(Option::as_ref)
    }

    /// Look up a keypoint that must be present.
    pub fn get(&self, id: usize) -> Result<&Keypoint, Error> {
        self.slot(id).ok_or(Error::MissingKeypoint(id))
    }

    pub fn part(&self, part: BodyPart) -> Result<&Keypoint, Error> {
        self.get(part.idx())
    }

    /// Iterate over the keypoints that were detected.
    pub fn present(&self) -> impl Iterator<Item = &Keypoint> + '_ {
        self.keypoints.iter().flatten()
    }

    pub fn slots(&self) -> &[Option<Keypoint>] {
        &self.keypoints
    }
}

impl FromIterator<Keypoint> for KeypointFrame {
    fn from_iter<I: IntoIterator<Item = Keypoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Some).collect::<Vec<_>>())
    }
}

pub mod constants {
    /// Default confidence a heatmap peak must exceed.
    pub const CONFIDENCE_THRESHOLD: f32 = 0.2;

    /// Square input size of the OpenPose model.
    pub const MODEL_INPUT_SIZE: u32 = 368;

    pub const BODY_PARTS: [&str; 19] = [
        "Nose",
        "Neck",
        "RShoulder",
        "RElbow",
        "RWrist",
        "LShoulder",
        "LElbow",
        "LWrist",
        "RHip",
        "RKnee",
        "RAnkle",
        "LHip",
        "LKnee",
        "LAnkle",
        "REye",
        "LEye",
        "REar",
        "LEar",
        "Background",
    ];

    pub const POSE_PAIRS: [(&str, &str); 17] = [
        ("Neck", "RShoulder"),
        ("Neck", "LShoulder"),
        ("RShoulder", "RElbow"),
        ("RElbow", "RWrist"),
        ("LShoulder", "LElbow"),
        ("LElbow", "LWrist"),
        ("Neck", "RHip"),
        ("RHip", "RKnee"),
        ("RKnee", "RAnkle"),
        ("Neck", "LHip"),
        ("LHip", "LKnee"),
        ("LKnee", "LAnkle"),
        ("Neck", "Nose"),
        ("Nose", "REye"),
        ("REye", "REar"),
        ("Nose", "LEye"),
        ("LEye", "LEar"),
    ];

    /// BlazePose landmark names, in detector output order.
    pub const LANDMARKS: [&str; 33] = [
        "nose",
        "left_eye_inner",
        "left_eye",
        "left_eye_outer",
        "right_eye_inner",
        "right_eye",
        "right_eye_outer",
        "left_ear",
        "right_ear",
        "mouth_left",
        "mouth_right",
        "left_shoulder",
        "right_shoulder",
        "left_elbow",
        "right_elbow",
        "left_wrist",
        "right_wrist",
        "left_pinky",
        "right_pinky",
        "left_index",
        "right_index",
        "left_thumb",
        "right_thumb",
        "left_hip",
        "right_hip",
        "left_knee",
        "right_knee",
        "left_ankle",
        "right_ankle",
        "left_heel",
        "right_heel",
        "left_foot_index",
        "right_foot_index",
    ];

    pub const LANDMARK_CONNECTIONS: [(&str, &str); 35] = [
        // face
        ("nose", "left_eye_inner"),
        ("left_eye_inner", "left_eye"),
        ("left_eye", "left_eye_outer"),
        ("left_eye_outer", "left_ear"),
        ("nose", "right_eye_inner"),
        ("right_eye_inner", "right_eye"),
        ("right_eye", "right_eye_outer"),
        ("right_eye_outer", "right_ear"),
        ("mouth_left", "mouth_right"),
        // arms and hands
        ("left_shoulder", "right_shoulder"),
        ("left_shoulder", "left_elbow"),
        ("left_elbow", "left_wrist"),
        ("left_wrist", "left_pinky"),
        ("left_wrist", "left_index"),
        ("left_wrist", "left_thumb"),
        ("left_pinky", "left_index"),
        ("right_shoulder", "right_elbow"),
        ("right_elbow", "right_wrist"),
        ("right_wrist", "right_pinky"),
        ("right_wrist", "right_index"),
        ("right_wrist", "right_thumb"),
        ("right_pinky", "right_index"),
        // torso
        ("left_shoulder", "left_hip"),
        ("right_shoulder", "right_hip"),
        ("left_hip", "right_hip"),
        // legs and feet
        ("left_hip", "left_knee"),
        ("right_hip", "right_knee"),
        ("left_knee", "left_ankle"),
        ("right_knee", "right_ankle"),
        ("left_ankle", "left_heel"),
        ("right_ankle", "right_heel"),
        ("left_heel", "left_foot_index"),
        ("right_heel", "right_foot_index"),
        ("left_ankle", "left_foot_index"),
        ("right_ankle", "right_foot_index"),
    ];
}

#[cfg(test)]
mod tests {
    use super::{BodyPart, Error, FrameSize, Keypoint, KeypointFrame, NUM_BODY_PARTS};

    #[test]
    fn body_part_ids_follow_table() {
        assert_eq!(NUM_BODY_PARTS, 19);
        assert_eq!(BodyPart::Nose.idx(), 0);
        assert_eq!(BodyPart::LeftEar.idx(), 17);
        assert_eq!(BodyPart::Background.idx(), 18);
        for id in 0..NUM_BODY_PARTS {
            assert_eq!(BodyPart::from_idx(id).unwrap().idx(), id);
        }
        assert_eq!(BodyPart::from_idx(NUM_BODY_PARTS), None);
    }

    #[test]
    fn body_part_names_round_trip() {
        assert_eq!(BodyPart::RightShoulder.name(), "RShoulder");
        assert_eq!("LKnee".parse::<BodyPart>().unwrap(), BodyPart::LeftKnee);
        assert!(matches!(
            "Tail".parse::<BodyPart>(),
            Err(Error::UnknownBodyPart(name)) if name == "Tail"
        ));
    }

    #[test]
    fn empty_frame_size() {
        assert!(FrameSize::new(0, 10).is_empty());
        assert!(FrameSize::new(10, 0).is_empty());
        assert!(!FrameSize::new(1, 1).is_empty());
    }

    #[test]
    fn absent_slot_is_missing() {
        let frame = KeypointFrame::new(vec![Some(Keypoint::new(0, 0, 0)), None]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(0).unwrap(), &Keypoint::new(0, 0, 0));
        assert!(matches!(frame.get(1), Err(Error::MissingKeypoint(1))));
        assert!(matches!(frame.get(2), Err(Error::MissingKeypoint(2))));
        assert_eq!(frame.present().count(), 1);
    }
}
