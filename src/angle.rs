use crate::{
    error::Error,
    pose::{BodyPart, KeypointFrame},
};

/// Three keypoint ids forming two bones that meet at `vertex`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Joint {
    pub first: usize,
    pub vertex: usize,
    pub last: usize,
}

impl Joint {
    pub fn new(first: usize, vertex: usize, last: usize) -> Self {
        Self {
            first,
            vertex,
            last,
        }
    }

    pub fn from_parts(first: BodyPart, vertex: BodyPart, last: BodyPart) -> Self {
        Self::new(first.idx(), vertex.idx(), last.idx())
    }

    /// The same joint measured in the opposite direction.
    pub fn reversed(self) -> Self {
        Self::new(self.last, self.vertex, self.first)
    }

    pub fn angle(self, frame: &KeypointFrame) -> Result<f64, Error> {
        joint_angle(frame, self.first, self.vertex, self.last)
    }
}

/// Directed angle in degrees, in `[0, 360)`, swept from the `p2 -> p1` bone to the
/// `p2 -> p3` bone.
///
/// The angle is not the interior angle: swapping `p1` and `p3` yields
/// `360 - angle`. Which of the two a caller wants depends on the joint and the
/// side of the body it is on.
pub fn joint_angle(frame: &KeypointFrame, p1: usize, p2: usize, p3: usize) -> Result<f64, Error> {
    let (x1, y1) = frame.get(p1)?.xy();
    let (x2, y2) = frame.get(p2)?.xy();
    let (x3, y3) = frame.get(p3)?.xy();

    let angle = ((y3 - y2).atan2(x3 - x2) - (y1 - y2).atan2(x1 - x2)).to_degrees();
    let angle = if angle < 0.0 { angle + 360.0 } else { angle };

    // tiny negative differences round up to the excluded bound
    Ok(if angle >= 360.0 { 0.0 } else { angle })
}
