use crate::{
    error::Error,
    pose::{FrameSize, Keypoint, KeypointFrame},
    topology::Topology,
};
use num_traits::ToPrimitive;
use tracing::debug;

/// A detector landmark with coordinates normalized to the frame size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    pub fn with_visibility(self, visibility: f32) -> Self {
        Self {
            visibility: Some(visibility),
            ..self
        }
    }
}

/// Scale a normalized coordinate to a pixel index inside `0..extent`.
fn to_pixel(value: f32, extent: u32) -> Result<u32, Error> {
    let pixel = (f64::from(value) * f64::from(extent))
        .floor()
        .clamp(0.0, f64::from(extent - 1));
    pixel.to_u32().ok_or(Error::ConvertToU32)
}

/// Convert normalized landmarks into pixel keypoints, keeping the detector's ids.
///
/// Coordinates are truncated, not rounded. Landmarks that fall outside the frame
/// are clamped to its border.
pub fn normalize(landmarks: &[Landmark], size: FrameSize) -> Result<KeypointFrame, Error> {
    if size.is_empty() {
        debug!(
            message = "empty frame, dropping landmarks",
            landmarks = landmarks.len()
        );
        return Ok(KeypointFrame::empty());
    }

    landmarks
        .iter()
        .enumerate()
        .map(|(id, &Landmark { x, y, visibility })| {
            if !(x.is_finite() && y.is_finite()) {
                return Err(Error::NonFiniteLandmark(id, x, y));
            }
            let keypoint = Keypoint::new(id, to_pixel(x, size.width)?, to_pixel(y, size.height)?);
            Ok(Some(match visibility {
                Some(visibility) => keypoint.with_score(visibility),
                None => keypoint,
            }))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(KeypointFrame::new)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, structopt::StructOpt)]
pub struct Normalizer {
    /// Treat landmarks the detector reports as less visible than this as absent.
    #[structopt(short = "v", long)]
    pub min_visibility: Option<f32>,
}

impl super::Decoder for Normalizer {
    type Input<'a> = &'a [Landmark];

    fn decode(
        &self,
        _topology: &Topology,
        input: Self::Input<'_>,
        size: FrameSize,
    ) -> Result<KeypointFrame, Error> {
        let frame = normalize(input, size)?;
        Ok(match self.min_visibility {
            Some(min_visibility) => KeypointFrame::new(
                frame
                    .slots()
                    .iter()
                    .map(|slot| {
                        slot.filter(|keypoint| {
                            keypoint
                                .score
                                .map_or(true, |visibility| visibility >= min_visibility)
                        })
                    })
                    .collect::<Vec<_>>(),
            ),
            None => frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, Landmark, Normalizer};
    use crate::{
        decode::Decoder,
        error::Error,
        pose::{FrameSize, Keypoint},
        topology::Topology,
    };

    mod normalize_tests {
        use super::*;

        #[test]
        fn truncates() {
            let landmarks = [
                Landmark::new(0.5, 0.5),
                Landmark::new(0.25, 0.75),
                Landmark::new(0.75, 0.75),
                Landmark::new(0.999, 0.019),
            ];
            let frame = normalize(&landmarks, FrameSize::new(200, 100)).unwrap();
            assert_eq!(frame.len(), 4);
            assert_eq!(frame.get(0).unwrap(), &Keypoint::new(0, 100, 50));
            assert_eq!(frame.get(1).unwrap(), &Keypoint::new(1, 50, 75));
            assert_eq!(frame.get(2).unwrap(), &Keypoint::new(2, 150, 75));
            assert_eq!(frame.get(3).unwrap(), &Keypoint::new(3, 199, 1));
        }

        #[test]
        fn stays_inside_frame() {
            let size = FrameSize::new(640, 480);
            let steps = 64;
            let landmarks = (0..=steps)
                .flat_map(|i| (0..=steps).map(move |j| (i, j)))
                .map(|(i, j)| Landmark::new(i as f32 / steps as f32, j as f32 / steps as f32))
                .collect::<Vec<_>>();
            let frame = normalize(&landmarks, size).unwrap();
            assert_eq!(frame.present().count(), landmarks.len());
            assert!(frame
                .present()
                .all(|keypoint| keypoint.x < size.width && keypoint.y < size.height));
        }

        #[test]
        fn clamps_out_of_range() {
            let landmarks = [Landmark::new(1.0, 1.0), Landmark::new(-0.2, 1.7)];
            let frame = normalize(&landmarks, FrameSize::new(10, 20)).unwrap();
            assert_eq!(frame.get(0).unwrap(), &Keypoint::new(0, 9, 19));
            assert_eq!(frame.get(1).unwrap(), &Keypoint::new(1, 0, 19));
        }

        #[test]
        fn no_landmarks() {
            let frame = normalize(&[], FrameSize::new(10, 20)).unwrap();
            assert!(frame.is_empty());
        }

        #[test]
        fn empty_image() {
            let frame = normalize(&[Landmark::new(0.5, 0.5)], FrameSize::new(0, 0)).unwrap();
            assert!(frame.is_empty());
        }

        #[test]
        fn rejects_nan() {
            let landmarks = [Landmark::new(0.5, 0.5), Landmark::new(f32::NAN, 0.5)];
            assert!(matches!(
                normalize(&landmarks, FrameSize::new(10, 20)),
                Err(Error::NonFiniteLandmark(1, ..))
            ));
        }

        #[test]
        fn keeps_visibility() {
            let landmarks = [Landmark::new(0.5, 0.5).with_visibility(0.8)];
            let frame = normalize(&landmarks, FrameSize::new(10, 10)).unwrap();
            assert_eq!(frame.get(0).unwrap().score, Some(0.8));
        }
    }

    mod normalizer_tests {
        use super::*;

        #[test]
        fn drops_invisible_landmarks() {
            let topology = Topology::mediapipe().unwrap();
            let landmarks = [
                Landmark::new(0.1, 0.1).with_visibility(0.9),
                Landmark::new(0.2, 0.2).with_visibility(0.1),
                Landmark::new(0.3, 0.3),
            ];
            let normalizer = Normalizer {
                min_visibility: Some(0.5),
            };
            let frame = normalizer
                .decode(&topology, &landmarks[..], FrameSize::new(100, 100))
                .unwrap();
            assert_eq!(frame.len(), 3);
            assert!(frame.slot(0).is_some());
            assert!(frame.slot(1).is_none());
            assert!(frame.slot(2).is_some());
        }

        #[test]
        fn default_keeps_everything() {
            let topology = Topology::mediapipe().unwrap();
            let landmarks = [Landmark::new(0.2, 0.2).with_visibility(0.0)];
            let frame = Normalizer::default()
                .decode(&topology, &landmarks[..], FrameSize::new(100, 100))
                .unwrap();
            assert_eq!(frame.get(0).unwrap(), &Keypoint::new(0, 20, 20).with_score(0.0));
        }
    }
}
