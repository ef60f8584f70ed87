use crate::{
    decode::{heatmap, landmarks, Decoder, Detection},
    error::Error,
    pose::FrameSize,
    skeleton::Skeleton,
    topology::Topology,
};
use num_traits::cast::ToPrimitive;
use std::time::{Duration, Instant};
use tracing::debug;

/// Per frame driver for both detection paths.
pub struct Engine {
    normalizer: landmarks::Normalizer,
    landmark_topology: Topology,
    decoder: heatmap::Decoder,
    heatmap_topology: Topology,
    timing: Timing,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Timing {
    /// Time spent decoding and assembling skeletons.
    pub decode: Duration,
    /// Time the external detector reported for producing its output.
    pub inference: Duration,
    pub frames: usize,
}

impl Timing {
    fn per_second(&self, elapsed: Duration) -> Result<Option<f64>, Error> {
        let frames = self.frames.to_f64().ok_or(Error::ConvertToF64)?;
        let seconds = elapsed.as_secs_f64();
        Ok(if seconds > 0.0 {
            Some(frames / seconds)
        } else {
            None
        })
    }

    pub fn decode_fps(&self) -> Result<Option<f64>, Error> {
        self.per_second(self.decode)
    }

    pub fn inference_fps(&self) -> Result<Option<f64>, Error> {
        self.per_second(self.inference)
    }
}

impl Engine {
    /// An engine decoding BlazePose landmarks and OpenPose heatmaps.
    pub fn new(normalizer: landmarks::Normalizer, decoder: heatmap::Decoder) -> Result<Self, Error> {
        Ok(Self::with_topologies(
            normalizer,
            Topology::mediapipe()?,
            decoder,
            Topology::openpose()?,
        ))
    }

    pub fn with_topologies(
        normalizer: landmarks::Normalizer,
        landmark_topology: Topology,
        decoder: heatmap::Decoder,
        heatmap_topology: Topology,
    ) -> Self {
        Self {
            normalizer,
            landmark_topology,
            decoder,
            heatmap_topology,
            timing: Default::default(),
        }
    }

    /// Decode one frame's detection into a skeleton in pixels of a `size` image.
    pub fn process(&mut self, detection: Detection<'_>, size: FrameSize) -> Result<Skeleton, Error> {
        let start = Instant::now();
        let skeleton = match detection {
            Detection::Landmarks(landmarks) => {
                self.normalizer
                    .decode_skeleton(&self.landmark_topology, landmarks, size)?
            }
            Detection::Heatmap(heatmaps) => {
                self.decoder
                    .decode_skeleton(&self.heatmap_topology, heatmaps, size)?
            }
        };
        self.timing.decode += start.elapsed();
        self.timing.frames += 1;

        debug!(
            message = "decoded frame",
            frame = self.timing.frames,
            keypoints = skeleton.keypoints().present().count(),
            bones = skeleton.bones().len()
        );
        Ok(skeleton)
    }

    /// Account for the time the external detector spent on the current frame.
    pub fn record_inference(&mut self, elapsed: Duration) {
        self.timing.inference += elapsed;
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn landmark_topology(&self) -> &Topology {
        &self.landmark_topology
    }

    pub fn heatmap_topology(&self) -> &Topology {
        &self.heatmap_topology
    }
}

/// Frames per second between consecutive ticks of a display loop.
#[derive(Debug, Default)]
pub struct FrameRate {
    previous: Option<Instant>,
}

impl FrameRate {
    pub fn tick(&mut self) -> Option<f64> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<f64> {
        let fps = self
            .previous
            .map(|previous| now.saturating_duration_since(previous).as_secs_f64())
            .filter(|&seconds| seconds > 0.0)
            .map(f64::recip);
        self.previous = Some(now);
        fps
    }
}

#[cfg(test)]
mod tests {
    use super::{Engine, FrameRate, Timing};
    use crate::{
        decode::{heatmap, landmarks, Detection, Landmark},
        error::Error,
        pose::{BodyPart, FrameSize, Keypoint},
    };
    use assert_approx_eq::assert_approx_eq;
    use ndarray::Array4;
    use std::time::{Duration, Instant};

    fn engine() -> Engine {
        Engine::new(landmarks::Normalizer::default(), heatmap::Decoder::default()).unwrap()
    }

    mod process_tests {
        use super::*;

        #[test]
        fn landmark_skeleton() {
            let mut engine = engine();
            let landmarks = (0..33)
                .map(|i| Landmark::new(i as f32 / 33.0, 0.5))
                .collect::<Vec<_>>();
            let skeleton = engine
                .process(Detection::Landmarks(&landmarks), FrameSize::new(330, 100))
                .unwrap();
            assert_eq!(skeleton.keypoints().len(), 33);
            assert_eq!(skeleton.bones().len(), 35);
            assert_eq!(engine.timing().frames, 1);
        }

        #[test]
        fn no_detection() {
            let mut engine = engine();
            let skeleton = engine
                .process(Detection::Landmarks(&[]), FrameSize::new(640, 480))
                .unwrap();
            assert!(skeleton.keypoints().is_empty());
            assert!(skeleton.bones().is_empty());
        }

        #[test]
        fn heatmap_skeleton() {
            let mut engine = engine();
            let mut heatmaps = Array4::<f32>::zeros((1, 19, 46, 46));
            heatmaps[(0, BodyPart::Neck.idx(), 10, 23)] = 0.7;
            heatmaps[(0, BodyPart::Nose.idx(), 5, 23)] = 0.6;
            let skeleton = engine
                .process(Detection::Heatmap(heatmaps.view()), FrameSize::new(368, 368))
                .unwrap();
            assert_eq!(skeleton.bones().len(), 1);
            assert_eq!(
                skeleton.keypoints().part(BodyPart::Neck).unwrap(),
                &Keypoint::new(1, 184, 80).with_score(0.7)
            );
        }

        #[test]
        fn heatmap_shape_mismatch() {
            let mut engine = engine();
            let heatmaps = Array4::<f32>::zeros((1, 17, 46, 46));
            assert!(matches!(
                engine.process(Detection::Heatmap(heatmaps.view()), FrameSize::new(368, 368)),
                Err(Error::ShapeMismatch { .. })
            ));
            assert_eq!(engine.timing().frames, 0);
        }
    }

    mod timing_tests {
        use super::*;

        #[test]
        fn fps() {
            let timing = Timing {
                decode: Duration::from_millis(500),
                inference: Duration::default(),
                frames: 10,
            };
            assert_approx_eq!(timing.decode_fps().unwrap().unwrap(), 20.0);
            assert_eq!(timing.inference_fps().unwrap(), None);
        }

        #[test]
        fn record_inference() {
            let mut engine = engine();
            engine.record_inference(Duration::from_millis(30));
            engine.record_inference(Duration::from_millis(20));
            assert_eq!(engine.timing().inference, Duration::from_millis(50));
        }
    }

    mod frame_rate_tests {
        use super::*;

        #[test]
        fn ticks() {
            let start = Instant::now();
            let mut rate = FrameRate::default();
            assert_eq!(rate.tick_at(start), None);
            assert_approx_eq!(
                rate.tick_at(start + Duration::from_millis(40)).unwrap(),
                25.0
            );
            assert_eq!(rate.tick_at(start + Duration::from_millis(40)), None);
        }
    }
}
