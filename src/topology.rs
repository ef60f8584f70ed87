use crate::{error::Error, pose::constants};
use std::collections::HashMap;

/// A connection between two body part ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

/// An immutable body part table together with the bones connecting its parts.
///
/// Part ids are the positions of the names in the table and must match the
/// output order of the detector that produces keypoints for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    parts: Box<[&'static str]>,
    ids: HashMap<&'static str, usize>,
    edges: Box<[Edge]>,
}

impl Topology {
    /// Build a topology, resolving every named pair against the part table.
    pub fn new(
        parts: &[&'static str],
        pairs: &[(&'static str, &'static str)],
    ) -> Result<Self, Error> {
        let mut ids = HashMap::with_capacity(parts.len());
        for (id, &name) in parts.iter().enumerate() {
            if ids.insert(name, id).is_some() {
                return Err(Error::DuplicateBodyPart(name.to_owned()));
            }
        }

        let resolve = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| Error::UnknownBodyPart(name.to_owned()))
        };
        let edges = pairs
            .iter()
            .map(|&(from, to)| {
                Ok(Edge {
                    from: resolve(from)?,
                    to: resolve(to)?,
                })
            })
            .collect::<Result<Box<[_]>, Error>>()?;

        Ok(Self {
            parts: parts.into(),
            ids,
            edges,
        })
    }

    /// The 19 part COCO table (including the background channel) of OpenPose.
    pub fn openpose() -> Result<Self, Error> {
        Self::new(&constants::BODY_PARTS, &constants::POSE_PAIRS)
    }

    /// The 33 landmark BlazePose table.
    pub fn mediapipe() -> Result<Self, Error> {
        Self::new(&constants::LANDMARKS, &constants::LANDMARK_CONNECTIONS)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&'static str> {
        self.parts.get(id).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
