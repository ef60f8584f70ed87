//! Replay of recorded detector output.
//!
//! Landmark recordings are text, one frame per line, each landmark written as
//! `x,y` or `x,y,visibility` and separated by whitespace. A blank line is a frame
//! without detections.
//!
//! Heatmap recordings are raw little-endian `f32` tensors of a fixed
//! `[1, channels, height, width]` shape written back to back.

use crate::{
    decode::{Detection, Landmark},
    error::Error,
};
use ndarray::{Array4, Dimension, Ix4};
use std::io::{BufRead, ErrorKind, Read};

/// An owned detection read from a recording.
#[derive(Debug, Clone)]
pub enum Recorded {
    Landmarks(Vec<Landmark>),
    Heatmap(Array4<f32>),
}

impl Recorded {
    pub fn as_detection(&self) -> Detection<'_> {
        match self {
            Self::Landmarks(landmarks) => Detection::Landmarks(landmarks),
            Self::Heatmap(heatmaps) => Detection::Heatmap(heatmaps.view()),
        }
    }
}

fn parse_value(line_number: usize, value: &str) -> Result<f32, Error> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::ParseLandmark(line_number, value.to_owned(), e))
}

/// Parse the landmarks of a single recorded frame.
pub fn parse_landmark_line(line_number: usize, line: &str) -> Result<Vec<Landmark>, Error> {
    line.split_whitespace()
        .map(|token| {
            let values = token
                .split(',')
                .map(|value| parse_value(line_number, value))
                .collect::<Result<Vec<_>, _>>()?;
            match values[..] {
                [x, y] => Ok(Landmark::new(x, y)),
                [x, y, visibility] => Ok(Landmark::new(x, y).with_visibility(visibility)),
                _ => Err(Error::MalformedLandmark(line_number, token.to_owned())),
            }
        })
        .collect()
}

/// Frames of a landmark recording.
pub struct LandmarkReader<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> LandmarkReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for LandmarkReader<R> {
    type Item = Result<Vec<Landmark>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(
            line.map_err(Error::Io)
                .and_then(|line| parse_landmark_line(self.line_number, &line)),
        )
    }
}

/// Fixed shape tensors of a heatmap recording.
pub struct HeatmapReader<R> {
    reader: R,
    shape: Ix4,
    buffer: Vec<u8>,
}

impl<R: Read> HeatmapReader<R> {
    pub fn new(reader: R, (channels, height, width): (usize, usize, usize)) -> Self {
        let shape = Ix4(1, channels, height, width);
        Self {
            reader,
            buffer: vec![0; shape.size() * std::mem::size_of::<f32>()],
            shape,
        }
    }

    /// Fill the buffer, returning how many bytes were read before end of input.
    fn fill(&mut self) -> Result<usize, Error> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(filled)
    }

    fn next_frame(&mut self) -> Result<Option<Array4<f32>>, Error> {
        let filled = self.fill()?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < self.buffer.len() {
            return Err(Error::TruncatedTensor(filled, self.buffer.len()));
        }

        let values = self
            .buffer
            .chunks_exact(std::mem::size_of::<f32>())
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect::<Vec<_>>();
        Array4::from_shape_vec(self.shape, values)
            .map(Some)
            .map_err(Error::ConstructArrayView)
    }
}

impl<R: Read> Iterator for HeatmapReader<R> {
    type Item = Result<Array4<f32>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
