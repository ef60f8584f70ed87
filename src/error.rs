#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("keypoint {0} is not present in the current frame")]
    MissingKeypoint(usize),

    #[error("heatmap tensor has {actual} channels, body part table has {expected} entries")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("expected a heatmap tensor with batch size 1, got {0}")]
    BatchSize(usize),

    #[error("heatmap tensor has an empty spatial extent: {0}x{1}")]
    EmptyHeatmap(usize, usize),

    #[error("edge references body part {0:?} which is not in the body part table")]
    UnknownBodyPart(String),

    #[error("body part {0:?} appears more than once in the body part table")]
    DuplicateBodyPart(String),

    #[error("landmark {0} has a non-finite coordinate: ({1}, {2})")]
    NonFiniteLandmark(usize, f32, f32),

    #[error("failed to construct NotNan from f32: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f32),

    #[error("failed to construct array view from raw tensor data")]
    ConstructArrayView(#[source] ndarray::ShapeError),

    #[error("tensor data ended after {0} bytes, expected a multiple of {1}")]
    TruncatedTensor(usize, usize),

    #[error("failed to parse landmark value {1:?} on line {0}")]
    ParseLandmark(usize, String, #[source] std::num::ParseFloatError),

    #[error("landmark {1:?} on line {0} is not of the form x,y or x,y,visibility")]
    MalformedLandmark(usize, String),

    #[error("failed to read detector output")]
    Io(#[source] std::io::Error),

    #[error("failed to convert value to f64")]
    ConvertToF64,

    #[error("failed to convert value to u32")]
    ConvertToU32,

    #[error("failed to convert value to u64")]
    ConvertToU64,
}

impl Error {
    /// Whether the error only affects a single overlay element of the current frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingKeypoint(_))
    }
}
