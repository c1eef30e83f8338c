use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, CatMapError>;

#[derive(Debug, Error)]
pub enum CatMapError {
    #[error("grid side {side} is below the minimum of {min}")]
    SideTooSmall { side: usize, min: usize },

    #[error("pixel buffer holds {actual} bytes, expected {expected} for a {side}x{side} grid")]
    ShapeMismatch {
        side: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{width}x{height} RGBA source needs {expected} bytes, got {actual}")]
    SourceMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("transform plan was built for side {plan_side}, grid has side {grid_side}")]
    SideMismatch { plan_side: usize, grid_side: usize },

    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image encode failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("frame index {index} out of range ({len} frames)")]
    FrameOutOfRange { index: usize, len: usize },
}

impl From<CatMapError> for JsValue {
    fn from(err: CatMapError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
