use thiserror::Error;

/// Errors raised at component boundaries before tensor ops can fail
/// with an opaque backend panic.
#[derive(Debug, Error)]
pub enum PoseError {
    #[error("shape mismatch: {lhs} has dims {lhs_dims:?} but {rhs} has dims {rhs_dims:?}")]
    ShapeMismatch {
        lhs: &'static str,
        lhs_dims: Vec<usize>,
        rhs: &'static str,
        rhs_dims: Vec<usize>,
    },

    #[error("feature width {width} is not a multiple of 3, expected flattened [x, y, z] joints")]
    MalformedFeatures { width: usize },

    #[error("bone ({a}, {b}) references a joint outside the {joints}-joint pose")]
    BoneOutOfRange { a: usize, b: usize, joints: usize },
}

pub type Result<T> = std::result::Result<T, PoseError>;
