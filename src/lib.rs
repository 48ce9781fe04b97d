//! Batch preparation and skeletal-structure-aware losses for
//! sequence-to-sequence sign pose production models.
//!
//! The crate covers the two pieces of the pipeline that sit around the
//! model itself: packaging variable-length source/target pairs into
//! masked, device-placed batches, and scoring predicted pose sequences
//! against ground truth both pointwise and through derived bone
//! length/direction features.

pub mod data;
pub mod device;
pub mod error;
pub mod loss;
pub mod skeleton;
pub mod utils;

pub use data::batch::{PoseBatch, PoseBatcher, RawBatch};
pub use device::DeviceResolver;
pub use error::{PoseError, Result};
pub use loss::{PointwiseLoss, RegressionLoss, RegressionLossConfig};
pub use skeleton::Skeleton;
