use burn::tensor::{backend::Backend, Tensor};

use crate::error::{PoseError, Result};
use crate::skeleton::Skeleton;

/// Keeps degenerate (coincident-joint) bones finite instead of dividing
/// by zero; the resulting direction is not meaningful and relies on
/// masking downstream.
const DIRECTION_EPS: f64 = 1e-8;

/// Derives per-bone features from a padded joint coordinate sequence.
///
/// For poses of shape `[N, T, 3 * J]` and a skeleton of `B` bones this
/// returns `lengths` of shape `[N, T, B]` (Euclidean norm of each bone
/// offset) and `directions` of shape `[N, T, 3 * B]` (the offset scaled
/// to unit norm, flattened bone-major). The skeleton's bone order fixes
/// the bone axis of both outputs.
pub fn bone_features<B: Backend>(
    poses: Tensor<B, 3>,
    skeleton: &Skeleton,
) -> Result<(Tensor<B, 3>, Tensor<B, 3>)> {
    let [nseqs, frames, width] = poses.dims();
    if width % 3 != 0 {
        return Err(PoseError::MalformedFeatures { width });
    }

    let joints = width / 3;
    if let Some(&(a, b)) = skeleton
        .bones()
        .iter()
        .find(|&&(a, b)| a >= joints || b >= joints)
    {
        return Err(PoseError::BoneOutOfRange { a, b, joints });
    }

    let coords: Tensor<B, 4> = poses.reshape([nseqs, frames, joints, 3]);

    let mut lengths = Vec::with_capacity(skeleton.len());
    let mut directions = Vec::with_capacity(skeleton.len());

    for &(a, b) in skeleton.bones() {
        let joint_a = coords.clone().slice([0..nseqs, 0..frames, a..a + 1, 0..3]);
        let joint_b = coords.clone().slice([0..nseqs, 0..frames, b..b + 1, 0..3]);

        let diff = joint_a - joint_b; // [N, T, 1, 3]
        let length = (diff.clone() * diff.clone()).sum_dim(3).sqrt(); // [N, T, 1, 1]
        let direction = diff / (length.clone() + DIRECTION_EPS);

        lengths.push(length.reshape([nseqs, frames, 1]));
        directions.push(direction.reshape([nseqs, frames, 3]));
    }

    Ok((Tensor::cat(lengths, 2), Tensor::cat(directions, 2)))
}
