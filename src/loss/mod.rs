pub mod skeletal;

use burn::config::Config;
use burn::tensor::{backend::Backend, Tensor};
use tracing::warn;

use crate::device::DeviceResolver;
use crate::error::PoseError;
use crate::skeleton::Skeleton;

use self::skeletal::bone_features;

/// Weight of the bone-direction term relative to the pointwise term.
const BONE_WEIGHT: f64 = 0.1;

/// Pointwise reduction criterion, mean over every element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointwiseLoss {
    L1,
    Mse,
}

impl PointwiseLoss {
    /// Case-insensitive lookup, falling back to `default` with a warning
    /// when the name is not recognized.
    pub fn from_name(name: &str, default: PointwiseLoss) -> PointwiseLoss {
        match name.to_lowercase().as_str() {
            "l1" => PointwiseLoss::L1,
            "mse" => PointwiseLoss::Mse,
            other => {
                warn!(loss = other, ?default, "loss not found, reverting to default");
                default
            }
        }
    }

    pub fn forward<B: Backend, const D: usize>(
        &self,
        preds: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        let residual = preds - targets;
        match self {
            PointwiseLoss::L1 => residual.abs().mean(),
            PointwiseLoss::Mse => (residual.clone() * residual).mean(),
        }
    }
}

#[derive(Config, Debug)]
pub struct RegressionLossConfig {
    /// Pointwise criterion for the reconstruction term.
    #[config(default = "String::from(\"l1\")")]
    pub loss: String,

    /// Pointwise criterion for the bone-direction term.
    #[config(default = "String::from(\"mse\")")]
    pub bone_loss: String,

    /// Multiplicative scale applied to the combined loss.
    #[config(default = 1.0)]
    pub loss_scale: f64,

    /// Sentinel marking padded positions in target coordinate frames.
    #[config(default = 0.0)]
    pub target_pad: f64,
}

impl RegressionLossConfig {
    pub fn init<B: Backend>(&self, resolver: &DeviceResolver<B>) -> RegressionLoss<B> {
        RegressionLoss {
            criterion: PointwiseLoss::from_name(&self.loss, PointwiseLoss::L1),
            criterion_bone: PointwiseLoss::from_name(&self.bone_loss, PointwiseLoss::Mse),
            loss_scale: self.loss_scale,
            target_pad: self.target_pad,
            skeleton: Skeleton::sign_pose().clone(),
            device: resolver.resolve().unwrap_or_default(),
        }
    }
}

/// Reconstruction loss for pose sequences: a pointwise term over masked
/// coordinates plus a weighted consistency term over derived bone
/// directions. Constructed once per run and reused across steps.
#[derive(Clone, Debug)]
pub struct RegressionLoss<B: Backend> {
    criterion: PointwiseLoss,
    criterion_bone: PointwiseLoss,
    loss_scale: f64,
    target_pad: f64,
    skeleton: Skeleton,
    device: B::Device,
}

impl<B: Backend> RegressionLoss<B> {
    /// Swaps the default skeleton for a custom topology.
    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = skeleton;
        self
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Rehomes the loss and everything it owns onto `device`. Must not
    /// be called while a forward pass is in flight.
    pub fn to_device(mut self, device: B::Device) -> Self {
        self.device = device;
        self
    }

    /// Scores `preds` against `targets`, both `[N, T, 3 * J]`.
    ///
    /// Padded positions are zeroed on both sides before either term is
    /// computed, and frames that are entirely pad are excluded from the
    /// derived bone features through a per-frame validity mask.
    pub fn forward(
        &self,
        preds: Tensor<B, 3>,
        targets: Tensor<B, 3>,
    ) -> crate::error::Result<Tensor<B, 1>> {
        let pred_dims = preds.dims();
        let trg_dims = targets.dims();
        if pred_dims != trg_dims {
            return Err(PoseError::ShapeMismatch {
                lhs: "preds",
                lhs_dims: pred_dims.to_vec(),
                rhs: "targets",
                rhs_dims: trg_dims.to_vec(),
            });
        }

        let loss_mask = targets
            .clone()
            .equal_elem(self.target_pad)
            .bool_not()
            .float();
        let preds_masked = preds * loss_mask.clone();
        let targets_masked = targets * loss_mask.clone();

        let (pred_lengths, pred_directions) =
            bone_features(preds_masked.clone(), &self.skeleton)?;
        let (trg_lengths, trg_directions) =
            bone_features(targets_masked.clone(), &self.skeleton)?;

        // A frame is valid if any of its coordinates is non-pad; the
        // reduced mask broadcasts against every derived feature width.
        let frame_mask = loss_mask.max_dim(2); // [N, T, 1]

        // The length term is masked like the directions but not yet part
        // of the sum; its weighting is still an open modelling question.
        let _pred_lengths = pred_lengths * frame_mask.clone();
        let _trg_lengths = trg_lengths * frame_mask.clone();

        let pred_directions = pred_directions * frame_mask.clone();
        let trg_directions = trg_directions * frame_mask;

        let loss = self.criterion.forward(preds_masked, targets_masked)
            + self
                .criterion_bone
                .forward(pred_directions, trg_directions)
                * BONE_WEIGHT;

        if self.loss_scale != 1.0 {
            Ok(loss * self.loss_scale)
        } else {
            Ok(loss)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use burn::backend::NdArray;
    use burn::tensor::{Data, Shape};

    type TestBackend = NdArray<f32>;

    fn poses(values: Vec<f32>, dims: [usize; 3]) -> Tensor<TestBackend, 3> {
        Tensor::from_data(
            Data::new(values, Shape::new([dims[0] * dims[1] * dims[2]])).convert(),
        )
        .reshape(dims)
    }

    fn two_joint_loss(config: RegressionLossConfig) -> RegressionLoss<TestBackend> {
        config
            .init(&DeviceResolver::cpu())
            .with_skeleton(Skeleton::new(vec![(1, 0)]))
    }

    fn scalar(loss: Tensor<TestBackend, 1>) -> f32 {
        loss.into_data().value[0]
    }

    #[test]
    fn identical_inputs_score_zero() {
        let loss = two_joint_loss(RegressionLossConfig::new());
        let x = poses(vec![0.1, 0.2, 0.3, 1.0, 0.5, 0.25], [1, 1, 6]);

        let value = loss.forward(x.clone(), x).unwrap();
        assert_abs_diff_eq!(scalar(value), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn masking_the_same_tensor_twice_changes_nothing() {
        let x = poses(vec![0.0, 0.2, 0.0, 1.0, 0.5, 0.25], [1, 1, 6]);
        let mask = x.clone().equal_elem(0.0).bool_not().float();

        let once = x.clone() * mask.clone();
        let twice = once.clone() * mask;
        assert_eq!(once.into_data().value, twice.into_data().value);
    }

    #[test]
    fn unrecognized_loss_name_behaves_like_the_default() {
        let preds = poses(vec![0.2, 0.1, 0.4, 0.9, 0.6, 0.3], [1, 1, 6]);
        let targets = poses(vec![0.1, 0.2, 0.3, 1.0, 0.5, 0.25], [1, 1, 6]);

        let fallback = two_joint_loss(RegressionLossConfig::new().with_loss("huber".into()));
        let explicit = two_joint_loss(RegressionLossConfig::new().with_loss("l1".into()));

        let a = scalar(fallback.forward(preds.clone(), targets.clone()).unwrap());
        let b = scalar(explicit.forward(preds, targets).unwrap());
        assert_abs_diff_eq!(a, b, epsilon = 1e-7);
    }

    #[test]
    fn loss_names_are_case_insensitive() {
        assert_eq!(
            PointwiseLoss::from_name("MSE", PointwiseLoss::L1),
            PointwiseLoss::Mse
        );
        assert_eq!(
            PointwiseLoss::from_name("L1", PointwiseLoss::Mse),
            PointwiseLoss::L1
        );
    }

    #[test]
    fn mse_squares_the_residual() {
        let preds = poses(vec![2.0; 6], [1, 1, 6]);
        let targets = poses(vec![1.0; 6], [1, 1, 6]);
        let value = PointwiseLoss::Mse.forward(preds, targets);
        assert_abs_diff_eq!(scalar(value), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn mismatched_inputs_fail_fast() {
        let loss = two_joint_loss(RegressionLossConfig::new());
        let preds = poses(vec![0.1; 6], [1, 1, 6]);
        let targets = poses(vec![0.1; 12], [1, 2, 6]);

        let err = loss.forward(preds, targets).unwrap_err();
        assert!(matches!(err, PoseError::ShapeMismatch { .. }));
    }

    #[test]
    fn rehoming_updates_device_affinity() {
        let loss = two_joint_loss(RegressionLossConfig::new());
        let device = <TestBackend as Backend>::Device::default();
        let loss = loss.to_device(device.clone());
        assert_eq!(loss.device(), &device);
    }
}
