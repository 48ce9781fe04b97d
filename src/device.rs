use burn::tensor::{backend::Backend, BasicOps, Tensor};

/// Resolves where batch and loss tensors should live.
///
/// The accelerator kind itself (CUDA, wgpu, CPU) is fixed by the backend
/// type parameter, so at runtime the choice reduces to: an explicitly
/// supplied device wins, otherwise the backend's default device is used.
/// When accelerator use is not requested at all, tensors are left on
/// whatever device they were created on.
///
/// One resolver is constructed per run and shared by the batcher and the
/// loss, so both always agree on placement.
#[derive(Clone, Debug)]
pub struct DeviceResolver<B: Backend> {
    explicit: Option<B::Device>,
    use_accelerator: bool,
}

impl<B: Backend> DeviceResolver<B> {
    pub fn new(explicit: Option<B::Device>, use_accelerator: bool) -> Self {
        Self {
            explicit,
            use_accelerator,
        }
    }

    /// Resolver that never moves tensors.
    pub fn cpu() -> Self {
        Self::new(None, false)
    }

    /// The device tensors should be moved to, if any.
    pub fn resolve(&self) -> Option<B::Device> {
        if !self.use_accelerator {
            return None;
        }

        Some(self.explicit.clone().unwrap_or_else(B::Device::default))
    }

    /// Moves `tensor` to the resolved device, a no-op when placement is
    /// not requested.
    pub fn place<const D: usize, K: BasicOps<B>>(&self, tensor: Tensor<B, D, K>) -> Tensor<B, D, K> {
        match self.resolve() {
            Some(device) => tensor.to_device(&device),
            None => tensor,
        }
    }
}
