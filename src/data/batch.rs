use burn::tensor::{backend::Backend, Bool, Int, Tensor};
use tracing::debug;

use crate::device::DeviceResolver;
use crate::error::{PoseError, Result};
use crate::utils::{count_true, replicate_pad_left};

/// One aligned source/target pair as it leaves the data iterator:
/// tokenized gloss ids on the source side, optionally a padded joint
/// coordinate sequence on the target side.
#[derive(Clone, Debug)]
pub struct RawBatch<B: Backend> {
    pub src: Tensor<B, 2, Int>,        // [N, T_src]
    pub src_lengths: Tensor<B, 1, Int>, // [N]
    pub trg: Option<Tensor<B, 3>>,     // [N, T_trg, 3 * J]
    pub file_paths: Vec<String>,
}

/// A fully assembled training batch: masked, shaped and placed on the
/// compute device. Owns all of its tensors and lives for one step.
#[derive(Clone, Debug)]
pub struct PoseBatch<B: Backend> {
    pub src: Tensor<B, 2, Int>,
    pub src_lengths: Tensor<B, 1, Int>,
    pub src_mask: Tensor<B, 3, Bool>, // [N, 1, T_src]
    pub nseqs: usize,
    pub trg_input: Option<Tensor<B, 3>>,
    pub trg: Option<Tensor<B, 3>>,
    pub trg_mask: Option<Tensor<B, 4, Bool>>, // [N, 1, T, T]
    pub trg_lengths: Option<usize>,
    pub ntokens: Option<usize>,
    pub file_paths: Vec<String>,
}

/// Turns raw pairs into [`PoseBatch`]es. Constructed once per run with
/// the padding convention and the shared device resolver.
#[derive(Clone, Debug)]
pub struct PoseBatcher<B: Backend> {
    pad_index: i64,
    target_pad: f64,
    resolver: DeviceResolver<B>,
}

impl<B: Backend> PoseBatcher<B> {
    pub fn new(pad_index: i64, target_pad: f64, resolver: DeviceResolver<B>) -> Self {
        Self {
            pad_index,
            target_pad,
            resolver,
        }
    }

    pub fn assemble(&self, raw: RawBatch<B>) -> Result<PoseBatch<B>> {
        let [nseqs, src_len] = raw.src.dims();

        let src_mask: Tensor<B, 3, Bool> = raw
            .src
            .clone()
            .equal_elem(self.pad_index)
            .bool_not()
            .unsqueeze_dim(1);

        let mut trg_input = None;
        let mut trg_out = None;
        let mut trg_mask = None;
        let mut trg_lengths = None;
        let mut ntokens = None;

        if let Some(trg) = raw.trg {
            let [trg_n, trg_len, width] = trg.dims();
            if trg_n != nseqs {
                return Err(PoseError::ShapeMismatch {
                    lhs: "src",
                    lhs_dims: vec![nseqs, src_len],
                    rhs: "trg",
                    rhs_dims: vec![trg_n, trg_len, width],
                });
            }

            // Both sides of the pair keep the full-length frame sequence;
            // any temporal shift for teacher forcing is the model's job.
            let input = trg.clone();

            // The target pad is dynamic, padded frames are excluded from
            // the loss downstream through this mask.
            let frame_mask: Tensor<B, 4, Bool> = input
                .clone()
                .equal_elem(self.target_pad)
                .bool_not()
                .unsqueeze_dim(1);
            trg_mask = Some(square_mask(frame_mask, nseqs, trg_len, width));

            // Token statistics are taken against the source pad id,
            // mirroring what the training loop reports for text batches.
            ntokens = Some(count_true(
                trg.clone().equal_elem(self.pad_index as f64).bool_not(),
            ));

            trg_input = Some(input);
            trg_out = Some(trg);
            trg_lengths = Some(trg_len);
        }

        debug!(nseqs, src_len, "assembled pose batch");

        Ok(PoseBatch {
            src: self.resolver.place(raw.src),
            // lengths stay host-side, they only feed bookkeeping
            src_lengths: raw.src_lengths,
            src_mask: self.resolver.place(src_mask),
            nseqs,
            trg_input: trg_input.map(|t| self.resolver.place(t)),
            trg: trg_out.map(|t| self.resolver.place(t)),
            trg_mask: trg_mask.map(|t| self.resolver.place(t)),
            trg_lengths,
            ntokens,
            file_paths: raw.file_paths,
        })
    }
}

/// Makes the last two axes of the target mask square so it broadcasts
/// against attention-shaped structures: the feature axis is grown by
/// replicating its leading edge column when the time axis is longer, or
/// truncated from the left when it is shorter.
fn square_mask<B: Backend>(
    mask: Tensor<B, 4, Bool>,
    nseqs: usize,
    trg_len: usize,
    width: usize,
) -> Tensor<B, 4, Bool> {
    if trg_len > width {
        replicate_pad_left(mask, trg_len - width)
    } else if width > trg_len {
        mask.slice([0..nseqs, 0..1, 0..trg_len, width - trg_len..width])
    } else {
        mask
    }
}
