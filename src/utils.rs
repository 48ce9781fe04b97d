use burn::tensor::{backend::Backend, BasicOps, Bool, Tensor};

/// Left-pads the last axis of `x` by `amount`, replicating the leading
/// edge slice rather than zero-filling.
pub fn replicate_pad_left<B: Backend, const D: usize, K: BasicOps<B>>(
    x: Tensor<B, D, K>,
    amount: usize,
) -> Tensor<B, D, K> {
    if amount == 0 {
        return x;
    }

    let mut ranges = x.dims().map(|d| 0..d);
    ranges[D - 1] = 0..1;
    let edge = x.clone().slice(ranges);

    let mut parts = vec![edge; amount];
    parts.push(x);
    Tensor::cat(parts, D - 1)
}

/// Number of `true` elements in a boolean tensor.
pub fn count_true<B: Backend, const D: usize>(mask: Tensor<B, D, Bool>) -> usize {
    mask.into_data().value.iter().filter(|v| **v).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Data, Shape};

    type TestBackend = NdArray<f32>;

    #[test]
    fn replicate_pad_duplicates_the_edge_column() {
        let x: Tensor<TestBackend, 2> =
            Tensor::from_data(Data::new(vec![1.0, 2.0, 3.0, 4.0], Shape::new([4])).convert())
                .reshape([2, 2]);

        let padded = replicate_pad_left(x, 2);
        assert_eq!(padded.dims(), [2, 4]);
        assert_eq!(
            padded.into_data().value,
            vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0, 4.0]
        );
    }

    #[test]
    fn replicate_pad_zero_amount_is_identity() {
        let x: Tensor<TestBackend, 2> =
            Tensor::from_data(Data::new(vec![1.0, 2.0], Shape::new([2])).convert()).reshape([1, 2]);

        let padded = replicate_pad_left(x.clone(), 0);
        assert_eq!(padded.into_data().value, x.into_data().value);
    }

    #[test]
    fn count_true_counts_only_set_positions() {
        let x: Tensor<TestBackend, 1> =
            Tensor::from_data(Data::new(vec![0.0, 1.0, 0.0, 2.0], Shape::new([4])).convert());
        let mask = x.equal_elem(0.0).bool_not();
        assert_eq!(count_true(mask), 2);
    }
}
