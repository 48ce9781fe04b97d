use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Ordered list of joint-index pairs defining the bones of a pose.
///
/// The order is load-bearing: it fixes the bone axis of every derived
/// feature tensor, so it must stay stable for the lifetime of a run.
/// Bones are directed, the offset of bone `(a, b)` is `joint_a - joint_b`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    bones: Vec<(usize, usize)>,
}

impl Skeleton {
    pub fn new(bones: Vec<(usize, usize)>) -> Self {
        Self { bones }
    }

    pub fn bones(&self) -> &[(usize, usize)] {
        &self.bones
    }

    /// Number of bones.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Highest joint index referenced by any bone.
    pub fn max_joint(&self) -> usize {
        self.bones
            .iter()
            .map(|&(a, b)| a.max(b))
            .max()
            .unwrap_or(0)
    }

    /// Width of the flattened direction feature axis, three coordinates
    /// per bone.
    pub fn direction_width(&self) -> usize {
        3 * self.bones.len()
    }

    /// The default upper-body-plus-hands structure used for sign
    /// production, cached for the whole process.
    pub fn sign_pose() -> &'static Skeleton {
        &SIGN_POSE
    }
}

/// 50 joints, 50 bones: an 8-joint upper body and two 21-joint hands.
///
/// Joint layout: 0 nose, 1 neck, 2-4 right shoulder/elbow/wrist,
/// 5-7 left shoulder/elbow/wrist, 8 right hand root plus joints 9-28,
/// 29 left hand root plus joints 30-49. Each hand chains four bones per
/// finger off its root; the shoulder-to-shoulder bone (2, 5) is a
/// derived, non-tree bone.
static SIGN_POSE: Lazy<Skeleton> = Lazy::new(|| {
    let mut bones: Vec<(usize, usize)> = vec![
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (1, 5),
        (5, 6),
        (6, 7),
        (2, 5),
    ];

    for (wrist, root) in [(4, 8), (7, 29)] {
        bones.push((wrist, root));
        for finger in 0..5 {
            let base = root + 1 + finger * 4;
            bones.push((root, base));
            bones.push((base, base + 1));
            bones.push((base + 1, base + 2));
            bones.push((base + 2, base + 3));
        }
    }

    Skeleton::new(bones)
});
