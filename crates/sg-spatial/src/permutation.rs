//! Deterministic random streams for permutation inference.

use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;

/// Independent stream for `stream` (a segment index) under `seed`, so
/// results do not depend on thread scheduling.
pub(crate) fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// `k` distinct indices from `0..n` excluding `skip`.
pub(crate) fn sample_excluding(
    rng: &mut ChaCha8Rng,
    n: usize,
    skip: usize,
    k: usize,
) -> Vec<usize> {
    index::sample(rng, n - 1, k)
        .into_iter()
        .map(|j| if j >= skip { j + 1 } else { j })
        .collect()
}

/// Folded pseudo p-value: `(min(larger, perms - larger) + 1) / (perms + 1)`.
pub(crate) fn folded_p(larger: usize, perms: usize) -> f64 {
    let tail = larger.min(perms - larger);
    (tail + 1) as f64 / (perms + 1) as f64
}
