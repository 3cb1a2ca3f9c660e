use crate::{
    error::{WheelError, WheelResult},
    rng::{ProvablyFairRng, RandomSource},
    wheel::{check_total, check_weight, PrizeOption},
};

/// Draws one option index with probability `weight / total`.
///
/// The walk uses an inclusive `r <= cumulative` compare. A wheel whose
/// weights are all zero draws `r = 0`, so the first option always wins;
/// operators should avoid such wheels but they are not an error. Only an
/// empty list, a weight that is negative or not finite, or weights whose
/// sum overflows to infinity, is rejected.
pub fn resolve<R: RandomSource + ?Sized>(options: &[PrizeOption], rng: &R) -> WheelResult<usize> {
    resolve_weights(options.iter().map(|o| o.weight), rng)
}

pub fn resolve_weights<I, R>(weights: I, rng: &R) -> WheelResult<usize>
where
    I: IntoIterator<Item = f64>,
    R: RandomSource + ?Sized,
{
    let weights: Vec<f64> = weights.into_iter().collect();
    if weights.is_empty() {
        return Err(WheelError::invalid("cannot spin a wheel without options"));
    }
    for (i, w) in weights.iter().enumerate() {
        check_weight(i, *w)?;
    }

    let total: f64 = weights.iter().sum();
    check_total(total)?;
    let r = rng.next_unit() * total;

    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if r <= cumulative {
            return Ok(i);
        }
    }
    // not reachable for r < total; the first option is the fallback
    Ok(0)
}

/// Spin a wheel with the RNG derived from the seeds.
pub fn spin_with_seeds(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    options: &[PrizeOption],
) -> WheelResult<usize> {
    let rng = ProvablyFairRng::new(server_seed, client_seed, nonce);
    resolve(options, &rng)
}

/// Check a published result once the server seed has been revealed.
pub fn verify_spin(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    options: &[PrizeOption],
    expected_index: usize,
) -> bool {
    spin_with_seeds(server_seed, client_seed, nonce, options)
        .map(|idx| idx == expected_index)
        .unwrap_or(false)
}
