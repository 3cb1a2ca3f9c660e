use roleta_core::{derive_floats, resolve, verify_spin, PrizeOption, ProvablyFairRng, Promotion, RandomSource};

struct Fixed(f64);

impl RandomSource for Fixed {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

fn wheel(weights: &[f64]) -> Vec<PrizeOption> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| PrizeOption::new(format!("prize {i}"), *w, "#123456"))
        .collect()
}

#[test]
fn rng_repeatable() {
    let rng1 = ProvablyFairRng::new("s", "c", 42);
    let rng2 = ProvablyFairRng::new("s", "c", 42);
    assert_eq!(derive_floats(&rng1.hmac_bytes(), 10), derive_floats(&rng2.hmac_bytes(), 10));
    assert_eq!(rng1.next_unit(), rng2.next_unit());
}

#[test]
fn concrete_scenarios() {
    let ab = vec![PrizeOption::new("A", 70.0, "#f00"), PrizeOption::new("B", 30.0, "#0f0")];
    assert_eq!(resolve(&ab, &Fixed(0.50)).unwrap(), 0);
    assert_eq!(resolve(&ab, &Fixed(0.85)).unwrap(), 1);

    let xy = vec![PrizeOption::new("X", 0.0, "#f00"), PrizeOption::new("Y", 0.0, "#0f0")];
    for n in 0..50u64 {
        let rng = ProvablyFairRng::new("server", "client", n);
        assert_eq!(resolve(&xy, &rng).unwrap(), 0);
    }
}

#[test]
fn frequencies_converge_to_weights() {
    let weights = [12.0, 30.0, 15.0, 20.0, 10.0, 5.0, 8.0];
    let options = wheel(&weights);
    let total: f64 = weights.iter().sum();
    let draws = 40_000u64;
    let mut hits = vec![0u64; weights.len()];
    for n in 0..draws {
        let rng = ProvablyFairRng::new("server", "client", n);
        hits[resolve(&options, &rng).unwrap()] += 1;
    }
    for (i, w) in weights.iter().enumerate() {
        let observed = hits[i] as f64 / draws as f64;
        let expected = w / total;
        // several standard deviations at this sample size
        assert!((observed - expected).abs() < 0.015, "index {i}: {observed} vs {expected}");
    }
}

#[test]
fn unreachable_zero_weight_option() {
    let options = wheel(&[3.0, 0.0, 1.0]);
    for n in 0..2_000u64 {
        let rng = ProvablyFairRng::new("server", "client", n);
        assert_ne!(resolve(&options, &rng).unwrap(), 1);
    }
}

#[test]
fn result_always_indexes_options() {
    let options = Promotion::starter("s", "S").options;
    for n in 0..1_000u64 {
        let rng = ProvablyFairRng::new("server", "client", n);
        let idx = resolve(&options, &rng).unwrap();
        assert!(idx < options.len());
        assert!(verify_spin("server", "client", n, &options, idx));
    }
}
