//! Synthetic inputs with known run structure.
//!
//! All generators are seeded so a failing input can be reproduced.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `len` copies of `symbol`.
pub fn repeated(symbol: u8, len: usize) -> Vec<u8> {
    vec![symbol; len]
}

/// Uniformly random bytes; almost no runs.
pub fn random(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

/// Runs of random symbols from the first `alphabet` byte values, with run
/// lengths uniform in `1..=2 * mean_run`.
pub fn runs(len: usize, mean_run: usize, alphabet: u8, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let max_run = (2 * mean_run).max(1);
    let alphabet = alphabet.max(1);
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        let symbol = rng.gen_range(0..alphabet);
        let run = rng.gen_range(1..=max_run).min(len - data.len());
        data.extend(std::iter::repeat(symbol).take(run));
    }
    data
}

/// Random bytes where roughly `share` of all positions hold `symbol`, in
/// short bursts. Exercises the single-symbol variants.
pub fn dominant(len: usize, symbol: u8, share: f64, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let share = share.clamp(0.0, 1.0);
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        let remaining = len - data.len();
        if rng.gen_bool(share) {
            let burst = rng.gen_range(1..=32).min(remaining);
            data.extend(std::iter::repeat(symbol).take(burst));
        } else {
            data.push(rng.gen());
        }
    }
    data
}

/// A named set of inputs covering the shapes the codecs special-case.
pub fn corpus(len: usize, seed: u64) -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("repeated", repeated(b'a', len)),
        ("random", random(len, seed)),
        ("short-runs", runs(len, 3, 4, seed)),
        ("long-runs", runs(len, 400, 8, seed)),
        ("dominant", dominant(len, 0, 0.7, seed)),
        ("tiny", random(len.min(3), seed)),
    ]
}
