//! 程序运行函数.

use crate::algos;
use crate::result::AblationResult;
use b0_berry::prelude::*;
use std::thread;
use utils::phantom;

/// 参与比较的收缩策略.
const STRATEGIES: [(&str, ShrinkStrategy); 2] = [
    ("distance-transform", ShrinkStrategy::DistanceTransform),
    ("centroid-radius", ShrinkStrategy::CentroidRadius),
];

/// 收缩比例 `0, 0.05, ..., 1`.
fn fractions() -> Vec<f64> {
    (0..=20).map(|i| i as f64 / 20.0).collect()
}

/// 实际运行.
pub fn run() -> AblationResult {
    let phantoms = phantom::standard_set();
    assert!(
        phantoms.iter().all(|p| !p.mask.is_empty()),
        "Phantom generation error"
    );
    let fractions = fractions();
    let (p, f) = (phantoms.as_slice(), fractions.as_slice());

    log::info!(
        "Running ablation studies on {} phantom(s) x {} fraction(s)...",
        p.len(),
        f.len()
    );
    thread::scope(|s| {
        let spawn = |st| s.spawn(move || algos::sweep(st, p, f));
        let handles = STRATEGIES.map(|(_, st)| spawn(st));

        STRATEGIES
            .into_iter()
            .map(|(name, _)| name)
            .zip(
                handles
                    .into_iter()
                    .map(|th| th.join().expect("Thread joining error")),
            )
            .collect()
    })
}
