mod profile;

use b0_berry::prelude::*;
use utils::phantom::{effective_radius, Phantom};

pub use profile::Profile;

/// 在所有 `phantoms` 上以升序的 `fractions` 运行收缩策略 `strategy`.
///
/// 同一模体上相邻比例的 ROI 必须满足包含关系, 否则记为一次单调性破坏.
pub fn sweep(strategy: ShrinkStrategy, phantoms: &[Phantom], fractions: &[f64]) -> Profile {
    debug_assert!(fractions.windows(2).all(|w| w[0] <= w[1]));

    let mut profile = Profile::new();
    for phantom in phantoms {
        log::info!("{strategy:?}: phantom `{}`...", phantom.name);
        let mut previous: Option<InteriorRoi> = None;
        for &f in fractions {
            profile.count_target(true);
            let roi = shrink(&phantom.mask, f, strategy);
            profile.target_elapsed();

            profile.count_roi(roi.count());
            if let Some(prev) = previous.as_ref() {
                if !prev.is_subset_of(roi.array_view()) {
                    log::warn!("{strategy:?}: `{}` not monotone at f = {f}", phantom.name);
                    profile.count_violation();
                }
            }
            previous = Some(roi);
        }

        let roi = shrink(&phantom.mask, DEFAULT_SHRINK_FRACTION, strategy);
        let ratio = effective_radius(roi.count()) / phantom.effective_radius();
        profile.record_radius_ratio(ratio);
    }
    profile.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::phantom;

    #[test]
    fn test_sweep_disk() {
        let phantoms = [phantom::disk((64, 64), (32.0, 32.0), 20.0)];
        let fractions = [0.0, 0.5, 0.85, 1.0];
        for strategy in [
            ShrinkStrategy::DistanceTransform,
            ShrinkStrategy::CentroidRadius,
        ] {
            let p = sweep(strategy, &phantoms, &fractions);
            assert_eq!(p.get_target(), 4);
            assert_eq!(p.get_violations(), 0);
            let ratio = p.get_avg_radius_ratio().unwrap();
            assert!(ratio > 0.75 && ratio < 0.95, "{strategy:?}: {ratio}");
        }
    }
}
