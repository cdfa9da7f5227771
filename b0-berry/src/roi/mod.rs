//! 内部 ROI 收缩: 把模体掩膜向内收缩, 只对远离边缘的像素评分.
//!
//! 两种策略都满足:
//!
//! 1. 平移不变: 模体在图像平面内整体平移, ROI 随之平移;
//! 2. 单调: `f1 <= f2` 时 `shrink(f1) ⊆ shrink(f2)`;
//! 3. `f = 1` 返回整个模体掩膜, `f = 0` 返回空掩膜;
//! 4. 空模体掩膜返回空 ROI, 不报错.

mod centroid;
mod distance;

pub use centroid::RoiGenerator;
pub use distance::distance_transform;

use crate::config::ShrinkStrategy;
use crate::{InteriorRoi, PhantomMask};

/// 以比例 `fraction` 和策略 `strategy` 收缩模体掩膜.
///
/// # 注意
///
/// `fraction` 必须位于 `[0, 1]`, 否则 panic. 经过 [`crate::config::QcConfig::validate`]
/// 检查的配置总是满足该条件.
pub fn shrink(mask: &PhantomMask, fraction: f64, strategy: ShrinkStrategy) -> InteriorRoi {
    assert!(
        (0.0..=1.0).contains(&fraction),
        "shrink fraction {fraction} out of [0, 1]"
    );
    let roi = match strategy {
        ShrinkStrategy::DistanceTransform => distance::shrink_by_distance(mask, fraction),
        ShrinkStrategy::CentroidRadius => centroid::shrink_by_centroid(mask, fraction),
    };
    debug_assert!(roi.is_subset_of(mask.array_view()));
    log::debug!(
        "{strategy:?} shrink by {fraction}: {} -> {} pixel(s)",
        mask.count(),
        roi.count()
    );
    roi
}
