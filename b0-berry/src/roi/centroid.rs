use crate::config::Connectivity;
use crate::{Idx2d, Idx2dF, InteriorRoi, PhantomMask};
use binary_heap_plus::BinaryHeap;
use ndarray::Array2;
use std::collections::HashSet;

/// 以质心为中心提取圆形 ROI 所需要维护的相关数据结构.
pub struct RoiGenerator<'a> {
    mask: &'a PhantomMask,
    center: Idx2dF,
}

impl<'a> RoiGenerator<'a> {
    /// 以 `mask` 的质心为中心. `mask` 为空时返回 `None`.
    pub fn new(mask: &'a PhantomMask) -> Option<Self> {
        mask.centroid().map(|center| Self { mask, center })
    }

    /// 质心 (高, 宽).
    #[inline]
    pub fn center(&self) -> Idx2dF {
        self.center
    }

    /// 计算 `self.center` 到 `point` 的欧氏距离的平方, 单位为像素^2.
    #[inline]
    fn center_distance_to_squared(&self, &(h, w): &Idx2d) -> f64 {
        (h as f64 - self.center.0).powi(2) + (w as f64 - self.center.1).powi(2)
    }

    /// 掩膜内像素到质心的最大距离的平方.
    pub fn max_radius_squared(&self) -> f64 {
        self.mask
            .positions()
            .map(|p| self.center_distance_to_squared(&p))
            .fold(0.0, f64::max)
    }

    /// 以 `self.center` 为中心, 提取距离平方不大于 `radius_sq`
    /// 的圆内所有前景像素索引.
    ///
    /// 从离质心最近的整数像素出发, 按距离由近及远扩展 4-邻居.
    /// 圆与图像矩形之交是 4-连通的, 因此扩展会恰好覆盖整个圆.
    pub fn extract_roi(&self, radius_sq: f64) -> Vec<Idx2d> {
        let (height, width) = self.mask.shape();
        let start = (
            (self.center.0.round() as usize).min(height - 1),
            (self.center.1.round() as usize).min(width - 1),
        );

        // 堆顶距 `self.center` 最近
        let mut heap: BinaryHeap<Idx2d, _> = BinaryHeap::new_by(|a, b| {
            self.center_distance_to_squared(b)
                .total_cmp(&self.center_distance_to_squared(a))
        });
        heap.reserve(32);
        heap.push(start);
        let mut ans = Vec::with_capacity(32);
        let mut visited = HashSet::with_capacity(32);

        while let Some(pos) = heap.pop() {
            if self.center_distance_to_squared(&pos) > radius_sq {
                break;
            }
            if !visited.insert(pos) {
                continue;
            }
            ans.push(pos);

            for neigh in Connectivity::Four.neighbours(pos, |p| self.mask.check(p)) {
                if !visited.contains(&neigh) {
                    heap.push(neigh);
                }
            }
        }
        ans.retain(|p| self.mask[*p]);
        ans.shrink_to_fit();
        ans
    }
}

/// 质心-最大半径策略: 保留距质心不超过 `fraction * R` 的掩膜像素,
/// 其中 `R` 为掩膜像素到质心的最大距离.
pub(super) fn shrink_by_centroid(mask: &PhantomMask, fraction: f64) -> InteriorRoi {
    let Some(generator) = RoiGenerator::new(mask) else {
        return InteriorRoi::empty(mask.shape());
    };
    // 平方比较, 保证 `fraction == 1` 时恰好保留整个掩膜.
    let radius_sq = fraction * fraction * generator.max_radius_squared();
    let mut data = Array2::from_elem(mask.shape(), false);
    for pos in generator.extract_roi(radius_sq) {
        data[pos] = true;
    }
    InteriorRoi::new(data)
}
