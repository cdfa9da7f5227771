//! 邻域索引.

use crate::config::Connectivity;
use crate::Idx2d;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

impl Connectivity {
    /// 按照连通规则获得 `pos` 的邻居索引, 并过滤掉不满足 `check` 的索引.
    pub(crate) fn neighbours(self, pos: Idx2d, check: impl Fn(Idx2d) -> bool) -> Vec<Idx2d> {
        match self {
            Connectivity::Four => neighbour4(pos).into_iter().filter(|p| check(*p)).collect(),
            Connectivity::Eight => neighbour8(pos).into_iter().filter(|p| check(*p)).collect(),
        }
    }
}
