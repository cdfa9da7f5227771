use super::CompactMask;
use crate::config::Connectivity;
use crate::{Area2d, Areas2d, Idx2d, Idx2dF};
use ndarray::{Array2, ArrayView2, Zip};
use std::collections::VecDeque;
use std::io;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 模体掩膜: 与切片同形状, 仅在模体最大连通区域内为 `true`.
///
/// 全 `false` 表示该切片没有检测到模体. 这是可报告的状态, 不是错误.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhantomMask {
    data: Array2<bool>,
}

/// 内部 ROI: 由 [`PhantomMask`] 向内收缩得到, 总是其子集.
///
/// 模体掩膜为空时, 内部 ROI 也为空.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteriorRoi {
    data: Array2<bool>,
}

/// 掩膜不可变方法集合.
macro_rules! impl_mask_immut {
    ($mask: ty) => {
        /// 不可变方法集合.
        impl $mask {
            /// 直接初始化. 调用方负责保证掩膜语义.
            #[inline]
            pub(crate) fn new(data: Array2<bool>) -> Self {
                Self { data }
            }

            /// 创建形状为 `shape` 的全 `false` 掩膜.
            #[inline]
            pub fn empty(shape: Idx2d) -> Self {
                Self::new(Array2::from_elem(shape, false))
            }

            /// 从压缩存储恢复掩膜.
            ///
            /// # 返回值
            ///
            /// 压缩数据损坏时返回 `io::Error`.
            pub fn from_compact(compact: &CompactMask) -> io::Result<Self> {
                compact.decompress().map(Self::new)
            }

            /// 压缩存储该掩膜.
            #[inline]
            pub fn compress(&self) -> CompactMask {
                CompactMask::from_view(self.data.view())
            }

            /// 获得底层数据的不可变视图.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<'_, bool> {
                self.data.view()
            }

            /// 直接获得底层数据.
            #[inline]
            pub fn into_raw(self) -> Array2<bool> {
                self.data
            }

            /// 掩膜形状 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 像素总个数.
            #[inline]
            pub fn size(&self) -> usize {
                self.data.len()
            }

            /// 高.
            #[inline]
            pub fn height(&self) -> usize {
                self.data.nrows()
            }

            /// 宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.data.ncols()
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                h < self.height() && w < self.width()
            }

            /// 掩膜内 (值为 `true`) 的像素个数.
            #[inline]
            pub fn count(&self) -> usize {
                self.data.iter().filter(|&&p| p).count()
            }

            /// 掩膜是否为空 (全 `false`)?
            #[inline]
            pub fn is_empty(&self) -> bool {
                !self.data.iter().any(|&p| p)
            }

            /// `pos` 是否在掩膜内. 越界时返回 `false`.
            #[inline]
            pub fn contains(&self, pos: Idx2d) -> bool {
                self.data.get(pos).copied().unwrap_or(false)
            }

            /// 获取给定位置的值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<bool> {
                self.data.get(pos).copied()
            }

            /// 行优先遍历所有位置.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                ndarray::indices(self.shape()).into_iter()
            }

            /// 行优先遍历掩膜内的所有位置.
            #[inline]
            pub fn positions(&self) -> impl Iterator<Item = Idx2d> + '_ {
                self.data
                    .indexed_iter()
                    .filter_map(|(pos, &p)| p.then_some(pos))
            }

            /// 掩膜内像素的质心 (高, 宽). 掩膜为空时返回 `None`.
            pub fn centroid(&self) -> Option<Idx2dF> {
                let (n, sh, sw) = self
                    .positions()
                    .fold((0usize, 0.0, 0.0), |(n, sh, sw), (h, w)| {
                        (n + 1, sh + h as f64, sw + w as f64)
                    });
                (n > 0).then(|| (sh / n as f64, sw / n as f64))
            }

            /// 该掩膜是否为 `other` 的子集? 形状不同时返回 `false`.
            pub fn is_subset_of(&self, other: ArrayView2<'_, bool>) -> bool {
                self.data.dim() == other.dim()
                    && Zip::from(&self.data)
                        .and(&other)
                        .all(|&mine, &theirs| !mine || theirs)
            }

            /// 按照 `connectivity` 规则获取掩膜内的所有连通区域.
            /// 区域按照其第一个像素的行优先顺序排列.
            #[inline]
            pub fn areas(&self, connectivity: Connectivity) -> Areas2d {
                areas_of(self.data.view(), true, connectivity)
            }
        }

        impl Index<Idx2d> for $mask {
            type Output = bool;

            #[inline]
            fn index(&self, index: Idx2d) -> &Self::Output {
                &self.data[index]
            }
        }
    };
}
impl_mask_immut!(PhantomMask);
impl_mask_immut!(InteriorRoi);

/// 按照 `connectivity` 规则, 获取 `data` 中所有值为 `value` 的连通区域.
///
/// 两个像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到 `p2`
/// 的相邻路径, 且路径上所有像素的值都是 `value`. 区域按照其第一个像素
/// (行优先) 的顺序排列, 区域内像素按照 BFS 顺序排列.
pub(crate) fn areas_of(
    data: ArrayView2<'_, bool>,
    value: bool,
    connectivity: Connectivity,
) -> Areas2d {
    let (height, width) = data.dim();
    let inside = |(h, w): Idx2d| h < height && w < width;

    let mut ans = Areas2d::with_capacity(1);
    let mut visited = Array2::from_elem((height, width), false);
    let mut bfs_q = VecDeque::with_capacity(16);

    for (pos, &pixel) in data.indexed_iter() {
        if pixel != value || visited[pos] {
            continue;
        }
        visited[pos] = true;
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(16);
        while let Some(cur_pos) = bfs_q.pop_front() {
            this_area.push(cur_pos);
            for neigh in connectivity.neighbours(cur_pos, inside) {
                if data[neigh] == value && !visited[neigh] {
                    visited[neigh] = true;
                    bfs_q.push_back(neigh);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// 将 `data` 中的背景孔洞 (即不接触图像边界的 4-连通背景区域)
/// 填充为前景. 如果以此法修改了原图则返回 `true`, 否则返回 `false`.
pub(crate) fn fill_holes(data: &mut Array2<bool>) -> bool {
    let (height, width) = data.dim();
    let at_border = |&(h, w): &Idx2d| h == 0 || w == 0 || h + 1 == height || w + 1 == width;

    let mut non_trivial = false;
    for area in areas_of(data.view(), false, Connectivity::Four) {
        if area.iter().any(at_border) {
            continue;
        }
        non_trivial = true;
        for pos in area {
            data[pos] = true;
        }
    }
    non_trivial
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ring() -> Array2<bool> {
        // 5x5, 中间有一个孔的环.
        let mut a = Array2::from_elem((5, 5), false);
        for h in 1..4 {
            for w in 1..4 {
                a[(h, w)] = true;
            }
        }
        a[(2, 2)] = false;
        a
    }

    #[test]
    fn test_basic_queries() {
        let m = PhantomMask::new(ring());
        assert_eq!(m.shape(), (5, 5));
        assert_eq!(m.size(), 25);
        assert_eq!(m.count(), 8);
        assert!(!m.is_empty());
        assert!(m.contains((1, 1)));
        assert!(!m.contains((2, 2)));
        assert!(!m.contains((100, 0)));
        assert_eq!(m.get((100, 0)), None);
        assert!(m[(3, 3)]);
        assert_eq!(m.positions().count(), 8);
        assert_eq!(m.pos_iter().count(), 25);
        assert_eq!(m.pos_iter().nth(6), Some((1, 1)));
        assert_eq!(m.centroid(), Some((2.0, 2.0)));
        assert_eq!(PhantomMask::empty((3, 4)).centroid(), None);
        assert!(InteriorRoi::empty((3, 4)).is_empty());
    }

    #[test]
    fn test_areas_connectivity() {
        let a = array![
            [true, false, false],
            [false, true, false],
            [false, false, true],
        ];
        assert_eq!(areas_of(a.view(), true, Connectivity::Four).len(), 3);
        let n8 = areas_of(a.view(), true, Connectivity::Eight);
        assert_eq!(n8.len(), 1);
        assert_eq!(n8[0].len(), 3);
        // 背景在 4-邻接下也是两块.
        assert_eq!(areas_of(a.view(), false, Connectivity::Four).len(), 2);
    }

    #[test]
    fn test_areas_ordered_by_first_pixel() {
        let a = array![[false, false, true], [true, false, false]];
        let areas = areas_of(a.view(), true, Connectivity::Four);
        assert_eq!(areas, vec![vec![(0, 2)], vec![(1, 0)]]);
    }

    #[test]
    fn test_fill_holes() {
        let mut a = ring();
        assert!(fill_holes(&mut a));
        assert!(a[(2, 2)]);
        assert_eq!(a.iter().filter(|&&p| p).count(), 9);
        // 再次填充不会改变任何东西.
        assert!(!fill_holes(&mut a));
    }

    #[test]
    fn test_fill_holes_keeps_border_background() {
        // 一个开口的 "C" 形: 开口接触边界, 不是孔洞.
        let mut a = array![
            [false, false, false, false],
            [false, true, true, true],
            [false, true, false, false],
            [false, true, true, true],
        ];
        let before = a.clone();
        assert!(!fill_holes(&mut a));
        assert_eq!(a, before);
    }

    #[test]
    fn test_is_subset_of() {
        let big = PhantomMask::new(ring());
        let mut small = Array2::from_elem((5, 5), false);
        small[(1, 1)] = true;
        let small = InteriorRoi::new(small);
        assert!(small.is_subset_of(big.array_view()));
        assert!(!big.is_subset_of(small.array_view()));
        assert!(!small.is_subset_of(Array2::from_elem((4, 4), true).view()));
        assert!(InteriorRoi::empty((5, 5)).is_subset_of(big.array_view()));
    }
}
