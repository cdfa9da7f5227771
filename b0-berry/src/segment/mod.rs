//! 模体分割: Otsu 全局阈值, 孔洞填充, 保留面积最大的连通区域.

mod otsu;

pub use otsu::OtsuThreshold;

use crate::config::QcConfig;
use crate::data::{areas_of, fill_holes};
use crate::{Area2d, PhantomMask};
use ndarray::{Array2, ArrayView2};

/// 在强度参考图 `reference` 上分割模体.
///
/// 1. 以 [`OtsuThreshold`] 二值化 (`config.histogram_bins` 个箱);
/// 2. 若 `config.fill_holes`, 把不接触图像边界的背景孔洞填为前景;
/// 3. 按 `config.connectivity` 标记连通区域, 保留像素个数最多的一个.
///    面积并列时保留行优先顺序下最先出现的区域.
///
/// # 注意
///
/// `reference` 必须是非负强度 (幅值); 参见 [`crate::Image::reference`].
///
/// # 返回值
///
/// 没有任何前景时 (例如全零切片) 返回全 `false` 的掩膜, 而不是错误.
pub fn segment_phantom(reference: ArrayView2<'_, f32>, config: &QcConfig) -> PhantomMask {
    let shape = reference.dim();
    let Some(threshold) = OtsuThreshold::compute(reference, config.histogram_bins) else {
        log::debug!("no separable intensities, phantom not found");
        return PhantomMask::empty(shape);
    };
    log::debug!(
        "otsu threshold {:.4} (bin {})",
        threshold.value(),
        threshold.split_bin()
    );

    let mut binary = reference.mapv(|v| threshold.is_foreground(v));
    if config.fill_holes && fill_holes(&mut binary) {
        log::debug!("filled background hollows inside the phantom");
    }

    let areas = areas_of(binary.view(), true, config.connectivity);
    log::debug!(
        "{} component(s), areas {:?}",
        areas.len(),
        areas.iter().map(Vec::len).collect::<Vec<_>>()
    );
    match largest_area(areas) {
        Some(area) => {
            let mut data = Array2::from_elem(shape, false);
            for pos in area {
                data[pos] = true;
            }
            PhantomMask::new(data)
        }
        None => PhantomMask::empty(shape),
    }
}

/// 面积最大的区域. 并列时取第一个.
fn largest_area<I: IntoIterator<Item = Area2d>>(areas: I) -> Option<Area2d> {
    areas
        .into_iter()
        .reduce(|best, a| if a.len() > best.len() { a } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Connectivity;
    use crate::testing::disk;

    fn intensity(mask: &Array2<bool>) -> Array2<f32> {
        mask.mapv(|p| if p { 100.0 } else { 0.0 })
    }

    #[test]
    fn test_disk_segmented_exactly() {
        let d = disk((64, 64), (32.0, 32.0), 25.0);
        let mask = segment_phantom(intensity(&d).view(), &QcConfig::default());
        assert_eq!(mask.array_view(), d.view());
    }

    #[test]
    fn test_all_zero_slice_is_empty() {
        let mask = segment_phantom(Array2::zeros((16, 16)).view(), &QcConfig::default());
        assert!(mask.is_empty());
        assert_eq!(mask.shape(), (16, 16));
    }

    #[test]
    fn test_largest_component_kept() {
        let mut d = disk((64, 64), (20.0, 20.0), 10.0);
        d |= &disk((64, 64), (50.0, 50.0), 5.0);
        let mask = segment_phantom(intensity(&d).view(), &QcConfig::default());
        assert!(mask.contains((20, 20)));
        assert!(!mask.contains((50, 50)));
        let big = disk((64, 64), (20.0, 20.0), 10.0);
        assert_eq!(mask.count(), big.iter().filter(|&&p| p).count());
    }

    #[test]
    fn test_tie_prefers_first_in_row_major_order() {
        let mut a = Array2::from_elem((6, 6), false);
        a[(1, 4)] = true;
        a[(1, 1)] = true;
        let cfg = QcConfig::default().with_connectivity(Connectivity::Four);
        let mask = segment_phantom(intensity(&a).view(), &cfg);
        assert_eq!(mask.positions().collect::<Vec<_>>(), vec![(1, 1)]);
    }

    #[test]
    fn test_hole_filling() {
        let mut d = disk((64, 64), (32.0, 32.0), 20.0);
        // 模体内部的低信号特征.
        for h in 28..36 {
            for w in 28..36 {
                d[(h, w)] = false;
            }
        }
        let img = intensity(&d);

        let filled = segment_phantom(img.view(), &QcConfig::default());
        assert!(filled.contains((32, 32)));

        let raw = segment_phantom(img.view(), &QcConfig::default().with_fill_holes(false));
        assert!(!raw.contains((32, 32)));
        assert_eq!(filled.count() - raw.count(), 64);
    }

    #[test]
    fn test_connectivity_matters() {
        // 两个仅在对角相接的方块.
        let mut a = Array2::from_elem((8, 8), false);
        for h in 1..4 {
            for w in 1..4 {
                a[(h, w)] = true;
                a[(h + 3, w + 3)] = true;
            }
        }
        let img = intensity(&a);
        let four = QcConfig::default().with_connectivity(Connectivity::Four);
        assert_eq!(segment_phantom(img.view(), &four).count(), 9);
        let eight = QcConfig::default().with_connectivity(Connectivity::Eight);
        assert_eq!(segment_phantom(img.view(), &eight).count(), 18);
    }

    #[test]
    fn test_deterministic() {
        let d = disk((48, 40), (20.3, 17.8), 12.5);
        let img = intensity(&d);
        let cfg = QcConfig::default();
        let first = segment_phantom(img.view(), &cfg);
        assert_eq!(first, segment_phantom(img.view(), &cfg));
    }
}
