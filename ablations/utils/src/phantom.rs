//! 合成模体. 每个模体先生成 100/0 的幅值图, 再交给 `b0_berry` 的分割器得到掩膜,
//! 这样消融实验与真实流水线看到的是同一种掩膜.

use b0_berry::prelude::*;
use ndarray::Array2;

/// 模体幅值.
const INTENSITY: f32 = 100.0;

/// 一个带名字的合成模体.
#[derive(Clone, Debug)]
pub struct Phantom {
    pub name: &'static str,
    pub mask: PhantomMask,
}

impl Phantom {
    /// 由形状谓词 `inside(h, w)` 生成模体.
    pub fn from_fn<F: Fn(f64, f64) -> bool>(name: &'static str, shape: Idx2d, inside: F) -> Self {
        let intensity = Array2::from_shape_fn(shape, |(h, w)| {
            if inside(h as f64, w as f64) {
                INTENSITY
            } else {
                0.0
            }
        });
        let mask = segment_phantom(intensity.view(), &QcConfig::default());
        Self { name, mask }
    }

    /// 掩膜面积对应的等效圆半径 `sqrt(area / π)`.
    #[inline]
    pub fn effective_radius(&self) -> f64 {
        effective_radius(self.mask.count())
    }
}

/// 面积 `area` 对应的等效圆半径.
#[inline]
pub fn effective_radius(area: usize) -> f64 {
    (area as f64 / std::f64::consts::PI).sqrt()
}

/// 圆心 `center`, 半径 `r` 的圆盘.
pub fn disk(shape: Idx2d, center: Idx2dF, r: f64) -> Phantom {
    Phantom::from_fn("disk", shape, move |h, w| {
        (h - center.0).powi(2) + (w - center.1).powi(2) <= r * r
    })
}

/// 半轴为 `(a, b)` 的轴对齐椭圆.
pub fn ellipse(shape: Idx2d, center: Idx2dF, (a, b): Idx2dF) -> Phantom {
    Phantom::from_fn("ellipse", shape, move |h, w| {
        ((h - center.0) / a).powi(2) + ((w - center.1) / b).powi(2) <= 1.0
    })
}

/// 一侧被咬掉一块的圆盘, 质心偏离几何中心.
pub fn bitten_disk(shape: Idx2d, center: Idx2dF, r: f64) -> Phantom {
    let bite = (center.0, center.1 + r);
    Phantom::from_fn("bitten-disk", shape, move |h, w| {
        let in_disk = (h - center.0).powi(2) + (w - center.1).powi(2) <= r * r;
        let in_bite = (h - bite.0).powi(2) + (w - bite.1).powi(2) <= (r / 2.0).powi(2);
        in_disk && !in_bite
    })
}

/// 被图像边界截断的圆盘.
pub fn clipped_disk(shape: Idx2d, r: f64) -> Phantom {
    let center = (shape.0 as f64 / 2.0, r / 2.0);
    let mut ans = disk(shape, center, r);
    ans.name = "clipped-disk";
    ans
}

/// 消融实验使用的标准模体集合.
pub fn standard_set() -> Vec<Phantom> {
    const SHAPE: Idx2d = (128, 128);
    let center = (64.0, 64.0);
    vec![
        disk(SHAPE, center, 40.0),
        disk(SHAPE, (40.5, 80.5), 20.0),
        ellipse(SHAPE, center, (30.0, 50.0)),
        bitten_disk(SHAPE, center, 40.0),
        clipped_disk(SHAPE, 40.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_set_segmented() {
        let set = standard_set();
        assert_eq!(set.len(), 5);
        for p in set.iter() {
            assert!(!p.mask.is_empty(), "{} not found", p.name);
            assert_eq!(p.mask.shape(), (128, 128));
        }
    }

    #[test]
    fn test_disk_radius() {
        let p = disk((128, 128), (64.0, 64.0), 40.0);
        assert!((p.effective_radius() - 40.0).abs() < 1.0);
    }

    #[test]
    fn test_bite_moves_centroid() {
        let p = bitten_disk((128, 128), (64.0, 64.0), 40.0);
        let (_, cw) = p.mask.centroid().unwrap();
        assert!(cw < 64.0);
        assert!(!p.mask.contains((64, 103)));
    }

    #[test]
    fn test_sep_to() {
        let mut buf = Vec::new();
        crate::sep_to(&mut buf).unwrap();
        assert_eq!(buf.len(), crate::SEP.len() + 1);
    }
}
