//! 单元测试共用的合成数据.

use crate::{Idx2d, Idx2dF, Image, ImageMeta, TaggedImage};
use ndarray::Array2;

/// 1.5 T 扫描仪的成像频率, 单位 Hz.
pub(crate) const F0_HZ: f64 = 63.86e6;

/// 以 `center` 为圆心, `radius` 为半径的圆盘 (含边界).
pub(crate) fn disk(shape: Idx2d, center: Idx2dF, radius: f64) -> Array2<bool> {
    Array2::from_shape_fn(shape, |(h, w)| {
        (h as f64 - center.0).powi(2) + (w as f64 - center.1).powi(2) <= radius * radius
    })
}

/// 全零采样值, 元数据完整的图像.
pub(crate) fn image(name: &str, shape: Idx2d, echo_time_s: f64, order_key: f64) -> Image {
    let meta = ImageMeta::new(echo_time_s, F0_HZ, order_key);
    let tagged = TaggedImage::new(name, Array2::zeros(shape), meta);
    Image::try_from(tagged).unwrap()
}

/// 采样值为 `phase` (弧度) 的图像, 排序键为 0.
pub(crate) fn phase_image(name: &str, phase: Array2<f32>, echo_time_s: f64) -> Image {
    let meta = ImageMeta::new(echo_time_s, F0_HZ, 0.0);
    let tagged = TaggedImage::new(name, phase, meta);
    Image::try_from(tagged).unwrap()
}

/// 双回波圆盘模体: 每个回波 `slices` 个切片, 图像中心放置半径 `radius` 的圆盘.
///
/// 幅值在圆盘内为 100, 之外为 0. 第一回波相位在圆盘内为 0.25 rad,
/// 第二回波再加上 `delta_phase`; 圆盘外相位为 0. ΔTE = 0.01 s, f0 = [`F0_HZ`].
pub(crate) fn disk_phantom_echoes(
    shape: Idx2d,
    radius: f64,
    delta_phase: f32,
    slices: usize,
) -> Vec<TaggedImage> {
    let center = (shape.0 as f64 / 2.0, shape.1 as f64 / 2.0);
    let inside = disk(shape, center, radius);
    let magnitude = inside.mapv(|p| if p { 100.0f32 } else { 0.0 });
    let phase1 = inside.mapv(|p| if p { 0.25f32 } else { 0.0 });
    let phase2 = inside.mapv(|p| if p { 0.25f32 + delta_phase } else { 0.0 });

    let mut ans = Vec::with_capacity(2 * slices);
    for k in 0..slices {
        let key = k as f64;
        for (te, phase) in [(0.01, &phase1), (0.02, &phase2)] {
            let meta = ImageMeta::new(te, F0_HZ, key);
            let tagged = TaggedImage::new(format!("te{te}-z{k}"), phase.clone(), meta);
            ans.push(tagged.with_magnitude(magnitude.clone()));
        }
    }
    ans
}
