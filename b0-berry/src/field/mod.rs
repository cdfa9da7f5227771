//! 场图估计: 双回波缠绕相位差 → Hz → ppm.

mod phase;

pub use phase::{wrapped_difference, PhaseScale};

use crate::config::QcConfig;
use crate::consts::{MIN_DELTA_TE_S, MIN_IMAGING_FREQUENCY_HZ, PPM};
use crate::{EchoPair, Image, InteriorRoi, QcError, Result};
use ndarray::{Array2, ArrayView2, Zip};
use ordered_float::OrderedFloat;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个切片的场偏移图, 单位 ppm.
///
/// 在整幅图像上都有定义 (便于可视化整个模体), 但只有内部 ROI 内的值参与评分.
/// 无法计算的像素 (输入非有限) 为 NaN.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMap {
    ppm: Array2<f64>,
    imaging_frequency_hz: f64,
}

impl FieldMap {
    /// ppm 图的不可变视图.
    #[inline]
    pub fn ppm(&self) -> ArrayView2<'_, f64> {
        self.ppm.view()
    }

    /// 换算回 Hz 的场偏移图.
    pub fn hz(&self) -> Array2<f64> {
        let scale = self.imaging_frequency_hz / PPM;
        self.ppm.mapv(|v| v * scale)
    }

    /// 归一化所用的成像频率, 单位 Hz.
    #[inline]
    pub fn imaging_frequency_hz(&self) -> f64 {
        self.imaging_frequency_hz
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f64> {
        self.ppm
    }

    /// `roi` 内有限像素的 |ppm| 最大值. `roi` 内没有有限像素时返回 `None`.
    ///
    /// # 注意
    ///
    /// `roi` 必须与场图同形状, 否则 panic.
    pub fn max_abs_within(&self, roi: &InteriorRoi) -> Option<f64> {
        let mut best: Option<OrderedFloat<f64>> = None;
        Zip::from(&self.ppm)
            .and(&roi.array_view())
            .for_each(|&v, &inside| {
                if inside && v.is_finite() {
                    let v = OrderedFloat(v.abs());
                    best = Some(best.map_or(v, |b| b.max(v)));
                }
            });
        best.map(OrderedFloat::into_inner)
    }
}

/// 由一对切片估计场图.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldMapEstimator {
    delta_te_s: f64,
    imaging_frequency_hz: f64,
    phase_scale: PhaseScale,
}

impl FieldMapEstimator {
    /// 以回波时间差 `delta_te_s` (秒) 和成像频率 `imaging_frequency_hz` 创建.
    ///
    /// 过小 (或非有限) 的分母会被钳位到 [`MIN_DELTA_TE_S`] 和
    /// [`MIN_IMAGING_FREQUENCY_HZ`], 并记录警告.
    pub fn new(delta_te_s: f64, imaging_frequency_hz: f64, phase_scale: PhaseScale) -> Self {
        let delta_te_s = if delta_te_s.is_finite() && delta_te_s.abs() >= MIN_DELTA_TE_S {
            delta_te_s
        } else {
            log::warn!(
                "echo time difference {delta_te_s} s clamped to {MIN_DELTA_TE_S} s"
            );
            MIN_DELTA_TE_S
        };
        let imaging_frequency_hz = if imaging_frequency_hz.is_finite()
            && imaging_frequency_hz >= MIN_IMAGING_FREQUENCY_HZ
        {
            imaging_frequency_hz
        } else {
            let floor = MIN_IMAGING_FREQUENCY_HZ;
            log::warn!(
                "imaging frequency {imaging_frequency_hz} Hz clamped to {floor} Hz"
            );
            MIN_IMAGING_FREQUENCY_HZ
        };
        Self {
            delta_te_s,
            imaging_frequency_hz,
            phase_scale,
        }
    }

    /// 以双回波数据的 ΔTE, 成像频率, 以及配置中的相位刻度创建.
    #[inline]
    pub fn from_pair(pair: &EchoPair, config: &QcConfig) -> Self {
        Self::new(
            pair.delta_te_s(),
            pair.imaging_frequency_hz(),
            config.phase_scale,
        )
    }

    /// 实际使用的回波时间差, 单位秒.
    #[inline]
    pub fn delta_te_s(&self) -> f64 {
        self.delta_te_s
    }

    /// 实际使用的成像频率, 单位 Hz.
    #[inline]
    pub fn imaging_frequency_hz(&self) -> f64 {
        self.imaging_frequency_hz
    }

    /// 缠绕相位差 (弧度) 换算为 ppm.
    #[inline]
    pub fn phase_to_ppm(&self, delta_phase: f64) -> f64 {
        let hz = delta_phase / (2.0 * PI * self.delta_te_s);
        hz / self.imaging_frequency_hz * PPM
    }

    /// 由第一回波切片 `first` 和第二回波切片 `second` 计算场图.
    ///
    /// 两个切片都带有幅值伴随图像时, 以之构造复数相量; 否则幅值取 1.
    ///
    /// # 返回值
    ///
    /// 两个切片形状不同时返回 [`QcError::ShapeMismatch`].
    pub fn estimate(&self, first: &Image, second: &Image) -> Result<FieldMap> {
        if first.shape() != second.shape() {
            return Err(QcError::ShapeMismatch {
                item: second.name().to_string(),
                expected: first.shape(),
                found: second.shape(),
            });
        }

        let mut ppm = Array2::<f64>::zeros(first.shape());
        let scale = self.phase_scale;
        match (first.magnitude(), second.magnitude()) {
            (Some(m1), Some(m2)) => Zip::from(&mut ppm)
                .and(&first.pixels())
                .and(&m1)
                .and(&second.pixels())
                .and(&m2)
                .for_each(|out, &p1, &m1, &p2, &m2| {
                    let d = wrapped_difference(
                        scale.to_radians(p1 as f64),
                        m1 as f64,
                        scale.to_radians(p2 as f64),
                        m2 as f64,
                    );
                    *out = self.phase_to_ppm(d);
                }),
            _ => Zip::from(&mut ppm)
                .and(&first.pixels())
                .and(&second.pixels())
                .for_each(|out, &p1, &p2| {
                    let d = wrapped_difference(
                        scale.to_radians(p1 as f64),
                        1.0,
                        scale.to_radians(p2 as f64),
                        1.0,
                    );
                    *out = self.phase_to_ppm(d);
                }),
        }

        Ok(FieldMap {
            ppm,
            imaging_frequency_hz: self.imaging_frequency_hz,
        })
    }
}
