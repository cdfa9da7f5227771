//! 质控计算配置.
//!
//! 所有阈值与比例都通过 [`QcConfig`] 显式传入, 库内部不存在隐式全局配置.

use crate::consts::{DEFAULT_ACTION_LIMIT_PPM, DEFAULT_HISTOGRAM_BINS, DEFAULT_SHRINK_FRACTION};
use crate::field::PhaseScale;
use crate::{QcError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 连通规则.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Connectivity {
    /// 4-邻接 (上下左右).
    Four,

    /// 8-邻接 (含对角).
    #[default]
    Eight,
}

/// 内部 ROI 收缩策略. 两种策略都满足平移不变性, 且对收缩比例单调.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ShrinkStrategy {
    /// 计算模体掩膜的欧氏距离变换 (到最近背景像素的距离),
    /// 保留距离大于 `(1 - f) * max(distance)` 的像素.
    #[default]
    DistanceTransform,

    /// 计算模体掩膜的质心与最大半径 `r`, 保留距质心不超过 `f * r` 的像素.
    CentroidRadius,
}

/// 两个回波之间的切片配对规则.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SlicePairing {
    /// 各自按排序键升序后, 第 `i` 对切片的排序键必须一致
    /// (四舍五入到 [`crate::consts::ORDER_KEY_RESOLUTION`]), 否则返回
    /// [`QcError::OrderKeyMismatch`].
    #[default]
    OrderKey,

    /// 各自按排序键升序后只按位置配对, 不比较排序键.
    /// 仅用于排序键是每个回波各自编号的采集序号, 而非切片位置的数据.
    Index,
}

/// B0 均匀性质控配置.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QcConfig {
    /// 行动限, 单位 ppm. 全局最大值 **不超过** 该值即为 PASS.
    pub action_limit_ppm: f64,

    /// 内部 ROI 收缩比例, 取值范围 `[0, 1]`.
    pub shrink_fraction: f64,

    /// 内部 ROI 收缩策略.
    pub shrink_strategy: ShrinkStrategy,

    /// 模体连通域分析的连通规则.
    pub connectivity: Connectivity,

    /// 连通域分析前是否填充模体内部的背景孔洞.
    pub fill_holes: bool,

    /// Otsu 阈值直方图分箱数, 至少为 2.
    pub histogram_bins: usize,

    /// 相位图像的存储刻度.
    pub phase_scale: PhaseScale,

    /// 两个回波之间的切片配对规则.
    pub slice_pairing: SlicePairing,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            action_limit_ppm: DEFAULT_ACTION_LIMIT_PPM,
            shrink_fraction: DEFAULT_SHRINK_FRACTION,
            shrink_strategy: ShrinkStrategy::default(),
            connectivity: Connectivity::default(),
            fill_holes: true,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            phase_scale: PhaseScale::default(),
            slice_pairing: SlicePairing::default(),
        }
    }
}

impl QcConfig {
    /// 设置行动限 (ppm).
    #[inline]
    pub fn with_action_limit(mut self, ppm: f64) -> Self {
        self.action_limit_ppm = ppm;
        self
    }

    /// 设置内部 ROI 收缩比例.
    #[inline]
    pub fn with_shrink_fraction(mut self, fraction: f64) -> Self {
        self.shrink_fraction = fraction;
        self
    }

    /// 设置内部 ROI 收缩策略.
    #[inline]
    pub fn with_shrink_strategy(mut self, strategy: ShrinkStrategy) -> Self {
        self.shrink_strategy = strategy;
        self
    }

    /// 设置连通规则.
    #[inline]
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// 设置是否填充孔洞.
    #[inline]
    pub fn with_fill_holes(mut self, fill_holes: bool) -> Self {
        self.fill_holes = fill_holes;
        self
    }

    /// 设置 Otsu 直方图分箱数.
    #[inline]
    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins;
        self
    }

    /// 设置相位刻度.
    #[inline]
    pub fn with_phase_scale(mut self, scale: PhaseScale) -> Self {
        self.phase_scale = scale;
        self
    }

    /// 设置切片配对规则.
    #[inline]
    pub fn with_slice_pairing(mut self, pairing: SlicePairing) -> Self {
        self.slice_pairing = pairing;
        self
    }

    /// 检查配置是否合法. 非法时返回 [`QcError::InvalidConfig`].
    pub fn validate(&self) -> Result<()> {
        if !self.action_limit_ppm.is_finite() || self.action_limit_ppm < 0.0 {
            return Err(QcError::InvalidConfig(format!(
                "action limit must be a finite non-negative ppm value, got {}",
                self.action_limit_ppm
            )));
        }
        if !(0.0..=1.0).contains(&self.shrink_fraction) {
            return Err(QcError::InvalidConfig(format!(
                "shrink fraction must lie in [0, 1], got {}",
                self.shrink_fraction
            )));
        }
        if self.histogram_bins < 2 {
            return Err(QcError::InvalidConfig(format!(
                "at least 2 histogram bins are required, got {}",
                self.histogram_bins
            )));
        }
        if let PhaseScale::Raw { min, max } = self.phase_scale {
            if !(min.is_finite() && max.is_finite() && max > min) {
                return Err(QcError::InvalidConfig(format!(
                    "raw phase range must be finite with max > min, got [{min}, {max}]"
                )));
            }
        }
        Ok(())
    }
}
