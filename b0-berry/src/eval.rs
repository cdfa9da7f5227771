//! 聚合与判定. 纯函数, 无副作用: 相同的切片指标总是得到相同的 [`QcResult`].

use crate::field::FieldMap;
use crate::{InteriorRoi, QcError, Result};
use ordered_float::OrderedFloat;
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个切片的指标: 内部 ROI 内 |ppm| 的最大值.
///
/// ROI 为空 (或 ROI 内没有有限值) 时无定义, 该切片不参与聚合.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SliceMetric(Option<f64>);

impl SliceMetric {
    /// 直接以最大值 (或无定义) 创建.
    #[inline]
    pub fn new(max_abs_ppm: Option<f64>) -> Self {
        Self(max_abs_ppm)
    }

    /// 由场图与内部 ROI 计算.
    #[inline]
    pub fn measure(field_map: &FieldMap, roi: &InteriorRoi) -> Self {
        Self(field_map.max_abs_within(roi))
    }

    /// 指标值 (ppm). 无定义时返回 `None`.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.0.filter(|v| v.is_finite())
    }

    /// 指标是否有定义?
    #[inline]
    pub fn is_defined(&self) -> bool {
        self.value().is_some()
    }
}

/// 判定结果.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Verdict {
    /// 不超过行动限.
    Pass,

    /// 超过行动限.
    Fail,
}

impl Verdict {
    /// `value <= limit` 时为 [`Verdict::Pass`] (含等号), 否则为 [`Verdict::Fail`].
    #[inline]
    pub fn classify(value: f64, limit: f64) -> Self {
        if value <= limit {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// 是否通过?
    #[inline]
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
        })
    }
}

/// 一次质控计算的结果. 创建后不可变; 重新计算总是产生新的结果.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QcResult {
    value_ppm: f64,
    action_limit_ppm: f64,
    verdict: Verdict,
    measured_slices: usize,
    total_slices: usize,
}

impl QcResult {
    /// 聚合切片指标并与行动限 `action_limit_ppm` 比较.
    ///
    /// 全局值为所有有定义切片指标的最大值; 无定义的切片被排除, 而不是按 0 计.
    ///
    /// # 返回值
    ///
    /// 没有任何有定义的切片指标时返回 [`QcError::NoValidPhantom`], 绝不返回 PASS.
    pub fn evaluate<I>(metrics: I, action_limit_ppm: f64) -> Result<Self>
    where
        I: IntoIterator<Item = SliceMetric>,
    {
        let mut total_slices = 0;
        let mut measured_slices = 0;
        let mut best: Option<OrderedFloat<f64>> = None;
        for metric in metrics {
            total_slices += 1;
            if let Some(v) = metric.value() {
                measured_slices += 1;
                best = best.max(Some(OrderedFloat(v)));
            }
        }
        let Some(OrderedFloat(value_ppm)) = best else {
            return Err(QcError::NoValidPhantom {
                slices: total_slices,
            });
        };
        Ok(Self {
            value_ppm,
            action_limit_ppm,
            verdict: Verdict::classify(value_ppm, action_limit_ppm),
            measured_slices,
            total_slices,
        })
    }

    /// 全局最大 |ppm|.
    #[inline]
    pub fn value_ppm(&self) -> f64 {
        self.value_ppm
    }

    /// 判定所用的行动限 (ppm).
    #[inline]
    pub fn action_limit_ppm(&self) -> f64 {
        self.action_limit_ppm
    }

    /// 判定结果.
    #[inline]
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// 是否通过?
    #[inline]
    pub fn is_pass(&self) -> bool {
        self.verdict.is_pass()
    }

    /// 参与聚合 (指标有定义) 的切片数.
    #[inline]
    pub fn measured_slices(&self) -> usize {
        self.measured_slices
    }

    /// 切片总数.
    #[inline]
    pub fn total_slices(&self) -> usize {
        self.total_slices
    }

    /// 持久化协作方记录的摘要.
    #[inline]
    pub fn summary(&self) -> QcSummary {
        QcSummary::from(self)
    }
}

impl Display for QcResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (value, verdict) = (self.value_ppm, self.verdict);
        write!(f, "Global max ppm: {value:.3} -> {verdict}")
    }
}

/// 测量日志中的一行: 保留三位小数的全局最大 ppm 与判定.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QcSummary {
    /// 全局最大 |ppm|, 四舍五入到三位小数.
    #[cfg_attr(feature = "serde", serde(rename = "Max_ppm"))]
    pub max_ppm: f64,

    /// 判定结果.
    #[cfg_attr(feature = "serde", serde(rename = "Status"))]
    pub status: Verdict,
}

impl From<&QcResult> for QcSummary {
    fn from(r: &QcResult) -> Self {
        Self {
            max_ppm: (r.value_ppm * 1000.0).round() / 1000.0,
            status: r.verdict,
        }
    }
}
