//! B0 均匀性质控流水线: 加载 → 分割 → ROI 收缩 → 场图估计 → 聚合判定.
//!
//! 每次计算都是一次普通的函数调用, 返回新的 [`B0Outcome`]. 跨调用保存结果是调用方的职责.

use crate::config::QcConfig;
use crate::eval::{QcResult, SliceMetric};
use crate::field::{FieldMap, FieldMapEstimator};
use crate::loader::load_echo_pair_with;
use crate::roi::shrink;
use crate::segment::segment_phantom;
use crate::{EchoPair, Image, InteriorRoi, PhantomMask, Result, TaggedImage};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个切片的处理状态.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SliceStatus {
    /// 指标有定义, 参与聚合.
    Measured,

    /// 分割结果为空: 该切片没有检测到模体.
    PhantomNotFound,

    /// 检测到模体, 但内部 ROI 为空或其中没有有限的场图值.
    RoiEmpty,
}

/// 单个切片的全部中间结果, 交给报告/可视化协作方.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SliceReport {
    /// 切片序号 (按排序键升序).
    pub index: usize,

    /// 第一回波切片的排序键.
    pub order_key: f64,

    /// 处理状态.
    pub status: SliceStatus,

    /// 模体掩膜.
    pub phantom: PhantomMask,

    /// 内部 ROI.
    pub roi: InteriorRoi,

    /// 全分辨率场图 (ppm).
    pub field_map: FieldMap,

    /// 切片指标.
    pub metric: SliceMetric,
}

/// 一次质控计算的输出: 全局结果, 以及按切片顺序排列的中间结果.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct B0Outcome {
    /// 全局结果.
    pub result: QcResult,

    /// 每个切片的中间结果.
    pub slices: Vec<SliceReport>,
}

impl B0Outcome {
    /// 没有检测到模体的切片序号.
    pub fn phantom_not_found(&self) -> Vec<usize> {
        self.slices
            .iter()
            .filter(|s| s.status == SliceStatus::PhantomNotFound)
            .map(|s| s.index)
            .collect()
    }
}

/// B0 均匀性质控流水线.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct B0Pipeline {
    config: QcConfig,
}

impl B0Pipeline {
    /// 以配置 `config` 创建流水线.
    ///
    /// # 返回值
    ///
    /// 配置非法时返回 [`crate::QcError::InvalidConfig`].
    pub fn new(config: QcConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 所用配置.
    #[inline]
    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    /// 从无序的带标签图像开始, 运行完整的质控计算.
    /// 两个回波的切片按配置中的 [`crate::config::SlicePairing`] 配对.
    /// 打开 `rayon` feature 时按切片并行, 结果与串行完全一致.
    pub fn run<I>(&self, images: I) -> Result<B0Outcome>
    where
        I: IntoIterator<Item = TaggedImage>,
    {
        let pair = load_echo_pair_with(images, self.config.slice_pairing)?;
        #[cfg(feature = "rayon")]
        let outcome = self.par_run_pair(&pair);
        #[cfg(not(feature = "rayon"))]
        let outcome = self.run_pair(&pair);
        outcome
    }

    /// 在已配对的双回波数据上串行地运行质控计算.
    pub fn run_pair(&self, pair: &EchoPair) -> Result<B0Outcome> {
        let estimator = self.prepare(pair);
        let slices = pair
            .pair_iter()
            .enumerate()
            .map(|(index, (first, second))| self.process_slice(index, first, second, &estimator))
            .collect::<Result<Vec<_>>>()?;
        self.finish(slices)
    }

    /// 处理单个切片: 分割, 收缩, 估计场图, 计算指标.
    ///
    /// 分割使用第一回波切片的幅值伴随图像; 没有时退化为其采样值的绝对值.
    pub fn process_slice(
        &self,
        index: usize,
        first: &Image,
        second: &Image,
        estimator: &FieldMapEstimator,
    ) -> Result<SliceReport> {
        let field_map = estimator.estimate(first, second)?;
        let phantom = segment_phantom(first.reference().view(), &self.config);
        let roi = shrink(
            &phantom,
            self.config.shrink_fraction,
            self.config.shrink_strategy,
        );
        let metric = SliceMetric::measure(&field_map, &roi);
        let status = if phantom.is_empty() {
            SliceStatus::PhantomNotFound
        } else if !metric.is_defined() {
            SliceStatus::RoiEmpty
        } else {
            SliceStatus::Measured
        };
        log::debug!(
            "slice {index} ({}): phantom {} px, roi {} px, metric {:?}",
            first.name(),
            phantom.count(),
            roi.count(),
            metric.value()
        );
        Ok(SliceReport {
            index,
            order_key: first.order_key(),
            status,
            phantom,
            roi,
            field_map,
            metric,
        })
    }

    fn prepare(&self, pair: &EchoPair) -> FieldMapEstimator {
        log::info!(
            "B0 homogeneity: {} slice pair(s), dTE {} s, f0 {} Hz",
            pair.len(),
            pair.delta_te_s(),
            pair.imaging_frequency_hz()
        );
        let without_magnitude = pair
            .first()
            .slice_iter()
            .filter(|s| !s.has_magnitude())
            .count();
        if without_magnitude > 0 {
            log::warn!(
                "{without_magnitude} slice(s) have no magnitude companion, \
                 segmenting on |samples| instead"
            );
        }
        FieldMapEstimator::from_pair(pair, &self.config)
    }

    fn finish(&self, slices: Vec<SliceReport>) -> Result<B0Outcome> {
        let missing: Vec<_> = slices
            .iter()
            .filter(|s| s.status != SliceStatus::Measured)
            .map(|s| s.index)
            .collect();
        if !missing.is_empty() {
            log::warn!(
                "slice(s) {missing:?} excluded: no phantom or empty interior ROI"
            );
        }
        let limit = self.config.action_limit_ppm;
        let metrics = slices.iter().map(|s| s.metric);
        let result = QcResult::evaluate(metrics, limit).map_err(|e| {
            log::warn!("{e}");
            e
        })?;
        log::info!("{result}");
        Ok(B0Outcome { result, slices })
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl B0Pipeline {
    /// 借助 `rayon`, 按切片并行地运行 [`B0Pipeline::run_pair`]. 结果与串行版本逐位相同.
    pub fn par_run_pair(&self, pair: &EchoPair) -> Result<B0Outcome> {
        let estimator = self.prepare(pair);
        let slices = (0..pair.len())
            .into_par_iter()
            .map(|index| {
                let (first, second) = pair.pair_at(index);
                self.process_slice(index, first, second, &estimator)
            })
            .collect::<Result<Vec<_>>>()?;
        self.finish(slices)
    }
}

/// 以配置 `config` 对无序的带标签图像运行一次 B0 均匀性质控.
///
/// 等价于 `B0Pipeline::new(*config)?.run(images)`.
pub fn compute_b0<I>(images: I, config: &QcConfig) -> Result<B0Outcome>
where
    I: IntoIterator<Item = TaggedImage>,
{
    B0Pipeline::new(*config)?.run(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ShrinkStrategy, SlicePairing};
    use crate::eval::Verdict;
    use crate::field::PhaseScale;
    use crate::testing::{disk_phantom_echoes, F0_HZ};
    use crate::{ImageMeta, QcError};
    use ndarray::Array2;
    use std::f64::consts::PI;

    #[test]
    fn test_end_to_end_disk() {
        // 多个测试可能竞争初始化, 失败无妨.
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let images = disk_phantom_echoes((64, 64), 25.0, 0.001, 1);
        let outcome = compute_b0(images, &QcConfig::default()).unwrap();
        let expected = 0.001 / (2.0 * PI * 0.01) / F0_HZ * 1e6;
        let r = outcome.result;
        let err = (r.value_ppm() - expected).abs();
        assert!(err < 1e-3 * expected, "{r:?}");
        assert!((r.value_ppm() - 2.49e-4).abs() < 0.01e-4);
        assert_eq!(r.verdict(), Verdict::Pass);
        assert_eq!(r.measured_slices(), 1);

        let s = &outcome.slices[0];
        assert_eq!(s.status, SliceStatus::Measured);
        let disk = crate::testing::disk((64, 64), (32.0, 32.0), 25.0);
        assert_eq!(s.phantom.array_view(), disk.view());
        let roi_radius = (s.roi.count() as f64 / PI).sqrt();
        assert!((20.0..=23.0).contains(&roi_radius), "{roi_radius}");
        assert!(s.roi.is_subset_of(s.phantom.array_view()));
    }

    #[test]
    fn test_end_to_end_both_strategies_agree_on_uniform_field() {
        for strategy in [
            ShrinkStrategy::DistanceTransform,
            ShrinkStrategy::CentroidRadius,
        ] {
            let cfg = QcConfig::default().with_shrink_strategy(strategy);
            let images = disk_phantom_echoes((64, 64), 25.0, 0.001, 3);
            let outcome = compute_b0(images, &cfg).unwrap();
            assert_eq!(outcome.result.measured_slices(), 3, "{strategy:?}");
            assert!(outcome.result.is_pass());
        }
    }

    #[test]
    fn test_zero_phase_difference_passes() {
        let images = disk_phantom_echoes((32, 32), 10.0, 0.0, 2);
        let outcome = compute_b0(images, &QcConfig::default()).unwrap();
        assert!(outcome.result.value_ppm().abs() < 1e-12);
        assert!(outcome.result.is_pass());
        let shown = outcome.result.to_string();
        assert_eq!(shown, "Global max ppm: 0.000 -> PASS");
    }

    #[test]
    fn test_raw_phase_storage() {
        // 相位以 12 位整数存储: 0..4096 对应 [-π, π).
        let to_raw = |v: f32| (v as f64 + PI) / (2.0 * PI) * 4096.0;
        let mut images = disk_phantom_echoes((32, 32), 10.0, 0.3, 2);
        for img in images.iter_mut() {
            img.pixels.mapv_inplace(|v| to_raw(v) as f32);
        }
        let raw = PhaseScale::Raw {
            min: 0.0,
            max: 4096.0,
        };
        let cfg = QcConfig::default().with_phase_scale(raw);
        let outcome = compute_b0(images, &cfg).unwrap();

        // 0.3 rad / (2π · 0.01 s) / 63.86 MHz ≈ 0.0748 ppm.
        let expected = 0.3 / (2.0 * PI * 0.01) / F0_HZ * 1e6;
        let r = outcome.result;
        let err = (r.value_ppm() - expected).abs();
        assert!(err < 1e-4 * expected, "{r:?}");
        assert_eq!(r.measured_slices(), 2);
        assert!(r.is_pass());
    }

    #[test]
    fn test_idempotent() {
        let images = disk_phantom_echoes((48, 48), 18.0, 0.02, 4);
        let pipeline = B0Pipeline::new(QcConfig::default()).unwrap();
        let a = pipeline.run(images.clone()).unwrap();
        let b = pipeline.run(images).unwrap();
        assert_eq!(a, b);
        let bits = |o: &B0Outcome| o.result.value_ppm().to_bits();
        assert_eq!(bits(&a), bits(&b));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_parallel_matches_serial() {
        let images = disk_phantom_echoes((48, 48), 18.0, 0.5, 5);
        let pair = crate::loader::load_echo_pair(images).unwrap();
        let pipeline = B0Pipeline::new(QcConfig::default()).unwrap();
        assert_eq!(
            pipeline.run_pair(&pair).unwrap(),
            pipeline.par_run_pair(&pair).unwrap()
        );
    }

    #[test]
    fn test_all_zero_slices_never_pass() {
        let meta = |te, key| ImageMeta::new(te, F0_HZ, key);
        let images = vec![
            TaggedImage::new("a", Array2::zeros((16, 16)), meta(0.01, 0.0)),
            TaggedImage::new("b", Array2::zeros((16, 16)), meta(0.02, 0.0)),
        ];
        let e = compute_b0(images, &QcConfig::default()).unwrap_err();
        assert_eq!(e, QcError::NoValidPhantom { slices: 1 });
    }

    #[test]
    fn test_empty_slice_excluded_not_zero() {
        let mut images = disk_phantom_echoes((32, 32), 10.0, 0.3, 2);
        // 第二个切片 (两个回波) 置为全零.
        for img in images.iter_mut() {
            if img.meta.order_key != Some(1.0) {
                continue;
            }
            img.pixels.fill(0.0);
            if let Some(m) = img.magnitude.as_mut() {
                m.fill(0.0);
            }
        }
        let outcome = compute_b0(images, &QcConfig::default()).unwrap();
        assert_eq!(outcome.phantom_not_found(), vec![1]);
        assert_eq!(outcome.slices[1].metric.value(), None);
        assert_eq!(outcome.result.measured_slices(), 1);
        assert_eq!(outcome.result.total_slices(), 2);
        assert!(outcome.result.value_ppm() > 0.0);
    }

    #[test]
    fn test_mismatched_slice_positions_rejected() {
        let mut images = disk_phantom_echoes((32, 32), 10.0, 0.3, 2);
        // 第二回波的第二个切片来自另一个位置.
        for img in images.iter_mut() {
            if img.meta.echo_time_s == Some(0.02) && img.meta.order_key == Some(1.0) {
                img.meta.order_key = Some(7.0);
            }
        }
        let strict = QcConfig::default();
        let e = compute_b0(images.clone(), &strict).unwrap_err();
        let expected = QcError::OrderKeyMismatch {
            index: 1,
            first: 1.0,
            second: 7.0,
        };
        assert_eq!(e, expected);
        assert!(e.is_structural());

        // 调用方显式选择按位置配对时照常计算.
        let by_index = QcConfig::default().with_slice_pairing(SlicePairing::Index);
        let outcome = compute_b0(images, &by_index).unwrap();
        assert_eq!(outcome.result.measured_slices(), 2);
    }

    #[test]
    fn test_action_limit_from_config() {
        let images = disk_phantom_echoes((32, 32), 10.0, 1.0, 1);
        let strict = QcConfig::default().with_action_limit(0.1);
        let outcome = compute_b0(images, &strict).unwrap();
        // 1 rad / (2π · 0.01 s) / 63.86 MHz ≈ 0.249 ppm.
        assert_eq!(outcome.result.verdict(), Verdict::Fail);
        assert_eq!(outcome.result.action_limit_ppm(), 0.1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = QcConfig::default().with_shrink_fraction(2.0);
        let e = B0Pipeline::new(bad).unwrap_err();
        assert!(matches!(e, QcError::InvalidConfig(_)));
        let images = disk_phantom_echoes((16, 16), 5.0, 0.0, 1);
        assert!(compute_b0(images, &bad).is_err());
    }

    #[test]
    fn test_structural_errors_propagate() {
        let mut images = disk_phantom_echoes((32, 32), 10.0, 0.0, 2);
        images.pop();
        let e = compute_b0(images, &QcConfig::default()).unwrap_err();
        assert!(matches!(e, QcError::SliceCountMismatch { .. }));
        assert!(e.is_structural());
    }
}
