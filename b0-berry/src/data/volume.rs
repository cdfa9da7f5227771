use super::Image;
use crate::config::SlicePairing;
use crate::consts::{IMAGING_FREQUENCY_TOLERANCE, ORDER_KEY_RESOLUTION};
use crate::error::MetaField;
use crate::{Idx2d, QcError, Result};
use itertools::Itertools;
use ordered_float::OrderedFloat;

/// 同一回波的有序切片集合.
///
/// 不变量: 至少包含一个切片; 所有切片形状相同; 按排序键严格升序.
#[derive(Clone, Debug)]
pub struct Volume {
    echo_time_s: f64,
    slices: Vec<Image>,
}

impl Volume {
    /// 以回波时间 `echo_time_s` 和切片集合 `slices` 创建体数据.
    /// 切片会按排序键升序重排.
    ///
    /// # 返回值
    ///
    /// - `slices` 为空时返回 [`QcError::EmptyVolume`];
    /// - 任一切片形状与第一个切片不同时返回 [`QcError::ShapeMismatch`];
    /// - 两个切片排序键相同时返回 [`QcError::DuplicateSlice`].
    pub fn new(echo_time_s: f64, mut slices: Vec<Image>) -> Result<Self> {
        let Some(first) = slices.first() else {
            return Err(QcError::EmptyVolume);
        };
        let expected = first.shape();
        if let Some(bad) = slices.iter().find(|s| s.shape() != expected) {
            return Err(QcError::ShapeMismatch {
                item: bad.name().to_string(),
                expected,
                found: bad.shape(),
            });
        }

        slices.sort_by_key(|s| OrderedFloat(s.order_key()));
        if let Some((_, dup)) = slices
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.order_key() == b.order_key())
        {
            return Err(QcError::DuplicateSlice {
                echo_time_s,
                order_key: dup.order_key(),
            });
        }
        Ok(Self {
            echo_time_s,
            slices,
        })
    }

    /// 回波时间, 单位秒.
    #[inline]
    pub fn echo_time_s(&self) -> f64 {
        self.echo_time_s
    }

    /// 切片个数 (至少为 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// 总是返回 `false`. 仅为满足 clippy 约定.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// 切片形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.slices[0].shape()
    }

    /// 获取第 `index` 个切片. 越界时 panic.
    #[inline]
    pub fn slice_at(&self, index: usize) -> &Image {
        &self.slices[index]
    }

    /// 按排序键升序迭代切片.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = &Image> {
        self.slices.iter()
    }

    /// 所有切片的排序键, 升序.
    pub fn order_keys(&self) -> Vec<f64> {
        self.slices.iter().map(Image::order_key).collect()
    }
}

/// 排序键配对键. 四舍五入到 [`ORDER_KEY_RESOLUTION`] 后相等的排序键视为同一切片位置.
#[inline]
fn order_key_bucket(order_key: f64) -> i64 {
    (order_key / ORDER_KEY_RESOLUTION).round() as i64
}

/// 双回波数据: 两个切片一一对应的体数据, 加上 ΔTE 和成像频率.
#[derive(Clone, Debug)]
pub struct EchoPair {
    first: Volume,
    second: Volume,
    delta_te_s: f64,
    imaging_frequency_hz: f64,
}

impl EchoPair {
    /// 由两个回波的体数据创建, 按排序键配对切片.
    /// 等价于 `EchoPair::with_pairing(a, b, SlicePairing::OrderKey)`.
    #[inline]
    pub fn new(a: Volume, b: Volume) -> Result<Self> {
        Self::with_pairing(a, b, SlicePairing::OrderKey)
    }

    /// 由两个回波的体数据创建. 参数顺序无关, 较短回波时间的一方成为第一回波.
    ///
    /// 成像频率取自第一回波的第一个切片. 其他切片报告的成像频率若与之不同,
    /// 仅记录警告, 以第一回波为准.
    ///
    /// # 返回值
    ///
    /// - 两个回波时间相同时返回 [`QcError::NotDualEcho`];
    /// - 切片数不同时返回 [`QcError::SliceCountMismatch`];
    /// - 切片形状不同时返回 [`QcError::ShapeMismatch`];
    /// - `pairing` 为 [`SlicePairing::OrderKey`] 且某对切片的排序键不一致时返回
    ///   [`QcError::OrderKeyMismatch`];
    /// - 第一回波的第一个切片缺少成像频率时返回 [`QcError::MissingMetadata`].
    pub fn with_pairing(a: Volume, b: Volume, pairing: SlicePairing) -> Result<Self> {
        let (first, second) = if a.echo_time_s() <= b.echo_time_s() {
            (a, b)
        } else {
            (b, a)
        };
        let delta_te_s = second.echo_time_s() - first.echo_time_s();
        if delta_te_s <= 0.0 {
            return Err(QcError::NotDualEcho { found: 1 });
        }
        if first.len() != second.len() {
            return Err(QcError::SliceCountMismatch {
                first: first.len(),
                second: second.len(),
            });
        }
        if first.shape() != second.shape() {
            return Err(QcError::ShapeMismatch {
                item: second.slice_at(0).name().to_string(),
                expected: first.shape(),
                found: second.shape(),
            });
        }

        if pairing == SlicePairing::OrderKey {
            let keys = first.order_keys().into_iter().zip(second.order_keys());
            if let Some((index, (k1, k2))) = keys
                .enumerate()
                .find(|(_, (k1, k2))| order_key_bucket(*k1) != order_key_bucket(*k2))
            {
                return Err(QcError::OrderKeyMismatch {
                    index,
                    first: k1,
                    second: k2,
                });
            }
        }

        let head = first.slice_at(0);
        let imaging_frequency_hz = head
            .imaging_frequency_hz()
            .ok_or_else(|| QcError::MissingMetadata {
                item: head.name().to_string(),
                field: MetaField::ImagingFrequency,
            })?;

        let inconsistent = first
            .slice_iter()
            .chain(second.slice_iter())
            .filter_map(Image::imaging_frequency_hz)
            .filter(|f| {
                ((f - imaging_frequency_hz) / imaging_frequency_hz).abs()
                    > IMAGING_FREQUENCY_TOLERANCE
            })
            .count();
        if inconsistent > 0 {
            log::warn!(
                "{inconsistent} image(s) report an imaging frequency different from \
                 {imaging_frequency_hz} Hz; using the first-echo value"
            );
        }

        Ok(Self {
            first,
            second,
            delta_te_s,
            imaging_frequency_hz,
        })
    }

    /// 第一回波 (较短回波时间).
    #[inline]
    pub fn first(&self) -> &Volume {
        &self.first
    }

    /// 第二回波 (较长回波时间).
    #[inline]
    pub fn second(&self) -> &Volume {
        &self.second
    }

    /// 回波时间差 ΔTE, 单位秒. 总是正数.
    #[inline]
    pub fn delta_te_s(&self) -> f64 {
        self.delta_te_s
    }

    /// 成像频率, 单位 Hz.
    #[inline]
    pub fn imaging_frequency_hz(&self) -> f64 {
        self.imaging_frequency_hz
    }

    /// 切片对个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.first.len()
    }

    /// 总是返回 `false`. 仅为满足 clippy 约定.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// 切片形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.first.shape()
    }

    /// 获取第 `index` 对切片. 越界时 panic.
    #[inline]
    pub fn pair_at(&self, index: usize) -> (&Image, &Image) {
        (self.first.slice_at(index), self.second.slice_at(index))
    }

    /// 按切片顺序迭代 (第一回波, 第二回波) 切片对.
    #[inline]
    pub fn pair_iter(&self) -> impl ExactSizeIterator<Item = (&Image, &Image)> {
        self.first.slice_iter().zip(self.second.slice_iter())
    }
}
