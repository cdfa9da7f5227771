//! 运行时错误.

use crate::Idx2d;
use std::fmt::{Display, Formatter};

/// 图像元数据字段.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MetaField {
    /// 回波时间.
    EchoTime,

    /// 成像 (Larmor) 频率.
    ImagingFrequency,

    /// 切片排序键 (切片位置或采集序号).
    OrderKey,
}

impl Display for MetaField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MetaField::EchoTime => "echo time",
            MetaField::ImagingFrequency => "imaging frequency",
            MetaField::OrderKey => "ordering key",
        })
    }
}

/// 质控计算错误.
///
/// 除 [`QcError::NoValidPhantom`] 之外, 所有变体都是结构性输入错误:
/// 调用方必须修正输入后重新提交, 重试没有意义.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QcError {
    /// 图像缺少必需的元数据.
    #[error("image `{item}` is missing required metadata: {field}")]
    MissingMetadata {
        /// 出错图像的名字.
        item: String,
        /// 缺失的字段.
        field: MetaField,
    },

    /// 图像的元数据取值非法 (非有限值, 或必须为正的量不为正).
    #[error("image `{item}` carries an invalid {field}: {value}")]
    InvalidMetadata {
        /// 出错图像的名字.
        item: String,
        /// 出错的字段.
        field: MetaField,
        /// 实际取值.
        value: f64,
    },

    /// 不同回波时间的个数少于 2.
    #[error("dual-echo data required, found {found} distinct echo time(s)")]
    NotDualEcho {
        /// 实际发现的不同回波时间个数.
        found: usize,
    },

    /// 不同回波时间的个数多于 2. 不猜测应该使用哪两个.
    #[error("dual-echo data required, found {found} distinct echo times")]
    TooManyEchoes {
        /// 实际发现的不同回波时间个数.
        found: usize,
    },

    /// 同一回波内两幅图像的排序键相同.
    #[error("echo {echo_time_s} s: duplicate ordering key {order_key}")]
    DuplicateSlice {
        /// 回波时间, 单位秒.
        echo_time_s: f64,
        /// 重复的排序键.
        order_key: f64,
    },

    /// 图像几何 (形状) 不一致.
    #[error("`{item}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// 出错对象的名字.
        item: String,
        /// 期望的形状 (高, 宽).
        expected: Idx2d,
        /// 实际的形状 (高, 宽).
        found: Idx2d,
    },

    /// 两个回波的切片数不一致.
    #[error("echo slice counts differ: {first} vs {second}")]
    SliceCountMismatch {
        /// 第一回波切片数.
        first: usize,
        /// 第二回波切片数.
        second: usize,
    },

    /// 按排序键配对时, 两个回波第 `index` 个切片的排序键不一致.
    #[error("slice {index}: ordering keys {first} and {second} differ")]
    OrderKeyMismatch {
        /// 切片序号 (按排序键升序).
        index: usize,
        /// 第一回波的排序键.
        first: f64,
        /// 第二回波的排序键.
        second: f64,
    },

    /// 体数据不包含任何切片.
    #[error("a volume must contain at least one slice")]
    EmptyVolume,

    /// 配置取值非法.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// 所有切片都没有检测到模体 (或内部 ROI 全部为空), 无法给出有效测量.
    #[error("no valid phantom detected in any of {slices} slice(s)")]
    NoValidPhantom {
        /// 参与计算的切片总数.
        slices: usize,
    },
}

impl QcError {
    /// 是否为结构性输入错误 (而非 "没有有效测量").
    #[inline]
    pub fn is_structural(&self) -> bool {
        !matches!(self, QcError::NoValidPhantom { .. })
    }
}

/// 质控计算结果.
pub type Result<T> = std::result::Result<T, QcError>;
