use crate::error::MetaField;
use crate::{Idx2d, QcError, Result};
use ndarray::{Array2, ArrayView2, CowArray, Ix2};

/// 单幅图像的元数据. 任意字段都可能缺失, 由加载器负责检查.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ImageMeta {
    /// 回波时间, 单位秒.
    pub echo_time_s: Option<f64>,

    /// 成像 (Larmor) 频率, 单位 Hz.
    pub imaging_frequency_hz: Option<f64>,

    /// 切片排序键 (切片位置或采集序号), 升序即切片顺序.
    pub order_key: Option<f64>,
}

impl ImageMeta {
    /// 以完整元数据创建.
    #[inline]
    pub fn new(echo_time_s: f64, imaging_frequency_hz: f64, order_key: f64) -> Self {
        Self {
            echo_time_s: Some(echo_time_s),
            imaging_frequency_hz: Some(imaging_frequency_hz),
            order_key: Some(order_key),
        }
    }

    /// 以毫秒为单位设置回波时间 (DICOM `EchoTime` 的惯用单位).
    #[inline]
    pub fn with_echo_time_ms(mut self, ms: f64) -> Self {
        self.echo_time_s = Some(ms / 1000.0);
        self
    }

    /// 以 MHz 为单位设置成像频率 (DICOM `ImagingFrequency` 的惯用单位).
    #[inline]
    pub fn with_imaging_frequency_mhz(mut self, mhz: f64) -> Self {
        self.imaging_frequency_hz = Some(mhz * 1e6);
        self
    }

    /// 设置排序键.
    #[inline]
    pub fn with_order_key(mut self, key: f64) -> Self {
        self.order_key = Some(key);
        self
    }
}

/// 加载器的原始输入: 带标签的二维图像.
///
/// `pixels` 保存相位编码的采样值; 若同时提供 `magnitude`,
/// 则它必须与 `pixels` 同形状, 并作为模体分割和相量构造的幅值.
#[derive(Clone, Debug)]
pub struct TaggedImage {
    /// 图像名, 仅用于报错和日志.
    pub name: String,

    /// 采样值 (相位).
    pub pixels: Array2<f32>,

    /// 可选的幅值伴随图像.
    pub magnitude: Option<Array2<f32>>,

    /// 元数据.
    pub meta: ImageMeta,
}

impl TaggedImage {
    /// 创建不带幅值伴随图像的输入.
    pub fn new(name: impl Into<String>, pixels: Array2<f32>, meta: ImageMeta) -> Self {
        Self {
            name: name.into(),
            pixels,
            magnitude: None,
            meta,
        }
    }

    /// 附加幅值伴随图像.
    #[inline]
    pub fn with_magnitude(mut self, magnitude: Array2<f32>) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    /// 图像形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.pixels.dim()
    }
}

/// 已通过元数据检查的二维图像. 创建后不可变.
#[derive(Clone, Debug)]
pub struct Image {
    name: String,
    pixels: Array2<f32>,
    magnitude: Option<Array2<f32>>,
    echo_time_s: f64,
    imaging_frequency_hz: Option<f64>,
    order_key: f64,
}

impl TryFrom<TaggedImage> for Image {
    type Error = QcError;

    /// 检查元数据:
    ///
    /// - 回波时间和排序键必须存在, 否则返回 [`QcError::MissingMetadata`];
    /// - 回波时间必须为有限正数, 排序键必须为有限值,
    ///   成像频率 (若存在) 必须为有限正数, 否则返回 [`QcError::InvalidMetadata`];
    /// - 幅值伴随图像 (若存在) 必须与采样值同形状, 否则返回 [`QcError::ShapeMismatch`].
    fn try_from(value: TaggedImage) -> Result<Self> {
        let TaggedImage {
            name,
            pixels,
            magnitude,
            meta,
        } = value;

        let missing = |field| QcError::MissingMetadata {
            item: name.clone(),
            field,
        };
        let invalid = |field, value| QcError::InvalidMetadata {
            item: name.clone(),
            field,
            value,
        };

        let echo_time_s = meta
            .echo_time_s
            .ok_or_else(|| missing(MetaField::EchoTime))?;
        if !(echo_time_s.is_finite() && echo_time_s > 0.0) {
            return Err(invalid(MetaField::EchoTime, echo_time_s));
        }
        let order_key = meta.order_key.ok_or_else(|| missing(MetaField::OrderKey))?;
        if !order_key.is_finite() {
            return Err(invalid(MetaField::OrderKey, order_key));
        }
        if let Some(f0) = meta.imaging_frequency_hz {
            if !(f0.is_finite() && f0 > 0.0) {
                return Err(invalid(MetaField::ImagingFrequency, f0));
            }
        }
        if let Some(m) = magnitude.as_ref() {
            if m.dim() != pixels.dim() {
                return Err(QcError::ShapeMismatch {
                    item: format!("{name} (magnitude)"),
                    expected: pixels.dim(),
                    found: m.dim(),
                });
            }
        }

        Ok(Self {
            name,
            pixels,
            magnitude,
            echo_time_s,
            imaging_frequency_hz: meta.imaging_frequency_hz,
            order_key,
        })
    }
}

impl Image {
    /// 图像名.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 采样值 (相位) 的不可变视图.
    #[inline]
    pub fn pixels(&self) -> ArrayView2<'_, f32> {
        self.pixels.view()
    }

    /// 幅值伴随图像的不可变视图 (若存在).
    #[inline]
    pub fn magnitude(&self) -> Option<ArrayView2<'_, f32>> {
        self.magnitude.as_ref().map(|m| m.view())
    }

    /// 回波时间, 单位秒.
    #[inline]
    pub fn echo_time_s(&self) -> f64 {
        self.echo_time_s
    }

    /// 成像频率, 单位 Hz (若存在).
    #[inline]
    pub fn imaging_frequency_hz(&self) -> Option<f64> {
        self.imaging_frequency_hz
    }

    /// 切片排序键.
    #[inline]
    pub fn order_key(&self) -> f64 {
        self.order_key
    }

    /// 图像形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.pixels.dim()
    }

    /// 模体分割使用的强度参考图.
    ///
    /// 存在幅值伴随图像时直接借用之; 否则返回采样值的绝对值 (新分配).
    /// Otsu 阈值只能作用于非负强度, 因此不会直接使用带符号的相位.
    ///
    /// # 注意
    ///
    /// 绝对值退化与现有质控工具的做法一致 (对相位像素直接取 `np.abs`),
    /// 只为兼容而保留. 真实相位数据的背景噪声 |相位| 往往很大,
    /// 由此得到的分割并不可靠. 应尽量提供幅值伴随图像.
    pub fn reference(&self) -> CowArray<'_, f32, Ix2> {
        match self.magnitude.as_ref() {
            Some(m) => CowArray::from(m.view()),
            None => CowArray::from(self.pixels.mapv(f32::abs)),
        }
    }

    /// 是否带有幅值伴随图像.
    #[inline]
    pub fn has_magnitude(&self) -> bool {
        self.magnitude.is_some()
    }
}
