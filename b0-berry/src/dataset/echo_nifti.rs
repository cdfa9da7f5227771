//! NIfTI 回波数据加载: 每个回波一个 3D 相位体数据, 可选一个同形状的幅值体数据.

use crate::{ImageMeta, TaggedImage};
use ndarray::{Array3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::{Path, PathBuf};

/// 打开 NIfTI 回波数据时可能发生的错误.
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// NIfTI 文件无法读取或解析.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 数据不是 3D 体数据.
    #[error("`{}` holds a {ndim}-D volume, expected 3-D", path.display())]
    NotVolume {
        /// 文件路径.
        path: PathBuf,
        /// 实际维数.
        ndim: usize,
    },

    /// 幅值体数据与相位体数据形状不同.
    #[error(
        "magnitude `{}` has shape {found:?}, phase has {expected:?}",
        path.display()
    )]
    MagnitudeShape {
        /// 幅值文件路径.
        path: PathBuf,
        /// 相位体数据形状 (z, 高, 宽).
        expected: (usize, usize, usize),
        /// 幅值体数据形状 (z, 高, 宽).
        found: (usize, usize, usize),
    },
}

/// 单个回波的数据来源.
#[derive(Clone, Debug, PartialEq)]
pub struct EchoSource {
    /// 相位体数据路径.
    pub phase: PathBuf,

    /// 可选的幅值体数据路径.
    pub magnitude: Option<PathBuf>,

    /// 回波时间, 单位秒.
    pub echo_time_s: f64,

    /// 成像频率, 单位 Hz. NIfTI 头不携带该信息, 由调用方提供.
    pub imaging_frequency_hz: Option<f64>,
}

impl EchoSource {
    /// 仅有相位体数据的回波.
    pub fn new(phase: impl Into<PathBuf>, echo_time_s: f64, imaging_frequency_hz: f64) -> Self {
        Self {
            phase: phase.into(),
            magnitude: None,
            echo_time_s,
            imaging_frequency_hz: Some(imaging_frequency_hz),
        }
    }

    /// 附加幅值体数据.
    #[inline]
    pub fn with_magnitude(mut self, magnitude: impl Into<PathBuf>) -> Self {
        self.magnitude = Some(magnitude.into());
        self
    }
}

/// 读取 3D NIfTI 体数据, 并把 `[W, H, z]` 转换成 `(z, H, W)`.
/// 同时返回相邻切片间距 (毫米); 头中间距非法时取 1.
fn read_volume(path: &Path) -> Result<(Array3<f32>, f64), DatasetError> {
    let obj = ReaderOptions::new().read_file(path)?;
    let spacing = obj.header().pixdim[3] as f64;
    let spacing = if spacing.is_finite() && spacing > 0.0 {
        spacing
    } else {
        1.0
    };

    let data = obj.into_volume().into_ndarray::<f32>()?;
    let ndim = data.ndim();
    let data = data
        .into_dimensionality::<Ix3>()
        .map_err(|_| DatasetError::NotVolume {
            path: path.to_owned(),
            ndim,
        })?;
    // [W, H, z] -> [z, H, W].
    Ok((data.permuted_axes([2, 1, 0]), spacing))
}

/// 打开单个回波, 每个水平切片产生一个 [`TaggedImage`].
///
/// 切片排序键为 `z 索引 × 切片间距 (毫米)`.
pub fn open_echo(source: &EchoSource) -> Result<Vec<TaggedImage>, DatasetError> {
    let (phase, spacing) = read_volume(&source.phase)?;
    let magnitude = match source.magnitude.as_deref() {
        Some(path) => {
            let (m, _) = read_volume(path)?;
            if m.dim() != phase.dim() {
                return Err(DatasetError::MagnitudeShape {
                    path: path.to_owned(),
                    expected: phase.dim(),
                    found: m.dim(),
                });
            }
            Some(m)
        }
        None => None,
    };

    let stem = source
        .phase
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::debug!(
        "{}: {} slice(s) of {:?}, spacing {spacing} mm",
        source.phase.display(),
        phase.len_of(Axis(0)),
        (phase.len_of(Axis(1)), phase.len_of(Axis(2)))
    );

    let images = phase
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(z, slice)| {
            let meta = ImageMeta {
                echo_time_s: Some(source.echo_time_s),
                imaging_frequency_hz: source.imaging_frequency_hz,
                order_key: Some(z as f64 * spacing),
            };
            let image = TaggedImage::new(format!("{stem}[{z}]"), slice.to_owned(), meta);
            match magnitude.as_ref() {
                Some(m) => image.with_magnitude(m.index_axis(Axis(0), z).to_owned()),
                None => image,
            }
        })
        .collect();
    Ok(images)
}

/// 依次打开多个回波, 合并为一个无序的图像集合, 可直接交给 [`crate::loader`].
pub fn open_echoes<'a, I>(sources: I) -> Result<Vec<TaggedImage>, DatasetError>
where
    I: IntoIterator<Item = &'a EchoSource>,
{
    let mut ans = Vec::new();
    for source in sources {
        ans.extend(open_echo(source)?);
    }
    Ok(ans)
}
