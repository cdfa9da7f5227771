//! 图像栈加载: 把无序的带标签图像整理为按回波分组, 按切片排序的体数据.
//!
//! 加载器不做任何磁盘 I/O, 只消费调用方已读入内存的 [`TaggedImage`].

use crate::config::SlicePairing;
use crate::consts::ECHO_TIME_RESOLUTION_S;
use crate::{EchoPair, Image, QcError, Result, TaggedImage, Volume};
use std::collections::BTreeMap;

/// 回波时间分组键. 差异小于 [`ECHO_TIME_RESOLUTION_S`] 的回波时间落入同一组.
#[inline]
fn echo_key(echo_time_s: f64) -> i64 {
    (echo_time_s / ECHO_TIME_RESOLUTION_S).round() as i64
}

/// 按回波时间分组, 每个不同的回波时间组装为一个 [`Volume`],
/// 结果按回波时间升序排列.
///
/// # 返回值
///
/// - 任一图像缺少或带有非法元数据时, 返回指明该图像的错误;
/// - 不同回波时间多于 2 个时返回 [`QcError::TooManyEchoes`];
/// - 体数据本身的错误 (形状不一致, 排序键重复) 原样返回.
///
/// 输入为空时返回空集合.
pub fn load_volumes<I>(images: I) -> Result<Vec<Volume>>
where
    I: IntoIterator<Item = TaggedImage>,
{
    let mut groups: BTreeMap<i64, Vec<Image>> = BTreeMap::new();
    for tagged in images {
        let image = Image::try_from(tagged)?;
        groups
            .entry(echo_key(image.echo_time_s()))
            .or_default()
            .push(image);
    }
    if groups.len() > 2 {
        return Err(QcError::TooManyEchoes {
            found: groups.len(),
        });
    }

    groups
        .into_values()
        .map(|slices| {
            let echo_time_s = slices[0].echo_time_s();
            log::debug!("echo {echo_time_s} s: {} slice(s)", slices.len());
            Volume::new(echo_time_s, slices)
        })
        .collect()
}

/// 加载双回波数据, 按排序键配对两个回波的切片.
/// 等价于 `load_echo_pair_with(images, SlicePairing::OrderKey)`.
#[inline]
pub fn load_echo_pair<I>(images: I) -> Result<EchoPair>
where
    I: IntoIterator<Item = TaggedImage>,
{
    load_echo_pair_with(images, SlicePairing::OrderKey)
}

/// 加载双回波数据, 按 `pairing` 配对两个回波的切片.
///
/// # 返回值
///
/// 除 [`load_volumes`] 的错误外, 不同回波时间恰好不为 2 个时返回
/// [`QcError::NotDualEcho`] 或 [`QcError::TooManyEchoes`];
/// 两个回波无法一一配对时返回 [`EchoPair::with_pairing`] 的错误.
pub fn load_echo_pair_with<I>(images: I, pairing: SlicePairing) -> Result<EchoPair>
where
    I: IntoIterator<Item = TaggedImage>,
{
    let mut volumes = load_volumes(images)?;
    if volumes.len() != 2 {
        return Err(QcError::NotDualEcho {
            found: volumes.len(),
        });
    }
    let second = volumes.pop().ok_or(QcError::NotDualEcho { found: 0 })?;
    let first = volumes.pop().ok_or(QcError::NotDualEcho { found: 1 })?;
    EchoPair::with_pairing(first, second, pairing)
}
