#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 基于双回波 (dual-TE) 相位差, 计算 MRI 质控模体内部的 B0 场均匀性,
//! 并给出 PASS/FAIL 判定.
//!
//! 该 crate 目前仅提供 `safe` 接口. 不进行任何磁盘 I/O (`dataset` 适配器除外),
//! 调用方负责把 DICOM / NIfTI 等数据读入内存后交给本库.
//!
//! # 注意
//!
//! 1. 结构性输入错误 (缺少元数据, 回波数不为 2, 几何不一致) 一律立即返回 `Err`,
//!   不做任何猜测.
//! 2. 某个切片找不到模体是 **状态** 而不是错误; 只有所有切片都找不到模体时,
//!   才会升级为 [`QcError::NoValidPhantom`], 绝不会因此给出 PASS.
//!
//! # 开发计划
//!
//! ### 图像栈加载 ✅
//!
//! 按回波时间分组, 组内按切片排序键升序排列, 组装为 [`EchoPair`].
//!
//! 实现位于 `b0-berry/src/loader.rs`.
//!
//! ### 模体分割 ✅
//!
//! Otsu 全局阈值 + 孔洞填充 + 连通域分析, 保留面积最大的连通区域.
//!
//! 实现位于 `b0-berry/src/segment`.
//!
//! ### 内部 ROI 收缩 ✅
//!
//! 两种等价策略: 欧氏距离变换 (默认) 与质心-最大半径. 两者都满足平移不变性,
//! 且对收缩比例单调.
//!
//! 实现位于 `b0-berry/src/roi`.
//!
//! ### 场图估计 ✅
//!
//! 共轭乘积求相位差 (天然避免 ±2π 缠绕), 换算为 Hz, 再以成像频率归一化为 ppm.
//!
//! 实现位于 `b0-berry/src/field`.
//!
//! ### 聚合与判定 ✅
//!
//! 切片内取 ROI 上 |ppm| 最大值, 切片间再取最大值, 与行动限比较 (含等号).
//!
//! 实现位于 `b0-berry/src/eval.rs` 和 `b0-berry/src/pipeline.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 掩膜压缩存储 (`CompactMask`), 便于报告/持久化协作方保存每个切片的 ROI. ✅
//! 2. NIfTI 回波数据加载适配器 (feature `nifti`). ✅
//! 3. 按切片并行 (feature `rayon`), 结果与串行完全一致. ✅

/// 二维索引 `(高, 宽)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 高精度二维坐标 `(高, 宽)`, 用于质心等亚像素位置.
pub type Idx2dF = (f64, f64);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

pub mod config;
pub mod consts;

/// 图像, 体数据与掩膜等基础数据结构.
mod data;

pub use data::{
    CompactMask, EchoPair, Image, ImageMeta, InteriorRoi, PhantomMask, TaggedImage, Volume,
};

pub mod dataset;

mod error;

pub use error::{MetaField, QcError, Result};

pub mod eval;
pub mod field;
pub mod loader;
mod neighbour;
pub mod pipeline;
pub mod prelude;
pub mod roi;
pub mod segment;

#[cfg(test)]
pub(crate) mod testing;
