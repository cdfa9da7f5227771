//! 通用常量.

/// 原质控限值表中 B0 均匀性的行动限, 单位 ppm.
pub const DEFAULT_ACTION_LIMIT_PPM: f64 = 0.5;

/// 默认内部 ROI 收缩比例. 只对模体有效半径 85% 以内的像素评分.
pub const DEFAULT_SHRINK_FRACTION: f64 = 0.85;

/// Otsu 阈值默认直方图分箱数.
pub const DEFAULT_HISTOGRAM_BINS: usize = 256;

/// 相对量到 ppm 的倍率.
pub const PPM: f64 = 1e6;

/// 回波时间分组精度, 单位秒. 差异小于该值的回波时间被视为同一回波.
pub const ECHO_TIME_RESOLUTION_S: f64 = 1e-6;

/// 切片排序键的配对精度. 两个回波的排序键四舍五入到该精度后必须相等.
pub const ORDER_KEY_RESOLUTION: f64 = 0.01;

/// 回波时间差 ΔTE 的下限, 单位秒. 更小的 ΔTE 会被钳位到该值.
pub const MIN_DELTA_TE_S: f64 = 1e-9;

/// 成像频率下限, 单位 Hz. 更小的值会被钳位到该值.
pub const MIN_IMAGING_FREQUENCY_HZ: f64 = 1.0;

/// 幅值下限. 构造复数相量时, 更小的幅值会被钳位到该值.
pub const MAGNITUDE_EPSILON: f64 = 1e-12;

/// 不同图像报告的成像频率之间允许的相对偏差. 超出时仅记录警告.
pub const IMAGING_FREQUENCY_TOLERANCE: f64 = 1e-6;

/// 质子旋磁比 γ/2π, 单位 Hz/T.
pub const PROTON_GAMMA_BAR_HZ_PER_T: f64 = 42.577_478_5e6;

/// 由主磁场强度 `field_t` (单位: 特斯拉) 估算质子 Larmor 频率, 单位 Hz.
///
/// # 注意
///
/// 质控流水线 **从不** 使用该函数; ppm 归一化总是取自图像元数据中的成像频率.
/// 它只供那些图像缺少成像频率属性的调用方自行填充 [`crate::ImageMeta`].
#[inline]
pub fn larmor_frequency_hz(field_t: f64) -> f64 {
    field_t * PROTON_GAMMA_BAR_HZ_PER_T
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_larmor_frequency_1_5t() {
        // 1.5 T 扫描仪约为 63.86 MHz.
        let f0 = larmor_frequency_hz(1.5);
        assert!((f0 - 63.866e6).abs() < 0.01e6, "{f0}");
    }
}
