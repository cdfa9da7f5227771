use crate::consts::MAGNITUDE_EPSILON;
use num::Complex;
use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 相位图像的存储刻度.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum PhaseScale {
    /// 采样值本身就是弧度.
    #[default]
    Radians,

    /// 采样值为原始存储值 (例如 12 位整数), `[min, max]` 线性映射到 `[-π, π]`.
    Raw {
        /// 对应 -π 的存储值.
        min: f64,
        /// 对应 π 的存储值.
        max: f64,
    },
}

impl PhaseScale {
    /// 把存储值 `v` 转换为弧度.
    #[inline]
    pub fn to_radians(self, v: f64) -> f64 {
        match self {
            PhaseScale::Radians => v,
            PhaseScale::Raw { min, max } => (v - min) / (max - min) * 2.0 * PI - PI,
        }
    }
}

/// 以共轭乘积计算缠绕相位差 `arg(z2 · conj(z1))`, 其中 `zk = max(mk, ε) · e^{iφk}`.
///
/// 结果位于 `(-π, π]`. 直接相减 `φ2 - φ1` 在 ±π 处会产生 2π 的跳变,
/// 而这里的结果对相位整体加减 2π 不敏感. 任一输入非有限时返回 NaN.
#[inline]
pub fn wrapped_difference(phi1: f64, m1: f64, phi2: f64, m2: f64) -> f64 {
    if !(phi1.is_finite() && phi2.is_finite()) {
        return f64::NAN;
    }
    let z1 = Complex::from_polar(m1.max(MAGNITUDE_EPSILON), phi1);
    let z2 = Complex::from_polar(m2.max(MAGNITUDE_EPSILON), phi2);
    let d = (z2 * z1.conj()).arg();
    if d <= -PI {
        PI
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_small_difference() {
        assert!(float_eq(wrapped_difference(0.2, 1.0, 0.5, 1.0), 0.3));
        assert!(float_eq(wrapped_difference(0.5, 1.0, 0.2, 1.0), -0.3));
        assert!(float_eq(wrapped_difference(1.0, 1.0, 1.0, 1.0), 0.0));
    }

    #[test]
    fn test_wrap_boundary() {
        let eps = 0.01;
        // 真实相位差为 2ε, 但两个存储相位分别落在 ±π 两侧.
        let d = wrapped_difference(PI - eps, 1.0, -PI + eps, 1.0);
        assert!(float_eq(d, 2.0 * eps), "{d}");
        let d = wrapped_difference(-PI + eps, 1.0, PI - eps, 1.0);
        assert!(float_eq(d, -2.0 * eps), "{d}");
        // 整体偏移 2π 不影响结果.
        let d = wrapped_difference(0.1 + 2.0 * PI, 1.0, 0.4, 1.0);
        assert!(float_eq(d, 0.3), "{d}");
    }

    #[test]
    fn test_range_is_half_open() {
        assert!(float_eq(wrapped_difference(0.0, 1.0, PI, 1.0), PI));
        assert!(float_eq(wrapped_difference(PI, 1.0, 0.0, 1.0).abs(), PI));
        for i in -50..=50 {
            let d = wrapped_difference(0.0, 1.0, i as f64 * 0.37, 1.0);
            assert!(d > -PI && d <= PI, "{d}");
        }
    }

    #[test]
    fn test_degenerate_magnitude() {
        assert!(float_eq(wrapped_difference(0.2, 0.0, 0.5, 0.0), 0.3));
        assert!(float_eq(wrapped_difference(0.2, -3.0, 0.5, 1e-300), 0.3));
        assert!(wrapped_difference(f64::NAN, 1.0, 0.5, 1.0).is_nan());
        assert!(wrapped_difference(0.1, 1.0, f64::INFINITY, 1.0).is_nan());
    }

    #[test]
    fn test_raw_scale() {
        let raw = PhaseScale::Raw {
            min: 0.0,
            max: 4096.0,
        };
        assert!(float_eq(raw.to_radians(0.0), -PI));
        assert!(float_eq(raw.to_radians(2048.0), 0.0));
        assert!(float_eq(raw.to_radians(4096.0), PI));
        assert_eq!(PhaseScale::Radians.to_radians(1.25), 1.25);
    }
}
