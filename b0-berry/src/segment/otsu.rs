use ndarray::ArrayView2;

/// Otsu 全局阈值: 在有限值的直方图上, 选取使类间方差最大的分割点.
///
/// 直方图覆盖有限值的 `[min, max]` 区间, 等分为 `bins` 个箱. 分割点 `t*`
/// 取类间方差最大的箱 (并列时取最小的 `t*`), 箱号 **大于** `t*`
/// 的像素为前景. 该过程完全确定, 结果可逐位复现.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OtsuThreshold {
    min: f64,
    bin_width: f64,
    bins: usize,
    split_bin: usize,
}

impl OtsuThreshold {
    /// 对 `data` 计算 Otsu 阈值. 非有限值 (NaN, ±inf) 不参与统计.
    ///
    /// # 返回值
    ///
    /// 没有有限值, 或所有有限值相同 (不存在可分的两类) 时返回 `None`.
    ///
    /// # 注意
    ///
    /// `bins` 至少为 2, 否则 panic.
    pub fn compute(data: ArrayView2<'_, f32>, bins: usize) -> Option<Self> {
        assert!(bins >= 2, "Otsu threshold needs at least 2 bins");

        let (min, max) = data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, &v| {
                let v = v as f64;
                Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
            })?;
        if max <= min {
            return None;
        }

        let mut ans = Self {
            min,
            bin_width: (max - min) / bins as f64,
            bins,
            split_bin: 0,
        };

        let mut histogram = vec![0usize; bins];
        for &v in data.iter().filter(|v| v.is_finite()) {
            histogram[ans.bin_of(v)] += 1;
        }

        let total = histogram.iter().sum::<usize>() as f64;
        let sum_total: f64 = histogram
            .iter()
            .enumerate()
            .map(|(i, &c)| i as f64 * c as f64)
            .sum();

        let mut sum_background = 0.0;
        let mut weight_background = 0.0;
        let mut max_variance = 0.0;
        for (t, &count) in histogram.iter().enumerate() {
            weight_background += count as f64;
            if weight_background == 0.0 {
                continue;
            }
            let weight_foreground = total - weight_background;
            if weight_foreground == 0.0 {
                break;
            }
            sum_background += t as f64 * count as f64;

            let mean_background = sum_background / weight_background;
            let mean_foreground = (sum_total - sum_background) / weight_foreground;
            let gap = mean_background - mean_foreground;
            let variance = weight_background * weight_foreground * gap * gap;
            if variance > max_variance {
                max_variance = variance;
                ans.split_bin = t;
            }
        }
        Some(ans)
    }

    /// 有限值 `v` 所在的箱号. 超出 `[min, max]` 的值被钳位到两端的箱.
    #[inline]
    fn bin_of(&self, v: f32) -> usize {
        let bin = ((v as f64 - self.min) / self.bin_width).floor();
        if bin <= 0.0 {
            0
        } else {
            (bin as usize).min(self.bins - 1)
        }
    }

    /// 类间方差最大的分割箱号 `t*`.
    #[inline]
    pub fn split_bin(&self) -> usize {
        self.split_bin
    }

    /// 阈值: 第一个前景箱的下边沿.
    #[inline]
    pub fn value(&self) -> f64 {
        self.min + (self.split_bin + 1) as f64 * self.bin_width
    }

    /// `v` 是否属于前景? 非有限值总是背景.
    #[inline]
    pub fn is_foreground(&self, v: f32) -> bool {
        v.is_finite() && self.bin_of(v) > self.split_bin
    }
}
