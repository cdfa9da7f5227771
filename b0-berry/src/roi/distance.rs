use crate::{InteriorRoi, PhantomMask};
use ndarray::{s, Array2, ArrayView2, Axis};

/// 精确欧氏距离变换: 每个前景像素到最近背景像素的距离 (像素), 背景像素为 0.
///
/// 图像之外视为背景. 先逐列求一维距离平方, 再逐行求抛物线下包络
/// (Felzenszwalb & Huttenlocher, 2012).
pub fn distance_transform(mask: ArrayView2<'_, bool>) -> Array2<f64> {
    let (height, width) = mask.dim();
    // 四周各填充一圈背景.
    let mut padded = Array2::from_elem((height + 2, width + 2), false);
    padded.slice_mut(s![1..=height, 1..=width]).assign(&mask);

    let mut sq = Array2::<f64>::zeros(padded.dim());
    let columns = padded.axis_iter(Axis(1)).zip(sq.axis_iter_mut(Axis(1)));
    for (src, mut dst) in columns {
        // 每列首尾都是背景, 两次扫描即得到到最近背景的一维距离.
        let n = src.len();
        let mut last = 0usize;
        for q in 0..n {
            if !src[q] {
                last = q;
            }
            dst[q] = (q - last) as f64;
        }
        let mut next = n - 1;
        for q in (0..n).rev() {
            if !src[q] {
                next = q;
            }
            dst[q] = dst[q].min((next - q) as f64).powi(2);
        }
    }

    let mut f = Vec::with_capacity(width + 2);
    let mut out = vec![0.0; width + 2];
    for mut row in sq.axis_iter_mut(Axis(0)) {
        f.clear();
        f.extend(row.iter().copied());
        lower_envelope(&f, &mut out);
        row.iter_mut().zip(&out).for_each(|(r, &o)| *r = o);
    }

    sq.slice(s![1..=height, 1..=width]).mapv(f64::sqrt)
}

/// 一维平方距离变换: `out[q] = min_p ((q - p)^2 + f[p])`. `f` 必须全为有限值.
fn lower_envelope(f: &[f64], out: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let intersect = |p: usize, q: usize| {
        let (pf, qf) = (p as f64, q as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
    };

    // v: 下包络中抛物线的顶点; z: 相邻抛物线的分界.
    let mut v = vec![0usize; n];
    let mut z = vec![0.0; n + 1];
    let mut k = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        let mut s = intersect(v[k], q);
        while s <= z[k] {
            k -= 1;
            s = intersect(v[k], q);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, o) in out.iter_mut().enumerate().take(n) {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let d = q as f64 - v[k] as f64;
        *o = d * d + f[v[k]];
    }
}

/// 距离变换策略: 保留距离大于 `(1 - fraction) * max(distance)` 的像素.
pub(super) fn shrink_by_distance(mask: &PhantomMask, fraction: f64) -> InteriorRoi {
    let dist = distance_transform(mask.array_view());
    let max = dist.iter().copied().fold(0.0, f64::max);
    let threshold = (1.0 - fraction) * max;
    InteriorRoi::new(dist.mapv(|d| d > threshold))
}
