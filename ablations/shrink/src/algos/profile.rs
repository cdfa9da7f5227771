//! 算法运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间 (微秒).
    #[inline]
    fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 收缩策略的运行统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 得到空 ROI 的收缩次数.
    trivial: u64,

    /// 收缩总次数.
    target: u64,

    /// 收缩本身花费的总时间.
    target_time: AccTimer,

    /// 整个任务花费的总时间 (包括单调性检查与统计).
    real_time: AccTimer,

    /// 最耗时的一次收缩.
    most: Option<Duration>,

    /// 所有 ROI 的像素总数.
    kept: u64,

    /// 比例增大时 ROI 却没有包含上一个 ROI 的次数.
    violations: u64,

    /// 默认比例下 ROI 等效半径与模体等效半径之比, 按模体累加.
    radius_ratio_sum: f64,
    radius_ratio_count: u64,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            trivial: 0,
            target: 0,
            target_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
            kept: 0,
            violations: 0,
            radius_ratio_sum: 0.0,
            radius_ratio_count: 0,
        }
    }

    /// 记录一次收缩. `start` 表明是否同时开启计时.
    #[inline]
    pub fn count_target(&mut self, start: bool) {
        self.target += 1;
        if start {
            self.target_time.start();
        }
    }

    /// 结束一次收缩计时.
    #[inline]
    pub fn target_elapsed(&mut self) {
        let d = self.target_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
    }

    /// 记录一个收缩结果: ROI 像素数 `kept`.
    #[inline]
    pub fn count_roi(&mut self, kept: usize) {
        if kept == 0 {
            self.trivial += 1;
        }
        self.kept += kept as u64;
    }

    /// 记录一次单调性破坏.
    #[inline]
    pub fn count_violation(&mut self) {
        self.violations += 1;
    }

    /// 记录一个模体的等效半径之比.
    #[inline]
    pub fn record_radius_ratio(&mut self, ratio: f64) {
        if ratio.is_finite() {
            self.radius_ratio_sum += ratio;
            self.radius_ratio_count += 1;
        }
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    #[inline]
    pub fn get_trivial(&self) -> u64 {
        self.trivial
    }

    #[inline]
    pub fn get_target(&self) -> u64 {
        self.target
    }

    #[inline]
    pub fn get_kept(&self) -> u64 {
        self.kept
    }

    #[inline]
    pub fn get_violations(&self) -> u64 {
        self.violations
    }

    /// 以微秒为单位获得收缩的总花费时间.
    #[inline]
    pub fn get_target_time_us(&self) -> u64 {
        self.target_time.get_total_us()
    }

    /// 以微秒为单位获得任务的总时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.get_total_us()
    }

    /// 单次收缩的平均时间 (微秒).
    #[inline]
    pub fn get_avg_target_time_us(&self) -> Option<f64> {
        match self.target {
            0 => None,
            target => Some(self.get_target_time_us() as f64 / target as f64),
        }
    }

    /// 默认比例下的平均等效半径之比.
    #[inline]
    pub fn get_avg_radius_ratio(&self) -> Option<f64> {
        match self.radius_ratio_count {
            0 => None,
            n => Some(self.radius_ratio_sum / n as f64),
        }
    }

    /// 最耗时的一次收缩. 如果不存在任务, 则返回 `None`.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
