//! 实验结果.

use crate::algos::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Shrinks: {}", p.get_target())?;
    writeln!(w, "{S4}Empty ROIs: {}", p.get_trivial())?;
    writeln!(w, "{S4}Kept in total: {} px", p.get_kept())?;
    writeln!(w, "{S4}Monotonicity violations: {}", p.get_violations())?;
    writeln!(
        w,
        "{S4}Average radius ratio at default fraction: {}",
        f64_to_display(p.get_avg_radius_ratio())
    )?;
    writeln!(w, "{S4}Effective total time: {} us", p.get_target_time_us())?;
    writeln!(
        w,
        "{S4}Effective average time: {} us",
        f64_to_display(p.get_avg_target_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.get_real_time_us())?;
    let most = p
        .get_most_time_consuming()
        .map_or_else(|| "/".to_string(), |d| d.as_micros().to_string());
    write!(w, "{S4}Most time-consuming shrink costs {most} us")
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl FromIterator<(&'static str, Profile)> for AblationResult {
    fn from_iter<I: IntoIterator<Item = (&'static str, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }
}

impl AblationResult {
    /// 把运行结果写进 `w`, 各策略之间以分隔线隔开.
    pub fn analyze_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        utils::sep_to(&mut *w)?;
        for (key, profile) in self.data.iter() {
            describe_into(key, profile, w)?;
            writeln!(w)?;
            utils::sep_to(&mut *w)?;
        }
        Ok(())
    }

    /// 分析运行结果并打印.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        self.analyze_into(&mut stdout.lock())
    }
}
