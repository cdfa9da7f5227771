//! 数据集操作. 这是外部协作方的适配器, 不属于质控流水线本身.

use std::path::{Path, PathBuf};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P, I>(it: I) -> Option<PathBuf>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = P>,
{
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "nifti")] {
        mod echo_nifti;

        pub use echo_nifti::{open_echo, open_echoes, DatasetError, EchoSource};
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_dataset_dir_with() {
        let Some(base) = home_dataset_dir() else {
            return;
        };
        assert!(base.ends_with("dataset"));
        let full = home_dataset_dir_with(["b0", "phantom"]);
        assert_eq!(full, Some(base.join("b0").join("phantom")));
    }
}
