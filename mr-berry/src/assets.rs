//! 模型与数据资产定位.

use std::path::{Path, PathBuf};

/// 资产根目录相对用户主目录的名称.
const ASSETS_DIR: &str = "mr-assets";

/// 获取 `{用户主目录}/mr-assets` 目录.
pub fn home_assets_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push(ASSETS_DIR);
    Some(ans)
}

/// 获取 `{用户主目录}/mr-assets` 目录下给定继续项组成的全路径.
pub fn home_assets_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_assets_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 默认模型 checkpoint 路径: `{用户主目录}/mr-assets/final_model/model.pth`.
///
/// 主目录不可得时回退到当前目录下的同名相对路径.
pub fn default_checkpoint_path() -> PathBuf {
    home_assets_dir_with(["final_model", "model.pth"])
        .unwrap_or_else(|| [ASSETS_DIR, "final_model", "model.pth"].iter().collect())
}

/// 默认病灶分割图集路径:
/// `{用户主目录}/mr-assets/BraTS20_Training_002/BraTS20_Training_002_seg.nii`.
///
/// 主目录不可得时回退到当前目录下的同名相对路径.
pub fn default_lesion_atlas_path() -> PathBuf {
    const PARTS: [&str; 2] = ["BraTS20_Training_002", "BraTS20_Training_002_seg.nii"];
    home_assets_dir_with(PARTS)
        .unwrap_or_else(|| std::iter::once(ASSETS_DIR).chain(PARTS).collect())
}
