//! 体数据存储目录.
//!
//! 平铺目录, 以文件名为键: 上传原件与规范化导出同级存放,
//! 网格文本写入 `obj_output/` 子目录. 同名上传会相互覆盖 (无版本化).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mr_berry::consts::name;

/// 网格输出子目录名.
const OBJ_OUTPUT_DIR: &str = "obj_output";

/// 体数据存储目录.
#[derive(Debug)]
pub struct VolumeStore {
    root: PathBuf,
    obj_dir: PathBuf,
}

/// 键名是否含路径成分?
fn has_path_component(key: &str) -> bool {
    key.is_empty() || key.contains(['/', '\\']) || key.contains("..")
}

impl VolumeStore {
    /// 打开 (必要时创建) 存储目录与网格输出子目录.
    pub fn create<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_owned();
        let obj_dir = root.join(OBJ_OUTPUT_DIR);
        fs::create_dir_all(&obj_dir)?;
        Ok(Self { root, obj_dir })
    }

    /// 存储根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 网格输出目录.
    #[inline]
    pub fn obj_dir(&self) -> &Path {
        &self.obj_dir
    }

    /// 上传文件的存储路径.
    #[inline]
    pub fn volume_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// base name 对应的规范化体数据路径.
    #[inline]
    pub fn normalized_path(&self, base: &str) -> PathBuf {
        self.root.join(name::normalized(base))
    }

    /// base name 对应的脑部网格路径.
    #[inline]
    pub fn brain_mesh_path(&self, base: &str) -> PathBuf {
        self.obj_dir.join(name::brain_mesh(base))
    }

    /// base name 对应的病灶网格路径.
    #[inline]
    pub fn lesion_mesh_path(&self, base: &str) -> PathBuf {
        self.obj_dir.join(name::lesion_mesh(base))
    }

    /// 以查询 base name 解析规范化体数据路径. 含路径成分的键一律拒绝.
    pub fn normalized_query_path(&self, base: &str) -> Option<PathBuf> {
        (!has_path_component(base)).then(|| self.normalized_path(base))
    }

    /// 以文件名解析网格下载路径. 含路径成分的文件名一律拒绝.
    pub fn mesh_download_path(&self, filename: &str) -> Option<PathBuf> {
        (!has_path_component(filename)).then(|| self.obj_dir.join(filename))
    }

    /// 持久化上传内容, 返回落盘路径.
    pub fn persist(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.volume_path(filename);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// 删除一次请求产生的全部文件: 上传原件、规范化导出与两个网格.
    /// 其它请求的文件不受影响. 返回实际删除的文件数.
    pub fn cleanup_request(&self, filename: &str, base: &str) -> usize {
        let targets = [
            self.volume_path(filename),
            self.normalized_path(base),
            self.brain_mesh_path(base),
            self.lesion_mesh_path(base),
        ];
        let mut removed = 0usize;
        for path in targets {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("cleanup: failed to remove {}: {e}", path.display());
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, VolumeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VolumeStore::create(dir.path().join("files")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_makes_directories() {
        let (_dir, store) = store();
        assert!(store.root().is_dir());
        assert!(store.obj_dir().is_dir());
        assert!(store.obj_dir().ends_with("obj_output"));
    }

    #[test]
    fn test_derived_paths() {
        let (_dir, store) = store();
        assert!(store
            .normalized_path("brain")
            .ends_with("brain_normalized.nii.gz"));
        assert!(store
            .brain_mesh_path("brain")
            .ends_with("obj_output/brain_brain.obj"));
        assert!(store
            .lesion_mesh_path("brain")
            .ends_with("obj_output/brain_lesion.obj"));
    }

    #[test]
    fn test_path_component_rejection() {
        let (_dir, store) = store();
        assert!(store.mesh_download_path("brain_brain.obj").is_some());
        assert!(store.mesh_download_path("../secret").is_none());
        assert!(store.mesh_download_path("a/b.obj").is_none());
        assert!(store.mesh_download_path("").is_none());
        assert!(store.normalized_query_path("brain").is_some());
        assert!(store.normalized_query_path("../../etc").is_none());
    }

    #[test]
    fn test_persist_and_scoped_cleanup() {
        let (_dir, store) = store();

        store.persist("brain.nii.gz", b"fake").unwrap();
        store.persist("other.nii", b"bystander").unwrap();
        fs::write(store.normalized_path("brain"), b"norm").unwrap();
        fs::write(store.brain_mesh_path("brain"), b"mesh").unwrap();

        let removed = store.cleanup_request("brain.nii.gz", "brain");
        assert_eq!(removed, 3);

        // 其它请求的文件不受影响.
        assert!(store.volume_path("other.nii").is_file());
        assert!(!store.volume_path("brain.nii.gz").exists());
        assert!(!store.normalized_path("brain").exists());
        assert!(!store.brain_mesh_path("brain").exists());
    }
}
