//! 环境变量驱动的服务配置.
//!
//! 全部配置在进程启动时装配一次, 此后只读; 不存在运行期的进程级
//! 环境变量修改.

use std::env;
use std::path::PathBuf;

use mr_berry::assets;

/// 服务配置.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 监听地址.
    pub bind: String,

    /// 体数据存储根目录.
    pub files_root: PathBuf,

    /// 模型 checkpoint 路径.
    pub checkpoint: PathBuf,

    /// 病灶分割图集路径. 每次上传的 lesion 网格都提取自该固定体数据.
    pub lesion_atlas: PathBuf,

    /// 请求体大小上限 (字节).
    pub max_body_bytes: usize,

    /// 网格下载启用 gzip 的最小字节数.
    pub compression_min_bytes: usize,

    /// 是否以 JSON 格式输出日志.
    pub log_json: bool,
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_path(name: &str, default: impl FnOnce() -> PathBuf) -> PathBuf {
    env::var_os(name).map(PathBuf::from).unwrap_or_else(default)
}

impl GatewayConfig {
    /// 从 `MRB_*` 环境变量装配配置.
    pub fn from_env() -> Self {
        Self {
            bind: env::var("MRB_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            files_root: env_path("MRB_FILES_ROOT", || PathBuf::from("files")),
            checkpoint: env_path("MRB_CHECKPOINT", assets::default_checkpoint_path),
            lesion_atlas: env_path("MRB_LESION_ATLAS", assets::default_lesion_atlas_path),
            max_body_bytes: env_usize("MRB_MAX_BODY_BYTES", 512 * 1024 * 1024),
            compression_min_bytes: env_usize("MRB_COMPRESSION_MIN_BYTES", 4096),
            log_json: env_bool("MRB_LOG_JSON", false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_bool_parsing() {
        // 未设置的变量取默认值.
        assert!(env_bool("MRB_TEST_UNSET_BOOL", true));
        assert!(!env_bool("MRB_TEST_UNSET_BOOL", false));
    }

    #[test]
    fn test_env_usize_parsing() {
        assert_eq!(env_usize("MRB_TEST_UNSET_USIZE", 42), 42);
    }
}
