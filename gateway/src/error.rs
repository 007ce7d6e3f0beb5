//! API 错误分类与 HTTP 状态映射.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::pipeline::PipelineError;

/// 面向 HTTP 的错误分类.
///
/// 校验错误映射到 400, 网格缺失映射到 404, 其余处理错误一律映射到 500
/// 并在 `detail` 字段携带错误文本.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 上传文件扩展名不可识别.
    #[error("Invalid file extension.")]
    InvalidExtension,

    /// multipart 请求中没有文件字段.
    #[error("Missing upload file field.")]
    MissingFile,

    /// multipart 解析失败.
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    /// 查询的 base 文件名含路径成分.
    #[error("Invalid base filename.")]
    InvalidBaseName,

    /// 请求的网格文件不存在.
    #[error("File not found")]
    MeshNotFound,

    /// 切片索引越界.
    #[error("Slice index ({x}, {y}, {z}) out of range for volume of shape {shape:?}.")]
    SliceOutOfRange {
        /// 请求的 x 索引.
        x: i64,
        /// 请求的 y 索引.
        y: i64,
        /// 请求的 z 索引.
        z: i64,
        /// 体数据 (x, y, z) 形状.
        shape: (usize, usize, usize),
    },

    /// 规范化体数据缺失或不可读.
    #[error("Failed to load normalized volume: {0}")]
    Volume(#[from] nifti::NiftiError),

    /// 上传处理管线失败.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// 响应编码或其它内部 I/O 失败.
    #[error("Internal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 阻塞任务 join 失败.
    #[error("Background task failed.")]
    TaskJoin,
}

impl ApiError {
    /// 对应的 HTTP 状态码.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidExtension | Self::MissingFile | Self::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::MeshNotFound => StatusCode::NOT_FOUND,
            Self::InvalidBaseName
            | Self::SliceOutOfRange { .. }
            | Self::Volume(_)
            | Self::Pipeline(_)
            | Self::Io(_)
            | Self::TaskJoin => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::MeshNotFound => json!({"error": "File not found"}),
            other => json!({"detail": other.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidExtension.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MeshNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::SliceOutOfRange {
                x: -1,
                y: 0,
                z: 0,
                shape: (2, 3, 4)
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::TaskJoin.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_detail_text() {
        let e = ApiError::InvalidExtension;
        assert_eq!(e.to_string(), "Invalid file extension.");
    }
}
