//! 脑部 MRI 分割与网格提取 HTTP 服务.
//!
//! 路由面:
//!
//! - `POST /upload/`: 上传体数据并运行 规范化 -> 预测 -> 网格提取 管线.
//! - `GET /obj/{filename}`: 下载网格文件.
//! - `POST /get_dimensions/`: 查询规范化体数据形状.
//! - `POST /get_slices/`: 查询三轴切片.

use std::io;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mr_berry::oracle::SegmentationOracle;

pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod store;

use config::GatewayConfig;
use store::VolumeStore;

/// 全部请求处理器共享的应用状态.
#[derive(Clone)]
pub struct AppState {
    /// 体数据存储.
    pub store: Arc<VolumeStore>,

    /// 分割 oracle. checkpoint 首次使用时装载一次, 此后只读共享.
    pub oracle: Arc<SegmentationOracle>,

    /// 启动时装配的只读配置.
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// 由配置装配应用状态, 必要时创建存储目录.
    pub fn new(config: GatewayConfig) -> io::Result<Self> {
        let store = VolumeStore::create(&config.files_root)?;
        let oracle = SegmentationOracle::new(config.checkpoint.clone());
        Ok(Self {
            store: Arc::new(store),
            oracle: Arc::new(oracle),
            config: Arc::new(config),
        })
    }
}

/// 构建服务路由. CORS 全放开, 仅面向本地/演示场景.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.max_body_bytes;
    Router::new()
        .route("/upload/", post(handlers::upload_volume))
        .route("/obj/:filename", get(handlers::get_mesh))
        .route("/get_dimensions/", post(handlers::get_dimensions))
        .route("/get_slices/", post(handlers::get_slices))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
