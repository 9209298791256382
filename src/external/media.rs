//! 订单项图片存储
//!
//! 支持 base64 data URI 与 http(s) 图片链接，文件写入 `<root>/order_items/`。
//! 任何失败只记录 warn 日志并返回 `None`，不影响下单。

use crate::config::MediaConfig;
use crate::error::{AppError, AppResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

const ORDER_ITEM_DIR: &str = "order_items";
const FALLBACK_EXT: &str = "jpg";

#[derive(Clone)]
pub struct MediaStore {
    http: Client,
    root: PathBuf,
}

impl MediaStore {
    pub fn new(cfg: &MediaConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("storefront-backend/media")
            .timeout(Duration::from_secs(cfg.download_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            root: PathBuf::from(&cfg.root),
        })
    }

    /// 解析客户端提交的图片，返回相对于媒体根目录的路径
    ///
    /// 接受字符串或 `{ "uri": "..." }`
    pub async fn resolve(&self, image: Option<&Value>) -> Option<String> {
        let source = match image? {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map.get("uri")?.as_str()?,
            _ => return None,
        };
        if source.is_empty() {
            return None;
        }

        match self.store(source).await {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Order item image dropped: {e}");
                None
            }
        }
    }

    /// 删除已保存的图片，失败只记录日志
    pub async fn discard(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("Failed to remove media file {}: {e}", path.display());
        }
    }

    async fn store(&self, source: &str) -> AppResult<Option<String>> {
        if source.starts_with("data:image") {
            let (ext, bytes) = decode_data_uri(source)?;
            return self.save(&bytes, &ext).await.map(Some);
        }
        if source.starts_with("http://") || source.starts_with("https://") {
            return self.download(source).await.map(Some);
        }
        Ok(None)
    }

    async fn download(&self, url: &str) -> AppResult<String> {
        let parsed = Url::parse(url)
            .map_err(|e| AppError::ValidationError(format!("Invalid image url {url}: {e}")))?;

        let resp = self.http.get(parsed.clone()).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(AppError::ExternalApiError(format!(
                "Image download from {url} returned HTTP {}",
                resp.status().as_u16()
            )));
        }
        let bytes = resp.bytes().await?;

        self.save(&bytes, &extension_from_url(&parsed)).await
    }

    async fn save(&self, bytes: &[u8], ext: &str) -> AppResult<String> {
        let relative = format!("{ORDER_ITEM_DIR}/{}.{ext}", uuid::Uuid::new_v4());
        let full = self.root.join(&relative);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        log::debug!("Stored order item image at {}", full.display());
        Ok(relative)
    }
}

/// `data:image/<ext>;base64,<payload>`
fn decode_data_uri(source: &str) -> AppResult<(String, Vec<u8>)> {
    let (header, payload) = source
        .split_once(";base64,")
        .ok_or_else(|| AppError::ValidationError("Image data URI is not base64".to_string()))?;
    let ext = header.rsplit('/').next().unwrap_or_default();
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::ValidationError(format!("Invalid base64 image: {e}")))?;
    Ok((sanitize_extension(ext), bytes))
}

fn extension_from_url(url: &Url) -> String {
    let file_name = url.path().rsplit('/').next().unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((_, ext)) => sanitize_extension(ext),
        None => FALLBACK_EXT.to_string(),
    }
}

fn sanitize_extension(ext: &str) -> String {
    let ext = ext.to_ascii_lowercase();
    if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        FALLBACK_EXT.to_string()
    }
}
