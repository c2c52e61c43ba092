use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::StorageConfig;

/// Object storage holding uploaded resumes.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn get_object(&self, key: &str) -> anyhow::Result<Bytes>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig, region: &str) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> anyhow::Result<Bytes> {
        let out = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 get_object")?;
        let data = out.body.collect().await.context("s3 read body")?;
        Ok(data.into_bytes())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

pub const PRESIGN_TTL_SECS: u64 = 30 * 60;

/// Download link for a stored object, or `None` when there is no object.
pub async fn presign_optional(
    storage: &dyn StorageClient,
    key: &str,
    expires_seconds: u64,
) -> anyhow::Result<Option<String>> {
    if key.trim().is_empty() {
        return Ok(None);
    }
    storage
        .presign_get(key, expires_seconds)
        .await
        .with_context(|| format!("presign url for {key}"))
        .map(Some)
}

pub async fn presign_many(
    storage: &dyn StorageClient,
    keys: &[&str],
    expires_seconds: u64,
) -> anyhow::Result<Vec<Option<String>>> {
    let mut out = Vec::with_capacity(keys.len());
    for k in keys {
        out.push(presign_optional(storage, k, expires_seconds).await?);
    }
    Ok(out)
}

#[cfg(test)]
mod storage_tests {
    use super::*;
    use crate::state::test_support::FakeStorage;

    #[tokio::test]
    async fn presign_many_skips_missing_objects() {
        let urls = presign_many(&FakeStorage, &["resumes/a/1.pdf", "", "resumes/b/2.docx"], 1800)
            .await
            .unwrap();
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0].as_deref(), Some("https://fake.local/resumes/a/1.pdf"));
        assert_eq!(urls[1], None);
        assert!(urls[2].as_deref().unwrap().ends_with("2.docx"));
    }
}
