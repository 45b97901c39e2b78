//! 🪣📡🏗️ S3 Store — four verbs, one bucket, zero half-written objects.
//!
//! COLD OPEN — EXT. DATA CENTER — 3:47 AM
//!
//! The on-call engineer stared at the terminal. "Just copy what's missing," they whispered.
//! The S3Store blinked back. "HEAD first," it said. "Always HEAD first."
//!
//! 🧠 Knowledge graph:
//! - `S3Store::new(&EndpointConfig)`: static credentials, explicit region, custom endpoint,
//!   path-style by default. No `aws_config::from_env()` here; every knob comes from our config.
//! - `S3KeyListing`: `ListObjectsV2` paginator → boxed stream of pages → one page buffered.
//! - `exists`: a modeled `NotFound` or a raw 404 is "absent". Anything else is an error.
//!   A 403 is NOT "absent". A timeout is NOT "absent". The cloud being sad is NOT "absent".

use std::collections::VecDeque;

use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::trace;

use crate::backends::{EndpointConfig, KeyListing, KeyListingBackend, ObjectPayload, ObjectStore};

// -- 🏷️ shows up in the SDK's credential provider name. nobody reads it. we named it anyway.
const CREDENTIALS_PROVIDER_NAME: &str = "s3mirror-static";

/// 🪣 One bucket on one S3-compatible server.
#[derive(Debug, Clone)]
pub(crate) struct S3Store {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    endpoint_url: String,
}

impl S3Store {
    /// 🚀 Builds the SDK client for one endpoint.
    ///
    /// No request leaves the building yet. Wrong credentials, wrong host, wrong region:
    /// all of those show up on the first `list`/`exists` call, not here.
    pub(crate) fn new(endpoint: &EndpointConfig) -> Result<Self> {
        ensure!(
            !endpoint.bucket.trim().is_empty(),
            "💀 Cannot build an S3 client without a bucket name. We need to know where to knock."
        );
        ensure!(
            !endpoint.endpoint.trim().is_empty(),
            "💀 Cannot build an S3 client for bucket '{}' without an endpoint. Where does it live?",
            endpoint.bucket
        );

        let the_endpoint_url = endpoint.endpoint_url();
        let the_credentials = Credentials::new(
            endpoint.access_key.clone(),
            endpoint.secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let the_sdk_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(endpoint.effective_region()))
            .credentials_provider(the_credentials)
            .endpoint_url(the_endpoint_url.clone())
            .force_path_style(endpoint.path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(the_sdk_config),
            bucket: endpoint.bucket.clone(),
            prefix: endpoint.effective_prefix().map(str::to_owned),
            endpoint_url: the_endpoint_url,
        })
    }
}

/// 🔍 Was this HEAD failure a plain "no such object"?
///
/// The modeled `NotFound` covers AWS and MinIO. The raw 404 check covers the stores that
/// answer HEAD with a bare status code and let the SDK guess.
fn is_not_found(err: &SdkError<HeadObjectError, HttpResponse>) -> bool {
    if err.as_service_error().is_some_and(HeadObjectError::is_not_found) {
        return true;
    }
    err.raw_response()
        .is_some_and(|response| response.status().as_u16() == 404)
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self) -> Result<KeyListingBackend> {
        let the_label = self.describe();
        let the_paginator = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(self.prefix.clone())
            .into_paginator()
            .send();

        // 🔄 The paginator has an async `next()` but is not a `Stream`. `unfold` makes it one,
        // so the listing can own it without naming the SDK's internal types.
        let the_pages = stream::unfold(the_paginator, |mut paginator| async move {
            paginator.next().await.map(|page| (page, paginator))
        })
        .map(move |page| {
            page.with_context(|| {
                format!(
                    "💀 ListObjectsV2 failed for {the_label}. The listing is incomplete and \
                     cannot be resumed. Check: credentials, bucket name, endpoint, network."
                )
            })
            .map(|output| {
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
        })
        .boxed();

        Ok(KeyListingBackend::S3(S3KeyListing {
            pages: the_pages,
            buffered_page: VecDeque::new(),
        }))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(anyhow::Error::new(err).context(format!(
                "💀 HEAD failed for s3://{}/{} and it was not a 404. \
                 Refusing to guess whether the object is there.",
                self.bucket, key
            ))),
        }
    }

    async fn fetch(&self, key: &str) -> Result<ObjectPayload> {
        let the_response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| {
                format!(
                    "💀 GetObject failed for s3://{}/{}. Check: key still exists, read permissions.",
                    self.bucket, key
                )
            })?;

        let the_content_type = the_response.content_type().map(str::to_owned);
        let the_body = the_response
            .body
            .collect()
            .await
            .with_context(|| {
                format!(
                    "💀 Reading the body of s3://{}/{} failed halfway. The connection ghosted us.",
                    self.bucket, key
                )
            })?
            .into_bytes();

        trace!("🪣 fetched {} bytes from s3://{}/{}", the_body.len(), self.bucket, key);
        Ok(ObjectPayload {
            content_type: the_content_type,
            ..ObjectPayload::new(the_body)
        })
    }

    async fn store(&self, key: &str, payload: ObjectPayload) -> Result<()> {
        let the_content_length = i64::try_from(payload.size())
            .context("💀 Payload is bigger than i64::MAX bytes. Impressive. Also unsupported.")?;

        // 📤 One PutObject, whole body, known length. S3 makes the key visible only once the
        // upload completes, so readers never see a partial object.
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(the_content_length)
            .set_content_type(payload.content_type)
            .body(ByteStream::from(payload.body))
            .send()
            .await
            .with_context(|| {
                format!(
                    "💀 PutObject failed for s3://{}/{}. Check: write permissions, quota, bucket exists.",
                    self.bucket, key
                )
            })?;

        trace!("🪣 stored {} bytes at s3://{}/{}", the_content_length, self.bucket, key);
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("s3://{}/{} ({})", self.bucket, prefix, self.endpoint_url),
            None => format!("s3://{} ({})", self.bucket, self.endpoint_url),
        }
    }
}

/// 📜 A live `ListObjectsV2` walk. Holds at most one page of keys at a time.
pub(crate) struct S3KeyListing {
    pages: BoxStream<'static, Result<Vec<String>>>,
    buffered_page: VecDeque<String>,
}

#[async_trait]
impl KeyListing for S3KeyListing {
    async fn next_key(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(key) = self.buffered_page.pop_front() {
                return Ok(Some(key));
            }
            // -- 📄 empty pages happen (prefix with nothing under it). keep asking until EOF.
            match self.pages.next().await {
                Some(page) => self.buffered_page.extend(page?),
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn the_endpoint() -> EndpointConfig {
        EndpointConfig {
            bucket: "mirror-me".to_string(),
            region: String::new(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            endpoint: "localhost:9000".to_string(),
            use_ssl: false,
            path_style: true,
            prefix: None,
        }
    }

    #[tokio::test]
    async fn the_one_where_the_store_describes_itself_with_bucket_and_endpoint() {
        let the_store = S3Store::new(&the_endpoint())
            .expect("💀 Building a client is offline work. It should not fail.");
        assert_eq!(the_store.describe(), "s3://mirror-me (http://localhost:9000)");
    }

    #[tokio::test]
    async fn the_one_where_the_prefix_shows_up_in_the_label() {
        let mut the_config = the_endpoint();
        the_config.prefix = Some("photos/2024".to_string());
        let the_store = S3Store::new(&the_config)
            .expect("💀 Building a client is offline work. It should not fail.");
        assert_eq!(
            the_store.describe(),
            "s3://mirror-me/photos/2024 (http://localhost:9000)"
        );
    }

    #[tokio::test]
    async fn the_one_where_no_bucket_means_no_client() {
        let mut the_config = the_endpoint();
        the_config.bucket = "  ".to_string();
        assert!(S3Store::new(&the_config).is_err());
    }

    #[tokio::test]
    async fn the_one_where_no_endpoint_means_no_client() {
        let mut the_config = the_endpoint();
        the_config.endpoint = String::new();
        assert!(S3Store::new(&the_config).is_err());
    }
}
