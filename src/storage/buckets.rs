//! Bucket provisioning on the S3 API
//!
//! `object_store` only talks to objects, so creating a missing bucket and
//! opening the public one to anonymous reads goes through `aws-sdk-s3`.

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use super::{Result, StorageError, Visibility};
use crate::config::StorageConfig;

/// Region S3 treats as the default; it must not be sent as a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// Anonymous read access to every object in `bucket`
pub fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "AddPerm",
            "Effect": "Allow",
            "Principal": {"AWS": ["*"]},
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/*")]
        }]
    })
    .to_string()
}

/// Creates buckets on first use
#[derive(Clone)]
pub struct BucketProvisioner {
    client: Client,
    region: String,
}

impl BucketProvisioner {
    pub fn new(config: &StorageConfig, endpoint: &Url) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone().unwrap_or_default(),
            config.secret_key.clone().unwrap_or_default(),
            None,
            None,
            "minls-config",
        );

        let conf = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(conf),
            region: config.region.clone(),
        }
    }

    /// Make sure `bucket` exists.
    ///
    /// A newly created public bucket also gets the anonymous read policy.
    /// Existing buckets are left as they are.
    pub async fn ensure(&self, bucket: &str, visibility: Visibility) -> Result<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!(bucket, "Bucket exists");
                return Ok(());
            }
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found())
                    || err.raw_response().map(|r| r.status().as_u16()) == Some(404);
                if !not_found {
                    return Err(bucket_error(bucket, "check", err));
                }
            }
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| bucket_error(bucket, "create", e))?;
        info!(bucket, region = %self.region, "Bucket created");

        if visibility == Visibility::Public {
            let policy = public_read_policy(bucket);
            self.client
                .put_bucket_policy()
                .bucket(bucket)
                .policy(&policy)
                .send()
                .await
                .map_err(|e| bucket_error(bucket, "set policy on", e))?;
            debug!(bucket, policy = %policy, "Public read policy set");
        }

        Ok(())
    }
}

fn bucket_error<E: std::error::Error>(bucket: &str, action: &str, err: E) -> StorageError {
    StorageError::Bucket {
        bucket: bucket.to_string(),
        reason: format!("could not {action} bucket: {}", DisplayErrorContext(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{Method, StatusCode, Uri};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct MockS3 {
        exists: bool,
        requests: Vec<(Method, Uri, Bytes)>,
    }

    type Shared = Arc<Mutex<MockS3>>;

    async fn s3_handler(
        State(state): State<Shared>,
        method: Method,
        uri: Uri,
        body: Bytes,
    ) -> StatusCode {
        let mut s3 = state.lock().unwrap();
        s3.requests.push((method.clone(), uri.clone(), body));

        let policy = uri.query().is_some_and(|q| q.contains("policy"));
        if method == Method::HEAD {
            if s3.exists {
                StatusCode::OK
            } else {
                StatusCode::NOT_FOUND
            }
        } else if method == Method::PUT && policy {
            StatusCode::NO_CONTENT
        } else if method == Method::PUT {
            s3.exists = true;
            StatusCode::OK
        } else {
            StatusCode::METHOD_NOT_ALLOWED
        }
    }

    async fn start_mock_s3(exists: bool) -> (Url, Shared) {
        let state: Shared = Arc::new(Mutex::new(MockS3 {
            exists,
            ..Default::default()
        }));
        let app = Router::new().fallback(s3_handler).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (Url::parse(&format!("http://{addr}")).unwrap(), state)
    }

    fn provisioner(endpoint: &Url) -> BucketProvisioner {
        let config = StorageConfig {
            endpoint: Some(endpoint.to_string()),
            access_key: Some("minio".to_string()),
            secret_key: Some("minio123".to_string()),
            ..StorageConfig::default()
        };
        BucketProvisioner::new(&config, endpoint)
    }

    #[test]
    fn test_public_read_policy() {
        let policy: serde_json::Value =
            serde_json::from_str(&public_read_policy("minls-public")).unwrap();

        assert_eq!(policy["Version"], "2012-10-17");
        let statement = &policy["Statement"][0];
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Principal"]["AWS"][0], "*");
        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert_eq!(statement["Resource"][0], "arn:aws:s3:::minls-public/*");
    }

    #[tokio::test]
    async fn test_missing_public_bucket_created_with_policy() {
        let (endpoint, state) = start_mock_s3(false).await;

        provisioner(&endpoint)
            .ensure("minls-public", Visibility::Public)
            .await
            .unwrap();

        let s3 = state.lock().unwrap();
        let calls: Vec<(&Method, bool)> = s3
            .requests
            .iter()
            .map(|(m, uri, _)| (m, uri.query().is_some_and(|q| q.contains("policy"))))
            .collect();
        assert_eq!(
            calls,
            [(&Method::HEAD, false), (&Method::PUT, false), (&Method::PUT, true)]
        );
        assert!(s3.requests.iter().all(|(_, uri, _)| uri.path().starts_with("/minls-public")));

        let policy: serde_json::Value = serde_json::from_slice(&s3.requests[2].2).unwrap();
        assert_eq!(policy["Statement"][0]["Resource"][0], "arn:aws:s3:::minls-public/*");
    }

    #[tokio::test]
    async fn test_missing_private_bucket_has_no_policy() {
        let (endpoint, state) = start_mock_s3(false).await;

        provisioner(&endpoint)
            .ensure("minls-private", Visibility::Private)
            .await
            .unwrap();

        let methods: Vec<Method> = state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(m, _, _)| m.clone())
            .collect();
        assert_eq!(methods, [Method::HEAD, Method::PUT]);
    }

    #[tokio::test]
    async fn test_existing_bucket_untouched() {
        let (endpoint, state) = start_mock_s3(true).await;

        provisioner(&endpoint)
            .ensure("minls-public", Visibility::Public)
            .await
            .unwrap();

        assert_eq!(state.lock().unwrap().requests.len(), 1);
    }
}
