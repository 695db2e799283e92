//! Geometry service contract and its HTTP implementation.

use async_trait::async_trait;
use geoedit_settings::ServiceSettings;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};
use crate::protocol::{
    BufferRequest, CalculateRequest, GeometryResponse, MergeRequest, MetricsResponse, Operation,
    SimplifyRequest, SplitRequest, SplitResponse, ValidateRequest, ValidationReport,
};

/// Remote geometry processing.
///
/// Implementations report service-level failures through the `success` and
/// `error` fields of the response; `Err` is reserved for transport failures.
#[async_trait]
pub trait GeometryService: Send + Sync {
    async fn simplify(&self, request: SimplifyRequest) -> ServiceResult<GeometryResponse>;

    async fn merge(&self, request: MergeRequest) -> ServiceResult<GeometryResponse>;

    async fn split(&self, request: SplitRequest) -> ServiceResult<SplitResponse>;

    async fn validate(&self, request: ValidateRequest) -> ServiceResult<ValidationReport>;

    async fn buffer(&self, request: BufferRequest) -> ServiceResult<GeometryResponse>;

    async fn calculate(&self, request: CalculateRequest) -> ServiceResult<MetricsResponse>;
}

/// `GeometryService` over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpGeometryService {
    client: reqwest::Client,
    settings: ServiceSettings,
}

impl HttpGeometryService {
    pub fn new(settings: ServiceSettings) -> ServiceResult<Self> {
        reqwest::Url::parse(&settings.base_url)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self { client, settings })
    }

    /// Client for `base_url` with the default prefix and timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> ServiceResult<Self> {
        Self::new(ServiceSettings {
            base_url: base_url.into(),
            ..ServiceSettings::default()
        })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    async fn post<Req, Resp>(&self, operation: Operation, body: &Req) -> ServiceResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.settings.endpoint(operation.path());
        tracing::debug!(%url, "Sending {} request", operation);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        // Error statuses may still carry a well-formed `{success: false, error}` body.
        match serde_json::from_str(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) => {
                tracing::warn!(status = status.as_u16(), "{} request failed", operation);
                Err(ServiceError::Status {
                    status: status.as_u16(),
                    body: text,
                })
            }
        }
    }
}

#[async_trait]
impl GeometryService for HttpGeometryService {
    async fn simplify(&self, request: SimplifyRequest) -> ServiceResult<GeometryResponse> {
        self.post(Operation::Simplify, &request).await
    }

    async fn merge(&self, request: MergeRequest) -> ServiceResult<GeometryResponse> {
        self.post(Operation::Merge, &request).await
    }

    async fn split(&self, request: SplitRequest) -> ServiceResult<SplitResponse> {
        self.post(Operation::Split, &request).await
    }

    async fn validate(&self, request: ValidateRequest) -> ServiceResult<ValidationReport> {
        self.post(Operation::Validate, &request).await
    }

    async fn buffer(&self, request: BufferRequest) -> ServiceResult<GeometryResponse> {
        self.post(Operation::Buffer, &request).await
    }

    async fn calculate(&self, request: CalculateRequest) -> ServiceResult<MetricsResponse> {
        self.post(Operation::Calculate, &request).await
    }
}
