use common::req::{Device, DeviceId, DevicePatch, ReadingQuery, SensorReading, SensorType};
use log::debug;
use reqwest::header::ACCEPT;

use crate::config::Config;
use crate::error::{ApiError, Result};

/// Request/response boundary to the remote device/telemetry service.
///
/// The stores are generic over this so a scripted in-memory implementation
/// can stand in for the real service under test.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    async fn devices(&self) -> Result<Vec<Device>>;
    async fn toggle_device(&self, id: DeviceId) -> Result<Device>;
    async fn update_device(&self, id: DeviceId, patch: &DevicePatch) -> Result<Device>;
    async fn delete_device(&self, id: DeviceId) -> Result<()>;
    async fn sensor_types(&self) -> Result<Vec<SensorType>>;
    async fn devices_by_type(&self, sensor_type: SensorType) -> Result<Vec<Device>>;
    async fn readings(&self, query: &ReadingQuery) -> Result<Vec<SensorReading>>;
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network(format!("timed out: {err}"))
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Error payload the gateway attaches to failed requests.
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Classify a non-success response, preferring the gateway's own message.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(body);
    Err(ApiError::from_status(status.as_u16(), message))
}

/// `reqwest`-backed gateway.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::from)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

impl Gateway for HttpGateway {
    async fn devices(&self) -> Result<Vec<Device>> {
        debug!("GET devices");
        let resp = self
            .client
            .get(self.api_url("devices"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn toggle_device(&self, id: DeviceId) -> Result<Device> {
        debug!("PATCH devices/{id}/toggle");
        let resp = self
            .client
            .patch(self.api_url(&format!("devices/{id}/toggle")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn update_device(&self, id: DeviceId, patch: &DevicePatch) -> Result<Device> {
        debug!("PUT devices/{id}");
        let resp = self
            .client
            .put(self.api_url(&format!("devices/{id}")))
            .header(ACCEPT, "application/json")
            .json(patch)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn delete_device(&self, id: DeviceId) -> Result<()> {
        debug!("DELETE devices/{id}");
        let resp = self
            .client
            .delete(self.api_url(&format!("devices/{id}")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn sensor_types(&self) -> Result<Vec<SensorType>> {
        debug!("GET sensor-data/types");
        let resp = self
            .client
            .get(self.api_url("sensor-data/types"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn devices_by_type(&self, sensor_type: SensorType) -> Result<Vec<Device>> {
        debug!("GET sensor-data/devices-by-type/{sensor_type}");
        let resp = self
            .client
            .get(self.api_url(&format!("sensor-data/devices-by-type/{sensor_type}")))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn readings(&self, query: &ReadingQuery) -> Result<Vec<SensorReading>> {
        debug!(
            "GET sensor-data deviceId={} sensorType={}",
            query.device_id, query.sensor_type
        );
        let resp = self
            .client
            .get(self.api_url("sensor-data"))
            .query(&[
                ("deviceId", query.device_id.to_string()),
                ("sensorType", query.sensor_type.to_string()),
                ("start", query.start.to_rfc3339()),
                ("end", query.end.to_rfc3339()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}
