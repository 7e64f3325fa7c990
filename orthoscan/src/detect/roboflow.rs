//! Hosted Roboflow inference backend.
//!
//! The image is sent as a base64 JPEG body to
//! `{detect_url}/{project}/{version}?api_key=..&confidence=..` and the
//! centre-based predictions in the JSON response are converted to pixel
//! boxes.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbImage;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use super::backend::{BoundingBox, Detection, DetectionBackend};
use super::error::BackendError;
use super::Credentials;
use crate::provider::{HttpClient, ProviderError};
use crate::stitch::encode_jpeg;

/// Account API used to validate credentials.
pub const ROBOFLOW_API_URL: &str = "https://api.roboflow.com";

/// Hosted object-detection inference endpoint.
pub const ROBOFLOW_DETECT_URL: &str = "https://detect.roboflow.com";

const REDACTED: &str = "<redacted>";

fn model_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*/\d+$").unwrap())
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    confidence: f32,
    class: String,
    #[serde(default)]
    class_id: Option<u32>,
}

impl From<Prediction> for Detection {
    fn from(p: Prediction) -> Self {
        Detection {
            label: p.class,
            class_id: p.class_id,
            confidence: p.confidence,
            bbox: BoundingBox::from_center(p.x, p.y, p.width, p.height),
        }
    }
}

/// Roboflow model served over HTTP.
pub struct RoboflowBackend<C: HttpClient> {
    client: C,
    model_id: String,
    api_key: String,
    detect_url: String,
}

impl<C: HttpClient> RoboflowBackend<C> {
    /// Validates the model identifier and the API key against the hosted
    /// service.
    pub fn connect(client: C, credentials: &Credentials) -> Result<Self, BackendError> {
        Self::connect_to(client, credentials, ROBOFLOW_API_URL, ROBOFLOW_DETECT_URL)
    }

    /// Like [`connect`](Self::connect) with explicit endpoints, e.g. a
    /// self-hosted inference server.
    pub fn connect_to(
        client: C,
        credentials: &Credentials,
        api_url: &str,
        detect_url: &str,
    ) -> Result<Self, BackendError> {
        if !model_regex().is_match(&credentials.model_id) {
            return Err(BackendError::InvalidModel(credentials.model_id.clone()));
        }

        let backend = Self {
            client,
            model_id: credentials.model_id.clone(),
            api_key: credentials.api_key.clone(),
            detect_url: detect_url.trim_end_matches('/').to_string(),
        };

        let probe = endpoint(
            &format!("{}/", api_url.trim_end_matches('/')),
            &[("api_key", backend.api_key.as_str())],
        )?;
        let body = backend
            .client
            .get(probe.as_str())
            .map_err(|e| backend.request_error(e))?;
        serde_json::from_slice::<serde_json::Value>(&body)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        debug!(model = %backend.model_id, "Detection backend connected");
        Ok(backend)
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn infer_url(&self, confidence: f32) -> Result<Url, BackendError> {
        // The hosted API takes the threshold as an integer percentage.
        let percent = ((confidence * 100.0).round() as u32).to_string();
        endpoint(
            &format!("{}/{}", self.detect_url, self.model_id),
            &[
                ("api_key", self.api_key.as_str()),
                ("confidence", percent.as_str()),
                ("format", "json"),
            ],
        )
    }

    /// Maps transport errors, keeping the API key out of messages.
    fn request_error(&self, error: ProviderError) -> BackendError {
        let encoded = encode_query_value(&self.api_key);
        let redact = |text: String| {
            text.replace(&encoded, REDACTED)
                .replace(&self.api_key, REDACTED)
        };
        let redacted = match error {
            ProviderError::HttpStatus { status: 401 | 403, .. } => {
                return BackendError::Unauthorized;
            }
            ProviderError::HttpStatus { status, url } => ProviderError::HttpStatus {
                status,
                url: redact(url),
            },
            ProviderError::HttpError(msg) => ProviderError::HttpError(redact(msg)),
            other => other,
        };
        BackendError::Request(redacted)
    }
}

/// Builds an endpoint URL with form-encoded query parameters.
fn endpoint(base: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
    Url::parse_with_params(base, params).map_err(|e| BackendError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })
}

/// A query value as it appears on the wire.
fn encode_query_value(value: &str) -> String {
    match endpoint("http://localhost/", &[("v", value)]) {
        Ok(url) => url.query().unwrap_or_default().trim_start_matches("v=").to_string(),
        Err(_) => value.to_string(),
    }
}

impl<C: HttpClient> DetectionBackend for RoboflowBackend<C> {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn infer(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, BackendError> {
        let jpeg = encode_jpeg(image).map_err(|e| BackendError::Encode(e.to_string()))?;
        let body = STANDARD.encode(jpeg).into_bytes();

        let response = self
            .client
            .post(
                self.infer_url(confidence)?.as_str(),
                "application/x-www-form-urlencoded",
                body,
            )
            .map_err(|e| self.request_error(e))?;

        let parsed: InferenceResponse = serde_json::from_slice(&response)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .predictions
            .into_iter()
            .filter(|p| p.confidence >= confidence)
            .map(Detection::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockHttpClient;

    const RESPONSE: &str = r#"{
        "time": 0.12,
        "image": {"width": 512, "height": 512},
        "predictions": [
            {"x": 100.0, "y": 50.0, "width": 40.0, "height": 20.0,
             "confidence": 0.91, "class": "ship", "class_id": 0},
            {"x": 300.0, "y": 300.0, "width": 10.0, "height": 10.0,
             "confidence": 0.30, "class": "plane"}
        ]
    }"#;

    fn credentials(model: &str) -> Credentials {
        Credentials {
            model_id: model.to_string(),
            api_key: "secret123".to_string(),
        }
    }

    fn backend(response: Result<Vec<u8>, ProviderError>) -> RoboflowBackend<MockHttpClient> {
        RoboflowBackend::connect(MockHttpClient::new(response), &credentials("ships-abc/3"))
            .unwrap()
    }

    #[test]
    fn test_connect_probes_account_api_once() {
        let backend = backend(Ok(b"{}".to_vec()));
        assert_eq!(
            backend.client.urls(),
            vec!["https://api.roboflow.com/?api_key=secret123".to_string()]
        );
        assert_eq!(backend.model_id(), "ships-abc/3");
    }

    #[test]
    fn test_connect_rejects_malformed_model() {
        for model in ["", "ships", "ships/", "ships/v3", "/3", "a/b/3"] {
            let client = MockHttpClient::new(Ok(b"{}".to_vec()));
            let result = RoboflowBackend::connect(client, &credentials(model));
            assert!(
                matches!(result, Err(BackendError::InvalidModel(_))),
                "{model}"
            );
        }
    }

    #[test]
    fn test_connect_unauthorized() {
        let client = MockHttpClient::new(Err(ProviderError::HttpStatus {
            status: 401,
            url: "https://api.roboflow.com/?api_key=secret123".to_string(),
        }));
        let result = RoboflowBackend::connect(client, &credentials("ships/1"));
        assert!(matches!(result, Err(BackendError::Unauthorized)));
    }

    #[test]
    fn test_errors_do_not_leak_api_key() {
        let client = MockHttpClient::new(Err(ProviderError::HttpStatus {
            status: 500,
            url: "https://api.roboflow.com/?api_key=secret123".to_string(),
        }));
        let err = RoboflowBackend::connect(client, &credentials("ships/1"))
            .err()
            .unwrap();
        let message = err.to_string();
        assert!(!message.contains("secret123"), "{message}");
        assert!(message.contains(REDACTED));
    }

    #[test]
    fn test_infer_converts_centre_boxes() {
        let backend = backend(Ok(RESPONSE.as_bytes().to_vec()));
        let image = RgbImage::new(512, 512);

        let detections = backend.infer(&image, 0.05).unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "ship");
        assert_eq!(detections[0].class_id, Some(0));
        assert_eq!(
            detections[0].bbox,
            BoundingBox::from_xyxy(80.0, 40.0, 120.0, 60.0)
        );
        assert_eq!(detections[1].class_id, None);
    }

    #[test]
    fn test_infer_passes_confidence_as_percent() {
        let backend = backend(Ok(RESPONSE.as_bytes().to_vec()));
        backend.infer(&RgbImage::new(512, 512), 0.05).unwrap();

        let requests = backend.client.requests.lock().unwrap();
        let (url, body) = requests.last().unwrap();
        assert_eq!(
            url,
            "https://detect.roboflow.com/ships-abc/3?api_key=secret123&confidence=5&format=json"
        );
        let body = body.as_ref().unwrap();
        let jpeg = STANDARD.decode(body).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_infer_drops_predictions_below_threshold() {
        let backend = backend(Ok(RESPONSE.as_bytes().to_vec()));
        let detections = backend.infer(&RgbImage::new(512, 512), 0.5).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "ship");
    }

    #[test]
    fn test_infer_invalid_response() {
        let backend = backend(Ok(b"{}".to_vec()));
        // `{}` is a valid probe but carries no predictions
        assert!(backend.infer(&RgbImage::new(8, 8), 0.5).unwrap().is_empty());

        let backend = RoboflowBackend {
            client: MockHttpClient::new(Ok(b"not json".to_vec())),
            model_id: "ships/1".to_string(),
            api_key: "k".to_string(),
            detect_url: ROBOFLOW_DETECT_URL.to_string(),
        };
        assert!(matches!(
            backend.infer(&RgbImage::new(8, 8), 0.5),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_connect_to_custom_endpoints() {
        let client = MockHttpClient::new(Ok(b"{}".to_vec()));
        let backend = RoboflowBackend::connect_to(
            client,
            &credentials("ships/2"),
            "http://localhost:9001/",
            "http://localhost:9001/",
        )
        .unwrap();
        assert_eq!(
            backend.infer_url(0.5).unwrap().as_str(),
            "http://localhost:9001/ships/2?api_key=secret123&confidence=50&format=json"
        );
    }

    #[test]
    fn test_api_key_is_percent_encoded() {
        let key = Credentials {
            model_id: "ships/2".to_string(),
            api_key: "a&b+c#d".to_string(),
        };
        let backend =
            RoboflowBackend::connect(MockHttpClient::new(Ok(RESPONSE.as_bytes().to_vec())), &key)
                .unwrap();
        backend.infer(&RgbImage::new(8, 8), 0.5).unwrap();

        assert_eq!(
            backend.client.urls(),
            vec![
                "https://api.roboflow.com/?api_key=a%26b%2Bc%23d".to_string(),
                "https://detect.roboflow.com/ships/2?api_key=a%26b%2Bc%23d&confidence=50&format=json"
                    .to_string(),
            ]
        );

        let url = backend.infer_url(0.5).unwrap();
        let sent: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(sent[0], ("api_key".to_string(), "a&b+c#d".to_string()));
    }

    #[test]
    fn test_encoded_api_key_is_redacted() {
        let client = MockHttpClient::new(Err(ProviderError::HttpError(
            "error sending request for url (https://api.roboflow.com/?api_key=a%26b%2Bc%23d)"
                .to_string(),
        )));
        let key = Credentials {
            model_id: "ships/1".to_string(),
            api_key: "a&b+c#d".to_string(),
        };
        let message = RoboflowBackend::connect(client, &key).err().unwrap().to_string();
        assert!(!message.contains("a%26b%2Bc%23d"), "{message}");
        assert!(message.contains(REDACTED));
    }
}
