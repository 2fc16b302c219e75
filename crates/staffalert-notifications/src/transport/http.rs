use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use sha2::Sha256;

use super::{CallReceipt, OutboundCall, PublishReceipt, TopicPublisher, VoiceOriginator};
use crate::error::TransportError;

type HmacSha256 = Hmac<Sha256>;

/// Relays transport calls as JSON over HTTP.
///
/// Topic publishes are POSTed to `topic_endpoint` and answered with
/// `{"MessageId": ...}`; outbound calls are POSTed to `voice_endpoint` and
/// answered with `{"ContactId": ...}`. When a signing secret is set every
/// request carries `X-Signature-256: sha256=<hex hmac of body>`.
pub struct HttpTransport {
    http_client: Client,
    topic_endpoint: String,
    voice_endpoint: String,
    signing_secret: Option<String>,
}

impl HttpTransport {
    pub fn new(
        topic_endpoint: impl Into<String>,
        voice_endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            topic_endpoint: topic_endpoint.into(),
            voice_endpoint: voice_endpoint.into(),
            signing_secret: None,
        })
    }

    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    fn sign_payload(&self, payload: &str, secret: &str) -> Result<String, TransportError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| TransportError::Request(format!("invalid signing key: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload =
            serde_json::to_string(body).map_err(|e| TransportError::Request(e.to_string()))?;

        let mut request = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json");

        if let Some(secret) = &self.signing_secret {
            let signature = self.sign_payload(&payload, secret)?;
            request = request.header("X-Signature-256", format!("sha256={}", signature));
        }

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TopicPublisher for HttpTransport {
    async fn publish(
        &self,
        topic: &str,
        message: &str,
        subject: Option<&str>,
    ) -> Result<PublishReceipt, TransportError> {
        let mut body = json!({
            "TopicArn": topic,
            "Message": message,
        });
        if let Some(subject) = subject {
            body["Subject"] = json!(subject);
        }
        self.post(&self.topic_endpoint, &body).await
    }
}

#[async_trait]
impl VoiceOriginator for HttpTransport {
    async fn start_outbound_call(&self, call: &OutboundCall) -> Result<CallReceipt, TransportError> {
        self.post(&self.voice_endpoint, call).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(
            format!("{}/publish", server.uri()),
            format!("{}/calls", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_relay_signature() {
        let transport =
            HttpTransport::new("http://localhost/p", "http://localhost/c", Duration::from_secs(1))
                .unwrap();
        let signature = transport.sign_payload(r#"{"test": "data"}"#, "secret123").unwrap();
        assert_eq!(signature.len(), 64);
        let signature2 = transport.sign_payload(r#"{"test": "data"}"#, "secret123").unwrap();
        assert_eq!(signature, signature2);
        let other = transport.sign_payload(r#"{"test": "data"}"#, "secret456").unwrap();
        assert_ne!(signature, other);
    }

    #[tokio::test]
    async fn test_publish_with_subject() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publish"))
            .and(header_exists("X-Signature-256"))
            .and(body_json(json!({
                "TopicArn": "topic-arn-1",
                "Message": "Blood results ready p1",
                "Subject": "Alert"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"MessageId": "msg-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = transport(&server)
            .with_signing_secret("relay-secret")
            .publish("topic-arn-1", "Blood results ready p1", Some("Alert"))
            .await
            .unwrap();
        assert_eq!(receipt.message_id, "msg-1");
    }

    #[tokio::test]
    async fn test_outbound_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ContactId": "ct-9"})))
            .expect(1)
            .mount(&server)
            .await;

        let call = OutboundCall {
            destination_phone_number: "+15550100".into(),
            instance_id: "instance-1".into(),
            contact_flow_id: "flow-1".into(),
            source_phone_number: "+15550199".into(),
            attributes: HashMap::from([("Message2".to_string(), "p1".to_string())]),
        };
        let receipt = transport(&server).start_outbound_call(&call).await.unwrap();
        assert_eq!(receipt.contact_id, "ct-9");
    }

    #[tokio::test]
    async fn test_rejected_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publish"))
            .respond_with(ResponseTemplate::new(403).set_body_string("topic not found"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .publish("topic-arn-1", "hi", None)
            .await
            .unwrap_err();
        match err {
            TransportError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "topic not found");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publish"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .publish("topic-arn-1", "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse(_)));
    }
}
