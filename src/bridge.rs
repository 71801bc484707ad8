//! # Bridge Messages Module
//!
//! Questo modulo definisce i messaggi scambiati con l'host attraverso la bridge.
//!
//! ## Responsabilità:
//! - `CorrelationToken`: accoppia una richiesta asincrona alla sua unica risposta
//! - `BridgeMessage`: payload serializzato verso l'host (successo, errore, permesso, ack)
//! - `ResponseSink`: trasporto verso l'host, dato il token di correlazione
//! - `JsonLineSink`: una riga JSON per messaggio su stdout
//! - `ChannelSink`: canale tokio per host embedded
//!
//! ## Tipi di messaggi:
//! - `ok`: sequenza ordinata di `MediaItem` + flag della richiesta
//! - `error`: singolo errore `{kind, message}`
//! - `permission`: esito di `hasReadPermission` / `requestReadPermission`
//! - `ack`: conferma di comandi senza payload (`closePicker`)
//!
//! ## Esempio:
//! ```json
//! {"callbackId":"6f1c…","message":{"status":"ok","payload":{"results":[{"uri":"/tmp/…/a.jpg","mediaType":"image","sizeFlagExceeded":false,"exportFailed":false}],"cancelled":false,"mediaSizeLimitExceeded":false,"videoExportFailed":false,"exportFailed":false}}}
//! ```

use crate::error::{ErrorKind, PickerError};
use crate::export::{ExportOutcome, ExportResult, Payload};
use crate::localization::Localizer;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identifier pairing a request with its single response
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One exported asset as seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    pub media_type: String,
    pub size_flag_exceeded: bool,
    pub export_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
    /// Video poster: temp file path or base64, as the main payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl From<&ExportResult> for MediaItem {
    fn from(result: &ExportResult) -> Self {
        let mut item = MediaItem {
            uri: None,
            base64: None,
            media_type: result.source.kind.media_type().to_string(),
            size_flag_exceeded: false,
            export_failed: false,
            width: None,
            height: None,
            byte_size: None,
            thumbnail: None,
        };

        match &result.outcome {
            ExportOutcome::Ok { payload, byte_size, dimensions, thumbnail } => {
                match payload {
                    Payload::FileUri(_) => item.uri = Some(payload.to_host_string()),
                    Payload::Base64(_) => item.base64 = Some(payload.to_host_string()),
                }
                item.byte_size = Some(*byte_size);
                item.thumbnail = thumbnail.as_ref().map(Payload::to_host_string);
                if let Some((width, height)) = dimensions {
                    item.width = Some(*width);
                    item.height = Some(*height);
                }
            }
            ExportOutcome::TooLarge { .. } => item.size_flag_exceeded = true,
            ExportOutcome::EncodeFailed { .. } => item.export_failed = true,
        }

        item
    }
}

/// Successful terminal response of a media request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    /// In selection order
    pub results: Vec<MediaItem>,
    pub cancelled: bool,
    pub media_size_limit_exceeded: bool,
    pub video_export_failed: bool,
    pub export_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MediaResponse {
    /// Risposta vuota per il cancel dell'utente (non è un errore)
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionPayload {
    pub granted: bool,
}

/// Message delivered to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "payload", rename_all = "camelCase")]
pub enum BridgeMessage {
    #[serde(rename = "ok")]
    Success(MediaResponse),
    Error(ErrorPayload),
    Permission(PermissionPayload),
    Ack,
}

impl BridgeMessage {
    pub fn error(err: &PickerError, localizer: &dyn Localizer) -> Self {
        Self::Error(ErrorPayload {
            kind: err.kind(),
            message: err.user_message(localizer),
        })
    }

    pub fn permission(granted: bool) -> Self {
        Self::Permission(PermissionPayload { granted })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error(payload) => Some(payload.kind),
            _ => None,
        }
    }

    pub fn as_success(&self) -> Option<&MediaResponse> {
        match self {
            Self::Success(response) => Some(response),
            _ => None,
        }
    }
}

/// Bridge transport towards the host
pub trait ResponseSink: Send + Sync {
    fn deliver(&self, token: &CorrelationToken, message: BridgeMessage);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    callback_id: &'a CorrelationToken,
    message: &'a BridgeMessage,
}

/// Emette ogni messaggio come riga JSON su stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineSink;

impl JsonLineSink {
    pub fn render(token: &CorrelationToken, message: &BridgeMessage) -> serde_json::Result<String> {
        serde_json::to_string(&Envelope {
            callback_id: token,
            message,
        })
    }
}

impl ResponseSink for JsonLineSink {
    fn deliver(&self, token: &CorrelationToken, message: BridgeMessage) {
        match Self::render(token, &message) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize response for {}: {}", token, e),
        }
    }
}

/// Inoltra i messaggi su un canale tokio
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<(CorrelationToken, BridgeMessage)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(CorrelationToken, BridgeMessage)>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ResponseSink for ChannelSink {
    fn deliver(&self, token: &CorrelationToken, message: BridgeMessage) {
        if self.sender.send((token.clone(), message)).is_err() {
            tracing::warn!("Host channel closed, dropping response for {}", token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::StringTables;
    use crate::picker::{AssetHandle, MediaKind};
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_media_item_from_results() {
        let ok = ExportResult::new(
            AssetHandle::new("a.png", MediaKind::Photo),
            ExportOutcome::Ok {
                payload: Payload::FileUri(PathBuf::from("/tmp/scope/a.jpg")),
                byte_size: 1200,
                dimensions: Some((25, 100)),
                thumbnail: None,
            },
        );
        let item = MediaItem::from(&ok);
        assert_eq!(item.uri.as_deref(), Some("/tmp/scope/a.jpg"));
        assert_eq!(item.media_type, "image");
        assert_eq!((item.width, item.height), (Some(25), Some(100)));

        let too_large = ExportResult::new(
            AssetHandle::new("b.mp4", MediaKind::Video),
            ExportOutcome::TooLarge { byte_size: 10, limit: 5 },
        );
        let item = MediaItem::from(&too_large);
        assert!(item.size_flag_exceeded);
        assert!(item.uri.is_none() && item.base64.is_none());
        assert_eq!(item.media_type, "video");
    }

    #[test]
    fn test_video_item_carries_thumbnail() {
        let video = ExportResult::new(
            AssetHandle::new("clip.mp4", MediaKind::Video),
            ExportOutcome::Ok {
                payload: Payload::Base64("QkJC".to_string()),
                byte_size: 3,
                dimensions: None,
                thumbnail: Some(Payload::Base64("/9j/".to_string())),
            },
        );
        let json = serde_json::to_value(MediaItem::from(&video)).unwrap();
        assert_eq!(json["base64"], "QkJC");
        assert_eq!(json["thumbnail"], "/9j/");
        assert!(json.get("width").is_none());
    }

    #[test]
    fn test_envelope_json_shape() {
        let token = CorrelationToken::new("cb-1");
        let message = BridgeMessage::Success(MediaResponse::cancelled());
        let json: serde_json::Value =
            serde_json::from_str(&JsonLineSink::render(&token, &message).unwrap()).unwrap();

        assert_eq!(
            json,
            json!({
                "callbackId": "cb-1",
                "message": {
                    "status": "ok",
                    "payload": {
                        "results": [],
                        "cancelled": true,
                        "mediaSizeLimitExceeded": false,
                        "videoExportFailed": false,
                        "exportFailed": false
                    }
                }
            })
        );
    }

    #[test]
    fn test_error_message_json() {
        let tables = StringTables::with_defaults();
        let message = BridgeMessage::error(&PickerError::PermissionDenied, &tables);
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["payload"]["kind"], "PermissionDenied");
        assert_eq!(message.error_kind(), Some(ErrorKind::PermissionDenied));
    }

    #[test]
    fn test_permission_and_ack_json() {
        assert_eq!(
            serde_json::to_value(BridgeMessage::permission(true)).unwrap(),
            json!({"status": "permission", "payload": {"granted": true}})
        );
        assert_eq!(
            serde_json::to_value(BridgeMessage::Ack).unwrap(),
            json!({"status": "ack"})
        );
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (sink, mut receiver) = ChannelSink::new();
        sink.deliver(&CorrelationToken::new("t"), BridgeMessage::Ack);
        let (token, message) = receiver.recv().await.unwrap();
        assert_eq!(token.as_str(), "t");
        assert_eq!(message, BridgeMessage::Ack);
    }
}
