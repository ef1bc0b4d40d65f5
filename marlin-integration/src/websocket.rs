use crate::error::TransportError;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, connect_async};
use tracing::debug;

/// Convenient type alias for a tungstenite `WebSocketStream`.
pub type WebSocket = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Communicative type alias for a tungstenite [`WebSocket`] `Message`.
pub type WsMessage = tokio_tungstenite::tungstenite::Message;

/// Communicative type alias for a tungstenite [`WebSocket`] `Error`.
pub type WsError = tokio_tungstenite::tungstenite::Error;

/// Establish a WebSocket connection to the provided url.
pub async fn connect(url: &str) -> Result<WebSocket, TransportError> {
    debug!(url, "establishing WebSocket connection");
    let (websocket, _response) = connect_async(url).await?;
    Ok(websocket)
}

/// Parse one inbound message into the expected JSON payload.
///
/// Control frames yield `None`; a close frame surfaces as `Terminated` so the
/// read loop can trigger reconnection. Unknown payload fields are ignored by
/// the target's serde implementation.
pub fn parse_message<Payload>(
    input: Result<WsMessage, WsError>,
) -> Option<Result<Payload, TransportError>>
where
    Payload: DeserializeOwned,
{
    match input {
        Ok(WsMessage::Text(payload)) => Some(
            serde_json::from_str::<Payload>(payload.as_str()).map_err(|error| {
                TransportError::Deserialise {
                    error,
                    payload: payload.to_string(),
                }
            }),
        ),
        Ok(WsMessage::Binary(payload)) => Some(
            serde_json::from_slice::<Payload>(&payload).map_err(|error| {
                TransportError::Deserialise {
                    error,
                    payload: String::from_utf8_lossy(&payload).to_string(),
                }
            }),
        ),
        Ok(WsMessage::Ping(payload)) => {
            debug!(?payload, "received Ping WebSocket message");
            None
        }
        Ok(WsMessage::Pong(payload)) => {
            debug!(?payload, "received Pong WebSocket message");
            None
        }
        Ok(WsMessage::Close(frame)) => {
            Some(Err(TransportError::Terminated(format!("{frame:?}"))))
        }
        Ok(WsMessage::Frame(_)) => None,
        Err(error) => Some(Err(TransportError::from(error))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        price: String,
    }

    #[test]
    fn test_parse_text_payload() {
        let message = WsMessage::text(r#"{"price": "100.5", "ignored": true}"#);
        let parsed: Payload = parse_message(Ok(message)).unwrap().unwrap();
        assert_eq!(parsed.price, "100.5");
    }

    #[test]
    fn test_malformed_payload_is_an_error_not_a_panic() {
        let message = WsMessage::text("not json");
        let parsed = parse_message::<Payload>(Ok(message)).unwrap();
        assert!(matches!(parsed, Err(TransportError::Deserialise { .. })));
    }

    #[test]
    fn test_control_frames_are_skipped() {
        let ping = WsMessage::Ping(vec![1, 2, 3].into());
        assert!(parse_message::<Payload>(Ok(ping)).is_none());
    }

    #[test]
    fn test_close_frame_terminates() {
        let close = WsMessage::Close(None);
        let parsed = parse_message::<Payload>(Ok(close)).unwrap();
        assert!(matches!(parsed, Err(TransportError::Terminated(_))));
    }
}
