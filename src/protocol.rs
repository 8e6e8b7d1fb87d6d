//! JSON message types for the agent-conversation WebSocket protocol.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

// Setup Message，连接建立后发送一次，声明鉴权和期望的下行格式
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetupMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub api_key: String,
    pub enable_vad: bool,
    pub output_format: String,
    pub output_sample_rate: u32,
}

impl SetupMessage {
    pub fn new(api_key: &str, output_format: &str, output_sample_rate: u32) -> Self {
        Self {
            msg_type: "setup",
            api_key: api_key.to_string(),
            enable_vad: true,
            output_format: output_format.to_string(),
            output_sample_rate,
        }
    }
}

// 上行音频消息，data 为 base64 编码的 mu-law 字节
#[derive(Serialize, Debug)]
pub struct AudioInMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub data: String,
}

impl AudioInMessage {
    pub fn new(encoded: &[u8]) -> Self {
        Self {
            msg_type: "audioIn",
            data: BASE64.encode(encoded),
        }
    }
}

/// Messages pushed down by the agent server, tagged on `"type"`.
/// Unknown types deserialize to `Unknown` and are ignored by the session.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "voiceActivityStart")]
    VoiceActivityStart,
    #[serde(rename = "voiceActivityEnd")]
    VoiceActivityEnd,
    #[serde(rename = "audioStream")]
    AudioStream { data: String },
    #[serde(rename = "newAudioStream")]
    NewAudioStream,
    #[serde(rename = "error")]
    Error { code: i64, message: String },
    #[serde(other)]
    Unknown,
}

/// Decode the base64 payload of an `audioStream` fragment.
pub fn decode_audio_payload(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_message_serializes_camel_case() {
        let msg = SetupMessage::new("ak-test", "mulaw", 16000);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"setup""#));
        assert!(json.contains(r#""apiKey":"ak-test""#));
        assert!(json.contains(r#""enableVad":true"#));
        assert!(json.contains(r#""outputFormat":"mulaw""#));
        assert!(json.contains(r#""outputSampleRate":16000"#));
    }

    #[test]
    fn audio_in_carries_base64_payload() {
        let msg = AudioInMessage::new(&[0xFF, 0x00, 0x7F]);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"audioIn""#));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let data = parsed["data"].as_str().unwrap();
        assert_eq!(decode_audio_payload(data).unwrap(), vec![0xFF, 0x00, 0x7F]);
    }

    #[test]
    fn parses_voice_activity_messages() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"voiceActivityStart"}"#).unwrap();
        assert_eq!(msg, ServerMessage::VoiceActivityStart);

        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"voiceActivityEnd"}"#).unwrap();
        assert_eq!(msg, ServerMessage::VoiceActivityEnd);
    }

    #[test]
    fn parses_audio_stream_fragment() {
        let json = r#"{"type":"audioStream","data":"AAEC"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::AudioStream { data } => {
                assert_eq!(decode_audio_payload(&data).unwrap(), vec![0, 1, 2]);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn parses_error_message() {
        let json = r#"{"type":"error","code":4401,"message":"invalid api key"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Error {
                code: 4401,
                message: "invalid api key".to_string()
            }
        );
    }

    #[test]
    fn unknown_type_falls_through() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"somethingNew","x":1}"#).unwrap();
        assert_eq!(msg, ServerMessage::Unknown);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(serde_json::from_str::<ServerMessage>("not json").is_err());
        assert!(serde_json::from_str::<ServerMessage>(r#"{"no":"type"}"#).is_err());
    }
}
