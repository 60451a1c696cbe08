use serde_json::{Value, json};

use crate::error::SendError;
use crate::transport::Transport;
use crate::types::{FieldMap, PostConfig};

/// Транспорт-заглушка: запоминает отправленные кадры
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    pub(crate) open: bool,
    pub(crate) sent: Vec<String>,
}

impl RecordingTransport {
    pub(crate) fn open() -> Self {
        Self {
            open: true,
            sent: Vec::new(),
        }
    }

    pub(crate) fn closed() -> Self {
        Self::default()
    }

    pub(crate) fn sent_json(&self) -> Vec<Value> {
        self.sent
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }

    /// Только Post-сообщения
    pub(crate) fn posts(&self) -> Vec<Value> {
        self.sent_json()
            .into_iter()
            .filter(|v| v["Type"] == json!("Post"))
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, text: &str) -> Result<(), SendError> {
        if !self.open {
            return Err(SendError::NotOpen);
        }
        self.sent.push(text.to_string());
        Ok(())
    }
}

pub(crate) fn test_config() -> PostConfig {
    let fields = match json!({"BID": 45.55, "ACVOL_1": 1000, "DSPLY_NAME": "TEST"}) {
        Value::Object(m) => m,
        _ => FieldMap::new(),
    };
    PostConfig {
        host: "127.0.0.1".to_string(),
        port: 15000,
        app_id: "256".to_string(),
        user: "root".to_string(),
        position: "10.0.0.1".to_string(),
        service: "DIST_CACHE".to_string(),
        ric: "TEST.RIC".to_string(),
        post_user_id: 4242,
        fields,
    }
}
