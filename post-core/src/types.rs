use serde_json::{Map, Value};

/// Снимок публикуемых полей: имя поля -> значение
pub type FieldMap = Map<String, Value>;

/// Неизменяемая конфигурация клиента, задаётся один раз при старте.
#[derive(Debug, Clone, PartialEq)]
pub struct PostConfig {
    pub host: String,
    pub port: u16,
    pub app_id: String,
    pub user: String,
    /// Адрес, который объявляем в логине и в PostUserInfo
    pub position: String,
    pub service: String,
    /// Имя инструмента (RIC)
    pub ric: String,
    /// PostUserInfo.UserID (в бинарнике - id процесса)
    pub post_user_id: u32,
    /// Начальные значения полей
    pub fields: FieldMap,
}

impl PostConfig {
    /// URL шлюза: ws://HOST:PORT/WebSocket
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/WebSocket", self.host, self.port)
    }
}
