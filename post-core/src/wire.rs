use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::LOGIN_STREAM_ID;
use crate::error::WireError;
use crate::types::{FieldMap, PostConfig};

/// Тип сообщения (поле `Type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Refresh,
    Update,
    Status,
    Ping,
    Pong,
    Post,
    Ack,
    Request,
    Close,
    Error,
    Generic,
    #[serde(other)]
    Unknown,
}

/// Домен сообщения (поле `Domain`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    Login,
    MarketPrice,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StreamState {
    Open,
    NonStreaming,
    Closed,
    ClosedRecover,
    ClosedRedirected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DataState {
    Ok,
    Suspect,
    #[serde(other)]
    Unknown,
}

/// Поле `State` входящего сообщения
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct State {
    pub stream: Option<StreamState>,
    pub data: Option<DataState>,
}

impl State {
    pub fn is_open_ok(&self) -> bool {
        self.stream == Some(StreamState::Open) && self.data == Some(DataState::Ok)
    }
}

/// Одно входящее сообщение из кадра
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundMessage {
    #[serde(rename = "Type")]
    pub kind: MessageType,
    pub domain: Option<Domain>,
    #[serde(rename = "ID")]
    pub id: Option<i64>,
    pub state: Option<State>,
}

/// Разбор входящего кадра: JSON-массив из 0..N сообщений.
///
/// Ошибка всего кадра - `Err`. Элемент, не похожий на сообщение
/// (например без `Type`), возвращается как `Err` внутри вектора,
/// чтобы остальные элементы обработались по порядку.
pub fn decode_frame(text: &str) -> Result<Vec<Result<InboundMessage, WireError>>, WireError> {
    let items: Vec<Value> = serde_json::from_str(text)?;
    Ok(items
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(WireError::from))
        .collect())
}

// --- исходящие ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest<'a> {
    #[serde(rename = "ID")]
    pub id: i64,
    pub domain: Domain,
    pub key: LoginKey<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginKey<'a> {
    pub name: &'a str,
    pub elements: LoginElements<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginElements<'a> {
    pub application_id: &'a str,
    pub position: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Pong {
    #[serde(rename = "Type")]
    pub kind: MessageType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostMessage<'a> {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Type")]
    pub kind: MessageType,
    pub domain: Domain,
    pub key: PostKey<'a>,
    pub ack: bool,
    #[serde(rename = "PostID")]
    pub post_id: u64,
    pub post_user_info: PostUserInfo<'a>,
    pub message: PostContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostKey<'a> {
    pub name: &'a str,
    pub service: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostUserInfo<'a> {
    pub address: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: u32,
}

/// Вложенное сообщение с контентом
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostContent<'a> {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Type")]
    pub kind: MessageType,
    pub domain: Domain,
    pub solicited: bool,
    pub fields: &'a FieldMap,
}

pub fn login_request(cfg: &PostConfig) -> LoginRequest<'_> {
    LoginRequest {
        id: LOGIN_STREAM_ID,
        domain: Domain::Login,
        key: LoginKey {
            name: &cfg.user,
            elements: LoginElements {
                application_id: &cfg.app_id,
                position: &cfg.position,
            },
        },
    }
}

pub fn pong() -> Pong {
    Pong {
        kind: MessageType::Pong,
    }
}

/// Post с контентом. Первый (post_id == 1) - Refresh, дальше Update.
pub fn post_message<'a>(cfg: &'a PostConfig, post_id: u64, fields: &'a FieldMap) -> PostMessage<'a> {
    let first = post_id == 1;
    PostMessage {
        id: LOGIN_STREAM_ID,
        kind: MessageType::Post,
        domain: Domain::MarketPrice,
        key: PostKey {
            name: &cfg.ric,
            service: &cfg.service,
        },
        ack: true,
        post_id,
        post_user_info: PostUserInfo {
            address: &cfg.position,
            user_id: cfg.post_user_id,
        },
        message: PostContent {
            id: 0,
            kind: if first {
                MessageType::Refresh
            } else {
                MessageType::Update
            },
            domain: Domain::MarketPrice,
            solicited: !first,
            fields,
        },
    }
}

/// Сериализация исходящего сообщения в один текстовый кадр
pub fn encode<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}
