//! # post-core
//!
//! Протокол и логика клиента, публикующего цены одного инструмента
//! в market-data шлюз по WebSocket (JSON, subprotocol `tr_json2`).
//!
//! Этот крейт содержит:
//!
//! - [`wire`] — входящие/исходящие JSON-сообщения (Login, Pong, Post)
//! - [`session`] — машина состояний соединения: логин, keep-alive, Closed
//! - [`scheduler`] — публикация снимка полей и периодических обновлений
//! - [`fields`] — чтение снимка полей и правило их изменения между Post
//! - [`transport`] — абстракция транспорта и его события
//! - [`clock`] — источник времени
//! - [`types`] — конфигурация и доменные типы
//! - [`error`] — типы ошибок `post-core`
//!
//! ## Пример: изменение полей между публикациями
//!
//! ```rust
//! use post_core::fields::bump_fields;
//! use serde_json::json;
//!
//! let mut fields = match json!({"BID": 9.99, "ACVOL_1": 2, "NAME": "x"}) {
//!     serde_json::Value::Object(m) => m,
//!     _ => unreachable!(),
//! };
//! bump_fields(&mut fields);
//! assert_eq!(serde_json::Value::Object(fields), json!({"BID": 10.09, "ACVOL_1": 3, "NAME": "x"}));
//! ```
//!
//! ## Пример: разбор входящего кадра
//!
//! ```rust
//! use post_core::wire::{decode_frame, MessageType};
//!
//! let msgs = decode_frame(r#"[{"Type":"Ping"}]"#).unwrap();
//! assert_eq!(msgs[0].as_ref().unwrap().kind, MessageType::Ping);
//! ```
//!
//! ## Дизайн
//!
//! Здесь нет сокетов и потоков: [`session::Session`] получает события
//! транспорта и время (`Instant`) явно, а отправляет через трейт
//! [`transport::Transport`]. Поэтому вся логика тестируется синхронно,
//! с виртуальным временем.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// JSON-сообщения шлюза.
pub mod wire;

/// Машина состояний сессии.
pub mod session;

/// Планировщик публикаций.
pub mod scheduler;

/// Снимок полей и его изменение.
pub mod fields;

/// Транспорт.
pub mod transport;

/// Время.
pub mod clock;

/// Доменные типы.
pub mod types;

/// Ошибки `post-core`.
pub mod error;

/// Общие константы
mod constants;
pub use constants::{LOGIN_STREAM_ID, POST_INTERVAL, SCHEDULER_TICK, WS_SUBPROTOCOL};

#[cfg(test)]
mod testutil;

// --- Re-exports (публичный фасад API) ---

pub use crate::clock::{Clock, SystemClock};
pub use crate::error::{FieldsError, SendError, SessionError, WireError};
pub use crate::session::{Phase, Session};
pub use crate::transport::{Transport, TransportEvent};
pub use crate::types::{FieldMap, PostConfig};
