use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::constants::{LOGIN_STREAM_ID, POST_INTERVAL};
use crate::error::{SendError, SessionError};
use crate::scheduler::Publisher;
use crate::transport::{Transport, TransportEvent, send_json};
use crate::types::PostConfig;
use crate::wire::{Domain, InboundMessage, MessageType, decode_frame, login_request, pong};

/// Фаза соединения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    LoggingIn,
    Active,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Disconnected => "disconnected",
            Phase::Connecting => "connecting",
            Phase::LoggingIn => "logging-in",
            Phase::Active => "active",
            Phase::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Состояние клиента целиком: конфиг, фаза и планировщик публикаций.
///
/// Всё изменяемое состояние живёт здесь и меняется только через `&mut self`,
/// поэтому логин и таймер не могут опубликовать одновременно.
#[derive(Debug)]
pub struct Session {
    config: PostConfig,
    phase: Phase,
    publisher: Publisher,
}

impl Session {
    pub fn new(config: PostConfig) -> Self {
        Self::with_interval(config, POST_INTERVAL)
    }

    pub fn with_interval(config: PostConfig, interval: Duration) -> Self {
        let publisher = Publisher::new(config.fields.clone(), interval);
        Self {
            config,
            phase: Phase::Disconnected,
            publisher,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    pub fn config(&self) -> &PostConfig {
        &self.config
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Начали подключение
    pub fn connecting(&mut self) {
        if self.phase == Phase::Disconnected {
            self.phase = Phase::Connecting;
        }
    }

    /// Общая точка входа для событий транспорта.
    ///
    /// Ошибка транспорта и ошибка отправки закрывают сессию и возвращаются
    /// наверх как `Err`.
    pub fn handle_event<T: Transport + ?Sized>(
        &mut self,
        event: TransportEvent,
        now: Instant,
        transport: &mut T,
    ) -> Result<(), SessionError> {
        let res = match event {
            TransportEvent::Opened => self.on_open(transport),
            TransportEvent::Message(text) => self.on_frame(&text, now, transport),
            TransportEvent::Error(reason) => {
                warn!("transport error: {reason}");
                self.on_close();
                return Err(SessionError::Transport(reason));
            }
            TransportEvent::Closed => {
                self.on_close();
                Ok(())
            }
        };

        res.map_err(|e| {
            warn!("send failed: {e}; closing session");
            self.on_close();
            SessionError::Send(e)
        })
    }

    /// Транспорт открыт: отправляем логин
    pub fn on_open<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), SendError> {
        if self.is_closed() {
            return Ok(());
        }
        info!("WebSocket successfully connected!");
        self.phase = Phase::LoggingIn;
        send_json(transport, &login_request(&self.config))
    }

    /// Входящий кадр: массив сообщений, обрабатываем по порядку.
    /// Битый кадр логируем и выбрасываем, состояние не меняется.
    pub fn on_frame<T: Transport + ?Sized>(
        &mut self,
        text: &str,
        now: Instant,
        transport: &mut T,
    ) -> Result<(), SendError> {
        let msgs = match decode_frame(text) {
            Ok(msgs) => msgs,
            Err(e) => {
                warn!("discarding frame: {e}; raw={text:?}");
                return Ok(());
            }
        };

        log_received(text);

        for msg in msgs {
            match msg {
                Ok(msg) => self.dispatch(&msg, now, transport)?,
                Err(e) => warn!("skipping message: {e}"),
            }
        }
        Ok(())
    }

    /// Соединение закрыто (или ошибка): больше ничего не публикуем
    pub fn on_close(&mut self) {
        if self.phase != Phase::Closed {
            info!("WebSocket Closed");
        }
        self.phase = Phase::Closed;
        self.publisher.disarm();
    }

    /// Тик таймера. Ошибка отправки закрывает сессию.
    pub fn on_tick<T: Transport + ?Sized>(
        &mut self,
        now: Instant,
        transport: &mut T,
    ) -> Result<bool, SendError> {
        if self.phase != Phase::Active {
            return Ok(false);
        }
        let res = self.publisher.poll(&self.config, now, transport);
        if let Err(e) = &res {
            warn!("post failed: {e}; closing session");
            self.on_close();
        }
        res
    }

    fn dispatch<T: Transport + ?Sized>(
        &mut self,
        msg: &InboundMessage,
        now: Instant,
        transport: &mut T,
    ) -> Result<(), SendError> {
        if msg.kind == MessageType::Ping {
            return self.answer_ping(transport);
        }

        if is_login_refresh(msg) {
            return self.on_login_refresh(msg, now, transport);
        }

        debug!("ignoring {:?} message on stream {:?}", msg.kind, msg.id);
        Ok(())
    }

    fn answer_ping<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), SendError> {
        if !transport.is_open() {
            warn!("ping received while transport is not open; ignoring");
            return Ok(());
        }
        send_json(transport, &pong())
    }

    fn on_login_refresh<T: Transport + ?Sized>(
        &mut self,
        msg: &InboundMessage,
        now: Instant,
        transport: &mut T,
    ) -> Result<(), SendError> {
        let accepted = msg.state.as_ref().is_none_or(|s| s.is_open_ok());
        if !accepted {
            warn!("login rejected: {:?}", msg.state);
            return Ok(());
        }

        if self.publisher.is_armed() || self.phase != Phase::LoggingIn {
            debug!("login refresh in phase {}; already handled", self.phase);
            return Ok(());
        }

        info!("login accepted; start posting {}", self.config.ric);
        self.phase = Phase::Active;
        self.publisher.arm(&self.config, now, transport)?;
        Ok(())
    }
}

fn is_login_refresh(msg: &InboundMessage) -> bool {
    msg.kind == MessageType::Refresh
        && msg.domain == Some(Domain::Login)
        && msg.id == Some(LOGIN_STREAM_ID)
}

fn log_received(text: &str) {
    if !log::log_enabled!(log::Level::Info) {
        return;
    }
    match serde_json::from_str::<serde_json::Value>(text)
        .and_then(|v| serde_json::to_string_pretty(&v))
    {
        Ok(pretty) => info!("RECEIVED:\n{pretty}"),
        Err(_) => info!("RECEIVED:\n{text}"),
    }
}
