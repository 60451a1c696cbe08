use std::time::{Duration, Instant};

use log::debug;

use crate::error::SendError;
use crate::fields::bump_fields;
use crate::transport::{Transport, send_json};
use crate::types::{FieldMap, PostConfig};
use crate::wire::post_message;

/// Планировщик публикаций: номер следующего Post, текущие поля и дедлайн.
#[derive(Debug, Clone)]
pub struct Publisher {
    post_id: u64,
    fields: FieldMap,
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl Publisher {
    pub fn new(fields: FieldMap, interval: Duration) -> Self {
        Self {
            post_id: 1,
            fields,
            interval,
            next_deadline: None,
        }
    }

    /// PostID следующей публикации
    pub fn post_id(&self) -> u64 {
        self.post_id
    }

    /// Значения, которые уйдут в следующей публикации
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    pub fn is_armed(&self) -> bool {
        self.next_deadline.is_some()
    }

    /// Запуск: сразу одна публикация, следующая через `interval`.
    /// Повторный вызов ничего не делает и возвращает `false`.
    pub fn arm<T: Transport + ?Sized>(
        &mut self,
        cfg: &PostConfig,
        now: Instant,
        transport: &mut T,
    ) -> Result<bool, SendError> {
        if self.is_armed() {
            return Ok(false);
        }
        self.publish(cfg, transport)?;
        self.next_deadline = Some(now + self.interval);
        Ok(true)
    }

    /// Тик: публикуем, если дедлайн наступил. Возвращает `true`, если был Post.
    pub fn poll<T: Transport + ?Sized>(
        &mut self,
        cfg: &PostConfig,
        now: Instant,
        transport: &mut T,
    ) -> Result<bool, SendError> {
        match self.next_deadline {
            Some(deadline) if now >= deadline => {
                self.publish(cfg, transport)?;
                self.next_deadline = Some(now + self.interval);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Больше не публикуем (соединение закрыто)
    pub fn disarm(&mut self) {
        self.next_deadline = None;
    }

    fn publish<T: Transport + ?Sized>(
        &mut self,
        cfg: &PostConfig,
        transport: &mut T,
    ) -> Result<(), SendError> {
        let msg = post_message(cfg, self.post_id, &self.fields);
        send_json(transport, &msg)?;

        debug!("post {} sent for {}", self.post_id, cfg.ric);
        self.post_id += 1;
        bump_fields(&mut self.fields);
        Ok(())
    }
}
