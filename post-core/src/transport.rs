use crate::error::SendError;

/// Исходящая сторона транспорта: отправка текстовых кадров
pub trait Transport {
    /// Открыт ли транспорт прямо сейчас
    fn is_open(&self) -> bool;

    /// Отправить один текстовый кадр
    fn send(&mut self, text: &str) -> Result<(), SendError>;
}

/// События транспорта, в порядке их возникновения
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Хендшейк завершён
    Opened,
    /// Пришёл текстовый кадр
    Message(String),
    /// Ошибка соединения
    Error(String),
    /// Соединение закрыто
    Closed,
}

/// Сериализует сообщение, логирует его и отправляет одним кадром
pub(crate) fn send_json<M, T>(transport: &mut T, msg: &M) -> Result<(), SendError>
where
    M: serde::Serialize,
    T: Transport + ?Sized,
{
    let text = crate::wire::encode(msg)?;
    transport.send(&text)?;
    log::info!("SENT:\n{}", serde_json::to_string_pretty(msg)?);
    Ok(())
}
