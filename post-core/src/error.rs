use thiserror::Error;

/// Ошибки разбора входящего кадра
#[derive(Debug, Error)]
pub enum WireError {
    /// Кадр не является корректным JSON (или не массивом сообщений)
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ошибки отправки
#[derive(Debug, Error)]
pub enum SendError {
    /// Транспорт ещё не открыт или уже закрыт
    #[error("transport is not open")]
    NotOpen,

    /// Поток транспорта завершился, канал отправки закрыт
    #[error("transport is gone")]
    Disconnected,

    /// Не удалось сериализовать исходящее сообщение
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ошибки сессии, фатальные для текущего соединения
#[derive(Debug, Error)]
pub enum SessionError {
    /// Ошибка отправки
    #[error(transparent)]
    Send(#[from] SendError),

    /// Транспорт сообщил об ошибке
    #[error("transport error: {0}")]
    Transport(String),
}

/// Ошибки загрузки снимка полей
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Ошибка чтения
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    /// Некорректный JSON
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Документ не является JSON-объектом
    #[error("fields document must be a JSON object")]
    NotAnObject,
}
