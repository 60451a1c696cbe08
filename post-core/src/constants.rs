use std::time::Duration;

/// Поток логина: фиксированный ID на всё время соединения
pub const LOGIN_STREAM_ID: i64 = 1;

/// Интервал между публикациями (Post)
pub const POST_INTERVAL: Duration = Duration::from_secs(3);

/// Шаг опроса дедлайна публикации
pub const SCHEDULER_TICK: Duration = Duration::from_secs(1);

/// WebSocket subprotocol шлюза
pub const WS_SUBPROTOCOL: &str = "tr_json2";
