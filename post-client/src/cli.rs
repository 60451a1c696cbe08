use std::path::PathBuf;

use clap::Parser;

use crate::config;

/// Post Client - логинится в market-data шлюз по WebSocket и каждые 3 секунды
/// публикует (Post) обновлённые значения полей одного инструмента.
#[derive(Parser, Debug, Clone)]
#[command(name = "post-client", version, about)]
pub(crate) struct Args {
    /// Хост шлюза
    #[arg(long, default_value = config::DEFAULT_HOST)]
    pub(crate) host: String,

    /// Порт шлюза
    #[arg(long, default_value_t = config::DEFAULT_PORT)]
    pub(crate) port: u16,

    /// ApplicationId для логина
    #[arg(long = "app_id", visible_alias = "app-id", default_value = config::DEFAULT_APP_ID)]
    pub(crate) app_id: String,

    /// Имя пользователя для логина
    #[arg(long, default_value = config::DEFAULT_USER)]
    pub(crate) user: String,

    /// Position для логина и PostUserInfo.Address
    /// (по умолчанию - IP локального интерфейса на маршруте к шлюзу)
    #[arg(long)]
    pub(crate) position: Option<String>,

    /// Инструмент (RIC), например TEST.RIC
    #[arg(long, default_value = config::DEFAULT_RIC)]
    pub(crate) ric: String,

    /// Сервис, в который публикуем
    #[arg(long, default_value = config::DEFAULT_SERVICE)]
    pub(crate) service: String,

    /// JSON-файл с начальными значениями полей
    #[arg(long, default_value = config::DEFAULT_FIELDS_FILE)]
    pub(crate) fields: PathBuf,
}
