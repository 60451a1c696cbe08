use std::io;
use std::net::{IpAddr, UdpSocket};
use std::time::Duration;

use post_core::{FieldMap, PostConfig};

use crate::cli::Args;

pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_PORT: u16 = 15000;
pub(crate) const DEFAULT_APP_ID: &str = "256";
pub(crate) const DEFAULT_USER: &str = "root";
pub(crate) const DEFAULT_SERVICE: &str = "DIST_CACHE";
pub(crate) const DEFAULT_RIC: &str = "TEST.RIC";
pub(crate) const DEFAULT_FIELDS_FILE: &str = "fields.json";

pub(crate) const FALLBACK_POSITION: &str = "127.0.0.1";

/// Заголовок User-Agent в хендшейке
pub(crate) const USER_AGENT: &str = concat!("post-client/", env!("CARGO_PKG_VERSION"));

/// Таймаут TCP connect к шлюзу
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Таймаут чтения сокета: как часто поток транспорта разгребает исходящие
pub(crate) const WS_READ_TICK: Duration = Duration::from_millis(50);

pub(crate) fn build_config(args: &Args, fields: FieldMap) -> PostConfig {
    let position = args
        .position
        .clone()
        .unwrap_or_else(|| detect_position(&args.host, args.port));

    PostConfig {
        host: args.host.clone(),
        port: args.port,
        app_id: args.app_id.clone(),
        user: args.user.clone(),
        position,
        service: args.service.clone(),
        ric: args.ric.clone(),
        post_user_id: std::process::id(),
        fields,
    }
}

/// IP локального интерфейса, через который виден шлюз.
/// UDP connect ничего не отправляет, только выбирает маршрут.
pub(crate) fn detect_position(host: &str, port: u16) -> String {
    let probe = || -> io::Result<IpAddr> {
        let sock = UdpSocket::bind("0.0.0.0:0")?;
        sock.connect((host, port))?;
        Ok(sock.local_addr()?.ip())
    };

    match probe() {
        Ok(ip) if !ip.is_unspecified() => ip.to_string(),
        _ => FALLBACK_POSITION.to_string(),
    }
}
