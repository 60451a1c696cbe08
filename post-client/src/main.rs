//! Точка входа `post-client`.
//!
//! Жизненный цикл:
//! - парсинг CLI и загрузка снимка полей (нет файла - выходим до подключения)
//! - подключение к шлюзу по WebSocket в отдельном потоке
//! - главный цикл: логин, ответы на Ping, публикация Post каждые 3 секунды
//! - корректная остановка по `Ctrl+C`

mod cli;
mod config;
mod event_loop;
mod fields;
mod ws;

use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};

use clap::Parser;
use log::{info, warn};
use post_core::{SCHEDULER_TICK, Session, SystemClock, WS_SUBPROTOCOL};

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG, по умолчанию info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();

    let fields = fields::load_fields(&args.fields)?;
    let config = config::build_config(&args, fields);

    let shutdown = Arc::new(AtomicBool::new(false));

    // Ctrl+C => ставим shutdown=true
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })?;
    }

    let url = config.ws_url();
    info!(
        "Starting post-client: ric={}, service={}, position={}, fields={}",
        config.ric,
        config.service,
        config.position,
        config.fields.len()
    );
    info!("Connecting to WebSocket {url} ...");

    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let headers = [("User-Agent", config::USER_AGENT.to_string())];
    let (mut handle, socket) = ws::open(
        &url,
        WS_SUBPROTOCOL,
        &headers,
        events_tx,
        shutdown.clone(),
    );

    let mut session = Session::new(config);
    session.connecting();

    let result = event_loop::run_event_loop(
        &mut session,
        &mut handle,
        &events_rx,
        &SystemClock,
        SCHEDULER_TICK,
        &shutdown,
    );

    // останавливаем поток сокета (он отправит Close)
    shutdown.store(true, Ordering::Relaxed);
    drop(handle);
    if let Err(panic) = socket.join() {
        warn!("socket thread panicked: {:?}", panic);
    }

    result
}
