use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::info;
use post_core::{Clock, Session, Transport, TransportEvent};

/// Главный цикл: единственный владелец `Session`.
///
/// Ждём событие транспорта не дольше `tick`, после каждого пробуждения
/// проверяем дедлайн публикации. Выходим по shutdown или когда сессия закрыта.
pub(crate) fn run_event_loop<T, C>(
    session: &mut Session,
    transport: &mut T,
    events: &Receiver<TransportEvent>,
    clock: &C,
    tick: Duration,
    shutdown: &AtomicBool,
) -> anyhow::Result<()>
where
    T: Transport + ?Sized,
    C: Clock + ?Sized,
{
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("shutting down...");
            session.on_close();
            return Ok(());
        }

        match events.recv_timeout(tick) {
            Ok(event) => session.handle_event(event, clock.now(), transport)?,
            Err(RecvTimeoutError::Timeout) => {
                // ничего, просто тик
            }
            Err(RecvTimeoutError::Disconnected) => {
                session.on_close();
                return Ok(());
            }
        }

        if session.is_closed() {
            return Ok(());
        }

        session.on_tick(clock.now(), transport)?;
    }
}
