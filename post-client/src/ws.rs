use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};
use post_core::{SendError, Transport, TransportEvent};
use thiserror::Error;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::{HandshakeError, Message, WebSocket};

use crate::config::{CONNECT_TIMEOUT, WS_READ_TICK};

/// Сколько тиков ждём ответный Close при остановке
const CLOSE_DRAIN_TICKS: usize = 20;

#[derive(Debug, Error)]
pub(crate) enum WsError {
    #[error("bad url or header: {0}")]
    Request(String),

    #[error("connect {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Ws(#[from] tungstenite::Error),
}

/// Сторона сессии: кладёт кадры в очередь потока сокета
#[derive(Debug, Clone)]
pub(crate) struct WsHandle {
    outbound: Sender<String>,
    open: Arc<AtomicBool>,
}

impl Transport for WsHandle {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn send(&mut self, text: &str) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::NotOpen);
        }
        self.outbound
            .send(text.to_string())
            .map_err(|_| SendError::Disconnected)
    }
}

/// Открывает соединение в отдельном потоке.
///
/// Поток сам выполняет connect + хендшейк, дальше читает кадры и отправляет
/// исходящие из очереди. Всё, что происходит с сокетом, приходит в `events`.
pub(crate) fn open(
    url: &str,
    subprotocol: &str,
    headers: &[(&'static str, String)],
    events: Sender<TransportEvent>,
    shutdown: Arc<AtomicBool>,
) -> (WsHandle, JoinHandle<()>) {
    let (tx, rx) = crossbeam_channel::unbounded::<String>();
    let open = Arc::new(AtomicBool::new(false));

    let handle = WsHandle {
        outbound: tx,
        open: open.clone(),
    };

    let url = url.to_string();
    let subprotocol = subprotocol.to_string();
    let headers = headers.to_vec();

    let h = thread::spawn(move || {
        let res = match connect(&url, &subprotocol, &headers, &shutdown) {
            Ok(Some(ws)) => run_socket(ws, &rx, &events, &open, &shutdown),
            Ok(None) => {
                info!("shutdown requested before websocket was open");
                Ok(())
            }
            Err(e) => Err(e),
        };

        open.store(false, Ordering::Release);
        if let Err(e) = res {
            let _ = events.send(TransportEvent::Error(e.to_string()));
        }
        let _ = events.send(TransportEvent::Closed);
    });

    (handle, h)
}

/// Connect + хендшейк. `Ok(None)` - пришёл shutdown до открытия сокета.
fn connect(
    url: &str,
    subprotocol: &str,
    headers: &[(&'static str, String)],
    shutdown: &AtomicBool,
) -> Result<Option<WebSocket<TcpStream>>, WsError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| WsError::Request(e.to_string()))?;

    {
        let h = request.headers_mut();
        h.insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_str(subprotocol).map_err(|e| WsError::Request(e.to_string()))?,
        );
        for (name, value) in headers {
            h.insert(
                *name,
                HeaderValue::from_str(value).map_err(|e| WsError::Request(e.to_string()))?,
            );
        }
    }

    let host = request
        .uri()
        .host()
        .ok_or_else(|| WsError::Request(format!("no host in {url}")))?
        .to_string();
    let port = request.uri().port_u16().unwrap_or(80);

    let stream = connect_tcp(&host, port).map_err(|source| WsError::Connect {
        url: url.to_string(),
        source,
    })?;
    stream.set_nodelay(true).ok();

    // таймаут чтения ставим до хендшейка: иначе молчащий шлюз повесит поток
    stream.set_read_timeout(Some(WS_READ_TICK))?;

    let mut attempt = tungstenite::client(request, stream);
    loop {
        match attempt {
            Ok((ws, _response)) => return Ok(Some(ws)),
            Err(HandshakeError::Interrupted(mid)) => {
                if shutdown.load(Ordering::Relaxed) {
                    return Ok(None);
                }
                attempt = mid.handshake();
            }
            Err(HandshakeError::Failure(e)) => return Err(WsError::Handshake(e.to_string())),
        }
    }
}

/// TCP connect с таймаутом, по всем адресам хоста
fn connect_tcp(host: &str, port: u16) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")
    }))
}

fn run_socket(
    mut ws: WebSocket<TcpStream>,
    outbound: &Receiver<String>,
    events: &Sender<TransportEvent>,
    open: &AtomicBool,
    shutdown: &AtomicBool,
) -> Result<(), WsError> {
    open.store(true, Ordering::Release);
    if events.send(TransportEvent::Opened).is_err() {
        return Ok(());
    }

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("closing websocket");
            open.store(false, Ordering::Release);
            close_gracefully(&mut ws);
            return Ok(());
        }

        // сначала исходящие
        for text in outbound.try_iter() {
            ws.send(Message::text(text))?;
        }

        match ws.read() {
            Ok(Message::Text(text)) => {
                if events
                    .send(TransportEvent::Message(text.as_str().to_owned()))
                    .is_err()
                {
                    // сессия ушла - закрываемся
                    close_gracefully(&mut ws);
                    return Ok(());
                }
            }
            Ok(Message::Close(frame)) => {
                info!("server closed websocket: {frame:?}");
                // отправить ответный Close
                let _ = ws.flush();
                return Ok(());
            }
            Ok(other) => {
                debug!("ignoring websocket frame: {other:?}");
            }
            Err(tungstenite::Error::Io(e)) if is_tick(&e) => {
                // просто "тик" цикла
                continue;
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn close_gracefully(ws: &mut WebSocket<TcpStream>) {
    if let Err(e) = ws.close(None) {
        debug!("close: {e}");
        return;
    }
    for _ in 0..CLOSE_DRAIN_TICKS {
        match ws.read() {
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if is_tick(&e) => {}
            Err(tungstenite::Error::ConnectionClosed) => return,
            Err(e) => {
                warn!("error while closing websocket: {e}");
                return;
            }
        }
    }
}

fn is_tick(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_loop::run_event_loop;
    use post_core::{FieldMap, PostConfig, Session, SystemClock};
    use serde_json::{Value, json};
    use std::net::TcpListener;
    use std::time::Duration;
    use tungstenite::handshake::server::{ErrorResponse, Request, Response};

    fn cfg(port: u16) -> PostConfig {
        let mut fields = FieldMap::new();
        fields.insert("BID".to_string(), json!(45.55));
        PostConfig {
            host: "127.0.0.1".to_string(),
            port,
            app_id: "256".to_string(),
            user: "root".to_string(),
            position: "127.0.0.1".to_string(),
            service: "DIST_CACHE".to_string(),
            ric: "TEST.RIC".to_string(),
            post_user_id: 7,
            fields,
        }
    }

    fn read_json(ws: &mut WebSocket<TcpStream>) -> Value {
        loop {
            match ws.read().unwrap() {
                Message::Text(t) => return serde_json::from_str(t.as_str()).unwrap(),
                _ => continue,
            }
        }
    }

    /// Мини-шлюз: логин -> Refresh, ждём Post, шлём Ping, ждём Pong, закрываем.
    fn spawn_gateway(listener: TcpListener) -> thread::JoinHandle<(Value, Value, Value, Option<String>)> {
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut agent = None;
            let callback = |req: &Request, mut resp: Response| -> Result<Response, ErrorResponse> {
                agent = req
                    .headers()
                    .get("User-Agent")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                resp.headers_mut()
                    .insert("Sec-WebSocket-Protocol", HeaderValue::from_static("tr_json2"));
                Ok(resp)
            };
            let mut ws = tungstenite::accept_hdr(stream, callback).unwrap();

            let login = read_json(&mut ws);
            let login_ok =
                r#"[{"ID":1,"Type":"Refresh","Domain":"Login","State":{"Stream":"Open","Data":"Ok"}}]"#;
            ws.send(Message::text(login_ok.to_string())).unwrap();

            let post = read_json(&mut ws);
            ws.send(Message::text(r#"[{"Type":"Ping"}]"#.to_string()))
                .unwrap();
            let pong = read_json(&mut ws);

            ws.close(None).unwrap();
            while ws.read().is_ok() {}

            (login, post, pong, agent)
        })
    }

    #[test]
    fn talks_to_local_gateway_until_server_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = spawn_gateway(listener);

        let config = cfg(port);
        let url = config.ws_url();
        let shutdown = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = crossbeam_channel::unbounded();

        let (mut handle, socket) = open(
            &url,
            "tr_json2",
            &[("User-Agent", "post-client-test".to_string())],
            events_tx,
            shutdown.clone(),
        );

        let mut session = Session::new(config);
        session.connecting();
        run_event_loop(
            &mut session,
            &mut handle,
            &events_rx,
            &SystemClock,
            Duration::from_millis(20),
            &shutdown,
        )
        .unwrap();

        assert!(session.is_closed());
        socket.join().unwrap();

        let (login, post, pong, agent) = server.join().unwrap();
        assert_eq!(login["Domain"], json!("Login"));
        assert_eq!(post["Type"], json!("Post"));
        assert_eq!(post["PostID"], json!(1));
        assert_eq!(post["PostUserInfo"]["UserID"], json!(7));
        assert_eq!(post["Message"]["Fields"], json!({"BID": 45.55}));
        assert_eq!(pong, json!({"Type": "Pong"}));
        assert_eq!(agent.as_deref(), Some("post-client-test"));
    }

    #[test]
    fn connect_failure_is_reported_as_error_then_closed() {
        // свободный порт, на котором никто не слушает
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (handle, socket) = open(
            &format!("ws://127.0.0.1:{port}/WebSocket"),
            "tr_json2",
            &[],
            events_tx,
            Arc::new(AtomicBool::new(false)),
        );
        socket.join().unwrap();

        let got: Vec<_> = events_rx.try_iter().collect();
        assert!(matches!(got.as_slice(), [TransportEvent::Error(_), TransportEvent::Closed]));
        assert!(!handle.is_open());
    }

    #[test]
    fn shutdown_during_stalled_handshake_stops_socket_thread() {
        // шлюз принимает TCP, но на upgrade не отвечает
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (accepted_tx, accepted_rx) = crossbeam_channel::bounded(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
        let gateway = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            accepted_tx.send(()).unwrap();
            let _ = release_rx.recv();
            drop(stream);
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (handle, socket) = open(
            &format!("ws://127.0.0.1:{port}/WebSocket"),
            "tr_json2",
            &[],
            events_tx,
            shutdown.clone(),
        );

        accepted_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        thread::sleep(Duration::from_millis(200));
        shutdown.store(true, Ordering::Relaxed);
        drop(handle);

        let (joined_tx, joined_rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let _ = joined_tx.send(socket.join().is_ok());
        });
        let joined = joined_rx.recv_timeout(Duration::from_secs(5));
        let _ = release_tx.send(());
        gateway.join().unwrap();

        assert_eq!(joined, Ok(true), "socket thread must exit after shutdown");
        let got: Vec<_> = events_rx.try_iter().collect();
        assert_eq!(got, vec![TransportEvent::Closed]);
    }

    #[test]
    fn send_before_open_fails() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut handle = WsHandle {
            outbound: tx,
            open: Arc::new(AtomicBool::new(false)),
        };
        assert!(matches!(handle.send("{}"), Err(SendError::NotOpen)));
    }

    #[test]
    fn send_after_socket_thread_gone_fails() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut handle = WsHandle {
            outbound: tx,
            open: Arc::new(AtomicBool::new(true)),
        };
        assert!(matches!(handle.send("{}"), Err(SendError::Disconnected)));
    }
}
