//! Outbound control-value sinks.

use std::io::Write;
use std::net::TcpStream;

use glove_config::SinkCfg;
use glove_core::GloveError;
use glove_traits::{BoxError, Sink};
use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// Text-frame WebSocket client. One message per control value.
pub struct WsSink {
    ws: WebSocket<MaybeTlsStream<TcpStream>>,
    url: String,
}

impl WsSink {
    /// Connect to `cfg.url()` with `Origin: cfg.origin()`.
    pub fn connect(cfg: &SinkCfg) -> Result<Self, GloveError> {
        let url = cfg.url();
        let origin = cfg.origin();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| GloveError::Sink(format!("invalid url {url}: {e}")))?;
        let origin_value = HeaderValue::from_str(&origin)
            .map_err(|e| GloveError::Sink(format!("invalid origin {origin}: {e}")))?;
        request.headers_mut().insert("Origin", origin_value);

        let (ws, response) = tungstenite::connect(request)
            .map_err(|e| GloveError::Sink(format!("connect {url}: {e}")))?;
        tracing::info!(%url, %origin, status = %response.status(), "sink connected");
        Ok(Self { ws, url })
    }
}

impl Sink for WsSink {
    fn send(&mut self, msg: &str) -> Result<(), BoxError> {
        self.ws.send(Message::Text(msg.into()))?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        match self.ws.close(None) {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(url = %self.url, "sink closed");
        Ok(())
    }
}

/// Writes each message on its own line to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink {
    closed: bool,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for StdoutSink {
    fn send(&mut self, msg: &str) -> Result<(), BoxError> {
        if self.closed {
            return Err("stdout sink closed".into());
        }
        let mut out = std::io::stdout().lock();
        writeln!(out, "{msg}")?;
        out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tungstenite::handshake::server::{ErrorResponse, Request, Response};

    #[test]
    fn stdout_sink_rejects_sends_after_close() {
        let mut sink = StdoutSink::new();
        sink.close().expect("close");
        assert!(sink.send("1,0").is_err());
    }

    #[test]
    fn ws_sink_sends_text_frames_with_origin() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut origin = None;
            let mut ws = tungstenite::accept_hdr(
                stream,
                |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    origin = req
                        .headers()
                        .get("Origin")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    Ok(resp)
                },
            )
            .expect("handshake");
            let mut texts = Vec::new();
            loop {
                match ws.read() {
                    Ok(Message::Text(t)) => texts.push(t.to_string()),
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            (origin, texts)
        });

        let cfg = SinkCfg {
            host: "127.0.0.1".to_string(),
            port,
            endpoint: "ws".to_string(),
        };
        let mut sink = WsSink::connect(&cfg).expect("connect");
        sink.send("42,0").expect("send");
        sink.send("0,0").expect("send stop");
        sink.close().expect("close");

        let (origin, texts) = server.join().expect("server thread");
        assert_eq!(origin.as_deref(), Some(format!("http://127.0.0.1:{port}").as_str()));
        assert_eq!(texts, vec!["42,0", "0,0"]);
    }

    #[test]
    fn ws_connect_failure_is_a_sink_error() {
        // Bind then drop to get a port with nothing listening.
        let port = TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("addr")
            .port();
        let cfg = SinkCfg {
            host: "127.0.0.1".to_string(),
            port,
            endpoint: "ws".to_string(),
        };
        assert!(matches!(WsSink::connect(&cfg), Err(GloveError::Sink(_))));
    }
}
