/// HTTP control panel.
///
/// A small GET-only server on the network runtime, one task per
/// connection. It renders the latest `RemoteView` published by the frame
/// loop and turns form submissions into `RemoteCommand`s.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tracing::{debug, info, warn};

use super::runtime;
use crate::config::RemoteConfig;
use crate::sim::remote::{RemoteCommand, RemoteView};

/// Time a client gets to send its request line and headers.
const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub location: Option<&'static str>,
    pub body: String,
}

impl Response {
    fn page(body: String) -> Self {
        Response { status: 200, location: None, body }
    }

    fn see_other() -> Self {
        Response { status: 303, location: Some("/"), body: String::new() }
    }

    fn error(status: u16) -> Self {
        Response { status, location: None, body: format!("{} {}\n", status, reason(status)) }
    }

    /// Status line, headers and body, ready for the socket.
    fn encode(&self) -> String {
        let mut out = format!("HTTP/1.1 {} {}\r\n", self.status, reason(self.status));
        let content_type = if self.status == 200 { "text/html; charset=utf-8" } else { "text/plain" };
        let _ = write!(out, "Content-Type: {content_type}\r\n");
        let _ = write!(out, "Content-Length: {}\r\n", self.body.len());
        if let Some(loc) = self.location {
            let _ = write!(out, "Location: {loc}\r\n");
        }
        out.push_str("Connection: close\r\n\r\n");
        out.push_str(&self.body);
        out
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        303 => "See Other",
        400 => "Bad Request",
        404 => "Not Found",
        501 => "Not Implemented",
        _ => "Error",
    }
}

/// Bind the listener and serve it on the network runtime. Returns the
/// bound address.
pub fn spawn(
    cfg: &RemoteConfig,
    view: Arc<Mutex<RemoteView>>,
    commands: Sender<RemoteCommand>,
) -> Result<SocketAddr> {
    serve(cfg, view, commands, HEAD_TIMEOUT)
}

fn serve(
    cfg: &RemoteConfig,
    view: Arc<Mutex<RemoteView>>,
    commands: Sender<RemoteCommand>,
    head_timeout: Duration,
) -> Result<SocketAddr> {
    let rt = runtime::get()?;
    let listener = rt
        .block_on(TcpListener::bind((cfg.host.as_str(), cfg.port)))
        .with_context(|| format!("cannot bind {}:{}", cfg.host, cfg.port))?;
    let addr = listener.local_addr()?;
    info!(%addr, "remote panel listening");

    rt.spawn(async move {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("remote accept failed: {e}");
                    continue;
                }
            };
            let view = Arc::clone(&view);
            let commands = commands.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_client(stream, view, commands, head_timeout).await {
                    debug!(%peer, "remote client: {e:#}");
                }
            });
        }
    });

    Ok(addr)
}

async fn handle_client(
    stream: TcpStream,
    view: Arc<Mutex<RemoteView>>,
    commands: Sender<RemoteCommand>,
    head_timeout: Duration,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let request_line = time::timeout(head_timeout, async {
        let request_line = lines.next_line().await?.unwrap_or_default();
        while let Some(header) = lines.next_line().await? {
            if header.trim().is_empty() {
                break;
            }
        }
        Ok::<_, std::io::Error>(request_line)
    })
    .await
    .context("request head timed out")??;

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/");
    debug!(%method, %target, "remote request");

    let snapshot = view.lock().unwrap_or_else(|p| p.into_inner()).clone();
    let resp = route(method, target, &snapshot, &commands);
    writer.write_all(resp.encode().as_bytes()).await?;
    writer.shutdown().await?;
    Ok(())
}

/// Map one request onto a response, sending any resulting command.
pub fn route(
    method: &str,
    target: &str,
    view: &RemoteView,
    commands: &Sender<RemoteCommand>,
) -> Response {
    if method != "GET" {
        return Response::error(501);
    }
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let params = parse_query(query);
    let param = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    };

    let cmd = match path {
        "/" => return Response::page(render_page(view)),
        "/set" => match (param("option"), param("value")) {
            (Some(name), Some(value)) => Some(RemoteCommand::SetOption {
                name: name.to_string(),
                value: value.to_string(),
            }),
            _ => return Response::error(400),
        },
        "/send" => param("msg").map(|m| RemoteCommand::SendChat(m.to_string())),
        "/add_item" => param("item").map(|i| RemoteCommand::AddItem(i.to_string())),
        "/remove_item" => param("idx")
            .and_then(|i| i.parse().ok())
            .map(RemoteCommand::RemoveItem),
        _ => return Response::error(404),
    };

    if let Some(cmd) = cmd {
        if commands.send(cmd).is_err() {
            warn!("remote command dropped, frame loop is gone");
        }
    }
    Response::see_other()
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

/// Decode `application/x-www-form-urlencoded` text. Malformed escapes are
/// kept as they are.
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn render_page(view: &RemoteView) -> String {
    let mut html = String::from("<html><body><h1>Remote Control</h1>\n");
    let _ = writeln!(html, "<p>Difficulty: {}</p>", html_escape(&view.difficulty));
    let _ = writeln!(html, "<p>WiFi: {}</p>", if view.wifi { "on" } else { "off" });
    html.push_str("<p>Set difficulty:");
    for (i, level) in ["Easy", "Normal", "Hard"].iter().enumerate() {
        let sep = if i == 0 { " " } else { " | " };
        let _ = write!(html, "{sep}<a href='/set?option=Difficulty&value={level}'>{level}</a>");
    }
    html.push_str("</p>\n");
    html.push_str(
        "<p>Toggle WiFi: <a href='/set?option=WiFi&value=true'>On</a> | \
         <a href='/set?option=WiFi&value=false'>Off</a></p>\n",
    );

    html.push_str("<h2>Inventory</h2>\n<ul>");
    for (i, item) in view.items.iter().enumerate() {
        let _ = write!(
            html,
            "<li>{} <a href='/remove_item?idx={i}'>remove</a></li>",
            html_escape(item)
        );
    }
    html.push_str("</ul>\n");
    html.push_str(
        "<form action='/add_item' method='get'>\
         <input type='text' name='item' /><input type='submit' value='Add' /></form>\n",
    );

    html.push_str("<h2>Chat</h2>\n");
    for line in &view.chat {
        let _ = writeln!(
            html,
            "<p><b>{}</b>: {}</p>",
            html_escape(&line.author),
            html_escape(&line.text)
        );
    }
    html.push_str(
        "<form action='/send' method='get'>\
         <input type='text' name='msg' /><input type='submit' value='Send' /></form>\n",
    );
    html.push_str("</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::chat::ChatLine;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::sync::mpsc::{self, Receiver};

    fn view() -> RemoteView {
        RemoteView {
            difficulty: "Normal".into(),
            wifi: true,
            items: vec!["Bone".into(), "<Ball>".into()],
            chat: vec![ChatLine::new("rex", "hi & bye")],
        }
    }

    fn get(target: &str) -> (Response, Receiver<RemoteCommand>) {
        let (tx, rx) = mpsc::channel();
        (route("GET", target, &view(), &tx), rx)
    }

    #[test]
    fn index_renders_state() {
        let (resp, rx) = get("/");
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("Difficulty: Normal"));
        assert!(resp.body.contains("WiFi: on"));
        assert!(resp.body.contains("&lt;Ball&gt; <a href='/remove_item?idx=1'>"));
        assert!(resp.body.contains("<b>rex</b>: hi &amp; bye"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn set_sends_option_and_redirects() {
        let (resp, rx) = get("/set?option=Difficulty&value=Hard");
        assert_eq!(resp, Response::see_other());
        assert_eq!(
            rx.try_recv().unwrap(),
            RemoteCommand::SetOption { name: "Difficulty".into(), value: "Hard".into() }
        );
    }

    #[test]
    fn set_without_both_params_is_bad_request() {
        assert_eq!(get("/set?option=WiFi").0.status, 400);
        assert_eq!(get("/set?value=true").0.status, 400);
        assert_eq!(get("/set").0.status, 400);
    }

    #[test]
    fn send_and_inventory_routes() {
        let (resp, rx) = get("/send?msg=good+dog%21");
        assert_eq!(resp.status, 303);
        assert_eq!(rx.try_recv().unwrap(), RemoteCommand::SendChat("good dog!".into()));

        let (_, rx) = get("/add_item?item=Squeaky%20Toy");
        assert_eq!(rx.try_recv().unwrap(), RemoteCommand::AddItem("Squeaky Toy".into()));

        let (_, rx) = get("/remove_item?idx=1");
        assert_eq!(rx.try_recv().unwrap(), RemoteCommand::RemoveItem(1));
    }

    #[test]
    fn empty_or_bad_values_only_redirect() {
        for target in ["/send?msg=", "/add_item", "/remove_item?idx=-3", "/remove_item?idx=x"] {
            let (resp, rx) = get(target);
            assert_eq!(resp.status, 303, "{target}");
            assert!(rx.try_recv().is_err(), "{target}");
        }
    }

    #[test]
    fn unknown_paths_and_methods() {
        assert_eq!(get("/admin").0.status, 404);
        let (tx, _rx) = mpsc::channel();
        assert_eq!(route("POST", "/", &view(), &tx).status, 501);
    }

    #[test]
    fn decodes_form_text() {
        assert_eq!(percent_decode("a+b%20c"), "a b c");
        assert_eq!(percent_decode("%C3%A9t%C3%A9"), "été");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn serves_over_tcp() {
        let cfg = RemoteConfig { host: "127.0.0.1".into(), port: 0 };
        let shared = Arc::new(Mutex::new(view()));
        let (tx, rx) = mpsc::channel();
        let addr = spawn(&cfg, shared, tx).unwrap();

        let mut sock = TcpStream::connect(addr).unwrap();
        sock.write_all(b"GET /add_item?item=Frisbee HTTP/1.1\r\nHost: pet\r\n\r\n").unwrap();
        let mut reply = String::new();
        sock.read_to_string(&mut reply).unwrap();

        assert!(reply.starts_with("HTTP/1.1 303 See Other\r\n"));
        assert!(reply.contains("Location: /\r\n"));
        assert_eq!(rx.recv().unwrap(), RemoteCommand::AddItem("Frisbee".into()));
    }

    #[test]
    fn silent_client_does_not_block_others() {
        let cfg = RemoteConfig { host: "127.0.0.1".into(), port: 0 };
        let (tx, _rx) = mpsc::channel();
        let addr = spawn(&cfg, Arc::new(Mutex::new(view())), tx).unwrap();

        let _silent = TcpStream::connect(addr).unwrap();
        let mut sock = TcpStream::connect(addr).unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(3))).unwrap();
        sock.write_all(b"GET / HTTP/1.1\r\nHost: pet\r\n\r\n").unwrap();
        let mut reply = String::new();
        sock.read_to_string(&mut reply).unwrap();

        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(reply.contains("Difficulty: Normal"));
    }

    #[test]
    fn silent_client_is_dropped_after_head_timeout() {
        let cfg = RemoteConfig { host: "127.0.0.1".into(), port: 0 };
        let (tx, rx) = mpsc::channel();
        let addr = serve(&cfg, Arc::new(Mutex::new(view())), tx, Duration::from_millis(100)).unwrap();

        let mut silent = TcpStream::connect(addr).unwrap();
        silent.set_read_timeout(Some(Duration::from_secs(3))).unwrap();
        let mut buf = Vec::new();
        let n = silent.read_to_end(&mut buf).unwrap();

        assert_eq!(n, 0);
        assert!(rx.try_recv().is_err());
    }
}
