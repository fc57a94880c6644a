/// IRC chat transport.
///
/// A task on the network runtime owns the socket: it registers, joins the
/// channel, answers PINGs, turns channel PRIVMSGs into chat lines and sends
/// queued outgoing lines. Any failure ends the task and shows up in the
/// chat as a line from `error`.

use std::sync::mpsc::{self, Sender};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info, warn};

use super::runtime;
use super::transport::ChatLink;
use crate::config::ChatConfig;
use crate::sim::chat::ChatLine;

#[derive(Debug, PartialEq, Eq)]
pub enum IrcLine<'a> {
    Ping(&'a str),
    Privmsg { nick: &'a str, text: &'a str },
    Other,
}

/// Classify one line from the server (without the trailing CRLF).
pub fn parse_line(line: &str) -> IrcLine<'_> {
    if let Some(rest) = line.strip_prefix("PING") {
        return IrcLine::Ping(rest.trim());
    }
    let mut parts = line.splitn(4, ' ');
    let (Some(prefix), Some(command), Some(_target), Some(trailing)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return IrcLine::Other;
    };
    if command != "PRIVMSG" {
        return IrcLine::Other;
    }
    let prefix = prefix.strip_prefix(':').unwrap_or(prefix);
    let nick = prefix.split('!').next().unwrap_or(prefix);
    let text = trailing.strip_prefix(':').unwrap_or(trailing);
    IrcLine::Privmsg { nick, text }
}

/// Start the IRC worker.
pub fn spawn(cfg: &ChatConfig) -> std::io::Result<ChatLink> {
    let rt = runtime::get()?;
    let (in_tx, in_rx) = mpsc::channel();
    let (out_tx, out_rx) = unbounded_channel();
    let worker_cfg = cfg.clone();

    rt.spawn(async move {
        if let Err(e) = run(&worker_cfg, &in_tx, out_rx).await {
            warn!("irc: {e:#}");
            let _ = in_tx.send(ChatLine::new("error", format!("{e:#}")));
        }
    });

    Ok(ChatLink::new(in_rx, out_tx, &cfg.nick))
}

async fn send_raw(writer: &mut OwnedWriteHalf, line: &str) -> Result<()> {
    debug!(">> {line}");
    writer
        .write_all(format!("{line}\r\n").as_bytes())
        .await
        .context("irc write failed")
}

async fn run(
    cfg: &ChatConfig,
    inbox: &Sender<ChatLine>,
    mut outbox: UnboundedReceiver<String>,
) -> Result<()> {
    let stream = TcpStream::connect((cfg.server.as_str(), cfg.port))
        .await
        .with_context(|| format!("cannot reach {}:{}", cfg.server, cfg.port))?;
    info!(server = %cfg.server, channel = %cfg.channel, "irc connected");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    send_raw(&mut writer, &format!("NICK {}", cfg.nick)).await?;
    send_raw(&mut writer, &format!("USER {0} 0 * :{0}", cfg.nick)).await?;
    send_raw(&mut writer, &format!("JOIN {}", cfg.channel)).await?;

    // Bytes of a partly read line stay here when the outbox branch wins.
    let mut pending: Vec<u8> = Vec::new();
    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut pending) => {
                if read.context("irc read failed")? == 0 {
                    bail!("server closed the connection");
                }
                if pending.last() != Some(&b'\n') {
                    continue;
                }
                let raw = std::mem::take(&mut pending);
                let line = String::from_utf8_lossy(&raw);
                let line = line.trim_end_matches(['\r', '\n']);
                match parse_line(line) {
                    IrcLine::Ping(token) => {
                        send_raw(&mut writer, &format!("PONG {token}")).await?
                    }
                    IrcLine::Privmsg { nick, text } => {
                        if inbox.send(ChatLine::new(nick, text)).is_err() {
                            return Ok(());
                        }
                    }
                    IrcLine::Other => {}
                }
            }
            text = outbox.recv() => {
                let Some(text) = text else { return Ok(()) };
                let text = text.replace(['\r', '\n'], " ");
                send_raw(&mut writer, &format!("PRIVMSG {} :{}", cfg.channel, text)).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn parses_ping() {
        assert_eq!(parse_line("PING :tungsten.libera.chat"), IrcLine::Ping(":tungsten.libera.chat"));
    }

    #[test]
    fn parses_privmsg() {
        assert_eq!(
            parse_line(":rex!~rex@host PRIVMSG #pets :good boy: yes"),
            IrcLine::Privmsg { nick: "rex", text: "good boy: yes" }
        );
    }

    #[test]
    fn ignores_other_traffic() {
        assert_eq!(parse_line(":server 001 virtualpet :Welcome"), IrcLine::Other);
        assert_eq!(parse_line(":rex!~rex@host JOIN #pets"), IrcLine::Other);
        assert_eq!(parse_line(""), IrcLine::Other);
    }

    #[test]
    fn talks_to_a_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut reader = std::io::BufReader::new(sock.try_clone().unwrap());
            let mut seen = Vec::new();
            for _ in 0..3 {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                seen.push(line.trim_end().to_string());
            }
            sock.write_all(b"PING :abc\r\n:rex!r@h PRIVMSG #pets :hi pet\r\n").unwrap();
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            seen.push(line.trim_end().to_string());
            line.clear();
            reader.read_line(&mut line).unwrap();
            seen.push(line.trim_end().to_string());
            seen
        });

        let cfg = ChatConfig {
            server: "127.0.0.1".into(),
            port,
            channel: "#pets".into(),
            nick: "pet".into(),
            ..ChatConfig::default()
        };
        let mut link = spawn(&cfg).unwrap();
        use crate::net::transport::ChatTransport;
        let deadline = Instant::now() + Duration::from_secs(5);
        while !link.poll_incoming().iter().any(|l| l.author == "rex") {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(20));
        }
        link.enqueue_outgoing("woof".into());

        let seen = server.join().unwrap();
        assert_eq!(seen[0], "NICK pet");
        assert_eq!(seen[1], "USER pet 0 * :pet");
        assert_eq!(seen[2], "JOIN #pets");
        assert_eq!(seen[3], "PONG :abc");
        assert_eq!(seen[4], "PRIVMSG #pets :woof");
    }
}
