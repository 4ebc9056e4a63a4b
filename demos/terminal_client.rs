//! Terminal IRC client
//!
//! Connects to a server, registers, and turns stdin into slash commands.
//! `/window <target>` switches the conversation that plain text goes to.
//!
//! ```text
//! cargo run --example terminal_client -- irc.libera.chat 6697 mynick
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use slirc_engine::ctcp::CtcpEvent;
use slirc_engine::format::{self, IrcColor};
use slirc_engine::transport::{ConnectionConfig, DEFAULT_TLS_PORT};
use slirc_engine::{Connection, ConnectionEvent, Reaction, Session, SessionConfig, SessionEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "irc.libera.chat".to_string());
    let port = match args.next() {
        Some(port) => port.parse().context("invalid port")?,
        None => DEFAULT_TLS_PORT,
    };
    let nickname = args.next().unwrap_or_else(|| "slirc_demo".to_string());

    let config = ConnectionConfig::new(&host, port).with_tls(port == DEFAULT_TLS_PORT);
    let (conn, mut events) = Connection::new(config);
    let conn = Arc::new(conn);
    let session = Arc::new(Session::new(SessionConfig {
        nickname: nickname.clone(),
        ..SessionConfig::default()
    }));

    conn.connect(Duration::from_secs(15))
        .await
        .with_context(|| format!("connecting to {}:{}", host, port))?;
    conn.send_line(&format!("NICK {}", nickname)).await?;
    conn.send_line(&format!("USER {} 0 * :slirc-engine demo", nickname))
        .await?;

    let reader = {
        let conn = conn.clone();
        let session = session.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let line = match event {
                    ConnectionEvent::Line(line) => line,
                    ConnectionEvent::Closed => {
                        println!("*** connection closed");
                        break;
                    }
                };
                match session.receive(&line) {
                    Ok(reaction) => {
                        if let Err(e) = flush(&conn, reaction).await {
                            eprintln!("*** send failed: {}", e);
                        }
                    }
                    Err(e) => eprintln!("*** unparsable line {:?}: {}", line, e),
                }
            }
        })
    };

    let mut active: Option<String> = None;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(input) = stdin.next_line().await? {
        if let Some(target) = input.strip_prefix("/window ") {
            active = Some(target.trim().to_string());
            println!("*** now talking in {}", target.trim());
            continue;
        }
        let reaction = session.input(&input, active.as_deref());
        flush(&conn, reaction).await?;
        if !conn.is_connected() {
            break;
        }
    }

    conn.close().await;
    reader.await?;
    conn.wait().await?;
    Ok(())
}

async fn flush(conn: &Connection, reaction: Reaction) -> anyhow::Result<()> {
    for line in &reaction.lines {
        conn.send_line(line).await?;
    }
    for event in reaction.events {
        show(event);
    }
    Ok(())
}

fn show(event: SessionEvent) {
    match event {
        SessionEvent::Message {
            channel,
            sender,
            text,
            notice,
            highlight,
        } => {
            let place = channel.unwrap_or_else(|| "query".to_string());
            let mark = if highlight { "!" } else { " " };
            let open = if notice { '-' } else { '<' };
            let close = if notice { '-' } else { '>' };
            println!("{}[{}] {}{}{} {}", mark, place, open, sender, close, render(&text));
        }
        SessionEvent::Ctcp(CtcpEvent::Action {
            channel,
            sender,
            text,
        }) => {
            let place = channel.unwrap_or_else(|| "query".to_string());
            println!(" [{}] * {} {}", place, sender, render(&text));
        }
        SessionEvent::Ctcp(CtcpEvent::PingReply { sender, elapsed }) => {
            println!("*** PING reply from {}: {:?}", sender, elapsed);
        }
        SessionEvent::Ctcp(CtcpEvent::Reply {
            sender,
            command,
            content,
        }) => {
            println!("*** {} reply from {}: {}", command, sender, content);
        }
        SessionEvent::Ctcp(CtcpEvent::ErrorReply { sender, content }) => {
            println!("*** CTCP error from {}: {}", sender, content);
        }
        SessionEvent::Sent { target, text } => println!(" [{}] > {}", target, render(&text)),
        SessionEvent::SentAction { target, text } => println!(" [{}] * {}", target, text),
        SessionEvent::Raw(line) => println!("{}", line),
    }
}

/// Render formatted text with ANSI escapes.
fn render(text: &str) -> String {
    let mut out = String::new();
    for run in format::parse(text) {
        let mut sgr = Vec::new();
        if run.bold {
            sgr.push("1".to_string());
        }
        if run.underline {
            sgr.push("4".to_string());
        }
        if let Some(fg) = ansi(run.foreground) {
            sgr.push(format!("38;5;{}", fg));
        }
        if let Some(bg) = ansi(run.background) {
            sgr.push(format!("48;5;{}", bg));
        }
        if sgr.is_empty() {
            out.push_str(&run.text());
        } else {
            out.push_str(&format!("\x1b[{}m{}\x1b[0m", sgr.join(";"), run.text()));
        }
    }
    out
}

fn ansi(color: IrcColor) -> Option<u8> {
    const XTERM: [u8; 16] = [15, 0, 4, 2, 9, 1, 5, 208, 11, 10, 6, 14, 12, 13, 8, 7];
    match color {
        IrcColor::Default => None,
        IrcColor::ReversedDefault => Some(0),
        other => other.code().map(|code| XTERM[code as usize]),
    }
}
