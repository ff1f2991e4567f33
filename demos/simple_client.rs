//! Simple IRC client example
//!
//! Connects, registers and then relays stdin to the session: plain lines go
//! to the current channel, `/join`, `/part`, `/msg`, `/nick` and `/quit` work
//! as usual and any other `/command` is sent raw. Server events are printed.
//!
//! ```text
//! cargo run --example simple_client -- [nickname] [server] [port]
//! RUST_LOG=slirc_client=trace cargo run --example simple_client
//! ```

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use slirc_client::{ClientConfig, ClientEvent, Session, SessionEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let nickname = args.next().unwrap_or_else(|| "slirc_example".to_string());
    let mut config = ClientConfig::new(nickname);
    if let Some(server) = args.next() {
        let port = match args.next() {
            Some(port) => port.parse().context("invalid port")?,
            None => config.port,
        };
        config = config.with_server(server, port);
    }

    let (mut session, mut events) = Session::new(config);
    session.connect().await?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = stdin.next_line() => match line? {
                Some(line) => {
                    if let Err(e) = session.submit(&line).await {
                        eprintln!("! {}", e);
                    }
                }
                None => break,
            },
            event = events.recv() => match event {
                Some(SessionEvent::Disconnected { reason }) => {
                    println!("* disconnected: {:?}", reason);
                    return Ok(());
                }
                Some(event) => print_event(event),
                None => return Ok(()),
            },
        }
    }

    session.disconnect().await;
    Ok(())
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Connected { server, port, nickname } => {
            println!("* connected to {}:{} as {}", server, port, nickname)
        }
        SessionEvent::ChannelChanged { channel: Some(channel) } => println!("* now talking in {}", channel),
        SessionEvent::ChannelChanged { channel: None } => println!("* left channel"),
        SessionEvent::MessageSent { target, text } => println!("→ [{}] {}", target, text),
        SessionEvent::Error(e) => println!("! {}", e),
        SessionEvent::Disconnected { .. } => {}
        SessionEvent::Irc(event) => match event {
            ClientEvent::ChatMessage { nick, target, text } => {
                println!("← [{}] <{}> {}", target, nick, text)
            }
            ClientEvent::Joined { nick, channel } => println!("* {} joined {}", nick, channel),
            ClientEvent::Parted { nick, channel } => println!("* {} left {}", nick, channel),
            ClientEvent::Quit { nick, reason } => println!("* {} quit ({})", nick, reason),
            ClientEvent::NickChanged { old_nick, new_nick } => {
                println!("* {} is now {}", old_nick, new_nick)
            }
            ClientEvent::ServerNotice { text } => println!("- {}", text),
            ClientEvent::Topic { channel, text } => println!("* topic for {}: {}", channel, text),
            ClientEvent::NamesList { names } => println!("* names: {}", names.join(" ")),
            ClientEvent::NicknameInUse => println!("! nickname in use, try /nick"),
            other => println!("? {:?}", other),
        },
    }
}
