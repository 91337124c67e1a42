use std::time::Duration;

use sphereirc::client::prelude::*;

#[tokio::main]
async fn main() -> sphereirc::error::Result<()> {
    env_logger::init();

    let config = Config {
        nickname: Some("pickles".to_owned()),
        username: Some("pickles".to_owned()),
        password: Some("hunter2".to_owned()),
        quit_message: Some("bye for now".to_owned()),
        servers: vec![
            ServerConfig {
                hostname: Some("irc.libera.chat".to_owned()),
                channels: vec!["#rust-spam".to_owned()],
                ..ServerConfig::default()
            },
            ServerConfig {
                hostname: Some("irc.oftc.net".to_owned()),
                nickname: Some("bananas".to_owned()),
                channels: vec!["rust-spam".to_owned()],
                ..ServerConfig::default()
            },
        ],
        ..Config::default()
    };

    let mut client = Client::from_config(&config)?;

    client.add_event_handler(
        ALL_SERVERS,
        EventFilter::Any,
        |conn, event| {
            if let Some(channel) = event.channel {
                println!("{}[{}] {}: {}", conn.hostname(), channel, event.kind, event.payload);
            }
        },
        false,
    )?;

    client.add_event_handler(
        "irc.oftc.net",
        IrcEvent::Kick,
        |conn, event| {
            if event.payload == conn.nickname() {
                println!("kicked from {:?}, leaving", event.channel);
                conn.disconnect();
            }
        },
        false,
    )?;

    client.connect();
    client.run(Duration::from_millis(50)).await;

    for server in client.servers() {
        println!("{} ({} lines logged)", server.hostname(), server.scrollback().len());
        for line in server.scrollback().iter().rev().take(5) {
            println!("  {} {}", line.time.format("%H:%M:%S"), line);
        }
    }
    Ok(())
}
