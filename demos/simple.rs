use std::env;
use std::time::Duration;

use sphereirc::client::prelude::*;

#[tokio::main]
async fn main() -> sphereirc::error::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| "config.toml".to_owned());
    let config = Config::load(path)?;
    let mut client = Client::from_config(&config)?;

    client.add_event_handler(
        ALL_SERVERS,
        IrcEvent::Privmsg,
        |conn, event| {
            println!("{}: <{}> {}", conn.hostname(), event.sender.unwrap_or("?"), event.payload);
            if let Some(channel) = event.channel {
                if event.payload.contains(conn.nickname()) {
                    let _ = conn.send_privmsg(channel, "Hi!");
                }
            }
        },
        false,
    )?;

    client.connect();
    client.run(Duration::from_millis(50)).await;
    Ok(())
}
