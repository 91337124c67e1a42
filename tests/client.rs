use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sphereirc::client::mock::{MockConnector, MockSocket};
use sphereirc::client::prelude::*;
use sphereirc::error::Error;

fn config() -> Config {
    Config {
        nickname: Some("mynick".to_owned()),
        username: Some("me".to_owned()),
        password: Some("secret".to_owned()),
        realname: Some("Test User".to_owned()),
        quit_message: Some("see you".to_owned()),
        servers: vec![
            ServerConfig {
                hostname: Some("irc.one.net".to_owned()),
                channels: vec!["#chat".to_owned(), "lobby".to_owned(), "".to_owned()],
                ..ServerConfig::default()
            },
            ServerConfig {
                hostname: Some("irc.two.net".to_owned()),
                port: Some(6697),
                nickname: Some("othernick".to_owned()),
                ..ServerConfig::default()
            },
        ],
        ..Config::default()
    }
}

fn connected() -> anyhow::Result<(Client, MockConnector, MockSocket)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let connector = MockConnector::new();
    let mut client = Client::with_connector(&config(), Arc::new(connector.clone()))?;
    client.connect();
    client.poll();
    let socket = connector
        .socket("irc.one.net")
        .ok_or_else(|| anyhow::anyhow!("no socket"))?;
    Ok((client, connector, socket))
}

#[test]
fn construction_leaves_config_untouched() -> anyhow::Result<()> {
    let config = config();
    let copy = config.clone();
    let client = Client::with_connector(&config, Arc::new(MockConnector::new()))?;
    assert_eq!(config, copy);

    let servers = client.servers();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].hostname(), "irc.one.net");
    assert_eq!(servers[0].port(), 6667);
    assert_eq!(servers[0].start_channels(), &["#chat", "#lobby"]);
    assert_eq!(servers[1].hostname(), "irc.two.net");
    assert_eq!(servers[1].port(), 6697);
    assert_eq!(servers[1].nickname(), "othernick");
    assert_eq!(servers[1].quit_message(), "see you");
    Ok(())
}

#[test]
fn registration_and_welcome() -> anyhow::Result<()> {
    let (mut client, connector, socket) = connected()?;
    assert_eq!(
        socket.take_written_lines(),
        vec!["PASS secret", "NICK mynick", "USER me 8 * :Test User"]
    );
    let other = connector
        .socket("irc.two.net")
        .ok_or_else(|| anyhow::anyhow!("no socket"))?;
    assert_eq!(other.written_lines()[1], "NICK othernick");

    socket.feed_line(":server.example 001 mynick :Welcome");
    socket.feed_line(":server.example 002 mynick :Your host is server.example");
    client.poll();
    assert_eq!(socket.take_written_lines(), vec!["JOIN #chat,#lobby"]);
    assert_eq!(
        client.server("irc.one.net")?.state(),
        ConnectionState::Joined
    );
    assert_eq!(
        client.server("irc.two.net")?.state(),
        ConnectionState::Registering
    );
    Ok(())
}

#[test]
fn privmsg_reaches_handler() -> anyhow::Result<()> {
    let (mut client, _, socket) = connected()?;
    let seen = Arc::new(Mutex::new(vec![]));
    let inner = seen.clone();
    client.add_event_handler(
        "irc.one.net",
        IrcEvent::Privmsg,
        move |_, event| {
            inner.lock().push((
                event.sender.map(|s| s.to_owned()),
                event.channel.map(|s| s.to_owned()),
                event.payload.to_owned(),
            ));
        },
        false,
    )?;

    socket.feed_line(":alice!a@host PRIVMSG #chat :hello");
    client.poll();
    assert_eq!(
        *seen.lock(),
        vec![(
            Some("alice".to_owned()),
            Some("#chat".to_owned()),
            "hello".to_owned()
        )],
        "registered handler must be invoked exactly once per matching event"
    );
    Ok(())
}

#[cfg(feature = "ctcp")]
#[test]
fn version_request_is_answered_privately() -> anyhow::Result<()> {
    let (mut client, _, socket) = connected()?;
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = calls.clone();
    client.add_event_handler(
        ALL_SERVERS,
        IrcEvent::Privmsg,
        move |_, _| {
            inner.fetch_add(1, Ordering::SeqCst);
        },
        false,
    )?;
    socket.take_written_lines();

    socket.feed_line(":alice!a@host PRIVMSG mynick :\u{001}VERSION\u{001}");
    client.poll();
    assert_eq!(
        socket.written_lines(),
        vec![format!(
            "PRIVMSG alice :\u{001}VERSION SphereIRC {} / Rust\u{001}",
            sphereirc::VERSION
        )]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn ping_is_answered_in_the_same_tick() -> anyhow::Result<()> {
    let (mut client, _, socket) = connected()?;
    socket.take_written_lines();
    socket.feed_line("PING :server.example");
    client.poll();
    assert_eq!(socket.written_lines(), vec!["PONG :server.example"]);
    Ok(())
}

#[test]
fn disconnect_twice_quits_once() -> anyhow::Result<()> {
    let (mut client, connector, socket) = connected()?;
    socket.take_written_lines();
    client.disconnect();
    client.disconnect();
    assert_eq!(socket.written_lines(), vec!["QUIT :see you"]);
    assert!(socket.was_closed());
    for server in client.servers() {
        assert_eq!(server.state(), ConnectionState::Disconnected);
    }
    let other = connector
        .socket("irc.two.net")
        .ok_or_else(|| anyhow::anyhow!("no socket"))?;
    assert_eq!(
        other.written_lines().iter().filter(|l| l.starts_with("QUIT")).count(),
        1
    );
    Ok(())
}

#[test]
fn channel_membership_round_trip() -> anyhow::Result<()> {
    let (mut client, _, socket) = connected()?;
    socket.feed_line(":mynick!me@host JOIN :#chat");
    socket.feed_line(":mynick!me@host JOIN :#lobby");
    socket.feed_line(":bob!b@host JOIN :#chat");
    client.poll();
    assert_eq!(
        client.server("irc.one.net")?.joined_channels(),
        &["#chat", "#lobby"]
    );

    socket.feed_line(":op!o@host KICK #chat mynick :out");
    client.poll();
    assert_eq!(client.server("irc.one.net")?.joined_channels(), &["#lobby"]);

    socket.feed_line(":mynick!me@host JOIN :#chat");
    client.poll();
    let joined = client.server("irc.one.net")?.joined_channels();
    assert_eq!(joined, &["#lobby", "#chat"]);
    assert!(joined.iter().all(|c| c.is_channel_name()));
    Ok(())
}

#[test]
fn unknown_server_lookup() -> anyhow::Result<()> {
    let (mut client, _, _) = connected()?;
    match client.server_mut("irc.nowhere.net") {
        Err(Error::UnknownServer { hostname }) => assert_eq!(hostname, "irc.nowhere.net"),
        other => panic!("unexpected lookup result: {:?}", other.map(|s| s.hostname().to_owned())),
    }
    assert!(client
        .send_message("irc.nowhere.net", "#chat", "hello")
        .is_err());
    client.send_message("irc.two.net", "#chat", "hello")?;
    Ok(())
}

#[test]
fn lines_split_across_reads() -> anyhow::Result<()> {
    let (mut client, _, socket) = connected()?;
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = calls.clone();
    client.add_event_handler(
        "irc.one.net",
        IrcEvent::Notice,
        move |_, _| {
            inner.fetch_add(1, Ordering::SeqCst);
        },
        false,
    )?;

    socket.feed(b":alice!a@host NOTICE #chat :first\r\n:alice!a@host NOT");
    client.poll();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    socket.feed(b"ICE #chat :second\r\n");
    client.poll();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn hang_up_only_affects_one_server() -> anyhow::Result<()> {
    let (mut client, connector, socket) = connected()?;
    socket.hang_up();
    client.poll();
    assert_eq!(
        client.server("irc.one.net")?.state(),
        ConnectionState::Disconnected
    );
    assert_eq!(
        client.server("irc.two.net")?.state(),
        ConnectionState::Registering
    );

    // A fresh connect opens a new socket.
    client.connect();
    client.poll();
    assert_eq!(connector.attempts("irc.one.net"), 2);
    assert_eq!(connector.attempts("irc.two.net"), 1);
    assert_eq!(
        client.server("irc.one.net")?.state(),
        ConnectionState::Registering
    );
    assert_eq!(client.server("irc.one.net")?.sessions(), 2);
    Ok(())
}

#[test]
fn scrollback_records_display_lines() -> anyhow::Result<()> {
    let (mut client, _, socket) = connected()?;
    socket.feed_line(":srv 332 mynick #chat :Welcome to chat");
    socket.feed_line(":alice!a@host PRIVMSG #chat :\u{001}ACTION waves\u{001}");
    socket.feed_line(":srv 372 mynick :- be nice");
    client.poll();

    let server = client.server("irc.one.net")?;
    let texts: Vec<_> = server
        .scrollback()
        .iter()
        .map(|line| line.to_string())
        .collect();
    assert!(texts.contains(&": Topic for #chat: Welcome to chat".to_owned()));
    assert!(texts.contains(&"[#chat]: alicewaves".to_owned()));
    assert_eq!(texts.last().map(|s| &s[..]), Some(": - be nice"));
    assert_eq!(server.scrollback().channel("#chat").count(), 1);
    Ok(())
}
