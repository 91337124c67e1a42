use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use sphereirc::client::prelude::*;

fn poll_until<F: Fn(&Client) -> bool>(client: &mut Client, done: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        client.poll();
        if done(client) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

/// Accepts one client, answers its registration and records every line up to its QUIT.
fn serve_once(listener: TcpListener) -> thread::JoinHandle<anyhow::Result<Vec<String>>> {
    thread::spawn(move || {
        let (stream, _) = listener.accept()?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);

        let mut lines = vec![];
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim_end().to_owned();
            if line.starts_with("USER") {
                writer.write_all(b"PING :local\r\n:srv 001 mynick :Welcome\r\n")?;
            }
            let quit = line.starts_with("QUIT");
            lines.push(line);
            if quit {
                break;
            }
        }
        Ok(lines)
    })
}

#[test]
fn plain_loop_without_a_runtime() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let server = serve_once(listener);

    let config = Config {
        nickname: Some("mynick".to_owned()),
        username: Some("me".to_owned()),
        password: Some("secret".to_owned()),
        realname: Some("Test User".to_owned()),
        servers: vec![ServerConfig {
            hostname: Some("127.0.0.1".to_owned()),
            port: Some(port),
            channels: vec!["#chat".to_owned()],
            ..ServerConfig::default()
        }],
        ..Config::default()
    };
    let mut client = Client::from_config(&config)?;
    client.connect();
    let joined = poll_until(&mut client, |c| {
        c.servers()[0].state() == ConnectionState::Joined
    });
    assert!(joined, "state: {:?}", client.servers()[0].state());

    client.disconnect();
    let lines = server
        .join()
        .map_err(|_| anyhow::anyhow!("server thread panicked"))??;
    assert_eq!(
        lines,
        vec![
            "PASS secret",
            "NICK mynick",
            "USER me 8 * :Test User",
            "PONG :local",
            "JOIN #chat",
            "QUIT :Quit",
        ]
    );
    Ok(())
}

#[test]
fn refused_connect_leaves_the_server_disconnected() -> anyhow::Result<()> {
    // Bind and release a port so nothing is listening on it.
    let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let config = Config {
        nickname: Some("mynick".to_owned()),
        username: Some("me".to_owned()),
        password: Some("secret".to_owned()),
        servers: vec![ServerConfig {
            hostname: Some("127.0.0.1".to_owned()),
            port: Some(port),
            ..ServerConfig::default()
        }],
        ..Config::default()
    };
    let mut client = Client::from_config(&config)?;
    client.connect();
    let settled = poll_until(&mut client, |c| {
        c.servers()[0].state() == ConnectionState::Disconnected
    });
    assert!(settled);
    assert_eq!(client.servers()[0].sessions(), 0);
    Ok(())
}
