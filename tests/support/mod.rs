// Fake Ruggedcom ROS Telnet device for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const IAC: u8 = 255;
const WILL: u8 = 251;
const DO: u8 = 253;
const ECHO: u8 = 1;
const TERMINAL_TYPE: u8 = 24;

/// Point in the conversation where the fake device drops the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HangUp {
    #[default]
    Never,
    /// As soon as the connection is accepted
    OnAccept,
    /// After reading the user name, without echoing it
    AfterUserName,
    /// After reading the password
    AfterPassword,
    /// After answering the first empty line in the CLI shell
    AfterLogin,
}

/// How the fake device behaves for one connection
#[derive(Debug, Clone)]
pub struct DeviceScript {
    pub user: String,
    pub password: String,
    pub prompt: String,
    /// Command line -> text printed before the next prompt
    pub responses: HashMap<String, String>,
    pub hang_up: HangUp,
}

impl Default for DeviceScript {
    fn default() -> Self {
        let mut responses = HashMap::new();
        responses.insert(
            "sql select Serial Number , Main Version from productinfo".to_string(),
            "Serial Number                   Main Version                                    \r\n\
RUME924058381                   v4.1.0 (May 09 2014 16:39)                      \r\n\
\r\n\
1 records selected"
                .to_string(),
        );
        responses.insert(
            "sql select MAC Address , Order Code , Hardware ID from productinfo".to_string(),
            "\x1b[0m\x1b[2KMAC Address       Order Code                                                Hardware ID                   \r\n\
94-B8-C5-F9-75-80 RS900-HI-D-L2-L2-00                                       RS900 (v2, 40-00-0066)        \r\n\
\r\n\
1 records selected"
                .to_string(),
        );

        Self {
            user: "admin".to_string(),
            password: "admin".to_string(),
            prompt: "RS900>".to_string(),
            responses,
            hang_up: HangUp::Never,
        }
    }
}

/// Running fake device; records every line the client typed
pub struct FakeRos {
    pub addr: SocketAddr,
    lines: Arc<Mutex<Vec<String>>>,
}

impl FakeRos {
    pub async fn start(script: DeviceScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let lines = Arc::new(Mutex::new(Vec::new()));

        let recorded = lines.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let script = script.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let _ = serve(socket, script, recorded).await;
                });
            }
        });

        Self { addr, lines }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Lines typed by the client, in order
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

async fn serve(
    mut socket: TcpStream,
    script: DeviceScript,
    recorded: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    if script.hang_up == HangUp::OnAccept {
        return Ok(());
    }

    socket.write_all(&[IAC, WILL, ECHO, IAC, DO, TERMINAL_TYPE]).await?;
    socket.write_all(b"\r\nRuggedcom Rugged Operating System\r\nEnter User Name: ").await?;

    let echo_user = script.hang_up != HangUp::AfterUserName;
    let Some(user) = read_line(&mut socket, echo_user, &recorded).await? else {
        return Ok(());
    };
    if script.hang_up == HangUp::AfterUserName {
        return Ok(());
    }
    socket.write_all(b"\r\nPassword: ").await?;
    let Some(password) = read_line(&mut socket, false, &recorded).await? else {
        return Ok(());
    };
    if script.hang_up == HangUp::AfterPassword {
        return Ok(());
    }

    if user != script.user || password != script.password {
        while read_line(&mut socket, false, &recorded).await?.is_some() {
            socket.write_all(b"\r\nEnter User Name: ").await?;
        }
        return Ok(());
    }

    while let Some(line) = read_line(&mut socket, true, &recorded).await? {
        let reply = match line.as_str() {
            "cls" => format!("\r\n\x1b[2J\x1b[H{}", script.prompt),
            other if other.trim().is_empty() => format!("\r\n{}", script.prompt),
            other => match script.responses.get(other) {
                Some(text) => format!("\r\n{}\r\n{}", text, script.prompt),
                None => format!("\r\nUnknown command\r\n{}", script.prompt),
            },
        };
        socket.write_all(reply.as_bytes()).await?;
        if script.hang_up == HangUp::AfterLogin && line.trim().is_empty() {
            return Ok(());
        }
    }
    Ok(())
}

/// Read one line, skipping Telnet negotiation and Ctrl-S; echo typed bytes when asked
async fn read_line(
    socket: &mut TcpStream,
    echo: bool,
    recorded: &Arc<Mutex<Vec<String>>>,
) -> std::io::Result<Option<String>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        if socket.read(&mut byte).await? == 0 {
            return Ok(None);
        }
        match byte[0] {
            IAC => {
                let mut option = [0u8; 2];
                socket.read_exact(&mut option).await?;
            }
            0x13 | b'\r' => {}
            b'\n' => break,
            other => {
                if echo {
                    socket.write_all(&[other]).await?;
                }
                line.push(other);
            }
        }
    }
    let line = String::from_utf8_lossy(&line).into_owned();
    recorded.lock().unwrap().push(line.clone());
    Ok(Some(line))
}
