use std::io;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use russh::client::{self, Handle, Msg};
use russh::keys::{HashAlg, PublicKey};
use russh::{ChannelStream, Disconnect};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::models::connection::ConnectionSettings;
use crate::services::device_stream::{DeviceStream, PassThrough};
use crate::services::pager::{self, TimedShell};
use crate::utils::error::{O4nError, Result};

/// Silence that marks the end of a device answer
pub const LAST_READ: Duration = Duration::from_secs(1);

/// Last line of an answer that is only the CLI prompt, e.g. `RS900>`
static TRAILING_PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+>\s*$").unwrap());

const TERMINAL: &str = "vt100";
const TERMINAL_WIDTH: u32 = 511;
const TERMINAL_HEIGHT: u32 = 1000;

/// Client handler that accepts the device host key and logs its fingerprint
struct DeviceClient {
    host: String,
}

impl client::Handler for DeviceClient {
    type Error = anyhow::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> std::result::Result<bool, Self::Error> {
        tracing::debug!(
            host = %self.host,
            fingerprint = %server_public_key.fingerprint(HashAlg::Sha256),
            "accepting device host key"
        );
        Ok(true)
    }
}

/// Interactive shell that reads each answer until the device goes quiet
pub struct SshShell<S> {
    stream: DeviceStream<S, PassThrough>,
    last_read: Duration,
    read_timeout: Duration,
}

impl<S> SshShell<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(transport: S, last_read: Duration, read_timeout: Duration) -> Self {
        Self {
            stream: DeviceStream::new(transport, PassThrough),
            last_read,
            read_timeout,
        }
    }
}

impl<S> TimedShell for SshShell<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn send_timing(&mut self, text: &str) -> io::Result<String> {
        self.stream.write_all(normalize_command(text).as_bytes()).await?;
        let raw = self
            .stream
            .read_until_quiet(self.last_read, self.read_timeout)
            .await?;
        let page = String::from_utf8_lossy(&raw).replace("\r\n", "\n");
        Ok(strip_trailing_prompt(&strip_command_echo(&page, text)))
    }
}

/// An authenticated SSH session with a shell channel open
pub struct SshSession {
    handle: Handle<DeviceClient>,
    pub shell: SshShell<ChannelStream<Msg>>,
}

impl SshSession {
    /// Connect, authenticate with the password and start an interactive shell
    pub async fn open(settings: &ConnectionSettings) -> Result<Self> {
        tracing::info!(target_device = %settings, "opening ssh session");

        let config = Arc::new(client::Config {
            inactivity_timeout: Some(settings.ssh_timeout()),
            ..Default::default()
        });
        let handler = DeviceClient {
            host: settings.host.clone(),
        };

        let mut handle = tokio::time::timeout(
            settings.ssh_timeout(),
            client::connect(config, settings.address(), handler),
        )
        .await
        .map_err(|_| {
            O4nError::SshConnection(format!(
                "TCP connection to device failed.\nConnection to device timed-out: {}",
                settings
            ))
        })?
        .map_err(|e| O4nError::SshConnection(format!("{}: {}", settings, e)))?;

        let auth = tokio::time::timeout(
            settings.auth_timeout(),
            handle.authenticate_password(settings.user.clone(), settings.password.clone()),
        )
        .await
        .map_err(|_| O4nError::SshConnection(format!("Authentication timed out: {}", settings)))?
        .map_err(|e| O4nError::SshConnection(e.to_string()))?;

        if !auth.success() {
            tracing::warn!(target_device = %settings, "ssh authentication rejected");
            return Err(O4nError::SshConnection(format!(
                "Authentication to device failed.\n\nCommon causes of this problem are:\n\
                 1. Invalid username and password\n\
                 2. Incorrect SSH-key file\n\
                 3. Connecting to the wrong device\n\n\
                 Device settings: {}",
                settings
            )));
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| O4nError::SshConnection(e.to_string()))?;
        channel
            .request_pty(false, TERMINAL, TERMINAL_WIDTH, TERMINAL_HEIGHT, 0, 0, &[])
            .await
            .map_err(|e| O4nError::SshConnection(e.to_string()))?;
        channel
            .request_shell(false)
            .await
            .map_err(|e| O4nError::SshConnection(e.to_string()))?;

        tracing::debug!(target_device = %settings, "ssh shell ready");
        Ok(Self {
            handle,
            shell: SshShell::new(channel.into_stream(), LAST_READ, settings.ssh_timeout()),
        })
    }

    pub async fn disconnect(self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!(error = %e, "ssh disconnect failed");
        }
    }
}

/// Log in over SSH, run `commands` following pagination and return the output blocks
pub async fn run(settings: &ConnectionSettings, commands: &[String]) -> Result<String> {
    let mut session = SshSession::open(settings).await?;
    let result = pager::run_on_shell(&mut session.shell, commands).await;
    session.disconnect().await;
    result
}

/// Strip trailing whitespace and terminate with a single newline
fn normalize_command(text: &str) -> String {
    let mut line = text
        .trim_end_matches(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n')
        .to_string();
    line.push('\n');
    line
}

/// Drop the device's echo of `command` from the start of `page`
fn strip_command_echo(page: &str, command: &str) -> String {
    let command = command.trim();
    if command.is_empty() {
        return page.to_string();
    }
    match page.split_once('\n') {
        Some((first, rest)) if first.contains(command) => rest.to_string(),
        None if page.trim_end().ends_with(command) => String::new(),
        _ => page.to_string(),
    }
}

/// Drop a final line holding only the device prompt, keeping the newline before it
fn strip_trailing_prompt(page: &str) -> String {
    let start = page.rfind('\n').map_or(0, |i| i + 1);
    if TRAILING_PROMPT.is_match(&page[start..]) {
        page[..start].to_string()
    } else {
        page.to_string()
    }
}
