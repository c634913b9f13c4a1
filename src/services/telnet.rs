use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::models::connection::ConnectionSettings;
use crate::services::device_stream::{DeviceStream, InboundFilter};
use crate::utils::error::{LoginStage, O4nError, Result};

/// Login prompt printed by ROS
pub const USER_PROMPT: &[u8] = b"Enter User Name: ";
pub const PASSWORD_PROMPT: &[u8] = b"Password: ";
/// Prompt followed by the echoed finish marker
pub const PROMPT_MARKER: &[u8] = b">    ";
/// Typed after the last command so the echo lands on [`PROMPT_MARKER`]
pub const FINISH_MARKER: &[u8] = b"    \n";
/// Ctrl-S switches the ROS menu screen to the CLI shell
pub const ENTER_CLI: u8 = 0x13;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NegotiationState {
    #[default]
    Data,
    Iac,
    Option(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Strips Telnet commands from the byte stream and refuses every option
#[derive(Debug, Clone, Default)]
pub struct TelnetNegotiator {
    state: NegotiationState,
}

impl InboundFilter for TelnetNegotiator {
    fn filter(&mut self, raw: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in raw {
            self.state = match self.state {
                NegotiationState::Data => match byte {
                    IAC => NegotiationState::Iac,
                    0 => NegotiationState::Data,
                    _ => {
                        data.push(byte);
                        NegotiationState::Data
                    }
                },
                NegotiationState::Iac => match byte {
                    IAC => {
                        data.push(IAC);
                        NegotiationState::Data
                    }
                    DO | DONT | WILL | WONT => NegotiationState::Option(byte),
                    SB => NegotiationState::Subnegotiation,
                    _ => NegotiationState::Data,
                },
                NegotiationState::Option(command) => {
                    match command {
                        DO | DONT => replies.extend_from_slice(&[IAC, WONT, byte]),
                        _ => replies.extend_from_slice(&[IAC, DONT, byte]),
                    }
                    NegotiationState::Data
                }
                NegotiationState::Subnegotiation => match byte {
                    IAC => NegotiationState::SubnegotiationIac,
                    _ => NegotiationState::Subnegotiation,
                },
                NegotiationState::SubnegotiationIac => match byte {
                    SE => NegotiationState::Data,
                    _ => NegotiationState::Subnegotiation,
                },
            };
        }
    }
}

/// Pauses inserted between steps of the Telnet conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelnetTiming {
    /// Wait after entering the CLI shell before draining the screen
    pub settle: Duration,
    /// Wait before typing each command
    pub command_gap: Duration,
}

impl Default for TelnetTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            command_gap: Duration::from_millis(200),
        }
    }
}

/// A logged-in ROS CLI session over Telnet
pub struct TelnetSession<S> {
    stream: DeviceStream<S, TelnetNegotiator>,
    settings: ConnectionSettings,
    timing: TelnetTiming,
}

impl TelnetSession<TcpStream> {
    /// Dial the device and log in
    pub async fn connect(settings: &ConnectionSettings, timing: TelnetTiming) -> Result<Self> {
        tracing::info!(target_device = %settings, "opening telnet session");

        let socket = tokio::time::timeout(settings.telnet_timeout(), TcpStream::connect(settings.address()))
            .await
            .map_err(|_| connection_error(settings, LoginStage::Connect, "timed out"))?
            .map_err(|e| connection_error(settings, LoginStage::Connect, e))?;

        Self::login(socket, settings, timing).await
    }
}

impl<S> TelnetSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Walk the ROS login screens on an already open transport
    pub async fn login(transport: S, settings: &ConnectionSettings, timing: TelnetTiming) -> Result<Self> {
        let mut session = Self {
            stream: DeviceStream::new(transport, TelnetNegotiator::default()),
            settings: settings.clone(),
            timing,
        };
        let limit = settings.telnet_timeout();

        session
            .stream
            .read_until(USER_PROMPT, limit)
            .await
            .map_err(|e| connection_error(settings, LoginStage::UserPrompt, e))?;
        session
            .send_line(settings.user.as_bytes(), LoginStage::UserPrompt)
            .await?;

        session
            .stream
            .read_until(PASSWORD_PROMPT, limit)
            .await
            .map_err(|e| connection_error(settings, LoginStage::PasswordPrompt, e))?;
        session
            .send_line(settings.password.as_bytes(), LoginStage::PasswordPrompt)
            .await?;

        session.enter_cli().await?;
        session.check_authentication().await?;

        tracing::debug!(target_device = %settings, "telnet login complete");
        Ok(session)
    }

    /// Type every command, then collect the screen up to the finish marker
    pub async fn run_commands(&mut self, commands: &[String]) -> Result<String> {
        for command in commands {
            tokio::time::sleep(self.timing.command_gap).await;
            tracing::debug!(command = %command, "sending command");

            let mut line = command.clone().into_bytes();
            line.push(b'\n');
            self.stream
                .write_all(&line)
                .await
                .map_err(|e| O4nError::TelnetCommand(e.to_string()))?;
        }

        self.stream
            .write_all(FINISH_MARKER)
            .await
            .map_err(|e| O4nError::TelnetCommand(e.to_string()))?;

        let output = self
            .stream
            .read_until(PROMPT_MARKER, self.settings.telnet_timeout())
            .await
            .map_err(|e| O4nError::TelnetCommand(e.to_string()))?;

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "telnet shutdown failed");
        }
    }

    async fn enter_cli(&mut self) -> Result<()> {
        self.stream
            .write_all(&[ENTER_CLI])
            .await
            .map_err(|e| connection_error(&self.settings, LoginStage::CliShell, e))?;
        self.send_line(b"cls", LoginStage::CliShell).await?;

        tokio::time::sleep(self.timing.settle).await;
        self.stream
            .read_very_eager()
            .await
            .map_err(|e| connection_error(&self.settings, LoginStage::CliShell, e))?;
        Ok(())
    }

    /// A fresh login prompt after an empty line means the credentials were refused
    async fn check_authentication(&mut self) -> Result<()> {
        self.send_line(b"", LoginStage::CliShell).await?;

        let screen = self
            .stream
            .read_until(PROMPT_MARKER, self.settings.telnet_timeout())
            .await
            .map_err(|e| connection_error(&self.settings, LoginStage::CliShell, e))?;

        if String::from_utf8_lossy(&screen).contains("Enter User Name:") {
            tracing::warn!(target_device = %self.settings, "telnet authentication rejected");
            return Err(O4nError::TelnetAuthentication {
                settings: self.settings.to_string(),
            });
        }
        Ok(())
    }

    async fn send_line(&mut self, text: &[u8], stage: LoginStage) -> Result<()> {
        let mut line = text.to_vec();
        line.push(b'\n');
        self.stream
            .write_all(&line)
            .await
            .map_err(|e| connection_error(&self.settings, stage, e))
    }
}

/// Log in over Telnet, run `commands` and return the captured screen
pub async fn run(settings: &ConnectionSettings, commands: &[String], timing: TelnetTiming) -> Result<String> {
    let mut session = TelnetSession::connect(settings, timing).await?;
    let output = session.run_commands(commands).await?;
    session.close().await;
    Ok(output)
}

fn connection_error(settings: &ConnectionSettings, stage: LoginStage, cause: impl ToString) -> O4nError {
    O4nError::TelnetConnection {
        stage,
        settings: settings.to_string(),
        cause: cause.to_string(),
    }
}
