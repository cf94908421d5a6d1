//! Session lifecycle.
//!
//! A [`ConnectionManager`] owns one TCP connection for one participant. Setup
//! happens in [`ConnectionManager::connect`]: resolve, connect, handshake,
//! build both relays. [`ConnectionManager::run`] then drives the relays as two
//! tasks until both have finished and tears the session down.
//!
//! # Session lifecycle
//!
//! ```text
//! connect() ──► Ready ──run()──► relays running ──both done──► cleanup() ──► NotReady
//!     │
//!     └── setup failure ──► ClientError (caller exits with Failure::exit_code)
//! ```

use std::{io, net::SocketAddr};

use parley_proto::{FrameReader, FrameWriter, PayloadMode};
use tokio::{
    net::{
        TcpStream, lookup_host,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    task::JoinError,
};
use tracing::{debug, error, info};

use crate::{
    ClientError, FrameSink, LineSource, RunFlag, SessionConfig,
    relay::{InboundRelay, OutboundRelay, RelayExit},
};

/// Whether a session can (still) run its relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Connected, handshake sent, relays built and not yet run.
    Ready,
    /// Relays have run and the socket is closed.
    NotReady,
}

/// How each relay direction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Local input to server.
    pub outbound: RelayExit,
    /// Server to local output.
    pub inbound: RelayExit,
}

/// Owns the server connection and both relay directions of one session.
pub struct ConnectionManager<S, K> {
    config: SessionConfig,
    peer: SocketAddr,
    run_flag: RunFlag,
    state: SessionState,
    outbound: Option<OutboundRelay<S, OwnedWriteHalf>>,
    inbound: Option<InboundRelay<OwnedReadHalf, K>>,
}

impl<S, K> ConnectionManager<S, K>
where
    S: LineSource + 'static,
    K: FrameSink + 'static,
{
    /// Connect to the configured server and prepare both relays.
    ///
    /// The participant name is written as the first line on the socket,
    /// before the outbound relay exists, so nothing can overtake it.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnsupportedProjection`] if `sink` wants records from
    ///   a text-only server
    /// - [`ClientError::InvalidUserName`] if the name would split the
    ///   handshake line
    /// - [`ClientError::UnknownHost`] if the host does not resolve
    /// - [`ClientError::Connection`] if no resolved address accepts
    /// - [`ClientError::Streams`] if the connected socket is unusable
    /// - [`ClientError::Handshake`] if the participant name cannot be sent
    pub async fn connect(
        config: SessionConfig,
        source: S,
        sink: K,
        run_flag: RunFlag,
    ) -> Result<Self, ClientError> {
        Self::establish(config, source, sink, run_flag).await.inspect_err(|e| {
            error!(error = %e, exit_code = e.exit_code(), "session setup failed");
        })
    }

    async fn establish(
        config: SessionConfig,
        source: S,
        sink: K,
        run_flag: RunFlag,
    ) -> Result<Self, ClientError> {
        if config.wire_mode == PayloadMode::Text && sink.mode() == PayloadMode::Structured {
            return Err(ClientError::UnsupportedProjection {
                wire: config.wire_mode,
                local: sink.mode(),
            });
        }
        if config.name.chars().any(char::is_control) {
            return Err(ClientError::InvalidUserName(config.name));
        }

        let stream = open_stream(&config.host, config.port).await?;
        let peer = stream.peer_addr().map_err(ClientError::Streams)?;
        info!(%peer, "socket created");

        let (read_half, write_half) = stream.into_split();

        let mut server_out = FrameWriter::new(write_half, PayloadMode::Text);
        server_out.write_raw_line(&config.name).await.map_err(ClientError::Handshake)?;
        debug!(name = %config.name, "handshake sent");

        let outbound = OutboundRelay::new(source, server_out, run_flag.clone());
        let inbound =
            InboundRelay::new(FrameReader::new(read_half, config.wire_mode), sink, run_flag.clone());

        Ok(Self {
            config,
            peer,
            run_flag,
            state: SessionState::Ready,
            outbound: Some(outbound),
            inbound: Some(inbound),
        })
    }

    /// Whether [`run`](Self::run) may still be called.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Flag shared by both relays. Stopping it ends the session.
    pub fn run_flag(&self) -> &RunFlag {
        &self.run_flag
    }

    /// Address of the connected server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Config this session was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run both relays concurrently until both finish, then clean up.
    ///
    /// Either relay may finish first; it stops the shared flag, which ends the
    /// other one.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotReady`] if the session has already run.
    pub async fn run(&mut self) -> Result<SessionReport, ClientError> {
        let (Some(mut outbound), Some(mut inbound)) = (self.outbound.take(), self.inbound.take())
        else {
            error!("session run while not ready");
            return Err(ClientError::NotReady);
        };

        info!(peer = %self.peer, "session started");

        let mut outbound_task = tokio::spawn(async move {
            let exit = outbound.run().await;
            (outbound, exit)
        });
        let mut inbound_task = tokio::spawn(async move {
            let exit = inbound.run().await;
            (inbound, exit)
        });

        let mut outbound_exit = None;
        let mut inbound_exit = None;
        while outbound_exit.is_none() || inbound_exit.is_none() {
            tokio::select! {
                joined = &mut outbound_task, if outbound_exit.is_none() => {
                    outbound_exit = Some(self.rejoin_outbound(joined));
                },
                joined = &mut inbound_task, if inbound_exit.is_none() => {
                    inbound_exit = Some(self.rejoin_inbound(joined));
                },
            }
        }

        self.cleanup().await;

        Ok(SessionReport {
            outbound: outbound_exit.unwrap_or(RelayExit::Failed),
            inbound: inbound_exit.unwrap_or(RelayExit::Failed),
        })
    }

    fn rejoin_outbound(
        &mut self,
        joined: Result<(OutboundRelay<S, OwnedWriteHalf>, RelayExit), JoinError>,
    ) -> RelayExit {
        match joined {
            Ok((relay, exit)) => {
                info!(%exit, "outbound relay ended");
                self.outbound = Some(relay);
                exit
            },
            Err(e) => {
                error!(error = %e, "outbound relay task aborted");
                self.run_flag.stop();
                RelayExit::Failed
            },
        }
    }

    fn rejoin_inbound(
        &mut self,
        joined: Result<(InboundRelay<OwnedReadHalf, K>, RelayExit), JoinError>,
    ) -> RelayExit {
        match joined {
            Ok((relay, exit)) => {
                info!(%exit, "inbound relay ended");
                self.inbound = Some(relay);
                exit
            },
            Err(e) => {
                error!(error = %e, "inbound relay task aborted");
                self.run_flag.stop();
                RelayExit::Failed
            },
        }
    }

    /// Close both relays' streams and the socket. Errors are logged only.
    ///
    /// Safe to call more than once. Also stops the shared flag, so a session
    /// cleaned up without running leaves no one waiting.
    pub async fn cleanup(&mut self) {
        self.run_flag.stop();

        if let Some(mut outbound) = self.outbound.take() {
            outbound.cleanup().await;
        }
        if let Some(mut inbound) = self.inbound.take() {
            inbound.cleanup().await;
        }

        if self.state == SessionState::Ready {
            info!(peer = %self.peer, "socket closed");
        }
        self.state = SessionState::NotReady;
    }
}

/// Resolve `host` and connect to the first address that accepts.
async fn open_stream(host: &str, port: u16) -> Result<TcpStream, ClientError> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|source| ClientError::UnknownHost { host: host.to_string(), source })?
        .collect();

    if addrs.is_empty() {
        return Err(ClientError::UnknownHost {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
        });
    }

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_error = Some(e);
            },
        }
    }

    Err(ClientError::Connection {
        host: host.to_string(),
        port,
        source: last_error.unwrap_or_else(|| io::ErrorKind::ConnectionRefused.into()),
    })
}
