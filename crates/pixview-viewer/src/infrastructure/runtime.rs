//! The viewer runtime: one driver task that owns everything.
//!
//! [`spawn_viewer`] starts a single tokio task (the driver) holding the
//! [`SessionController`], the [`Framebuffer`], the [`InputGate`], the
//! [`RenderClock`] and the current link.  The collaborator talks to it
//! through a cloneable [`ViewerHandle`]; the driver talks back through the
//! [`ViewerSink`] it was given.
//!
//! The driver multiplexes five event sources with `tokio::select!`:
//!
//! | Source            | Handler                                         |
//! |-------------------|-------------------------------------------------|
//! | handle commands   | intent, endpoint edits, pointer events, teardown |
//! | connect in flight | `on_opened` / `on_lost`                         |
//! | inbound frames    | decode into the framebuffer, or `on_lost`       |
//! | reconnect timer   | `on_reconnect_timer`                            |
//! | render clock      | paint the current snapshot                      |
//!
//! Because frame writes and snapshot reads both run on this task, the
//! framebuffer needs no lock.  Outbound touch commands go through a bounded
//! channel to a per-link writer task, so a slow socket does not stall the
//! driver while the link is up.  Releasing a link waits for that task to end
//! (at most 500 ms, then it is aborted), so no socket outlives its
//! session and a reconnect never overlaps the previous socket.

use std::collections::VecDeque;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot, watch,
    },
    task::JoinHandle,
    time::{sleep, timeout, Sleep},
};
use tracing::{debug, info, trace, warn};

use pixview_core::{encode_touch_command, Framebuffer, InputGate, TouchCommand};

use crate::application::session::{SessionAction, SessionController, SessionError, SessionState};
use crate::application::sink::ViewerSink;
use crate::domain::config::{ConfigError, ViewerConfig};
use crate::infrastructure::render_clock::RenderClock;
use crate::infrastructure::transport::{Connector, FrameSink, FrameStream, Link, TransportError};

/// Errors returned to the collaborator by [`ViewerHandle`] and
/// [`spawn_viewer`].
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The driver task has stopped (after teardown, or a panic).
    #[error("viewer has shut down")]
    Closed,

    /// An endpoint edit was rejected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Requests from a [`ViewerHandle`] to the driver.
#[derive(Debug)]
enum ViewerCommand {
    SetIntent(bool),
    SetHost {
        host: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SetPort {
        port: u16,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    PointerDown { x: u16, y: u16 },
    PointerUp { x: u16, y: u16 },
    PointerMove { x: u16, y: u16 },
    Teardown,
}

// ── ViewerHandle ──────────────────────────────────────────────────────────────

/// The collaborator's side of a running viewer.  Cheap to clone.
///
/// When every handle is dropped the driver tears itself down.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    commands: mpsc::UnboundedSender<ViewerCommand>,
    state: watch::Receiver<SessionState>,
    connected: watch::Receiver<bool>,
}

impl ViewerHandle {
    /// Sets the desired connection state.
    ///
    /// # Errors
    ///
    /// [`ViewerError::Closed`] once the viewer has been torn down.
    pub fn set_intent(&self, connect: bool) -> Result<(), ViewerError> {
        self.command(ViewerCommand::SetIntent(connect))
    }

    /// Changes the server host used by the next connection attempt.
    ///
    /// # Errors
    ///
    /// [`ViewerError::Session`] if a socket is currently held or the host is
    /// empty, [`ViewerError::Closed`] after teardown.
    pub async fn set_host(&self, host: impl Into<String>) -> Result<(), ViewerError> {
        let (reply, rx) = oneshot::channel();
        self.command(ViewerCommand::SetHost {
            host: host.into(),
            reply,
        })?;
        rx.await.map_err(|_| ViewerError::Closed)??;
        Ok(())
    }

    /// Changes the server port used by the next connection attempt.
    ///
    /// # Errors
    ///
    /// [`ViewerError::Session`] if a socket is currently held or the port is
    /// 0, [`ViewerError::Closed`] after teardown.
    pub async fn set_port(&self, port: u16) -> Result<(), ViewerError> {
        let (reply, rx) = oneshot::channel();
        self.command(ViewerCommand::SetPort { port, reply })?;
        rx.await.map_err(|_| ViewerError::Closed)??;
        Ok(())
    }

    pub fn pointer_down(&self, x: u16, y: u16) -> Result<(), ViewerError> {
        self.command(ViewerCommand::PointerDown { x, y })
    }

    pub fn pointer_up(&self, x: u16, y: u16) -> Result<(), ViewerError> {
        self.command(ViewerCommand::PointerUp { x, y })
    }

    pub fn pointer_move(&self, x: u16, y: u16) -> Result<(), ViewerError> {
        self.command(ViewerCommand::PointerMove { x, y })
    }

    /// Forces the intent off, closes the socket, stops rendering and stops
    /// the driver.  Safe to call any number of times, from any clone.
    pub fn teardown(&self) {
        let _ = self.commands.send(ViewerCommand::Teardown);
    }

    /// `true` while the session is open.
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// The session state as last published by the driver.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A receiver that observes every change of the connected status.
    pub fn subscribe_status(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// A receiver that observes every session state change.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    fn command(&self, command: ViewerCommand) -> Result<(), ViewerError> {
        self.commands.send(command).map_err(|_| ViewerError::Closed)
    }
}

// ── spawn_viewer ──────────────────────────────────────────────────────────────

/// Validates `config` and starts the driver task.
///
/// The render clock starts immediately, so `sink` receives the all-black
/// buffer on the first tick.  If `config.autoconnect` is set the intent is
/// turned on before any handle command is processed.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// [`ViewerError::Config`] if the configuration does not validate.
pub fn spawn_viewer<C, S>(
    config: ViewerConfig,
    connector: C,
    sink: S,
) -> Result<(ViewerHandle, JoinHandle<()>), ViewerError>
where
    C: Connector,
    S: ViewerSink,
{
    config.validate()?;
    let endpoint = config.endpoint()?;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SessionState::Idle);
    let (connected_tx, connected_rx) = watch::channel(false);

    let driver = ViewerDriver {
        session: SessionController::new(endpoint, config.reconnect_delay()),
        framebuffer: Framebuffer::new(config.width, config.height),
        gate: InputGate::new(),
        clock: RenderClock::new(config.render_interval()),
        sink: Some(sink),
        connector: Arc::new(connector),
        outbound_queue: config.outbound_queue,
        autoconnect: config.autoconnect,
        commands: command_rx,
        connecting: None,
        inbound: None,
        outbound: None,
        writer: None,
        reconnect: None,
        state_tx,
        connected_tx,
    };
    let task = tokio::spawn(driver.run());

    let handle = ViewerHandle {
        commands: command_tx,
        state: state_rx,
        connected: connected_rx,
    };
    Ok((handle, task))
}

// ── ViewerDriver ──────────────────────────────────────────────────────────────

/// How long a released link may take to flush and close its socket.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

type ConnectFuture = Pin<Box<dyn Future<Output = Result<Link, TransportError>> + Send>>;

struct ViewerDriver<S> {
    session: SessionController,
    framebuffer: Framebuffer,
    gate: InputGate,
    clock: RenderClock,
    /// `None` after teardown: nothing is painted or reported any more.
    sink: Option<S>,
    connector: Arc<dyn Connector>,
    outbound_queue: usize,
    autoconnect: bool,
    commands: mpsc::UnboundedReceiver<ViewerCommand>,

    connecting: Option<ConnectFuture>,
    inbound: Option<FrameStream>,
    outbound: Option<mpsc::Sender<Vec<u8>>>,
    writer: Option<JoinHandle<()>>,
    reconnect: Option<Pin<Box<Sleep>>>,

    state_tx: watch::Sender<SessionState>,
    connected_tx: watch::Sender<bool>,
}

impl<S: ViewerSink> ViewerDriver<S> {
    async fn run(mut self) {
        info!(
            "viewer started ({}x{}, endpoint {})",
            self.framebuffer.width(),
            self.framebuffer.height(),
            self.session.endpoint()
        );
        self.clock.start();
        if self.autoconnect {
            let actions = self.session.set_intent(true);
            self.execute(actions).await;
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ViewerCommand::Teardown) | None => {
                        self.teardown().await;
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                },
                result = connect_in_flight(&mut self.connecting) => {
                    self.connecting = None;
                    self.on_connect_result(result).await;
                }
                item = next_frame(&mut self.inbound) => self.on_inbound(item).await,
                () = reconnect_timer(&mut self.reconnect) => {
                    self.reconnect = None;
                    let actions = self.session.on_reconnect_timer();
                    self.execute(actions).await;
                }
                _ = self.clock.tick() => self.render(),
            }
        }
        info!("viewer stopped");
    }

    async fn handle_command(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::SetIntent(connect) => {
                let actions = self.session.set_intent(connect);
                self.execute(actions).await;
            }
            ViewerCommand::SetHost { host, reply } => {
                let _ = reply.send(self.session.set_host(host));
            }
            ViewerCommand::SetPort { port, reply } => {
                let _ = reply.send(self.session.set_port(port));
            }
            ViewerCommand::PointerDown { x, y } => {
                let command = self.gate.pointer_down(x, y);
                self.send(command);
            }
            ViewerCommand::PointerUp { x, y } => {
                let command = self.gate.pointer_up(x, y);
                self.send(command);
            }
            ViewerCommand::PointerMove { x, y } => {
                if let Some(command) = self.gate.pointer_move(x, y) {
                    self.send(command);
                }
            }
            // Handled in `run` because it ends the loop.
            ViewerCommand::Teardown => {}
        }
    }

    /// Carries out controller actions in order, including any follow-up
    /// actions produced by releasing the link.
    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut pending: VecDeque<SessionAction> = actions.into();
        while let Some(action) = pending.pop_front() {
            match action {
                SessionAction::Connect(endpoint) => {
                    let url = endpoint.url();
                    info!("connecting to {url}");
                    let connector = Arc::clone(&self.connector);
                    self.connecting = Some(Box::pin(async move { connector.connect(&url).await }));
                }
                SessionAction::Disconnect => {
                    self.release_link().await;
                    pending.extend(self.session.on_released());
                }
                SessionAction::ArmReconnect(delay) => {
                    self.reconnect = Some(Box::pin(sleep(delay)));
                }
                SessionAction::DisarmReconnect => {
                    if self.reconnect.take().is_some() {
                        debug!("reconnect timer disarmed");
                    }
                }
                SessionAction::StatusChanged(connected) => {
                    self.connected_tx.send_replace(connected);
                    if let Some(sink) = self.sink.as_mut() {
                        sink.on_status_change(connected);
                    }
                }
            }
        }
        self.state_tx.send_replace(self.session.state());
    }

    async fn on_connect_result(&mut self, result: Result<Link, TransportError>) {
        match result {
            Ok(link) => {
                let (tx, rx) = mpsc::channel(self.outbound_queue);
                self.writer = Some(tokio::spawn(write_frames(link.outbound, rx)));
                self.outbound = Some(tx);
                self.inbound = Some(link.inbound);
                let actions = self.session.on_opened();
                self.execute(actions).await;
            }
            Err(e) => {
                warn!("{e}");
                let actions = self.session.on_lost();
                self.execute(actions).await;
            }
        }
    }

    async fn on_inbound(&mut self, item: Option<Result<Vec<u8>, TransportError>>) {
        match item {
            Some(Ok(frame)) => {
                let stats = self.framebuffer.apply_frame(&frame);
                trace!("frame: {} bytes, {stats:?}", frame.len());
            }
            Some(Err(e)) => {
                warn!("{e}");
                self.link_lost().await;
            }
            None => {
                info!("server closed the connection");
                self.link_lost().await;
            }
        }
    }

    /// The link closed or failed.  It is released before the controller can
    /// arm a reconnect.
    async fn link_lost(&mut self) {
        self.release_link().await;
        let actions = self.session.on_lost();
        self.execute(actions).await;
    }

    /// Drops the connect in flight and both halves of the link, then waits
    /// for the writer task to end.  The writer gets [`CLOSE_GRACE`] to flush
    /// and close the socket; after that it is aborted.  Either way the socket
    /// is gone when this returns.
    async fn release_link(&mut self) {
        self.connecting = None;
        self.inbound = None;
        self.outbound = None;

        let Some(mut writer) = self.writer.take() else {
            return;
        };
        if timeout(CLOSE_GRACE, &mut writer).await.is_err() {
            warn!("socket did not close within {CLOSE_GRACE:?}; aborting writer");
            writer.abort();
            // Resolves once the aborted task, and the socket it owns, is dropped.
            let _ = writer.await;
        }
    }

    fn send(&mut self, command: TouchCommand) {
        if !self.session.currently_open() {
            debug!("dropping {command:?}: session is {:?}", self.session.state());
            return;
        }
        let Some(tx) = self.outbound.as_ref() else {
            return;
        };
        let frame = encode_touch_command(command.kind, command.x, command.y).to_vec();
        match tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("outbound queue full; dropping {command:?}"),
            Err(TrySendError::Closed(_)) => debug!("writer gone; dropping {command:?}"),
        }
    }

    fn render(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.on_frame_ready(self.framebuffer.snapshot());
        }
    }

    async fn teardown(&mut self) {
        let actions = self.session.teardown();
        self.execute(actions).await;
        self.release_link().await;
        self.reconnect = None;
        self.clock.stop();
        self.sink = None;
        info!("viewer torn down");
    }
}

/// Resolves when the connect in `slot` completes; pending while empty.
async fn connect_in_flight(slot: &mut Option<ConnectFuture>) -> Result<Link, TransportError> {
    match slot {
        Some(connecting) => connecting.await,
        None => future::pending().await,
    }
}

async fn next_frame(slot: &mut Option<FrameStream>) -> Option<Result<Vec<u8>, TransportError>> {
    match slot {
        Some(inbound) => inbound.next().await,
        None => future::pending().await,
    }
}

async fn reconnect_timer(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot {
        Some(timer) => timer.as_mut().await,
        None => future::pending().await,
    }
}

/// Single writer for one link.  Ends when the driver drops its sender or the
/// socket rejects a write.
async fn write_frames(mut sink: FrameSink, mut rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = sink.send(frame).await {
            warn!("{e}");
            return;
        }
    }
    if let Err(e) = sink.close().await {
        debug!("close after release failed: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
