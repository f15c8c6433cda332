//! SessionController: the connection lifecycle state machine.
//!
//! The controller never touches a socket or a timer itself.  Each input
//! (intent change, socket opened, socket lost, reconnect timer fired) returns
//! a list of [`SessionAction`]s that the runtime carries out in order.  This
//! keeps every transition testable without a network or a clock.
//!
//! ```text
//!             set_intent(true)            opened
//!   Idle ───────────────────────> Connecting ───────> Open
//!    ^                              │   ^               │
//!    │  intent false                │   │ timer fired   │ lost
//!    │                         lost │   │ (intent true) │
//!    │                              v   │               v
//!    └──────────────────────────── Backoff <────────────┘
//!
//!   Connecting/Open ── set_intent(false) ──> Closing ── released ──> Idle
//! ```
//!
//! Retries are unbounded and use one fixed delay: there is no attempt limit,
//! no growth and no jitter.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::config::{ConfigError, Endpoint};

/// Error type for endpoint edits.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Host and port may only change while no socket is held.
    #[error("endpoint cannot change while the session is {0:?}")]
    EndpointLocked(SessionState),

    /// The new host or port is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Lifecycle state of the viewer's single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No socket and no reconnect pending.
    Idle,
    /// A socket is being opened.
    Connecting,
    /// The socket is open; frames flow and commands can be sent.
    Open,
    /// The socket is being released after the intent went false.
    Closing,
    /// Waiting out the fixed delay before the next attempt.
    Backoff,
}

impl SessionState {
    /// `true` while the runtime holds (or is acquiring) a socket.
    pub fn holds_socket(self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Open | SessionState::Closing
        )
    }
}

/// Side effects requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a socket to this endpoint.
    Connect(Endpoint),
    /// Abort any connect in flight and close the open socket.  The runtime
    /// must report back with [`SessionController::on_released`].
    Disconnect,
    /// Start the reconnect timer.
    ArmReconnect(Duration),
    /// Cancel the reconnect timer if armed.
    DisarmReconnect,
    /// The observable "connected" status flipped.
    StatusChanged(bool),
}

/// Owns the desired-vs-actual connection state for one viewer.
#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    intent: bool,
    endpoint: Endpoint,
    reconnect_delay: Duration,
}

impl SessionController {
    /// Creates an `Idle` controller with the intent off.
    pub fn new(endpoint: Endpoint, reconnect_delay: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            intent: false,
            endpoint,
            reconnect_delay,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The collaborator's desired connection state.
    pub fn intent(&self) -> bool {
        self.intent
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// `true` only in [`SessionState::Open`]; sends are dropped otherwise.
    pub fn currently_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Changes the server host for the next connection attempt.
    ///
    /// # Errors
    ///
    /// [`SessionError::EndpointLocked`] while a socket is held, or
    /// [`SessionError::Config`] for an empty host.
    pub fn set_host(&mut self, host: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_unlocked()?;
        self.endpoint.set_host(host)?;
        Ok(())
    }

    /// Changes the server port for the next connection attempt.
    ///
    /// # Errors
    ///
    /// [`SessionError::EndpointLocked`] while a socket is held, or
    /// [`SessionError::Config`] for port 0.
    pub fn set_port(&mut self, port: u16) -> Result<(), SessionError> {
        self.ensure_unlocked()?;
        self.endpoint.set_port(port)?;
        Ok(())
    }

    fn ensure_unlocked(&self) -> Result<(), SessionError> {
        if self.state.holds_socket() {
            return Err(SessionError::EndpointLocked(self.state));
        }
        Ok(())
    }

    /// Applies a new connection intent.  Idempotent.
    ///
    /// Turning the intent on from `Idle` connects immediately.  Turning it off
    /// closes any socket and cancels a pending reconnect.
    pub fn set_intent(&mut self, desired: bool) -> Vec<SessionAction> {
        if desired == self.intent {
            return Vec::new();
        }
        self.intent = desired;
        debug!("connection intent set to {desired} in {:?}", self.state);

        if desired {
            return match self.state {
                SessionState::Idle => self.begin_connect(),
                // Closing resumes in `on_released`; the other states already
                // imply the intent was on.
                _ => Vec::new(),
            };
        }

        match self.state {
            SessionState::Idle | SessionState::Closing => Vec::new(),
            SessionState::Backoff => {
                self.transition(SessionState::Idle);
                vec![SessionAction::DisarmReconnect]
            }
            SessionState::Connecting => {
                self.transition(SessionState::Closing);
                vec![SessionAction::Disconnect]
            }
            SessionState::Open => {
                self.transition(SessionState::Closing);
                vec![SessionAction::StatusChanged(false), SessionAction::Disconnect]
            }
        }
    }

    /// The socket requested by the last [`SessionAction::Connect`] opened.
    pub fn on_opened(&mut self) -> Vec<SessionAction> {
        if self.state != SessionState::Connecting {
            debug!("ignoring socket open in {:?}", self.state);
            return Vec::new();
        }
        self.transition(SessionState::Open);
        info!("session open to {}", self.endpoint);
        vec![SessionAction::StatusChanged(true)]
    }

    /// The socket failed to open, errored, or was closed by the server.
    pub fn on_lost(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        match self.state {
            SessionState::Open => actions.push(SessionAction::StatusChanged(false)),
            SessionState::Connecting => {}
            SessionState::Closing => return self.on_released(),
            SessionState::Idle | SessionState::Backoff => {
                debug!("ignoring socket loss in {:?}", self.state);
                return actions;
            }
        }

        if self.intent {
            self.transition(SessionState::Backoff);
            info!("reconnecting to {} in {:?}", self.endpoint, self.reconnect_delay);
            actions.push(SessionAction::ArmReconnect(self.reconnect_delay));
        } else {
            self.transition(SessionState::Idle);
        }
        actions
    }

    /// The runtime finished a [`SessionAction::Disconnect`].
    pub fn on_released(&mut self) -> Vec<SessionAction> {
        if self.state != SessionState::Closing {
            return Vec::new();
        }
        if self.intent {
            // Re-enabled while closing: the old socket is gone, go again.
            return self.begin_connect();
        }
        self.transition(SessionState::Idle);
        Vec::new()
    }

    /// The reconnect timer fired.  The intent is checked now, not when the
    /// timer was armed.
    pub fn on_reconnect_timer(&mut self) -> Vec<SessionAction> {
        if self.state != SessionState::Backoff {
            debug!("ignoring stale reconnect timer in {:?}", self.state);
            return Vec::new();
        }
        if !self.intent {
            self.transition(SessionState::Idle);
            return Vec::new();
        }
        self.begin_connect()
    }

    /// Forces the intent off.  Safe to call any number of times.
    pub fn teardown(&mut self) -> Vec<SessionAction> {
        self.set_intent(false)
    }

    fn begin_connect(&mut self) -> Vec<SessionAction> {
        self.transition(SessionState::Connecting);
        vec![SessionAction::Connect(self.endpoint.clone())]
    }

    fn transition(&mut self, next: SessionState) {
        debug!("session {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
