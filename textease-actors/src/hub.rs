//! One actor per user session, addressed through a shared [`SessionHub`].
use crate::action::{Action, Reply};
use crate::actor::{spawn_actor_with_shutdown, Actor, Addr, Context};
use crate::registry::Registry;
use crate::session::{Session, SessionLimits};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use textease_common::{Result, TextEaseError};
use textease_config::SessionConfig;
use textease_pipeline::AssistantContext;
use tokio::sync::{broadcast, oneshot};

/// Opaque identifier of the user a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

pub enum SessionMsg {
    Act {
        action: Action,
        reply: oneshot::Sender<Reply>,
    },
    /// Handled after everything queued before it; then the session is gone.
    End,
}

/// Owns one user's [`Session`] and applies that user's actions in order.
pub struct SessionActor {
    user: UserId,
    session: Session,
    ctx: AssistantContext,
    timeout: Option<Duration>,
}

impl SessionActor {
    pub fn new(
        user: UserId,
        ctx: AssistantContext,
        limits: SessionLimits,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            user,
            session: Session::new(limits),
            ctx,
            timeout,
        }
    }

    async fn act(&mut self, action: Action) -> Reply {
        let name = action.name();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.session.apply(&self.ctx, action))
                .await
                .unwrap_or(Err(TextEaseError::Timeout)),
            None => self.session.apply(&self.ctx, action).await,
        };

        match outcome {
            Ok(reply) => reply,
            Err(err) => {
                if err.is_user_facing() {
                    tracing::info!(user = %self.user, action = name, error = %err, "action rejected");
                } else {
                    tracing::error!(user = %self.user, action = name, error = %err, "action failed");
                }
                self.session.failure_reply(&err)
            }
        }
    }
}

#[async_trait::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> anyhow::Result<()> {
        match msg {
            SessionMsg::Act { action, reply } => {
                let response = self.act(action).await;
                if reply.send(response).is_err() {
                    tracing::debug!(user = %self.user, "caller went away before the reply");
                }
            }
            SessionMsg::End => {
                tracing::info!(user = %self.user, "session ended");
                ctx.stop();
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    pub limits: SessionLimits,
    pub action_timeout: Option<Duration>,
    pub mailbox: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for HubSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            limits: SessionLimits {
                max_text_chars: config.max_text_chars,
            },
            action_timeout: config
                .action_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            mailbox: config.mailbox,
        }
    }
}

/// Routes `(user, action)` pairs to per-user session actors.
///
/// Sessions are created on first contact. Actions from one user are handled
/// in arrival order; different users never wait on each other.
#[derive(Clone)]
pub struct SessionHub {
    ctx: AssistantContext,
    settings: HubSettings,
    sessions: Registry<UserId, SessionActor>,
    shutdown: broadcast::Sender<()>,
}

impl SessionHub {
    pub fn new(ctx: AssistantContext, settings: HubSettings) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            ctx,
            settings,
            sessions: Registry::default(),
            shutdown,
        }
    }

    /// Apply `action` to `user`'s session and wait for the reply.
    ///
    /// Action failures come back as a [`Reply`] with a non-`Done` outcome; an
    /// `Err` means the session itself could not be reached.
    pub async fn dispatch(&self, user: impl Into<UserId>, action: Action) -> Result<Reply> {
        let user = user.into();
        let (tx, rx) = oneshot::channel();
        let msg = SessionMsg::Act { action, reply: tx };

        let addr = self.session(&user);
        if let Err(msg) = addr.send(msg).await {
            // Stopped between lookup and send; a fresh session takes over.
            self.sessions.remove(&user);
            self.session(&user)
                .send(msg)
                .await
                .map_err(|_| TextEaseError::Other(anyhow!("session for {user} is unavailable")))?;
        }

        rx.await
            .map_err(|_| TextEaseError::Other(anyhow!("session for {user} stopped before replying")))
    }

    /// Drop `user`'s session after any queued actions finish. Returns whether
    /// a session existed.
    pub async fn end_session(&self, user: impl Into<UserId>) -> bool {
        let user = user.into();
        match self.sessions.remove(&user) {
            Some(addr) => {
                let _ = addr.send(SessionMsg::End).await;
                true
            }
            None => false,
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Stop every session without waiting for queued actions.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
        self.sessions.clear();
    }

    fn session(&self, user: &UserId) -> Addr<SessionActor> {
        self.sessions.get_or_spawn(user, || {
            tracing::debug!(user = %user, "starting session");
            let actor = SessionActor::new(
                user.clone(),
                self.ctx.clone(),
                self.settings.limits,
                self.settings.action_timeout,
            );
            spawn_actor_with_shutdown(actor, self.settings.mailbox, Some(self.shutdown.subscribe()))
                .addr
        })
    }
}
