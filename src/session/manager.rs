// src/session/manager.rs
//! The session manager actor.
//!
//! All state transitions happen on one owned task. Provider events, the
//! mount-time initializer and the refresh timer used to race each other as
//! independent continuations; here they all go through the same command
//! queue, processed strictly in arrival order - the last event wins because
//! it is handled last, not because of scheduling luck.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::backend::{AuthApi, AuthSession, UserMetadata};
use crate::common::{safe_email_log, Error};
use crate::profiles::{Profile, ProfileChanges, ProfileService};

use super::models::SessionState;

/// How often the refresh timer fires while the page is open
pub(crate) const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Refresh proactively when the token expires within this window
const TOKEN_REFRESH_WINDOW_MINUTES: i64 = 30;

const COMMAND_BUFFER: usize = 32;

enum Command {
    SignIn {
        email: String,
        password: String,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    SignUp {
        email: String,
        password: String,
        username: String,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    SignOut {
        reply: oneshot::Sender<Result<(), Error>>,
    },
    UpdateProfile {
        changes: ProfileChanges,
        reply: oneshot::Sender<Result<Profile, Error>>,
    },
    ChangePassword {
        new_password: String,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    RefreshAuth {
        reply: oneshot::Sender<Result<(), Error>>,
    },
    AuthStateChanged {
        session: Option<AuthSession>,
    },
}

fn manager_gone() -> Error {
    Error::Backend {
        status: 503,
        message: "session manager task stopped".to_string(),
    }
}

/// The actor. Constructed and consumed by [`SessionManager::spawn`].
pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    profiles: ProfileService,
    state_tx: watch::Sender<SessionState>,
    cmd_rx: mpsc::Receiver<Command>,
}

/// Cloneable handle the rest of the application talks to
#[derive(Clone)]
pub struct SessionHandle {
    auth: Arc<dyn AuthApi>,
    cmd_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionManager {
    /// Start the manager task and return its handle. The machine enters
    /// `Loading` immediately and resolves to `Authenticated` or `Anonymous`
    /// once the provider has been asked for the current session.
    pub fn spawn(auth: Arc<dyn AuthApi>, profiles: ProfileService) -> SessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(SessionState::Uninitialized);

        let manager = SessionManager {
            auth: auth.clone(),
            profiles,
            state_tx,
            cmd_rx,
        };
        tokio::spawn(manager.run());

        SessionHandle {
            auth,
            cmd_tx,
            state_rx,
        }
    }

    async fn run(mut self) {
        self.set_state(SessionState::Loading);
        self.initialize().await;

        // First tick only after a full interval; initialization already
        // validated the session.
        let mut refresh_timer = interval_at(
            Instant::now() + TOKEN_REFRESH_INTERVAL,
            TOKEN_REFRESH_INTERVAL,
        );

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            debug!("All session handles dropped, stopping manager task");
                            break;
                        }
                    }
                }
                _ = refresh_timer.tick() => {
                    self.refresh_tick().await;
                }
            }
        }
    }

    fn set_state(&self, state: SessionState) {
        let _ = self.state_tx.send(state);
    }

    fn current_user_id(&self) -> Option<String> {
        self.state_tx.borrow().user().map(|u| u.id.clone())
    }

    async fn initialize(&mut self) {
        match self.auth.get_session().await {
            Ok(Some(session)) => self.enter_session(session).await,
            Ok(None) => self.set_state(SessionState::Anonymous),
            Err(e) => {
                error!(error = %e, "Error getting session during initialization");
                self.set_state(SessionState::Anonymous);
            }
        }
    }

    /// Shared fetch/create-profile path for every route a session can arrive
    /// through: initialization, sign-in, pushed auth events, refresh.
    async fn enter_session(&mut self, session: AuthSession) {
        let profile = match self.profiles.fetch_or_create(&session.user).await {
            Ok(profile) => profile,
            Err(e) => {
                // Authenticated but profile-less; the identity stands.
                warn!(user_id = %session.user.id, error = %e, "Profile unavailable for session");
                None
            }
        };
        self.set_state(SessionState::Authenticated {
            user: session.user,
            profile,
        });
    }

    async fn leave_session(&mut self) {
        self.profiles.set_cached(None).await;
        self.set_state(SessionState::Anonymous);
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SignIn {
                email,
                password,
                reply,
            } => {
                let _ = reply.send(self.sign_in(&email, &password).await);
            }
            Command::SignUp {
                email,
                password,
                username,
                reply,
            } => {
                let _ = reply.send(self.sign_up(&email, &password, &username).await);
            }
            Command::SignOut { reply } => {
                let _ = reply.send(self.sign_out().await);
            }
            Command::UpdateProfile { changes, reply } => {
                let _ = reply.send(self.update_profile(changes).await);
            }
            Command::ChangePassword {
                new_password,
                reply,
            } => {
                let _ = reply.send(self.change_password(&new_password).await);
            }
            Command::RefreshAuth { reply } => {
                let _ = reply.send(self.refresh_auth().await);
            }
            Command::AuthStateChanged { session } => {
                debug!(
                    has_session = session.is_some(),
                    "Auth state changed"
                );
                match session {
                    Some(session) => self.enter_session(session).await,
                    None => self.leave_session().await,
                }
            }
        }
    }

    async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), Error> {
        info!(email = %safe_email_log(email), "Signing in");
        let previous = self.state_tx.borrow().clone();
        self.set_state(SessionState::Loading);

        match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => {
                self.enter_session(session).await;
                Ok(())
            }
            Err(e) => {
                warn!(email = %safe_email_log(email), error = %e, "Sign-in failed");
                self.set_state(previous);
                Err(e)
            }
        }
    }

    /// Identity and profile row are created as one logical operation. If the
    /// profile insert fails after the identity exists, the identity is
    /// deleted again - best-effort compensation, not atomic.
    async fn sign_up(&mut self, email: &str, password: &str, username: &str) -> Result<(), Error> {
        info!(email = %safe_email_log(email), username = %username, "Signing up");

        if self.profiles.is_username_taken(username).await? {
            return Err(Error::UsernameTaken);
        }

        let metadata = UserMetadata {
            username: Some(username.to_string()),
            ..Default::default()
        };
        let outcome = self.auth.sign_up(email, password, metadata).await?;

        let profile = match self
            .profiles
            .create_for_signup(&outcome.user.id, username)
            .await
        {
            Ok(profile) => profile,
            Err(e) => {
                error!(user_id = %outcome.user.id, error = %e, "Profile creation failed after sign-up");
                if let Err(del) = self.auth.admin_delete_user(&outcome.user.id).await {
                    warn!(user_id = %outcome.user.id, error = %del, "Could not roll back auth identity");
                }
                return Err(Error::ProfileCreationFailed);
            }
        };

        match outcome.session {
            Some(session) => {
                self.set_state(SessionState::Authenticated {
                    user: session.user,
                    profile: Some(profile),
                });
            }
            // Email confirmation pending; no session yet.
            None => self.set_state(SessionState::Anonymous),
        }
        Ok(())
    }

    /// Local state is cleared no matter what; the remote error, if any, is
    /// still reported to the caller.
    async fn sign_out(&mut self) -> Result<(), Error> {
        let result = self.auth.sign_out().await;
        if let Err(ref e) = result {
            warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
        }
        self.leave_session().await;
        result
    }

    async fn update_profile(&mut self, changes: ProfileChanges) -> Result<Profile, Error> {
        let user_id = self.current_user_id().ok_or(Error::NotAuthenticated)?;
        let profile = self.profiles.update(&user_id, changes).await?;

        // Snapshot first: an `if let` scrutinee would keep the watch read
        // guard alive across the send below.
        let current = self.state_tx.borrow().clone();
        if let SessionState::Authenticated { user, .. } = current {
            self.set_state(SessionState::Authenticated {
                user,
                profile: Some(profile.clone()),
            });
        }
        Ok(profile)
    }

    async fn change_password(&mut self, new_password: &str) -> Result<(), Error> {
        if self.current_user_id().is_none() {
            return Err(Error::NotAuthenticated);
        }
        self.auth.update_password(new_password).await
    }

    /// Manual re-validation, sharing the profile fetch window: inside it the
    /// call is a no-op rather than another round-trip.
    async fn refresh_auth(&mut self) -> Result<(), Error> {
        if self.profiles.rate_limited().await {
            debug!("Skipping session refresh due to rate limiting");
            return Ok(());
        }

        match self.auth.refresh_session().await {
            Ok(session) => {
                self.enter_session(session).await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Error refreshing session");
                self.leave_session().await;
                Err(e)
            }
        }
    }

    async fn refresh_tick(&mut self) {
        if !self.state_tx.borrow().is_authenticated() {
            return;
        }

        let session = match self.auth.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("No valid session found during token refresh");
                self.leave_session().await;
                return;
            }
            Err(e) => {
                error!(error = %e, "Error reading session during token refresh");
                return;
            }
        };

        if !session.expires_within(chrono::Duration::minutes(TOKEN_REFRESH_WINDOW_MINUTES)) {
            return;
        }

        info!("Token expires soon, refreshing");
        match self.auth.refresh_session().await {
            Ok(refreshed) => {
                // Keep the current profile; only the identity/token changed.
                let profile = self.state_tx.borrow().profile().cloned();
                self.set_state(SessionState::Authenticated {
                    user: refreshed.user,
                    profile,
                });
            }
            Err(e) => {
                error!(error = %e, "Token refresh error");
                self.leave_session().await;
            }
        }
    }
}

impl SessionHandle {
    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Watch for state changes; the receiver always sees the latest state
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Wait until the machine has left `Uninitialized`/`Loading`
    pub async fn wait_until_settled(&self) -> SessionState {
        let mut rx = self.state_rx.clone();
        loop {
            let state = rx.borrow().clone();
            if !state.is_loading() {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.state_rx.borrow().clone();
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SignIn {
                email: email.to_string(),
                password: password.to_string(),
                reply,
            })
            .await
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())?
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SignUp {
                email: email.to_string(),
                password: password.to_string(),
                username: username.to_string(),
                reply,
            })
            .await
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())?
    }

    /// Idempotent: local state ends up `Anonymous` even when the remote call
    /// fails, and that failure is returned
    pub async fn sign_out(&self) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SignOut { reply })
            .await
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())?
    }

    pub async fn update_profile(&self, changes: ProfileChanges) -> Result<Profile, Error> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::UpdateProfile { changes, reply })
            .await
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())?
    }

    pub async fn change_password(&self, new_password: &str) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ChangePassword {
                new_password: new_password.to_string(),
                reply,
            })
            .await
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())?
    }

    pub async fn refresh_auth(&self) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RefreshAuth { reply })
            .await
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())?
    }

    /// Forward a provider-pushed auth event into the manager's queue.
    /// Processed in arrival order relative to everything else.
    pub async fn auth_state_changed(&self, session: Option<AuthSession>) {
        let _ = self
            .cmd_tx
            .send(Command::AuthStateChanged { session })
            .await;
    }

    /// Where to navigate the page for an OAuth sign-in. Control returns via
    /// the callback route, not this handle.
    pub fn google_sign_in_url(&self) -> String {
        self.auth.authorize_url("google")
    }
}
