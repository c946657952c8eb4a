//! Guard state machine.
//!
//! Transitions are pure: [`GuardState::apply`] maps a state and an event to
//! the next state plus at most one side effect. Only the two waiting states
//! accept events, so a settled guard can never re-fire an effect.

use strum::Display;

/// Which checks a guard performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardMode {
    /// Render once the session check passes.
    TokenOnly,
    /// Additionally bounce users whose role equals `restricted_role`.
    RoleGated { restricted_role: String },
}

/// Navigation requested by a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    /// Location the user tried to reach, for return-to after login.
    pub from: Option<String>,
}

/// Lifecycle of one guard mount.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GuardState {
    /// Session check in flight.
    Pending,
    /// Session is valid; waiting for the profile to decide on the role.
    ResolvingRole,
    Authorized,
    Unauthorized { redirect: Redirect },
    /// Signed in, but the role may not see this route.
    Restricted { redirect: Redirect },
    /// The role could not be determined; treated as unauthorized.
    Error { redirect: Redirect, message: String },
}

/// Result of an async stage, fed into [`GuardState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    Authenticated(bool),
    RoleResolved(String),
    ProfileFailed(String),
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEffect {
    /// Show the blocking restricted-access notification.
    Notify(String),
}

/// Routing inputs a transition needs.
#[derive(Debug, Clone)]
pub struct GuardContext {
    pub mode: GuardMode,
    pub location: String,
    pub login_route: String,
    pub landing_route: String,
    pub restricted_message: String,
}

impl GuardContext {
    fn to_login(&self) -> Redirect {
        Redirect {
            to: self.login_route.clone(),
            from: Some(self.location.clone()),
        }
    }
}

/// What the view layer should show for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Loading,
    Content(T),
    Redirect(Redirect),
}

impl GuardState {
    /// Still waiting on an async stage.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Pending | Self::ResolvingRole)
    }

    /// Next state for `event`, or `None` if this state does not accept it.
    pub fn apply(
        &self,
        event: GuardEvent,
        ctx: &GuardContext,
    ) -> Option<(GuardState, Option<GuardEffect>)> {
        match (self, event) {
            (Self::Pending, GuardEvent::Authenticated(false)) => Some((
                Self::Unauthorized {
                    redirect: ctx.to_login(),
                },
                None,
            )),
            (Self::Pending, GuardEvent::Authenticated(true)) => match ctx.mode {
                GuardMode::TokenOnly => Some((Self::Authorized, None)),
                GuardMode::RoleGated { .. } => Some((Self::ResolvingRole, None)),
            },
            (Self::ResolvingRole, GuardEvent::RoleResolved(role)) => match &ctx.mode {
                GuardMode::RoleGated { restricted_role } if *restricted_role == role => Some((
                    Self::Restricted {
                        redirect: Redirect {
                            to: ctx.landing_route.clone(),
                            from: None,
                        },
                    },
                    Some(GuardEffect::Notify(ctx.restricted_message.clone())),
                )),
                _ => Some((Self::Authorized, None)),
            },
            (Self::ResolvingRole, GuardEvent::ProfileFailed(message)) => Some((
                Self::Error {
                    redirect: ctx.to_login(),
                    message,
                },
                None,
            )),
            _ => None,
        }
    }

    pub fn render<T>(&self, children: T) -> Rendered<T> {
        match self {
            Self::Pending | Self::ResolvingRole => Rendered::Loading,
            Self::Authorized => Rendered::Content(children),
            Self::Unauthorized { redirect }
            | Self::Restricted { redirect }
            | Self::Error { redirect, .. } => Rendered::Redirect(redirect.clone()),
        }
    }
}
