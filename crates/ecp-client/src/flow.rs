//! Handshake states.

use std::fmt;

/// Where an ECP handshake attempt stands.
///
/// The happy path runs strictly forward from [`Init`](Self::Init) to
/// [`SessionEstablished`](Self::SessionEstablished). [`Failed`](Self::Failed)
/// can be reached from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Init,
    /// PAOS-advertising GET sent to the SP.
    SpRequestSent,
    /// The SP answered with a PAOS request.
    PaosDetected,
    /// The `AuthnRequest` was posted to the IdP.
    IdpAuthSent,
    /// The IdP answered with a matching ECP response.
    IdpResponseReceived,
    /// The assertion was posted to the SP's consumer URL.
    SpResponsePosted,
    /// The SP accepted the assertion.
    SessionEstablished,
    /// The attempt is over and unsuccessful.
    Failed,
}

impl HandshakeState {
    /// State name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::SpRequestSent => "SP_REQUEST_SENT",
            Self::PaosDetected => "PAOS_DETECTED",
            Self::IdpAuthSent => "IDP_AUTH_SENT",
            Self::IdpResponseReceived => "IDP_RESPONSE_RECEIVED",
            Self::SpResponsePosted => "SP_RESPONSE_POSTED",
            Self::SessionEstablished => "SESSION_ESTABLISHED",
            Self::Failed => "FAILED",
        }
    }

    /// Returns true for states no transition leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::SessionEstablished | Self::Failed)
    }

    /// The next state on the happy path.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::SpRequestSent),
            Self::SpRequestSent => Some(Self::PaosDetected),
            Self::PaosDetected => Some(Self::IdpAuthSent),
            Self::IdpAuthSent => Some(Self::IdpResponseReceived),
            Self::IdpResponseReceived => Some(Self::SpResponsePosted),
            Self::SpResponsePosted => Some(Self::SessionEstablished),
            Self::SessionEstablished | Self::Failed => None,
        }
    }

    /// Returns true if `next` may follow this state.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Failed || self.successor() == Some(next)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
