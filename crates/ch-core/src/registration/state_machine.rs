//! Registration state machine.
//!
//! Defines a pure state transition function shared by every flow variant.
//! Side effects are returned as actions and executed by the orchestrator,
//! which feeds their outcome back in as events.

use serde::{Deserialize, Serialize};

use super::error::RegistrationError;
use super::otp::OTP_LENGTH;

/// Registration phase plus the error currently shown in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RegistrationState {
    /// Filling in the form.
    Entering { error: Option<RegistrationError> },
    /// A passcode was sent; waiting for the user to enter it.
    AwaitingCode {
        /// Masked destination number, shown as the "code sent" notice.
        sent_to: String,
        error: Option<RegistrationError>,
    },
    /// Identity confirmed; writing the profile.
    Persisting { error: Option<RegistrationError> },
    /// Profile saved. Terminal.
    Done,
}

impl RegistrationState {
    pub fn initial() -> Self {
        RegistrationState::Entering { error: None }
    }

    pub fn error(&self) -> Option<&RegistrationError> {
        match self {
            RegistrationState::Entering { error }
            | RegistrationState::AwaitingCode { error, .. }
            | RegistrationState::Persisting { error } => error.as_ref(),
            RegistrationState::Done => None,
        }
    }

    pub fn phase(&self) -> &'static str {
        match self {
            RegistrationState::Entering { .. } => "entering",
            RegistrationState::AwaitingCode { .. } => "awaiting_code",
            RegistrationState::Persisting { .. } => "persisting",
            RegistrationState::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, RegistrationState::Done)
    }
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Events that drive the registration flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// User changed a form field.
    FieldEdited,
    /// User submitted the form; carries the validation outcome.
    DetailsSubmitted {
        invalid_fields: usize,
        phone_number: String,
    },
    /// Bot-check widget could not be initialized.
    VerifierUnavailable,
    /// Bot-check token expired before use.
    VerifierExpired,
    /// Provider accepted the challenge.
    CodeSent { sent_to: String },
    CodeSendFailed { error: RegistrationError },
    /// User submitted the passcode; carries how many digits were entered.
    CodeSubmitted { digits: usize },
    CodeConfirmed,
    CodeRejected { error: RegistrationError },
    /// User backed out of passcode entry.
    BackToForm,
    ProfileSaved,
    ProfileSaveFailed { error: RegistrationError },
    /// User asked to re-run a failed save.
    RetrySave,
}

impl RegistrationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistrationEvent::FieldEdited => "field_edited",
            RegistrationEvent::DetailsSubmitted { .. } => "details_submitted",
            RegistrationEvent::VerifierUnavailable => "verifier_unavailable",
            RegistrationEvent::VerifierExpired => "verifier_expired",
            RegistrationEvent::CodeSent { .. } => "code_sent",
            RegistrationEvent::CodeSendFailed { .. } => "code_send_failed",
            RegistrationEvent::CodeSubmitted { .. } => "code_submitted",
            RegistrationEvent::CodeConfirmed => "code_confirmed",
            RegistrationEvent::CodeRejected { .. } => "code_rejected",
            RegistrationEvent::BackToForm => "back_to_form",
            RegistrationEvent::ProfileSaved => "profile_saved",
            RegistrationEvent::ProfileSaveFailed { .. } => "profile_save_failed",
            RegistrationEvent::RetrySave => "retry_save",
        }
    }
}

/// Side-effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationAction {
    /// Request a passcode for the (raw, not yet normalized) number.
    SendCode { phone_number: String },
    /// Submit the entered passcode against the pending confirmation.
    ConfirmCode,
    /// Drop the passcode buffer and pending confirmation.
    DiscardChallenge,
    /// Write the profile for the confirmed identity.
    PersistProfile,
    /// Leave the form.
    Navigate,
}

/// Pure registration state machine.
pub struct RegistrationStateMachine;

impl RegistrationStateMachine {
    pub fn transition(
        state: RegistrationState,
        event: RegistrationEvent,
    ) -> (RegistrationState, Vec<RegistrationAction>) {
        use RegistrationEvent as E;
        use RegistrationState as S;

        match (state, event) {
            (S::Entering { .. }, E::FieldEdited) => (S::Entering { error: None }, Vec::new()),
            (
                S::Entering { .. },
                E::DetailsSubmitted {
                    invalid_fields,
                    phone_number,
                },
            ) => {
                if invalid_fields > 0 {
                    return (
                        S::Entering {
                            error: Some(RegistrationError::InvalidFields {
                                count: invalid_fields,
                            }),
                        },
                        Vec::new(),
                    );
                }
                (
                    S::Entering { error: None },
                    vec![RegistrationAction::SendCode { phone_number }],
                )
            }
            (S::Entering { .. }, E::VerifierUnavailable) => (
                S::Entering {
                    error: Some(RegistrationError::VerifierUnavailable),
                },
                Vec::new(),
            ),
            (S::Entering { .. }, E::VerifierExpired) => (
                S::Entering {
                    error: Some(RegistrationError::VerifierExpired),
                },
                Vec::new(),
            ),
            (S::Entering { .. }, E::CodeSent { sent_to }) => {
                (S::AwaitingCode { sent_to, error: None }, Vec::new())
            }
            (S::Entering { .. }, E::CodeSendFailed { error }) => {
                (S::Entering { error: Some(error) }, Vec::new())
            }
            (S::AwaitingCode { sent_to, .. }, E::CodeSubmitted { digits }) => {
                if digits != OTP_LENGTH {
                    return (
                        S::AwaitingCode {
                            sent_to,
                            error: Some(RegistrationError::CodeIncomplete),
                        },
                        Vec::new(),
                    );
                }
                (
                    S::AwaitingCode {
                        sent_to,
                        error: None,
                    },
                    vec![RegistrationAction::ConfirmCode],
                )
            }
            (S::AwaitingCode { .. }, E::CodeConfirmed) => (
                S::Persisting { error: None },
                vec![RegistrationAction::PersistProfile],
            ),
            (S::AwaitingCode { sent_to, .. }, E::CodeRejected { error }) => (
                S::AwaitingCode {
                    sent_to,
                    error: Some(error),
                },
                Vec::new(),
            ),
            (S::AwaitingCode { .. }, E::BackToForm) => (
                S::Entering { error: None },
                vec![RegistrationAction::DiscardChallenge],
            ),
            (S::Persisting { .. }, E::ProfileSaved) => {
                (S::Done, vec![RegistrationAction::Navigate])
            }
            (S::Persisting { .. }, E::ProfileSaveFailed { error }) => {
                (S::Persisting { error: Some(error) }, Vec::new())
            }
            (S::Persisting { error: Some(_) }, E::RetrySave) => (
                S::Persisting { error: None },
                vec![RegistrationAction::PersistProfile],
            ),
            (state, _event) => (state, Vec::new()),
        }
    }
}
