//! Registration orchestrator.
//!
//! This module coordinates the registration state machine and side effects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use ch_core::{
    config::{NavigationSettings, RegistrationSettings},
    ports::{
        AuthenticatedIdentity, BotCheckPort, ClockPort, DocumentStorePort, ExpiryNotifier,
        NavigationPort, PendingConfirmation, PhoneAuthPort, RegistrationEventPort, WidgetAnchor,
    },
    registration::phone::mask_phone,
    FlowId, FlowVariant, OtpBuffer, RegistrationAction, RegistrationDraft, RegistrationEvent,
    RegistrationState, RegistrationStateMachine, Validator,
};

use crate::usecases::registration::context::RegistrationContext;
use crate::usecases::registration::{ConfirmCode, DispatchChallenge, PersistProfile, VerifierSlot};

/// Errors produced by the registration orchestrator.
///
/// User-facing failures are carried in [`RegistrationState`]; these only
/// signal misuse of the orchestrator API or broken internal invariants.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationOrchestratorError {
    #[error("unknown field `{field}` for {variant} registration")]
    UnknownField { field: String, variant: FlowVariant },
    #[error("confirm requested without a pending confirmation")]
    MissingPendingConfirmation,
    #[error("persist requested without an authenticated identity")]
    MissingIdentity,
}

/// Ports the orchestrator is wired with.
///
/// Groups constructor parameters; this is not a Builder.
#[derive(Clone)]
pub struct RegistrationDeps {
    pub phone_auth: Arc<dyn PhoneAuthPort>,
    pub bot_check: Arc<dyn BotCheckPort>,
    pub document_store: Arc<dyn DocumentStorePort>,
    pub clock: Arc<dyn ClockPort>,
    pub navigation: Arc<dyn NavigationPort>,
    pub events: Arc<dyn RegistrationEventPort>,
}

/// Orchestrator that drives one mounted registration form.
pub struct RegistrationOrchestrator {
    flow_id: FlowId,
    variant: FlowVariant,
    context: Arc<RegistrationContext>,

    draft: Mutex<RegistrationDraft>,
    otp: Mutex<OtpBuffer>,
    pending: Mutex<Option<PendingConfirmation>>,
    identity: Mutex<Option<AuthenticatedIdentity>>,
    identity_checked: AtomicBool,

    validator: Validator,
    success_path: String,
    verifier: VerifierSlot,
    dispatch_challenge: DispatchChallenge,
    confirm_code: ConfirmCode,
    persist_profile: PersistProfile,
    navigation: Arc<dyn NavigationPort>,
    events: Arc<dyn RegistrationEventPort>,
}

impl RegistrationOrchestrator {
    pub fn new(
        variant: FlowVariant,
        deps: RegistrationDeps,
        settings: RegistrationSettings,
        navigation: &NavigationSettings,
    ) -> Self {
        Self {
            flow_id: FlowId::new(),
            variant,
            context: RegistrationContext::default().arc(),
            draft: Mutex::new(RegistrationDraft::new(variant)),
            otp: Mutex::new(OtpBuffer::new()),
            pending: Mutex::new(None),
            identity: Mutex::new(None),
            identity_checked: AtomicBool::new(false),
            validator: Validator::for_flow(variant, settings.min_phone_digits),
            success_path: variant.success_path(navigation).to_string(),
            verifier: VerifierSlot::new(deps.bot_check),
            dispatch_challenge: DispatchChallenge::new(
                deps.phone_auth.clone(),
                settings.default_country_prefix.clone(),
            ),
            confirm_code: ConfirmCode::new(deps.phone_auth),
            persist_profile: PersistProfile::new(deps.document_store, deps.clock, settings),
            navigation: deps.navigation,
            events: deps.events,
        }
    }

    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    pub fn variant(&self) -> FlowVariant {
        self.variant
    }

    /// Initializes the bot-check widget for the form.
    ///
    /// A failed init leaves the form usable but dispatch is refused until the
    /// next successful mount.
    pub async fn mount(
        &self,
        anchor: &WidgetAnchor,
    ) -> Result<RegistrationState, RegistrationOrchestratorError> {
        match self.verifier.init(anchor).await {
            Ok((_token, notifier)) => {
                let watcher = self.start_expiry_listener(notifier);
                self.verifier.attach_watcher(watcher).await;
                Ok(self.context.get_state().await)
            }
            Err(err) => {
                warn!(flow_id = %self.flow_id, error = %err, "bot-check init failed");
                self.dispatch(RegistrationEvent::VerifierUnavailable).await
            }
        }
    }

    /// Tears down the bot-check widget. Safe to call more than once.
    pub async fn unmount(&self) {
        self.verifier.dispose().await;
    }

    /// Updates one form field and clears its error. Ignored outside the form phase.
    pub async fn edit_field(
        &self,
        name: &str,
        value: &str,
    ) -> Result<RegistrationState, RegistrationOrchestratorError> {
        let state = self.context.get_state().await;
        if !matches!(state, RegistrationState::Entering { .. }) {
            return Ok(state);
        }
        if !self.draft.lock().await.set_field(name, value) {
            return Err(RegistrationOrchestratorError::UnknownField {
                field: name.to_string(),
                variant: self.variant,
            });
        }
        self.dispatch(RegistrationEvent::FieldEdited).await
    }

    pub async fn submit_details(&self) -> Result<RegistrationState, RegistrationOrchestratorError> {
        let event = {
            let mut draft = self.draft.lock().await;
            let invalid_fields = draft.revalidate(&self.validator).len();
            RegistrationEvent::DetailsSubmitted {
                invalid_fields,
                phone_number: draft.phone().to_string(),
            }
        };
        self.dispatch(event).await
    }

    /// Writes a digit into a passcode cell. Returns whether it was accepted.
    pub async fn enter_code_digit(&self, index: usize, input: char) -> bool {
        if !self.awaiting_code().await {
            return false;
        }
        self.otp.lock().await.set_cell(index, input)
    }

    /// Returns the cell that should take focus next.
    pub async fn backspace_code(&self, index: usize) -> usize {
        let mut otp = self.otp.lock().await;
        if !self.awaiting_code().await {
            return otp.focus();
        }
        otp.backspace(index)
    }

    pub async fn paste_code(&self, text: &str) -> bool {
        if !self.awaiting_code().await {
            return false;
        }
        self.otp.lock().await.paste_fill(text)
    }

    pub async fn submit_code(&self) -> Result<RegistrationState, RegistrationOrchestratorError> {
        let digits = self.otp.lock().await.join().len();
        self.dispatch(RegistrationEvent::CodeSubmitted { digits })
            .await
    }

    pub async fn back_to_form(&self) -> Result<RegistrationState, RegistrationOrchestratorError> {
        self.dispatch(RegistrationEvent::BackToForm).await
    }

    pub async fn retry_save(&self) -> Result<RegistrationState, RegistrationOrchestratorError> {
        self.dispatch(RegistrationEvent::RetrySave).await
    }

    pub async fn state(&self) -> RegistrationState {
        self.context.get_state().await
    }

    pub async fn draft(&self) -> RegistrationDraft {
        self.draft.lock().await.clone()
    }

    pub async fn otp(&self) -> OtpBuffer {
        self.otp.lock().await.clone()
    }

    /// True while a step is in flight; submit controls should be disabled.
    pub fn is_busy(&self) -> bool {
        self.context.is_busy()
    }

    async fn awaiting_code(&self) -> bool {
        matches!(
            self.context.get_state().await,
            RegistrationState::AwaitingCode { .. }
        )
    }

    async fn dispatch(
        &self,
        event: RegistrationEvent,
    ) -> Result<RegistrationState, RegistrationOrchestratorError> {
        // A repeated action while a step is in flight must not reach the ports.
        let Some(_busy) = self.context.try_begin() else {
            debug!(flow_id = %self.flow_id, event = event.name(), "registration busy, event ignored");
            return Ok(self.context.get_state().await);
        };
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let span = info_span!(
            "usecase.registration_orchestrator.dispatch",
            flow_id = %self.flow_id,
            variant = %self.variant,
            event = event.name()
        );
        async {
            let mut current = self.context.get_state().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from = current.phase();
                let event_name = event.name();
                let (next, actions) = RegistrationStateMachine::transition(current, event);
                info!(from, to = next.phase(), event = event_name, "registration state transition");
                let follow_up_events = self.execute_actions(actions).await?;
                self.set_state_and_emit(next.clone()).await;
                current = next;
                pending_events.extend(follow_up_events);
            }

            Ok(current)
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(
        &self,
        actions: Vec<RegistrationAction>,
    ) -> Result<Vec<RegistrationEvent>, RegistrationOrchestratorError> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            debug!(?action, "registration executing action");
            match action {
                RegistrationAction::SendCode { phone_number } => {
                    follow_up_events.push(self.send_code_action(&phone_number).await);
                }
                RegistrationAction::ConfirmCode => {
                    follow_up_events.push(self.confirm_code_action().await?);
                }
                RegistrationAction::DiscardChallenge => {
                    self.otp.lock().await.clear();
                    *self.pending.lock().await = None;
                    debug!("registration action DiscardChallenge completed");
                }
                RegistrationAction::PersistProfile => {
                    follow_up_events.push(self.persist_profile_action().await?);
                }
                RegistrationAction::Navigate => {
                    self.finish().await;
                    debug!("registration action Navigate completed");
                }
            }
        }

        Ok(follow_up_events)
    }

    async fn send_code_action(&self, phone_number: &str) -> RegistrationEvent {
        let token = self.verifier.current().await;
        match self
            .dispatch_challenge
            .execute(phone_number, token.as_ref())
            .await
        {
            Ok(pending) => {
                let sent_to = mask_phone(pending.phone_number());
                self.otp.lock().await.clear();
                *self.pending.lock().await = Some(pending);
                RegistrationEvent::CodeSent { sent_to }
            }
            Err(error) => RegistrationEvent::CodeSendFailed { error },
        }
    }

    async fn confirm_code_action(&self) -> Result<RegistrationEvent, RegistrationOrchestratorError> {
        let pending = self
            .pending
            .lock()
            .await
            .clone()
            .ok_or(RegistrationOrchestratorError::MissingPendingConfirmation)?;
        let code = self.otp.lock().await.join();

        Ok(match self.confirm_code.execute(&pending, &code).await {
            Ok(identity) => {
                *self.identity.lock().await = Some(identity);
                RegistrationEvent::CodeConfirmed
            }
            Err(error) => RegistrationEvent::CodeRejected { error },
        })
    }

    async fn persist_profile_action(
        &self,
    ) -> Result<RegistrationEvent, RegistrationOrchestratorError> {
        let identity = self
            .identity
            .lock()
            .await
            .clone()
            .ok_or(RegistrationOrchestratorError::MissingIdentity)?;

        // A retry after a partial write must not trip over its own records.
        if !self.identity_checked.load(Ordering::SeqCst) {
            if let Err(error) = self
                .persist_profile
                .ensure_unregistered(self.variant, &identity)
                .await
            {
                return Ok(RegistrationEvent::ProfileSaveFailed { error });
            }
            self.identity_checked.store(true, Ordering::SeqCst);
        }

        let draft = self.draft.lock().await.clone();
        Ok(match self.persist_profile.execute(&identity, &draft).await {
            Ok(_) => RegistrationEvent::ProfileSaved,
            Err(error) => RegistrationEvent::ProfileSaveFailed { error },
        })
    }

    async fn finish(&self) {
        self.verifier.dispose().await;
        *self.draft.lock().await = RegistrationDraft::new(self.variant);
        self.otp.lock().await.clear();
        *self.pending.lock().await = None;
        *self.identity.lock().await = None;
        info!(flow_id = %self.flow_id, path = %self.success_path, "registration complete");
        self.navigation.navigate(&self.success_path);
    }

    async fn set_state_and_emit(&self, state: RegistrationState) {
        self.context.set_state(state.clone()).await;
        self.events.emit_state_changed(&self.flow_id, &state).await;
    }

    fn start_expiry_listener(&self, notifier: ExpiryNotifier) -> AbortHandle {
        let context = Arc::clone(&self.context);
        let events = Arc::clone(&self.events);
        let flow_id = self.flow_id.clone();

        let task = tokio::spawn(async move {
            notifier.expired().await;

            let _dispatch_guard = context.acquire_dispatch_lock().await;
            let current = context.get_state().await;
            let (next, _) =
                RegistrationStateMachine::transition(current.clone(), RegistrationEvent::VerifierExpired);
            if next == current {
                debug!(flow_id = %flow_id, phase = current.phase(), "bot-check token expired, state unchanged");
                return;
            }
            warn!(flow_id = %flow_id, "bot-check token expired");
            context.set_state(next.clone()).await;
            events.emit_state_changed(&flow_id, &next).await;
        });
        task.abort_handle()
    }
}
