//! Line-oriented driver for one registration flow.

use std::sync::Arc;

use ch_app::RegistrationOrchestrator;
use ch_core::ports::WidgetAnchor;
use ch_core::registration::OTP_LENGTH;
use ch_core::{RegistrationError, RegistrationState};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Profile saved and the flow navigated away.
    Completed,
    /// Input ended or the user gave up before completion.
    Abandoned,
}

/// What to ask for the next time the form is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormPass {
    All,
    Invalid,
    Confirm,
}

pub struct ConsoleSession<R, W> {
    orchestrator: Arc<RegistrationOrchestrator>,
    anchor: WidgetAnchor,
    input: Lines<R>,
    output: W,
}

impl<R, W> ConsoleSession<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        orchestrator: Arc<RegistrationOrchestrator>,
        anchor: WidgetAnchor,
        input: R,
        output: W,
    ) -> Self {
        Self {
            orchestrator,
            anchor,
            input: input.lines(),
            output,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<SessionOutcome> {
        let variant = self.orchestrator.variant();
        self.say(&format!("== {} registration ==", variant)).await?;
        self.orchestrator.mount(&self.anchor).await?;

        let mut pass = FormPass::All;
        let outcome = loop {
            match self.orchestrator.state().await {
                RegistrationState::Entering { error } => {
                    if let Some(error) = &error {
                        self.say(&format!("! {error}")).await?;
                        if matches!(
                            error,
                            RegistrationError::VerifierExpired
                                | RegistrationError::VerifierUnavailable
                        ) {
                            self.orchestrator.mount(&self.anchor).await?;
                        }
                    }
                    if !self.fill_form(pass).await? {
                        break SessionOutcome::Abandoned;
                    }
                    let state = self.orchestrator.submit_details().await?;
                    pass = match state.error() {
                        Some(RegistrationError::InvalidFields { .. }) => FormPass::Invalid,
                        Some(_) => FormPass::Confirm,
                        None => FormPass::All,
                    };
                }
                RegistrationState::AwaitingCode { sent_to, error } => {
                    if let Some(error) = error {
                        self.say(&format!("! {error}")).await?;
                    }
                    let prompt = format!(
                        "Code sent to {sent_to}. Enter the {OTP_LENGTH}-digit code (or 'back'): "
                    );
                    let Some(line) = self.ask(&prompt).await? else {
                        break SessionOutcome::Abandoned;
                    };
                    if line.eq_ignore_ascii_case("back") {
                        self.orchestrator.back_to_form().await?;
                        pass = FormPass::All;
                        continue;
                    }
                    self.enter_code(&line).await;
                    self.orchestrator.submit_code().await?;
                }
                RegistrationState::Persisting { error: Some(error) } => {
                    self.say(&format!("! {error}")).await?;
                    if matches!(error, RegistrationError::AlreadyRegistered) {
                        break SessionOutcome::Abandoned;
                    }
                    match self.ask("Retry saving? [Y/n]: ").await? {
                        Some(answer) if !answer.eq_ignore_ascii_case("n") => {
                            self.orchestrator.retry_save().await?;
                        }
                        _ => break SessionOutcome::Abandoned,
                    }
                }
                RegistrationState::Persisting { error: None } => {
                    anyhow::bail!("registration stalled while saving the profile");
                }
                RegistrationState::Done => {
                    self.say("Registration complete.").await?;
                    break SessionOutcome::Completed;
                }
            }
        };

        self.orchestrator.unmount().await;
        debug!(?outcome, "console session finished");
        Ok(outcome)
    }

    /// Returns `false` when input ends.
    async fn fill_form(&mut self, mut pass: FormPass) -> anyhow::Result<bool> {
        if pass == FormPass::Confirm {
            match self.ask("Press enter to retry, or type 'edit': ").await? {
                Some(answer) if answer.eq_ignore_ascii_case("edit") => pass = FormPass::All,
                Some(_) => return Ok(true),
                None => return Ok(false),
            }
        }

        let variant = self.orchestrator.variant();
        for spec in variant.schema() {
            let draft = self.orchestrator.draft().await;
            let field_error = draft.error(spec.name).map(str::to_string);
            if pass == FormPass::Invalid && field_error.is_none() {
                continue;
            }
            if let Some(message) = field_error {
                self.say(&format!("  ! {message}")).await?;
            }

            let current = draft.field(spec.name).unwrap_or("").to_string();
            let prompt = if current.is_empty() {
                format!("{}: ", spec.label)
            } else {
                format!("{} [{}]: ", spec.label, current)
            };
            let Some(value) = self.ask(&prompt).await? else {
                return Ok(false);
            };
            if value.is_empty() && !current.is_empty() {
                continue;
            }
            self.orchestrator.edit_field(spec.name, &value).await?;
        }
        Ok(true)
    }

    /// Replaces the passcode buffer with `code`, cell by cell unless it pastes whole.
    async fn enter_code(&self, code: &str) {
        if self.orchestrator.paste_code(code).await {
            return;
        }
        for index in (0..OTP_LENGTH).rev() {
            self.orchestrator.backspace_code(index).await;
        }
        for (index, input) in code.chars().take(OTP_LENGTH).enumerate() {
            if !self.orchestrator.enter_code_digit(index, input).await {
                break;
            }
        }
    }

    async fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;
        Ok(self
            .input
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    async fn say(&mut self, line: &str) -> anyhow::Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ch_app::RegistrationDeps;
    use ch_core::config::{NavigationSettings, RegistrationSettings};
    use ch_core::ports::{
        AuthenticatedIdentity, PendingConfirmation, PhoneAuthError, PhoneAuthPort, VerifierToken,
    };
    use ch_core::{FlowVariant, Uid};
    use ch_infra::{FileDocumentStore, SystemClock, TimedBotCheck};
    use tempfile::TempDir;

    use crate::console::{ConsoleNavigator, TracingEventPort};

    struct FixedCodePhoneAuth {
        sent_to: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PhoneAuthPort for FixedCodePhoneAuth {
        async fn send_code(
            &self,
            phone_number: &str,
            _token: &VerifierToken,
        ) -> Result<PendingConfirmation, PhoneAuthError> {
            self.sent_to.lock().unwrap().push(phone_number.to_string());
            Ok(PendingConfirmation::new("session", phone_number))
        }

        async fn confirm(
            &self,
            pending: &PendingConfirmation,
            code: &str,
        ) -> Result<AuthenticatedIdentity, PhoneAuthError> {
            if code != "424242" {
                return Err(PhoneAuthError::InvalidCode);
            }
            Ok(AuthenticatedIdentity {
                uid: Uid::new("U-console"),
                phone_number: pending.phone_number().to_string(),
            })
        }
    }

    fn orchestrator(
        variant: FlowVariant,
        data_dir: &TempDir,
    ) -> (Arc<RegistrationOrchestrator>, Arc<ConsoleNavigator>) {
        let navigator = Arc::new(ConsoleNavigator::new());
        let deps = RegistrationDeps {
            phone_auth: Arc::new(FixedCodePhoneAuth {
                sent_to: Mutex::new(Vec::new()),
            }),
            bot_check: Arc::new(TimedBotCheck::new("site-token", 120)),
            document_store: Arc::new(FileDocumentStore::new(data_dir.path().to_path_buf())),
            clock: Arc::new(SystemClock),
            navigation: navigator.clone(),
            events: Arc::new(TracingEventPort),
        };
        let orchestrator = Arc::new(RegistrationOrchestrator::new(
            variant,
            deps,
            RegistrationSettings::default(),
            &NavigationSettings::default(),
        ));
        (orchestrator, navigator)
    }

    async fn run_session(
        orchestrator: Arc<RegistrationOrchestrator>,
        script: &str,
    ) -> (SessionOutcome, String) {
        let mut output = Vec::new();
        let outcome = {
            let mut session = ConsoleSession::new(
                orchestrator,
                WidgetAnchor::new("recaptcha-container"),
                script.as_bytes(),
                &mut output,
            );
            session.run().await.unwrap()
        };
        (outcome, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn donor_session_completes_after_fixing_phone_and_code() {
        let data_dir = TempDir::new().unwrap();
        let (orchestrator, navigator) = orchestrator(FlowVariant::BloodDonor, &data_dir);
        let script = [
            "Asha Menon",
            "asha@example.org",
            "98765",
            "Kochi",
            "O+",
            "98765 43210",
            "111111",
            "424242",
        ]
        .join("\n");

        let (outcome, transcript) = run_session(orchestrator, &script).await;

        assert_eq!(outcome, SessionOutcome::Completed);
        assert!(transcript.contains("Enter a valid phone number"));
        assert!(transcript.contains("Code sent to ********3210"));
        assert!(transcript.contains("invalid code, check and try again"));
        assert_eq!(navigator.destination().as_deref(), Some("/"));
        assert!(data_dir.path().join("users/U-console.json").exists());
        assert!(data_dir.path().join("blood_donors/U-console.json").exists());
    }

    #[tokio::test]
    async fn short_code_is_reported_without_leaving_code_entry() {
        let data_dir = TempDir::new().unwrap();
        let (orchestrator, _) = orchestrator(FlowVariant::BloodDonor, &data_dir);
        let script = [
            "Asha Menon",
            "asha@example.org",
            "9876543210",
            "Kochi",
            "O+",
            "123",
        ]
        .join("\n");

        let (outcome, transcript) = run_session(orchestrator, &script).await;

        assert_eq!(outcome, SessionOutcome::Abandoned);
        assert!(transcript.contains("enter the valid 6-digit code"));
    }

    #[tokio::test]
    async fn end_of_input_abandons_flow() {
        let data_dir = TempDir::new().unwrap();
        let (orchestrator, navigator) = orchestrator(FlowVariant::Membership, &data_dir);

        let (outcome, _) = run_session(orchestrator, "Ravi\n").await;

        assert_eq!(outcome, SessionOutcome::Abandoned);
        assert!(navigator.destination().is_none());
    }
}
