use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ch_app::{RegistrationDeps, RegistrationOrchestrator};
use ch_core::config::{NavigationSettings, RegistrationSettings};
use ch_core::ports::{
    AuthenticatedIdentity, BotCheckError, BotCheckPort, ClockPort, DocumentStoreError,
    DocumentStorePort, ExpiryNotifier, NavigationPort, PendingConfirmation, PhoneAuthError,
    PhoneAuthPort, Record, RegistrationEventPort, VerifierToken, WidgetAnchor,
};
use ch_core::{FlowId, FlowVariant, RegistrationError, RegistrationState, Uid};
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;

const ANCHOR: &str = "recaptcha-container";

#[tokio::test]
async fn membership_happy_path_writes_profile_and_navigates_to_login() {
    let env = TestEnv::new(FlowVariant::Membership);
    env.mount().await;
    fill_membership(&env.orchestrator, "Studying").await;

    let state = env.orchestrator.submit_details().await.expect("submit details");
    assert!(matches!(state, RegistrationState::AwaitingCode { .. }));
    assert_eq!(env.phone_auth.sent_to(), vec!["+919876543210".to_string()]);

    for (index, digit) in "123456".chars().enumerate() {
        assert!(env.orchestrator.enter_code_digit(index, digit).await);
    }
    let state = env.orchestrator.submit_code().await.expect("submit code");

    assert_eq!(state, RegistrationState::Done);
    assert_eq!(env.navigation.paths(), vec!["/login".to_string()]);

    let user = env.store.get("users", "U1").expect("member record");
    assert_eq!(user["name"], "Ravi");
    assert_eq!(user["profession"], "");
    assert_eq!(user["isAdmin"], false);
    assert_eq!(user["verified"], true);
    assert_eq!(user["createdAt"], "2026-10-17T09:30:00.000Z");
    assert!(env.store.get("blood_donors", "U1").is_none());
}

#[tokio::test]
async fn donor_happy_path_writes_both_records() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    env.mount().await;
    fill_donor(&env.orchestrator).await;

    env.orchestrator.submit_details().await.expect("submit details");
    assert!(env.orchestrator.paste_code("123456").await);
    let state = env.orchestrator.submit_code().await.expect("submit code");

    assert_eq!(state, RegistrationState::Done);
    assert_eq!(env.navigation.paths(), vec!["/".to_string()]);

    let donor = env.store.get("blood_donors", "U1").expect("donor record");
    assert_eq!(donor["bloodGroup"], "O+");
    assert_eq!(donor["uid"], "U1");

    let user = env.store.get("users", "U1").expect("member record");
    assert_eq!(user["name"], "Asha");
    assert_eq!(user["lastName"], "Menon");
    assert_eq!(user["mobile"], "9876543210");
    assert_eq!(user["address"], "Kochi");
    assert_eq!(user["status"], "Donor");
    assert_eq!(user["isBloodDonor"], true);
}

#[tokio::test]
async fn invalid_draft_never_reaches_provider() {
    let env = TestEnv::new(FlowVariant::Membership);
    env.mount().await;
    fill_membership(&env.orchestrator, "Working").await;

    let state = env.orchestrator.submit_details().await.expect("submit");

    assert_eq!(
        state.error(),
        Some(&RegistrationError::InvalidFields { count: 1 })
    );
    let draft = env.orchestrator.draft().await;
    assert_eq!(draft.error("profession"), Some("Profession is required"));
    assert_eq!(env.phone_auth.send_calls(), 0);

    env.orchestrator
        .edit_field("profession", "Engineer")
        .await
        .expect("edit");
    assert_eq!(env.orchestrator.draft().await.error("profession"), None);
    let state = env.orchestrator.submit_details().await.expect("submit");
    assert!(matches!(state, RegistrationState::AwaitingCode { .. }));
}

#[tokio::test]
async fn send_failure_preserves_draft() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    env.phone_auth.fail_send_with(PhoneAuthError::QuotaExceeded);
    env.mount().await;
    fill_donor(&env.orchestrator).await;
    let before = env.orchestrator.draft().await;

    let state = env.orchestrator.submit_details().await.expect("submit");

    assert_eq!(state.error(), Some(&RegistrationError::QuotaExceeded));
    assert_eq!(
        state.error().map(ToString::to_string).as_deref(),
        Some("try again later")
    );
    assert_eq!(env.orchestrator.draft().await.fields(), before.fields());
}

#[tokio::test]
async fn back_to_form_discards_code_but_keeps_draft() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    env.mount().await;
    fill_donor(&env.orchestrator).await;
    env.orchestrator.submit_details().await.expect("submit");
    env.orchestrator.paste_code("999999").await;

    let state = env.orchestrator.back_to_form().await.expect("back");

    assert_eq!(state, RegistrationState::initial());
    assert_eq!(env.orchestrator.otp().await.join(), "");
    assert_eq!(env.orchestrator.draft().await.field("name"), Some("Asha Menon"));
    assert_eq!(env.store.len(), 0);
}

#[tokio::test]
async fn repeated_submit_while_in_flight_sends_once() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    let gate = env.phone_auth.hold_sends();
    env.mount().await;
    fill_donor(&env.orchestrator).await;

    let orchestrator = Arc::clone(&env.orchestrator);
    let first = tokio::spawn(async move { orchestrator.submit_details().await });

    while env.phone_auth.send_calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(env.orchestrator.is_busy());

    let state = env.orchestrator.submit_details().await.expect("second submit");
    assert_eq!(state, RegistrationState::initial());
    assert_eq!(env.phone_auth.send_calls(), 1);

    gate.notify_one();
    let state = first.await.expect("join").expect("first submit");
    assert!(matches!(state, RegistrationState::AwaitingCode { .. }));
    assert_eq!(env.phone_auth.send_calls(), 1);
    assert!(!env.orchestrator.is_busy());
}

#[tokio::test]
async fn expired_token_blocks_dispatch() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    env.mount().await;
    fill_donor(&env.orchestrator).await;

    env.bot_check.expire_latest();
    let state = env.orchestrator.submit_details().await.expect("submit");

    assert_eq!(state.error(), Some(&RegistrationError::VerifierExpired));
    assert_eq!(env.phone_auth.send_calls(), 0);

    env.mount().await;
    let state = env.orchestrator.submit_details().await.expect("submit");
    assert!(matches!(state, RegistrationState::AwaitingCode { .. }));
    assert_eq!(env.bot_check.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_bot_check_init_reports_unavailable() {
    let env = TestEnv::new(FlowVariant::Membership);
    env.bot_check.fail_renders();

    let state = env
        .orchestrator
        .mount(&WidgetAnchor::new(ANCHOR))
        .await
        .expect("mount");

    assert_eq!(state.error(), Some(&RegistrationError::VerifierUnavailable));
}

#[tokio::test]
async fn save_failure_can_be_retried() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    env.store.fail_writes_to("blood_donors");
    env.mount().await;
    fill_donor(&env.orchestrator).await;
    env.orchestrator.submit_details().await.expect("submit");
    env.orchestrator.paste_code("123456").await;

    let state = env.orchestrator.submit_code().await.expect("submit code");
    assert!(matches!(
        state.error(),
        Some(RegistrationError::SaveFailed { .. })
    ));
    assert!(env.navigation.paths().is_empty());

    env.store.recover();
    let state = env.orchestrator.retry_save().await.expect("retry");

    assert_eq!(state, RegistrationState::Done);
    assert_eq!(env.navigation.paths(), vec!["/".to_string()]);
    assert!(env.store.get("blood_donors", "U1").is_some());
}

#[tokio::test]
async fn existing_identity_is_not_overwritten() {
    let env = TestEnv::new(FlowVariant::Membership);
    let mut existing = Record::new();
    existing.insert("name".into(), "Existing".into());
    env.store.insert("users", "U1", existing);
    env.mount().await;
    fill_membership(&env.orchestrator, "Studying").await;
    env.orchestrator.submit_details().await.expect("submit");
    env.orchestrator.paste_code("123456").await;

    let state = env.orchestrator.submit_code().await.expect("submit code");

    assert_eq!(state.error(), Some(&RegistrationError::AlreadyRegistered));
    assert_eq!(env.store.get("users", "U1").expect("record")["name"], "Existing");
}

#[tokio::test]
async fn existing_member_can_register_as_donor() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    let mut existing = Record::new();
    existing.insert("name".into(), "Existing".into());
    existing.insert("isBloodDonor".into(), false.into());
    env.store.insert("users", "U1", existing);
    env.mount().await;
    fill_donor(&env.orchestrator).await;
    env.orchestrator.submit_details().await.expect("submit");
    env.orchestrator.paste_code("123456").await;

    let state = env.orchestrator.submit_code().await.expect("submit code");

    assert_eq!(state, RegistrationState::Done);
    assert_eq!(env.navigation.paths(), vec!["/".to_string()]);
    assert!(env.store.get("blood_donors", "U1").is_some());
    let user = env.store.get("users", "U1").expect("member record");
    assert_eq!(user["isBloodDonor"], true);
    assert_eq!(user["name"], "Asha");
}

#[tokio::test]
async fn existing_donor_is_not_registered_twice() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    let mut existing = Record::new();
    existing.insert("bloodGroup".into(), "A+".into());
    env.store.insert("blood_donors", "U1", existing);
    env.mount().await;
    fill_donor(&env.orchestrator).await;
    env.orchestrator.submit_details().await.expect("submit");
    env.orchestrator.paste_code("123456").await;

    let state = env.orchestrator.submit_code().await.expect("submit code");

    assert_eq!(state.error(), Some(&RegistrationError::AlreadyRegistered));
    assert_eq!(
        env.store.get("blood_donors", "U1").expect("record")["bloodGroup"],
        "A+"
    );
    assert!(env.store.get("users", "U1").is_none());
}

#[tokio::test]
async fn incomplete_code_is_rejected_locally() {
    let env = TestEnv::new(FlowVariant::BloodDonor);
    env.mount().await;
    fill_donor(&env.orchestrator).await;
    env.orchestrator.submit_details().await.expect("submit");
    env.orchestrator.enter_code_digit(0, '1').await;
    assert!(!env.orchestrator.enter_code_digit(1, 'x').await);

    let state = env.orchestrator.submit_code().await.expect("submit code");

    assert_eq!(state.error(), Some(&RegistrationError::CodeIncomplete));
    assert_eq!(env.phone_auth.confirm_calls(), 0);
}

async fn fill_membership(orchestrator: &RegistrationOrchestrator, status: &str) {
    for (name, value) in [
        ("name", "Ravi"),
        ("lastName", "Kumar"),
        ("fatherName", "Suresh Kumar"),
        ("gender", "Male"),
        ("dob", "1998-04-12"),
        ("email", "ravi@example.org"),
        ("mobile", "98765 43210"),
        ("address", "MG Road, Kochi"),
        ("bloodGroup", "B+"),
        ("qualification", "BSc"),
        ("status", status),
        ("availability", "Native"),
    ] {
        orchestrator.edit_field(name, value).await.expect("edit field");
    }
}

async fn fill_donor(orchestrator: &RegistrationOrchestrator) {
    for (name, value) in [
        ("name", "Asha Menon"),
        ("email", "asha@example.org"),
        ("phone", "9876543210"),
        ("place", "Kochi"),
        ("bloodGroup", "O+"),
    ] {
        orchestrator.edit_field(name, value).await.expect("edit field");
    }
}

struct TestEnv {
    orchestrator: Arc<RegistrationOrchestrator>,
    phone_auth: Arc<CountingPhoneAuth>,
    bot_check: Arc<StubBotCheck>,
    store: Arc<MemoryStore>,
    navigation: Arc<RecordingNavigation>,
}

impl TestEnv {
    fn new(variant: FlowVariant) -> Self {
        let phone_auth = Arc::new(CountingPhoneAuth::default());
        let bot_check = Arc::new(StubBotCheck::default());
        let store = Arc::new(MemoryStore::default());
        let navigation = Arc::new(RecordingNavigation::default());
        let deps = RegistrationDeps {
            phone_auth: phone_auth.clone(),
            bot_check: bot_check.clone(),
            document_store: store.clone(),
            clock: Arc::new(FixedClock),
            navigation: navigation.clone(),
            events: Arc::new(NoopEvents),
        };
        let orchestrator = Arc::new(RegistrationOrchestrator::new(
            variant,
            deps,
            RegistrationSettings::default(),
            &NavigationSettings::default(),
        ));
        Self {
            orchestrator,
            phone_auth,
            bot_check,
            store,
            navigation,
        }
    }

    async fn mount(&self) {
        self.orchestrator
            .mount(&WidgetAnchor::new(ANCHOR))
            .await
            .expect("mount");
    }
}

#[derive(Default)]
struct CountingPhoneAuth {
    send_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
    sent_to: Mutex<Vec<String>>,
    send_error: Mutex<Option<PhoneAuthError>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl CountingPhoneAuth {
    fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    fn sent_to(&self) -> Vec<String> {
        self.sent_to.lock().unwrap().clone()
    }

    fn fail_send_with(&self, error: PhoneAuthError) {
        *self.send_error.lock().unwrap() = Some(error);
    }

    fn hold_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl PhoneAuthPort for CountingPhoneAuth {
    async fn send_code(
        &self,
        phone_number: &str,
        _token: &VerifierToken,
    ) -> Result<PendingConfirmation, PhoneAuthError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.send_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent_to.lock().unwrap().push(phone_number.to_string());
        Ok(PendingConfirmation::new("session-1", phone_number))
    }

    async fn confirm(
        &self,
        pending: &PendingConfirmation,
        code: &str,
    ) -> Result<AuthenticatedIdentity, PhoneAuthError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if code != "123456" {
            return Err(PhoneAuthError::InvalidCode);
        }
        Ok(AuthenticatedIdentity {
            uid: Uid::new("U1"),
            phone_number: pending.phone_number().to_string(),
        })
    }
}

#[derive(Default)]
struct StubBotCheck {
    notifiers: Mutex<Vec<ExpiryNotifier>>,
    clears: AtomicUsize,
    fail: Mutex<bool>,
}

impl StubBotCheck {
    fn expire_latest(&self) {
        if let Some(notifier) = self.notifiers.lock().unwrap().last() {
            notifier.expire();
        }
    }

    fn fail_renders(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl BotCheckPort for StubBotCheck {
    async fn render(
        &self,
        anchor: &WidgetAnchor,
        notifier: ExpiryNotifier,
    ) -> Result<VerifierToken, BotCheckError> {
        if *self.fail.lock().unwrap() {
            return Err(BotCheckError::AnchorMissing(anchor.as_str().to_string()));
        }
        let token = VerifierToken::new("site-token", &notifier);
        self.notifiers.lock().unwrap().push(notifier);
        Ok(token)
    }

    async fn clear(&self, _token: &VerifierToken) -> Result<(), BotCheckError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<(String, String), Record>>,
    failing_collection: Mutex<Option<String>>,
}

impl MemoryStore {
    fn get(&self, collection: &str, key: &str) -> Option<Record> {
        self.records
            .lock()
            .unwrap()
            .get(&(collection.to_string(), key.to_string()))
            .cloned()
    }

    fn insert(&self, collection: &str, key: &str, record: Record) {
        self.records
            .lock()
            .unwrap()
            .insert((collection.to_string(), key.to_string()), record);
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn fail_writes_to(&self, collection: &str) {
        *self.failing_collection.lock().unwrap() = Some(collection.to_string());
    }

    fn recover(&self) {
        *self.failing_collection.lock().unwrap() = None;
    }
}

#[async_trait]
impl DocumentStorePort for MemoryStore {
    async fn write(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<(), DocumentStoreError> {
        if self.failing_collection.lock().unwrap().as_deref() == Some(collection) {
            return Err(DocumentStoreError::Unavailable("offline".into()));
        }
        self.insert(collection, key, record.clone());
        Ok(())
    }

    async fn exists(&self, collection: &str, key: &str) -> Result<bool, DocumentStoreError> {
        Ok(self.get(collection, key).is_some())
    }
}

struct FixedClock;

impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap()
    }
}

#[derive(Default)]
struct RecordingNavigation {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigation {
    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl NavigationPort for RecordingNavigation {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

struct NoopEvents;

#[async_trait]
impl RegistrationEventPort for NoopEvents {
    async fn emit_state_changed(&self, _flow_id: &FlowId, _state: &RegistrationState) {}
}
