//! Generic multi-step form wizard
//!
//! ```text
//! NotInitialized{false} ──initialize──▶ NotInitialized{true} ──loaded──▶ Ready{step 1}
//!        ▲                                     │                            │ advance_step
//!        │                                load failed                       ▼
//!        ├─────────────────────────────────────┘                    Ready{step N}
//!        │                                                                  │ submit
//!        └──────────────────────── persisted ◀── Ready{is_submitting} ◀─────┘
//! ```
//!
//! The wizard is one state machine parameterised by a [`FormSchema`]: the
//! schema owns the step payloads, the accumulated draft and the API calls,
//! the wizard owns the transitions and their guards. The state lock is never
//! held across an API call.
//!
//! `reset` starts a new epoch. A load or persist that completes, fails or is
//! dropped only writes back if the epoch it started in is still current.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use sill_core::{Result, SillApi, SillError};

// ============================================================================
// SCHEMA
// ============================================================================

#[async_trait]
pub trait FormSchema: Send + Sync + 'static {
    /// Short form name used in logs and errors
    const NAME: &'static str;

    /// Number of steps; the last one is submitted, never advanced
    const STEP_COUNT: u8;

    /// Arguments of `initialize`: create or edit
    type Params: Send;

    /// What the form writes to (entity id in edit mode, owning software...)
    type Target: Clone + Debug + Send + Sync;

    /// Data of one step, tagged by the step it belongs to
    type Step: Clone + Debug + Send;

    /// Accumulated partial form data, one optional slot per step
    type Draft: Clone + Debug + Default + Send + Sync;

    /// Complete data handed to the API on submit
    type Payload: Send;

    /// 1-based step the data belongs to
    fn step_number(step: &Self::Step) -> u8;

    fn validate(step: &Self::Step) -> Result<()>;

    fn merge(draft: &mut Self::Draft, step: Self::Step);

    /// Build the payload; fails when any step is missing
    fn complete(target: &Self::Target, draft: &Self::Draft) -> Result<Self::Payload>;

    /// Fetch what initialization needs; edit mode prefills the draft
    async fn load(api: &dyn SillApi, params: Self::Params) -> Result<(Self::Target, Self::Draft)>;

    /// Create or update; returns the name of the software to show next
    async fn persist(
        api: &dyn SillApi,
        target: &Self::Target,
        payload: Self::Payload,
    ) -> Result<String>;
}

// ============================================================================
// STATE
// ============================================================================

pub struct ReadyState<S: FormSchema> {
    pub step: u8,
    pub form_data: S::Draft,
    pub is_submitting: bool,
    pub target: S::Target,
}

// Manual impls: the schema type itself is neither Clone nor Debug
impl<S: FormSchema> Clone for ReadyState<S> {
    fn clone(&self) -> Self {
        Self {
            step: self.step,
            form_data: self.form_data.clone(),
            is_submitting: self.is_submitting,
            target: self.target.clone(),
        }
    }
}

impl<S: FormSchema> Debug for ReadyState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyState")
            .field("step", &self.step)
            .field("form_data", &self.form_data)
            .field("is_submitting", &self.is_submitting)
            .field("target", &self.target)
            .finish()
    }
}

pub enum WizardState<S: FormSchema> {
    NotInitialized { is_initializing: bool },
    Ready(ReadyState<S>),
}

impl<S: FormSchema> Clone for WizardState<S> {
    fn clone(&self) -> Self {
        match self {
            Self::NotInitialized { is_initializing } => Self::NotInitialized {
                is_initializing: *is_initializing,
            },
            Self::Ready(ready) => Self::Ready(ready.clone()),
        }
    }
}

impl<S: FormSchema> Debug for WizardState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized { is_initializing } => f
                .debug_struct("NotInitialized")
                .field("is_initializing", is_initializing)
                .finish(),
            Self::Ready(ready) => f.debug_tuple("Ready").field(ready).finish(),
        }
    }
}

impl<S: FormSchema> WizardState<S> {
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotInitialized { is_initializing: false } => "not initialized",
            Self::NotInitialized { is_initializing: true } => "initializing",
            Self::Ready(ready) if ready.is_submitting => "submitting",
            Self::Ready(_) => "ready",
        }
    }

    pub fn step(&self) -> Option<u8> {
        match self {
            Self::Ready(ready) => Some(ready.step),
            Self::NotInitialized { .. } => None,
        }
    }
}

/// Signal for the UI once a form is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    /// Software whose detail page should be shown
    pub software_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(Redirect),
    /// A submission was already in flight; nothing was sent
    AlreadySubmitting,
}

// ============================================================================
// WIZARD
// ============================================================================

pub struct Wizard<S: FormSchema> {
    session_id: Uuid,
    state: Mutex<WizardState<S>>,
    /// Bumped by `reset`, under the state lock
    epoch: AtomicU64,
    _schema: PhantomData<fn() -> S>,
}

/// Returns an initializing wizard to idle when the load fails or is dropped
struct InitializingGuard<'a, S: FormSchema> {
    wizard: &'a Wizard<S>,
    epoch: u64,
    armed: bool,
}

impl<S: FormSchema> InitializingGuard<'_, S> {
    /// Install the loaded form; false when a reset superseded the load
    fn commit(mut self, target: S::Target, form_data: S::Draft) -> bool {
        self.armed = false;
        let mut state = self.wizard.lock();
        if !self.wizard.is_current(self.epoch)
            || !matches!(*state, WizardState::NotInitialized { is_initializing: true })
        {
            return false;
        }
        *state = WizardState::Ready(ReadyState {
            step: 1,
            form_data,
            is_submitting: false,
            target,
        });
        true
    }
}

impl<S: FormSchema> Drop for InitializingGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.wizard.lock();
        if self.wizard.is_current(self.epoch)
            && matches!(*state, WizardState::NotInitialized { is_initializing: true })
        {
            *state = WizardState::NotInitialized {
                is_initializing: false,
            };
        }
    }
}

/// Guard, target and payload of a started submission
type Submission<'a, S> = (
    SubmittingGuard<'a, S>,
    <S as FormSchema>::Target,
    <S as FormSchema>::Payload,
);

/// Clears `is_submitting` when the persist fails or is dropped
struct SubmittingGuard<'a, S: FormSchema> {
    wizard: &'a Wizard<S>,
    epoch: u64,
    armed: bool,
}

impl<S: FormSchema> SubmittingGuard<'_, S> {
    /// The form was persisted: back to idle unless a reset came first
    fn commit(mut self) {
        self.armed = false;
        let mut state = self.wizard.lock();
        if self.wizard.is_current(self.epoch) {
            *state = WizardState::NotInitialized {
                is_initializing: false,
            };
        }
    }
}

impl<S: FormSchema> Drop for SubmittingGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if !self.wizard.is_current(self.epoch) {
            return;
        }
        if let WizardState::Ready(ready) = &mut *self.wizard.lock() {
            ready.is_submitting = false;
        }
    }
}

impl<S: FormSchema> Default for Wizard<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FormSchema> Wizard<S> {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: Mutex::new(WizardState::NotInitialized {
                is_initializing: false,
            }),
            epoch: AtomicU64::new(0),
            _schema: PhantomData,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn lock(&self) -> MutexGuard<'_, WizardState<S>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    pub fn state(&self) -> WizardState<S> {
        self.lock().clone()
    }

    pub fn step(&self) -> Option<u8> {
        self.lock().step()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(&*self.lock(), WizardState::Ready(ready) if ready.is_submitting)
    }

    /// Accumulated draft, when ready
    pub fn form_data(&self) -> Option<S::Draft> {
        match &*self.lock() {
            WizardState::Ready(ready) => Some(ready.form_data.clone()),
            WizardState::NotInitialized { .. } => None,
        }
    }

    fn not_ready(&self, operation: &str, state: &WizardState<S>) -> SillError {
        SillError::precondition(format!(
            "{} form: cannot {} while {}",
            S::NAME,
            operation,
            state.description()
        ))
    }

    /// Load the form; returns `Ok(false)` without calling the API when the
    /// wizard is already ready or initializing, and also when a `reset`
    /// arrived while the load was in flight
    #[instrument(name = "form.initialize", skip_all, fields(form = S::NAME, session = %self.session_id))]
    pub async fn initialize(&self, api: &dyn SillApi, params: S::Params) -> Result<bool> {
        let guard = {
            let mut state = self.lock();
            if !matches!(*state, WizardState::NotInitialized { is_initializing: false }) {
                debug!(state = state.description(), "initialization skipped");
                return Ok(false);
            }
            *state = WizardState::NotInitialized {
                is_initializing: true,
            };
            InitializingGuard {
                wizard: self,
                epoch: self.epoch.load(Ordering::SeqCst),
                armed: true,
            }
        };

        match S::load(api, params).await {
            Ok((target, form_data)) => {
                debug!(?target, "form loaded");
                let installed = guard.commit(target, form_data);
                if !installed {
                    debug!("form reset during load, draft dropped");
                }
                Ok(installed)
            }
            Err(e) => {
                warn!(error = %e, "form initialization failed");
                Err(e)
            }
        }
    }

    /// Record the data of the current step and move to the next one
    ///
    /// Data for any other step than the current one, or for the final step,
    /// is a precondition error; invalid data is a validation error. Neither
    /// changes the state.
    pub fn advance_step(&self, data: S::Step) -> Result<u8> {
        let mut state = self.lock();
        let ready = match &mut *state {
            WizardState::Ready(ready) if !ready.is_submitting => ready,
            other => return Err(self.not_ready("advance", other)),
        };

        let step = S::step_number(&data);
        if step != ready.step {
            return Err(SillError::precondition(format!(
                "{} form: got data for step {} while on step {}",
                S::NAME,
                step,
                ready.step
            )));
        }
        if step >= S::STEP_COUNT {
            return Err(SillError::precondition(format!(
                "{} form: step {} is final and must be submitted",
                S::NAME,
                step
            )));
        }
        S::validate(&data)?;

        S::merge(&mut ready.form_data, data);
        ready.step += 1;
        debug!(form = S::NAME, step = ready.step, "step advanced");
        Ok(ready.step)
    }

    /// Go back one step; the draft keeps every entered step
    pub fn return_to_previous_step(&self) -> Result<u8> {
        let mut state = self.lock();
        match &mut *state {
            WizardState::Ready(ready) if !ready.is_submitting && ready.step > 1 => {
                ready.step -= 1;
                Ok(ready.step)
            }
            WizardState::Ready(ready) if ready.step <= 1 => Err(SillError::precondition(format!(
                "{} form: already on the first step",
                S::NAME
            ))),
            other => Err(self.not_ready("return to previous step", other)),
        }
    }

    /// Mark the wizard as submitting and build the payload
    ///
    /// `Ok(None)` when a submission is already in flight.
    fn start_submission(&self, data: S::Step) -> Result<Option<Submission<'_, S>>> {
        let mut state = self.lock();
        let ready = match &mut *state {
            WizardState::Ready(ready) => ready,
            other => return Err(self.not_ready("submit", other)),
        };
        if ready.is_submitting {
            return Ok(None);
        }

        let step = S::step_number(&data);
        if ready.step != S::STEP_COUNT || step != S::STEP_COUNT {
            return Err(SillError::precondition(format!(
                "{} form: submit needs step {} data on step {}, got step {} on step {}",
                S::NAME,
                S::STEP_COUNT,
                S::STEP_COUNT,
                step,
                ready.step
            )));
        }
        S::validate(&data)?;

        let mut form_data = ready.form_data.clone();
        S::merge(&mut form_data, data);
        let payload = S::complete(&ready.target, &form_data)?;

        ready.form_data = form_data;
        ready.is_submitting = true;
        let guard = SubmittingGuard {
            wizard: self,
            epoch: self.epoch.load(Ordering::SeqCst),
            armed: true,
        };
        Ok(Some((guard, ready.target.clone(), payload)))
    }

    /// Validate the final step, persist the form and reset the wizard
    ///
    /// A second call while the first is in flight returns
    /// [`SubmitOutcome::AlreadySubmitting`] without reaching the API. A failed
    /// or dropped persist clears `is_submitting` and leaves the draft in place.
    #[instrument(name = "form.submit", skip_all, fields(form = S::NAME, session = %self.session_id))]
    pub async fn submit(&self, api: &dyn SillApi, data: S::Step) -> Result<SubmitOutcome> {
        let (guard, target, payload) = match self.start_submission(data)? {
            Some(submission) => submission,
            None => {
                debug!("submission already in flight");
                return Ok(SubmitOutcome::AlreadySubmitting);
            }
        };

        match S::persist(api, &target, payload).await {
            Ok(software_name) => {
                info!(software = %software_name, "form submitted");
                guard.commit();
                Ok(SubmitOutcome::Submitted(Redirect { software_name }))
            }
            Err(e) => {
                warn!(error = %e, "form submission failed");
                Err(e)
            }
        }
    }

    /// Drop the draft (form left without submitting); pending loads and
    /// submissions no longer write back
    pub fn reset(&self) {
        let mut state = self.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *state = WizardState::NotInitialized {
            is_initializing: false,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingApi;
    use std::sync::Arc;
    use std::time::Duration;

    /// Three free-text steps
    struct NotesSchema;

    #[derive(Debug, Clone, Default)]
    struct NotesDraft([Option<String>; 3]);

    #[async_trait]
    impl FormSchema for NotesSchema {
        const NAME: &'static str = "notes";
        const STEP_COUNT: u8 = 3;
        type Params = Option<&'static str>;
        type Target = ();
        type Step = (u8, String);
        type Draft = NotesDraft;
        type Payload = String;

        fn step_number(step: &Self::Step) -> u8 {
            step.0
        }

        fn validate(step: &Self::Step) -> Result<()> {
            crate::validation::require_text("note", &step.1)
        }

        fn merge(draft: &mut Self::Draft, step: Self::Step) {
            draft.0[(step.0 - 1) as usize] = Some(step.1);
        }

        fn complete(_target: &(), draft: &Self::Draft) -> Result<String> {
            let parts = draft
                .0
                .iter()
                .enumerate()
                .map(|(i, note)| {
                    note.clone()
                        .ok_or_else(|| SillError::precondition(format!("step {} missing", i + 1)))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(parts.join("/"))
        }

        async fn load(api: &dyn SillApi, params: Self::Params) -> Result<((), NotesDraft)> {
            match params {
                Some("missing") => Err(SillError::not_found("note", "missing")),
                Some("remote") => {
                    let found = api.search_external_entity("remote").await?;
                    let first = found.first().map(|e| e.label.clone());
                    Ok(((), NotesDraft([first, None, None])))
                }
                Some(first) => Ok(((), NotesDraft([Some(first.to_string()), None, None]))),
                None => Ok(((), NotesDraft::default())),
            }
        }

        async fn persist(api: &dyn SillApi, _target: &(), payload: String) -> Result<String> {
            api.search_external_entity(&payload).await?;
            Ok(payload)
        }
    }

    fn note(step: u8, text: &str) -> (u8, String) {
        (step, text.to_string())
    }

    async fn ready_wizard(api: &RecordingApi) -> Wizard<NotesSchema> {
        let wizard = Wizard::new();
        assert!(wizard.initialize(api, None).await.unwrap());
        wizard
    }

    #[tokio::test]
    async fn test_advance_before_initialize_rejected() {
        let wizard: Wizard<NotesSchema> = Wizard::new();
        let err = wizard.advance_step(note(1, "a")).unwrap_err();
        assert!(err.is_programming_error());
        assert_eq!(wizard.step(), None);
    }

    #[tokio::test]
    async fn test_step_monotonicity() {
        let api = RecordingApi::new();
        let wizard = ready_wizard(&api).await;
        assert_eq!(wizard.step(), Some(1));

        assert!(wizard.return_to_previous_step().is_err());
        assert_eq!(wizard.step(), Some(1));

        assert_eq!(wizard.advance_step(note(1, "a")).unwrap(), 2);
        assert_eq!(wizard.form_data().unwrap().0[0].as_deref(), Some("a"));

        // out of order data is a programming error and changes nothing
        assert!(wizard.advance_step(note(1, "again")).unwrap_err().is_programming_error());
        assert_eq!(wizard.step(), Some(2));

        assert_eq!(wizard.return_to_previous_step().unwrap(), 1);
        assert_eq!(wizard.form_data().unwrap().0[0].as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_invalid_step_data_keeps_step() {
        let api = RecordingApi::new();
        let wizard = ready_wizard(&api).await;
        let err = wizard.advance_step(note(1, " ")).unwrap_err();
        assert!(matches!(err, SillError::Validation { field: "note", .. }));
        assert_eq!(wizard.step(), Some(1));
    }

    #[tokio::test]
    async fn test_final_step_cannot_be_advanced() {
        let api = RecordingApi::new();
        let wizard = ready_wizard(&api).await;
        wizard.advance_step(note(1, "a")).unwrap();
        wizard.advance_step(note(2, "b")).unwrap();
        assert!(wizard.advance_step(note(3, "c")).is_err());
        assert_eq!(wizard.step(), Some(3));
    }

    #[tokio::test]
    async fn test_submit_resets_and_redirects() {
        let api = RecordingApi::new();
        let wizard = ready_wizard(&api).await;
        wizard.advance_step(note(1, "a")).unwrap();
        wizard.advance_step(note(2, "b")).unwrap();

        let outcome = wizard.submit(&api, note(3, "c")).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Submitted(Redirect {
                software_name: "a/b/c".into()
            })
        );
        assert!(matches!(
            wizard.state(),
            WizardState::NotInitialized { is_initializing: false }
        ));

        // reusable after the cycle
        assert!(wizard.initialize(&api, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_before_final_step_rejected() {
        let api = RecordingApi::new();
        let wizard = ready_wizard(&api).await;
        wizard.advance_step(note(1, "a")).unwrap();
        let err = wizard.submit(&api, note(3, "c")).await.unwrap_err();
        assert!(err.is_programming_error());
        assert_eq!(api.search_count(), 0);
        assert!(!wizard.is_submitting());
    }

    #[tokio::test]
    async fn test_double_submit_sends_once() {
        let api = Arc::new(RecordingApi::gated());
        let wizard = Arc::new(ready_wizard(&api).await);
        wizard.advance_step(note(1, "a")).unwrap();
        wizard.advance_step(note(2, "b")).unwrap();

        let first = {
            let (api, wizard) = (Arc::clone(&api), Arc::clone(&wizard));
            tokio::spawn(async move { wizard.submit(api.as_ref(), note(3, "c")).await })
        };
        api.wait_for_call().await;
        assert!(wizard.is_submitting());

        let second = wizard.submit(api.as_ref(), note(3, "c")).await.unwrap();
        assert_eq!(second, SubmitOutcome::AlreadySubmitting);

        api.release();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, SubmitOutcome::Submitted(_)));
        assert_eq!(api.search_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_submit_clears_flag() {
        let api = RecordingApi::failing();
        let wizard = ready_wizard(&api).await;
        wizard.advance_step(note(1, "a")).unwrap();
        wizard.advance_step(note(2, "b")).unwrap();

        assert!(matches!(
            wizard.submit(&api, note(3, "c")).await,
            Err(SillError::Api(_))
        ));
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.step(), Some(3));
        assert_eq!(wizard.form_data().unwrap().0[2].as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_initialize_guard_and_failure() {
        let api = RecordingApi::new();
        let wizard: Wizard<NotesSchema> = Wizard::new();

        assert!(matches!(
            wizard.initialize(&api, Some("missing")).await,
            Err(SillError::NotFound { .. })
        ));
        assert!(matches!(
            wizard.state(),
            WizardState::NotInitialized { is_initializing: false }
        ));

        assert!(wizard.initialize(&api, Some("draft")).await.unwrap());
        assert!(!wizard.initialize(&api, None).await.unwrap());
        assert_eq!(wizard.form_data().unwrap().0[0].as_deref(), Some("draft"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submit_clears_flag() {
        let api = RecordingApi::gated();
        let wizard = ready_wizard(&api).await;
        wizard.advance_step(note(1, "a")).unwrap();
        wizard.advance_step(note(2, "b")).unwrap();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), wizard.submit(&api, note(3, "c"))).await;
        assert!(timed_out.is_err());
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.step(), Some(3));

        api.release();
        let outcome = wizard.submit(&api, note(3, "c")).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
        assert_eq!(api.search_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_initialize_can_be_retried() {
        let api = RecordingApi::gated();
        let wizard: Wizard<NotesSchema> = Wizard::new();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            wizard.initialize(&api, Some("remote")),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(matches!(
            wizard.state(),
            WizardState::NotInitialized { is_initializing: false }
        ));

        assert!(wizard.initialize(&api, None).await.unwrap());
        assert_eq!(wizard.step(), Some(1));
    }

    #[tokio::test]
    async fn test_reset_during_initialize_discards_load() {
        let api = Arc::new(RecordingApi::gated());
        let wizard: Arc<Wizard<NotesSchema>> = Arc::new(Wizard::new());
        let pending = {
            let (api, wizard) = (Arc::clone(&api), Arc::clone(&wizard));
            tokio::spawn(async move { wizard.initialize(api.as_ref(), Some("remote")).await })
        };
        api.wait_for_call().await;
        assert_eq!(wizard.state().description(), "initializing");

        wizard.reset();
        api.release();
        assert!(!pending.await.unwrap().unwrap());
        assert!(matches!(
            wizard.state(),
            WizardState::NotInitialized { is_initializing: false }
        ));
    }

    #[tokio::test]
    async fn test_reset_during_submit_keeps_new_session() {
        let api = Arc::new(RecordingApi::gated());
        let wizard = Arc::new(ready_wizard(&api).await);
        wizard.advance_step(note(1, "a")).unwrap();
        wizard.advance_step(note(2, "b")).unwrap();

        let pending = {
            let (api, wizard) = (Arc::clone(&api), Arc::clone(&wizard));
            tokio::spawn(async move { wizard.submit(api.as_ref(), note(3, "c")).await })
        };
        api.wait_for_call().await;

        wizard.reset();
        assert!(wizard.initialize(api.as_ref(), None).await.unwrap());
        wizard.advance_step(note(1, "fresh")).unwrap();

        api.release();
        assert!(matches!(
            pending.await.unwrap().unwrap(),
            SubmitOutcome::Submitted(_)
        ));
        assert_eq!(wizard.step(), Some(2));
        assert_eq!(wizard.form_data().unwrap().0[0].as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_stale_failed_submit_leaves_new_submission() {
        let api = Arc::new(RecordingApi::gated_failing());
        let wizard = Arc::new(ready_wizard(&api).await);
        wizard.advance_step(note(1, "a")).unwrap();
        wizard.advance_step(note(2, "b")).unwrap();

        let stale = {
            let (api, wizard) = (Arc::clone(&api), Arc::clone(&wizard));
            tokio::spawn(async move { wizard.submit(api.as_ref(), note(3, "c")).await })
        };
        api.wait_for_call().await;

        wizard.reset();
        assert!(wizard.initialize(api.as_ref(), None).await.unwrap());
        wizard.advance_step(note(1, "x")).unwrap();
        wizard.advance_step(note(2, "y")).unwrap();
        let current = {
            let (api, wizard) = (Arc::clone(&api), Arc::clone(&wizard));
            tokio::spawn(async move { wizard.submit(api.as_ref(), note(3, "z")).await })
        };
        api.wait_for_call().await;

        // waiters are released in arrival order: the stale submission fails first
        api.release();
        assert!(stale.await.unwrap().is_err());
        assert!(wizard.is_submitting());

        api.release();
        assert!(current.await.unwrap().is_err());
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.form_data().unwrap().0[2].as_deref(), Some("z"));
    }
}
