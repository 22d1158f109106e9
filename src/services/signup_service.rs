use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::{RosterSource, SignupSettings};
use crate::models::{
    BannerKind, CapacitySnapshot, ControlPhase, MessageBanner, SignupControlState, SignupForm,
};
use crate::services::backend_service::{BackendError, RosterBackend};
use crate::services::roster_service::Roster;
use crate::services::sanitizer;
use crate::web::render::{update_activity_ui, CardRenderer, CardView, PageView, RenderStrategy};

pub const LOAD_FAILED_TEXT: &str = "Failed to load activities. Please try again later.";
pub const FORM_FAILED_TEXT: &str = "Failed to sign up. Please try again.";
pub const FORM_INCOMPLETE_TEXT: &str = "Please enter an email and select an activity.";

/// Result of one click on a card's signup button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Disabled, in flight or already signed; nothing was sent.
    Ignored,
    UnknownActivity,
    /// Capacity was exhausted before sending; the control is now terminal.
    Full(CapacitySnapshot),
    Signed(CapacitySnapshot),
    /// The request failed and the control went back to idle.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOutcome {
    pub banner: MessageBanner,
    pub reset: bool,
}

// Activity a form submission refers to, resolved against the roster that
// was current when the form arrived.
struct FormTarget {
    id: Option<String>,
    name: String,
    generation: u64,
}

#[derive(Default)]
struct PageState {
    roster: Roster,
    cards: HashMap<String, CardView>,
    form: SignupForm,
    load_error: Option<String>,
    // Bumped on every load; responses started under an older value are stale.
    generation: u64,
}

/// Owns the page session: roster, card views, form and message banner.
///
/// The page lock is never held across a backend call, so a second click on
/// the same control observes `Processing` and is dropped.
pub struct SignupController<B> {
    backend: B,
    settings: SignupSettings,
    renderer: Box<dyn RenderStrategy>,
    page: Mutex<PageState>,
    banner: Arc<Mutex<MessageBanner>>,
}

impl<B: RosterBackend> SignupController<B> {
    pub fn new(backend: B, settings: SignupSettings) -> Self {
        Self::with_renderer(backend, settings, CardRenderer)
    }

    pub fn with_renderer(
        backend: B,
        settings: SignupSettings,
        renderer: impl RenderStrategy + 'static,
    ) -> Self {
        Self {
            backend,
            settings,
            renderer: Box::new(renderer),
            page: Mutex::new(PageState::default()),
            banner: Arc::new(Mutex::new(MessageBanner::default())),
        }
    }

    /// Full reload: refetches the roster and recreates every control.
    pub async fn load(&self) -> Result<usize, BackendError> {
        let fetched = match self.settings.source {
            RosterSource::Activities => self
                .backend
                .fetch_activities()
                .await
                .map(|activities| Roster::init_from_server(&activities)),
            RosterSource::LooseJson => self
                .backend
                .fetch_loose_activities()
                .await
                .map(|raw| Roster::from_loose_records(&sanitizer::clean_many(&raw))),
        };

        let mut page = self.page.lock().await;
        page.generation += 1;
        match fetched {
            Ok(roster) => {
                page.cards = roster
                    .iter()
                    .map(|e| {
                        (
                            e.record.id.clone(),
                            CardView::new(&e.control, &self.settings.labels),
                        )
                    })
                    .collect();
                page.roster = roster;
                page.load_error = None;
                Ok(page.roster.len())
            }
            Err(e) => {
                page.roster = Roster::default();
                page.cards.clear();
                page.load_error = Some(LOAD_FAILED_TEXT.to_string());
                Err(e)
            }
        }
    }

    /// Handles a click on the signup button of `activity_id`.
    pub async fn click(&self, activity_id: &str) -> ClickOutcome {
        let labels = &self.settings.labels;

        let (signup_url, generation) = {
            let mut page = self.page.lock().await;
            let generation = page.generation;
            let PageState { roster, cards, .. } = &mut *page;
            let (Some(card), Some(phase)) = (cards.get_mut(activity_id), roster.phase(activity_id))
            else {
                warn!("Click for unknown activity {:?}", activity_id);
                return ClickOutcome::UnknownActivity;
            };
            if !card.accepts_click() || phase != ControlPhase::Idle {
                info!(
                    "Ignoring click on {:?} while {}",
                    activity_id,
                    phase.as_str()
                );
                return ClickOutcome::Ignored;
            }

            card.begin_processing(labels);
            roster.set_phase(activity_id, ControlPhase::Processing);

            let capacity = roster.capacity_of(activity_id, card.capacity);
            let registered = roster.registered_of(activity_id, card.registered);
            if registered >= capacity {
                card.mark_full(labels);
                roster.set_phase(activity_id, ControlPhase::Full);
                return ClickOutcome::Full(CapacitySnapshot {
                    capacity,
                    registered,
                });
            }

            let url = roster
                .get(activity_id)
                .and_then(|e| e.record.signup_url.clone())
                .unwrap_or_else(|| self.settings.signup_url.clone());
            (url, generation)
        };

        let result = self.backend.signup_by_id(&signup_url, activity_id).await;

        let mut page = self.page.lock().await;
        let stale = page.generation != generation;
        let PageState { roster, cards, .. } = &mut *page;
        let card = match cards.get_mut(activity_id) {
            Some(card) if !stale => card,
            // The roster was reloaded while the request was in flight; the
            // fresh controls already reflect the server.
            _ => {
                info!("Dropping signup response for {:?} after reload", activity_id);
                return match result {
                    Ok(()) => ClickOutcome::Ignored,
                    Err(e) => ClickOutcome::Failed {
                        reason: e.to_string(),
                    },
                };
            }
        };

        match result {
            Ok(()) => {
                card.mark_signed(labels);
                roster.set_phase(activity_id, ControlPhase::Signed);
                match roster.apply_signup_success(activity_id, None) {
                    Some(snapshot) => {
                        update_activity_ui(card, snapshot, labels);
                        ClickOutcome::Signed(snapshot)
                    }
                    None => ClickOutcome::UnknownActivity,
                }
            }
            Err(e) => {
                error!("Signup error for {:?}: {}", activity_id, e);
                card.restore(labels.error_text.clone());
                roster.set_phase(activity_id, ControlPhase::Idle);
                if let Some(snapshot) = roster.snapshot(activity_id).filter(|s| s.is_full()) {
                    card.mark_full(labels);
                    roster.set_phase(activity_id, ControlPhase::Full);
                    update_activity_ui(card, snapshot, labels);
                }
                ClickOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Form-based signup. The form names the activity by id; the backend
    /// is addressed by the activity's title.
    pub async fn submit_form(&self, form: SignupForm) -> FormOutcome {
        let email = form.email.trim().to_string();
        let Some(target) = self.accept_form(form).await else {
            return self.finish_form(BannerKind::Error, FORM_INCOMPLETE_TEXT, false).await;
        };
        if email.is_empty() {
            return self.finish_form(BannerKind::Error, FORM_INCOMPLETE_TEXT, false).await;
        }
        let activity = target.name.clone();

        match self.backend.signup_by_email(&activity, &email).await {
            Ok(message) => {
                self.patch_roster(&target, |roster, id| {
                    roster.apply_signup_success(id, Some(&email))
                })
                .await;
                self.finish_form(BannerKind::Success, message, true).await
            }
            Err(BackendError::Rejected { status, detail }) => {
                warn!("Signup for {:?} rejected ({}): {}", activity, status, detail);
                self.finish_form(BannerKind::Error, detail, false).await
            }
            Err(e) => {
                error!("Error signing up for {:?}: {}", activity, e);
                self.finish_form(BannerKind::Error, FORM_FAILED_TEXT, false).await
            }
        }
    }

    /// Removes `email` from the activity named in the form.
    pub async fn unregister(&self, form: SignupForm) -> FormOutcome {
        let email = form.email.trim().to_string();
        let Some(target) = self.accept_form(form).await else {
            return self.finish_form(BannerKind::Error, FORM_INCOMPLETE_TEXT, false).await;
        };
        if email.is_empty() {
            return self.finish_form(BannerKind::Error, FORM_INCOMPLETE_TEXT, false).await;
        }
        let activity = target.name.clone();

        match self.backend.remove_participant(&activity, &email).await {
            Ok(message) => {
                self.patch_roster(&target, |roster, id| {
                    roster.apply_participant_removed(id, &email)
                })
                .await;
                self.finish_form(BannerKind::Success, message, true).await
            }
            Err(e) => {
                if e.is_rejection() {
                    warn!("Unregister from {:?} rejected: {}", activity, e);
                } else {
                    error!("Error unregistering from {:?}: {}", activity, e);
                }
                let text = match e {
                    BackendError::Rejected { detail, .. } => detail,
                    _ => "Failed to unregister. Please try again.".to_string(),
                };
                self.finish_form(BannerKind::Error, text, false).await
            }
        }
    }

    // Stores the submitted form and resolves its activity. `None` when no
    // activity was selected.
    async fn accept_form(&self, form: SignupForm) -> Option<FormTarget> {
        let key = form.activity.trim().to_string();
        let mut page = self.page.lock().await;
        page.form = form;
        if key.is_empty() {
            return None;
        }
        let generation = page.generation;
        let target = match page.roster.get(&key) {
            Some(entry) => FormTarget {
                id: Some(key),
                name: entry.record.title.clone(),
                generation,
            },
            // Not an id of the current roster: treat it as an activity name.
            None => FormTarget {
                id: page.roster.find_by_title(&key).map(str::to_string),
                name: key,
                generation,
            },
        };
        Some(target)
    }

    // Applies a confirmed roster change and mirrors it into the card. A
    // control that is in flight or full only gets the new counts.
    async fn patch_roster(
        &self,
        target: &FormTarget,
        apply: impl FnOnce(&mut Roster, &str) -> Option<CapacitySnapshot>,
    ) {
        let labels = &self.settings.labels;
        let mut page = self.page.lock().await;
        if page.generation != target.generation {
            info!("Roster reloaded during request for {:?}", target.name);
            return;
        }
        let PageState { roster, cards, .. } = &mut *page;
        let Some(id) = target.id.as_deref() else {
            warn!("Activity {:?} is not in the current roster", target.name);
            return;
        };
        let Some(snapshot) = apply(roster, id) else {
            return;
        };
        let phase = roster.phase(id);
        if let Some(card) = cards.get_mut(id) {
            match phase {
                Some(ControlPhase::Processing | ControlPhase::Full) => card.mirror_counts(snapshot),
                _ => update_activity_ui(card, snapshot, labels),
            }
        }
        if phase == Some(ControlPhase::Idle) && snapshot.is_full() {
            roster.set_phase(id, ControlPhase::Full);
        }
    }

    async fn finish_form(&self, kind: BannerKind, text: impl Into<String>, reset: bool) -> FormOutcome {
        if reset {
            self.page.lock().await.form.reset();
        }
        let banner = self.show_banner(kind, text).await;
        FormOutcome { banner, reset }
    }

    /// Shows the message banner and schedules it to hide after the
    /// configured timeout.
    pub async fn show_banner(&self, kind: BannerKind, text: impl Into<String>) -> MessageBanner {
        let (generation, shown) = {
            let mut banner = self.banner.lock().await;
            let generation = banner.show(kind, text);
            (generation, banner.clone())
        };

        let banner = Arc::clone(&self.banner);
        let timeout = self.settings.message_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            banner.lock().await.hide_if_current(generation);
        });
        shown
    }

    pub async fn banner(&self) -> MessageBanner {
        self.banner.lock().await.clone()
    }

    pub async fn form(&self) -> SignupForm {
        self.page.lock().await.form.clone()
    }

    pub async fn control_state(&self, activity_id: &str) -> Option<SignupControlState> {
        let page = self.page.lock().await;
        page.roster.get(activity_id).map(|e| e.control.clone())
    }

    pub async fn card_view(&self, activity_id: &str) -> Option<CardView> {
        self.page.lock().await.cards.get(activity_id).cloned()
    }

    pub async fn participants(&self, activity_id: &str) -> Option<Vec<String>> {
        let page = self.page.lock().await;
        page.roster
            .get(activity_id)
            .map(|e| e.record.participants.clone())
    }

    pub async fn render_page(&self) -> askama::Result<String> {
        let banner = self.banner().await;
        let page = self.page.lock().await;
        self.renderer.render_page(&PageView {
            roster: &page.roster,
            cards: &page.cards,
            banner: &banner,
            form: &page.form,
            load_error: page.load_error.as_deref(),
        })
    }

    pub async fn render_card(&self, activity_id: &str) -> Option<askama::Result<String>> {
        let page = self.page.lock().await;
        let entry = page.roster.get(activity_id)?;
        let card = page.cards.get(activity_id)?;
        Some(self.renderer.render_card(entry, card))
    }
}
