use std::collections::HashMap;

use askama::Template;

use crate::models::{CapacitySnapshot, ControlPhase, MessageBanner, SignupControlState, SignupForm};
use crate::services::roster_service::{Roster, RosterEntry};

/// Escapes `& < > " '` to entities. `&` is handled in the same single pass,
/// so existing entities are escaped again rather than passed through.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

mod filters {
    pub fn escape_html<T: std::fmt::Display>(s: T) -> ::askama::Result<String> {
        Ok(super::escape_html(&s.to_string()))
    }

    pub fn urlencode_segment<T: std::fmt::Display>(s: T) -> ::askama::Result<String> {
        Ok(urlencoding::encode(&s.to_string()).into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonLabels {
    pub signup_text: String,
    pub full_text: String,
    pub processing_text: String,
    pub signed_text: String,
    pub error_text: String,
}

impl Default for ButtonLabels {
    fn default() -> Self {
        Self {
            signup_text: "Sign up".to_string(),
            full_text: "Full".to_string(),
            processing_text: "Processing...".to_string(),
            signed_text: "Signed".to_string(),
            error_text: "Could not complete signup. Please try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub disabled: bool,
    pub processing: bool,
    pub signed: bool,
    pub full: bool,
    pub label: String,
}

impl ButtonView {
    pub fn class_list(&self) -> String {
        let mut class = String::from("signup-btn");
        if self.full {
            class.push_str(" full");
        }
        if self.signed {
            class.push_str(" signed");
        }
        class
    }
}

/// View state of one rendered activity card: the mirrored counts and the
/// signup button. The roster stays the source of truth; the controller
/// patches this view after every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub activity_id: String,
    pub capacity: Option<i64>,
    pub registered: Option<i64>,
    pub button: ButtonView,
    pub error_notice: Option<String>,
    saved_label: Option<String>,
}

impl CardView {
    pub fn new(state: &SignupControlState, labels: &ButtonLabels) -> Self {
        let signed = state.phase == ControlPhase::Signed;
        Self {
            activity_id: state.activity_id.clone(),
            capacity: Some(state.capacity),
            registered: Some(state.registered),
            button: ButtonView {
                disabled: signed,
                processing: false,
                signed,
                full: false,
                label: if signed {
                    labels.signed_text.clone()
                } else {
                    labels.signup_text.clone()
                },
            },
            error_notice: None,
            saved_label: None,
        }
    }

    pub fn accepts_click(&self) -> bool {
        !self.button.disabled && !self.button.processing && !self.button.signed
    }

    pub fn begin_processing(&mut self, labels: &ButtonLabels) {
        self.saved_label = Some(self.button.label.clone());
        self.error_notice = None;
        self.button.processing = true;
        self.button.disabled = true;
        self.button.label = labels.processing_text.clone();
    }

    pub fn mark_full(&mut self, labels: &ButtonLabels) {
        self.button.processing = false;
        self.button.disabled = true;
        self.button.full = true;
        self.button.label = labels.full_text.clone();
    }

    pub fn mark_signed(&mut self, labels: &ButtonLabels) {
        self.button.processing = false;
        self.button.disabled = true;
        self.button.signed = true;
        self.button.label = labels.signed_text.clone();
    }

    pub fn mirror_counts(&mut self, snapshot: CapacitySnapshot) {
        self.capacity = Some(snapshot.capacity);
        self.registered = Some(snapshot.registered);
    }

    /// Reverts a failed attempt to the label shown before the click.
    pub fn restore(&mut self, notice: impl Into<String>) {
        self.button.processing = false;
        self.button.disabled = false;
        if let Some(label) = self.saved_label.take() {
            self.button.label = label;
        }
        self.error_notice = Some(notice.into());
    }
}

/// Pushes fresh counts into a card and re-derives the button.
///
/// A full activity always disables the button and shows the full label.
/// Otherwise the button is only re-enabled when it has not been signed;
/// signed is sticky for the session.
pub fn update_activity_ui(card: &mut CardView, snapshot: CapacitySnapshot, labels: &ButtonLabels) {
    card.mirror_counts(snapshot);

    if snapshot.registered >= snapshot.capacity {
        card.button.disabled = true;
        card.button.full = true;
        card.button.label = labels.full_text.clone();
    } else if !card.button.signed {
        card.button.disabled = false;
        card.button.full = false;
        card.button.label = labels.signup_text.clone();
    }
}

/// Everything a page render needs, borrowed from the controller state.
pub struct PageView<'a> {
    pub roster: &'a Roster,
    pub cards: &'a HashMap<String, CardView>,
    pub banner: &'a MessageBanner,
    pub form: &'a SignupForm,
    pub load_error: Option<&'a str>,
}

/// Turns roster entries into HTML. Chosen once at startup and handed to the
/// controller.
pub trait RenderStrategy: Send + Sync {
    fn render_card(&self, entry: &RosterEntry, card: &CardView) -> askama::Result<String>;

    fn render_page(&self, page: &PageView<'_>) -> askama::Result<String>;
}

#[derive(Template)]
#[template(path = "activity_card.html", escape = "none")]
struct ActivityCardTemplate<'a> {
    activity_id: &'a str,
    title: &'a str,
    description: &'a str,
    schedule: &'a str,
    capacity: i64,
    registered: i64,
    spots_left: i64,
    participants: &'a [String],
    button: &'a ButtonView,
    button_class: String,
    error_notice: Option<&'a str>,
}

struct ActivityOption<'a> {
    value: &'a str,
    name: &'a str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "activities.html", escape = "none")]
struct ActivitiesPageTemplate<'a> {
    cards: Vec<String>,
    options: Vec<ActivityOption<'a>>,
    form_email: &'a str,
    banner_text: &'a str,
    banner_class: String,
    load_error: Option<&'a str>,
}

/// Default strategy: server-ordered cards with a participants live region.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardRenderer;

impl RenderStrategy for CardRenderer {
    fn render_card(&self, entry: &RosterEntry, card: &CardView) -> askama::Result<String> {
        let snapshot = CapacitySnapshot {
            capacity: card.capacity.unwrap_or(entry.control.capacity),
            registered: card.registered.unwrap_or(entry.control.registered),
        };
        ActivityCardTemplate {
            activity_id: &entry.record.id,
            title: &entry.record.title,
            description: &entry.record.description,
            schedule: &entry.record.schedule,
            capacity: snapshot.capacity,
            registered: snapshot.registered,
            spots_left: snapshot.spots_left(),
            participants: &entry.record.participants,
            button: &card.button,
            button_class: card.button.class_list(),
            error_notice: card.error_notice.as_deref(),
        }
        .render()
    }

    fn render_page(&self, page: &PageView<'_>) -> askama::Result<String> {
        let mut cards = Vec::with_capacity(page.roster.len());
        for entry in page.roster.iter() {
            let Some(card) = page.cards.get(&entry.record.id) else {
                continue;
            };
            cards.push(self.render_card(entry, card)?);
        }
        let options = page
            .roster
            .iter()
            .map(|entry| ActivityOption {
                value: &entry.record.id,
                name: &entry.record.title,
                selected: entry.record.id == page.form.activity.trim(),
            })
            .collect();

        let mut banner_class = page.banner.kind.as_str().to_string();
        if !page.banner.visible {
            banner_class.push_str(" hidden");
        }

        ActivitiesPageTemplate {
            cards,
            options,
            form_email: &page.form.email,
            banner_text: &page.banner.text,
            banner_class,
            load_error: page.load_error,
        }
        .render()
    }
}
