#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use activity_roster::{BackendError, RosterBackend};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    Reject(u16, String),
    Unreachable,
}

impl Reply {
    fn into_result(self) -> Result<String, BackendError> {
        match self {
            Reply::Ok(message) => Ok(message),
            Reply::Reject(status, detail) => Err(BackendError::Rejected { status, detail }),
            Reply::Unreachable => Err(BackendError::Decode("connection refused".to_string())),
        }
    }
}

struct Inner {
    activities: Mutex<Option<Value>>,
    loose: Mutex<Value>,
    card_reply: Mutex<Reply>,
    form_reply: Mutex<Reply>,
    remove_reply: Mutex<Reply>,
    card_calls: AtomicUsize,
    form_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    signup_urls: Mutex<Vec<String>>,
}

/// In-process stand-in for the REST backend. Clones share state so tests
/// can inspect calls after handing one copy to the controller.
#[derive(Clone)]
pub struct FakeBackend {
    inner: Arc<Inner>,
}

impl FakeBackend {
    pub fn new(activities: Value) -> Self {
        Self {
            inner: Arc::new(Inner {
                activities: Mutex::new(Some(activities)),
                loose: Mutex::new(json!([])),
                card_reply: Mutex::new(Reply::Ok(String::new())),
                form_reply: Mutex::new(Reply::Ok("Signed up".to_string())),
                remove_reply: Mutex::new(Reply::Ok("Removed".to_string())),
                card_calls: AtomicUsize::new(0),
                form_calls: AtomicUsize::new(0),
                remove_calls: AtomicUsize::new(0),
                signup_urls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn with_loose(self, loose: Value) -> Self {
        *self.inner.loose.lock().unwrap() = loose;
        self
    }

    pub fn failing_load(self) -> Self {
        *self.inner.activities.lock().unwrap() = None;
        self
    }

    pub fn set_card_reply(&self, reply: Reply) {
        *self.inner.card_reply.lock().unwrap() = reply;
    }

    pub fn set_form_reply(&self, reply: Reply) {
        *self.inner.form_reply.lock().unwrap() = reply;
    }

    pub fn set_remove_reply(&self, reply: Reply) {
        *self.inner.remove_reply.lock().unwrap() = reply;
    }

    pub fn card_calls(&self) -> usize {
        self.inner.card_calls.load(Ordering::SeqCst)
    }

    pub fn form_calls(&self) -> usize {
        self.inner.form_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.inner.remove_calls.load(Ordering::SeqCst)
    }

    pub fn signup_urls(&self) -> Vec<String> {
        self.inner.signup_urls.lock().unwrap().clone()
    }
}

impl RosterBackend for FakeBackend {
    async fn fetch_activities(&self) -> Result<Map<String, Value>, BackendError> {
        let activities = self.inner.activities.lock().unwrap().clone();
        match activities {
            Some(Value::Object(map)) => Ok(map),
            Some(_) => Ok(Map::new()),
            None => Err(BackendError::Rejected {
                status: 503,
                detail: "Service Unavailable".to_string(),
            }),
        }
    }

    async fn fetch_loose_activities(&self) -> Result<Value, BackendError> {
        Ok(self.inner.loose.lock().unwrap().clone())
    }

    async fn signup_by_email(&self, _activity: &str, _email: &str) -> Result<String, BackendError> {
        self.inner.form_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.inner.form_reply.lock().unwrap().clone();
        reply.into_result()
    }

    async fn signup_by_id(&self, signup_url: &str, _activity_id: &str) -> Result<(), BackendError> {
        self.inner.card_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .signup_urls
            .lock()
            .unwrap()
            .push(signup_url.to_string());
        // Stay in flight for a few polls so concurrent clicks can interleave.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        let reply = self.inner.card_reply.lock().unwrap().clone();
        reply.into_result().map(|_| ())
    }

    async fn remove_participant(&self, _activity: &str, _email: &str) -> Result<String, BackendError> {
        self.inner.remove_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.inner.remove_reply.lock().unwrap().clone();
        reply.into_result()
    }
}

pub fn school_activities() -> Value {
    json!({
        "Chess Club": {
            "description": "Learn strategies and compete in chess tournaments",
            "schedule": "Fridays, 3:30 PM - 5:00 PM",
            "max_participants": 12,
            "participants": ["michael@mergington.edu", "daniel@mergington.edu"]
        },
        "Art Studio": {
            "description": "Explore painting, drawing, and sculpture",
            "schedule": "Fridays, 3:30 PM - 5:00 PM",
            "max_participants": 2,
            "participants": ["a@x.com"]
        },
        "Robotics Club": {
            "description": "Design and build robots for competitions",
            "schedule": "Mondays and Fridays, 3:30 PM - 5:00 PM",
            "max_participants": 1,
            "participants": ["ethan@mergington.edu"]
        }
    })
}
