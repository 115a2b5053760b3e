#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pilot_drivers::automation::{
    Ack, ActionChannel, Delay, DriverError, FocusedInput, Intent, RemotePage,
};

/// Every collaborator call, in the order the driver made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CurrentValue(String),
    IsSelected(String, bool),
    Submit(Intent),
    SelectAll,
    DeleteSelection,
    Wait(u64),
}

#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<Call>>>);

impl Log {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Submit(Intent::Click(_))))
            .count()
    }

    pub fn mutations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Submit(_) | Call::SelectAll | Call::DeleteSelection))
            .count()
    }
}

/// Page whose field value and focus answers are scripted up front.
pub struct ScriptedPage {
    log: Log,
    values: Mutex<VecDeque<Result<Option<String>, String>>>,
    focus: Mutex<VecDeque<bool>>,
    focus_fallback: bool,
    broken: Option<Broken>,
}

/// Page operation that answers with a remote error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broken {
    FocusQuery,
    SelectAll,
    DeleteSelection,
}

impl ScriptedPage {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            values: Mutex::new(VecDeque::new()),
            focus: Mutex::new(VecDeque::new()),
            focus_fallback: true,
            broken: None,
        }
    }

    /// Answer the next `current_value` read with `value`.
    pub fn value(self, value: Option<&str>) -> Self {
        self.values
            .lock()
            .unwrap()
            .push_back(Ok(value.map(str::to_string)));
        self
    }

    /// Fail the next `current_value` read with a lookup error.
    pub fn missing(self) -> Self {
        self.values.lock().unwrap().push_back(Err("lookup".into()));
        self
    }

    /// Report unfocused for the next `n` polls, focused afterwards.
    pub fn unfocused_for(self, n: usize) -> Self {
        self.focus.lock().unwrap().extend(std::iter::repeat(false).take(n));
        self
    }

    /// Never report focus.
    pub fn never_focused(mut self) -> Self {
        self.focus_fallback = false;
        self
    }

    /// Fail every call of `op` with a remote error.
    pub fn breaking(mut self, op: Broken) -> Self {
        self.broken = Some(op);
        self
    }

    fn check(&self, op: Broken) -> Result<(), DriverError> {
        if self.broken == Some(op) {
            return Err(DriverError::Remote(format!("{op:?} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemotePage for ScriptedPage {
    async fn current_value(&self, selector: &str) -> Result<Option<String>, DriverError> {
        self.log.push(Call::CurrentValue(selector.to_string()));
        match self.values.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(_)) => Err(DriverError::lookup(selector)),
            None => Ok(None),
        }
    }

    async fn is_selected(&self, selector: &str) -> Result<bool, DriverError> {
        self.check(Broken::FocusQuery)?;
        let answer = self
            .focus
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.focus_fallback);
        self.log.push(Call::IsSelected(selector.to_string(), answer));
        Ok(answer)
    }

    fn focused(&self) -> &dyn FocusedInput {
        self
    }
}

#[async_trait]
impl FocusedInput for ScriptedPage {
    async fn select_all(&self) -> Result<(), DriverError> {
        self.log.push(Call::SelectAll);
        self.check(Broken::SelectAll)
    }

    async fn delete_selection(&self) -> Result<(), DriverError> {
        self.log.push(Call::DeleteSelection);
        self.check(Broken::DeleteSelection)
    }
}

/// Channel that records intents and optionally rejects clicks or typing.
pub struct RecordingChannel {
    log: Log,
    reject_clicks: bool,
    reject_types: bool,
}

impl RecordingChannel {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            reject_clicks: false,
            reject_types: false,
        }
    }

    pub fn rejecting_types(log: &Log) -> Self {
        Self {
            reject_types: true,
            ..Self::new(log)
        }
    }

    pub fn rejecting_clicks(log: &Log) -> Self {
        Self {
            reject_clicks: true,
            ..Self::new(log)
        }
    }
}

#[async_trait]
impl ActionChannel for RecordingChannel {
    async fn submit(&self, intent: Intent) -> Result<Ack, DriverError> {
        self.log.push(Call::Submit(intent.clone()));
        let rejection = match intent {
            Intent::Click(_) if self.reject_clicks => Some("element not interactable"),
            Intent::Type(_) if self.reject_types => Some("keyboard unavailable"),
            _ => None,
        };
        match rejection {
            Some(reason) => Err(DriverError::channel(intent, reason)),
            None => Ok(Ack),
        }
    }
}

/// Delay that records the requested duration and returns at once.
pub struct RecordingDelay {
    log: Log,
}

impl RecordingDelay {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.log.push(Call::Wait(duration.as_millis() as u64));
    }
}

pub fn click(selector: &str) -> Call {
    Call::Submit(Intent::Click(selector.to_string()))
}

pub fn type_text(text: &str) -> Call {
    Call::Submit(Intent::Type(text.to_string()))
}

pub fn polled(selector: &str, focused: bool) -> Call {
    Call::IsSelected(selector.to_string(), focused)
}
