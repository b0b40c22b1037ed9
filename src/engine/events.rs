//! Append-only event log shared by a run.

use strum::{Display, EnumIter, IntoEnumIterator};

/// Category of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum EventKind {
    /// A heuristic resolved a runtime fact.
    #[strum(serialize = "fact-resolved")]
    FactResolved,
    /// A heuristic matched but its extraction failed.
    #[strum(serialize = "heuristic-failed")]
    HeuristicFailed,
    /// Advice was woven into a method.
    #[strum(serialize = "advice-woven")]
    AdviceWoven,
    /// A produced edit was dropped before weaving.
    #[strum(serialize = "transform-dropped")]
    TransformDropped,
    /// A module declined or failed on a class it applied to.
    #[strum(serialize = "module-skipped")]
    ModuleSkipped,
    /// A class was synthesized from resolved facts.
    #[strum(serialize = "class-synthesized")]
    ClassSynthesized,
    /// Informational note.
    #[strum(serialize = "info")]
    Info,
    /// Something unexpected that did not stop the run.
    #[strum(serialize = "warning")]
    Warning,
    /// A contained failure.
    #[strum(serialize = "error")]
    Error,
}

/// One recorded event, with the class it concerns when there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event category.
    pub kind: EventKind,
    /// Internal name of the class involved, if any.
    pub class: Option<String>,
    /// Free-form description.
    pub message: String,
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.class {
            Some(class) => write!(f, "[{}] {}: {}", self.kind, class, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Lock-free, append-only log of what happened during a run.
///
/// Every component of a run reports into the same log, from any thread, without
/// coordination. Entries keep their insertion order and are never dropped; the log is a
/// diagnostic record, not a control channel.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: boxcar::Vec<Event>,
}

impl EventLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event without class context.
    pub fn record(&self, kind: EventKind, message: impl Into<String>) {
        self.entries.push(Event {
            kind,
            class: None,
            message: message.into(),
        });
    }

    /// Record an event concerning a class.
    pub fn record_for(&self, kind: EventKind, class: &str, message: impl Into<String>) {
        self.entries.push(Event {
            kind,
            class: Some(class.to_string()),
            message: message.into(),
        });
    }

    /// Record an informational note.
    pub fn info(&self, message: impl Into<String>) {
        self.record(EventKind::Info, message);
    }

    /// Record a warning.
    pub fn warn(&self, message: impl Into<String>) {
        self.record(EventKind::Warning, message);
    }

    /// Record a contained failure.
    pub fn error(&self, message: impl Into<String>) {
        self.record(EventKind::Error, message);
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter().map(|(_, event)| event)
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of events of the given kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.iter().filter(|event| event.kind == kind).count()
    }

    /// One-line digest of event counts by kind, in a fixed kind order.
    #[must_use]
    pub fn summary(&self) -> String {
        let parts: Vec<String> = EventKind::iter()
            .filter_map(|kind| {
                let count = self.count(kind);
                (count > 0).then(|| format!("{count} {kind}"))
            })
            .collect();
        if parts.is_empty() {
            "no events".to_string()
        } else {
            parts.join(", ")
        }
    }
}
