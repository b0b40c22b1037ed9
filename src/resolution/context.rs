//! Cross-class resolution state.

use dashmap::DashMap;

use crate::classfile::{ClassFile, FieldRef, InvokeKind, MethodRef};
use crate::engine::{EventKind, EventLog};
use crate::resolution::{catalog, FactKey, FactTable, FactValue, Heuristic};
use crate::Result;

/// Shared state of a resolution run: the fact table, the rule set, and the classes
/// retained for revisiting.
///
/// A context is observed with every class a run sees, in whatever order they arrive.
/// Rules whose dependencies are unresolved when their evidence matches do not lose the
/// class: it is retained and rescanned as soon as any new fact lands, so resolution
/// converges to the same table regardless of observation order. All state is internally
/// synchronized and observation may run from several threads at once.
#[derive(Debug)]
pub struct ResolutionContext {
    facts: FactTable,
    heuristics: Vec<Heuristic>,
    retained: DashMap<String, ClassFile>,
    events: EventLog,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionContext {
    /// A context armed with the built-in rule catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_heuristics(catalog::builtin_heuristics())
    }

    /// A context with a custom rule set.
    #[must_use]
    pub fn with_heuristics(heuristics: Vec<Heuristic>) -> Self {
        ResolutionContext {
            facts: FactTable::new(),
            heuristics,
            retained: DashMap::new(),
            events: EventLog::new(),
        }
    }

    /// The fact table.
    #[must_use]
    pub fn facts(&self) -> &FactTable {
        &self.facts
    }

    /// The event log observations report into.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Whether the key has been resolved.
    #[must_use]
    pub fn is_resolved(&self, key: FactKey) -> bool {
        self.facts.contains(key)
    }

    /// Number of classes currently retained for revisiting.
    #[must_use]
    pub fn retained_count(&self) -> usize {
        self.retained.len()
    }

    /// Feed one class through every applicable rule.
    ///
    /// When the scan resolves anything new, retained classes are drained and rescanned
    /// until no further progress is made.
    pub fn observe(&self, class: &ClassFile) {
        let (inserted, revisit) = self.scan(class);
        if inserted > 0 || revisit {
            self.drain_retained();
        }
    }

    fn scan(&self, class: &ClassFile) -> (usize, bool) {
        let mut inserted = 0;
        let mut deferred: Vec<&Heuristic> = Vec::new();
        for heuristic in &self.heuristics {
            if heuristic.is_satisfied(&self.facts) || !heuristic.matches(class) {
                continue;
            }
            if !heuristic.dependencies_met(&self.facts) {
                log::debug!(
                    "deferring {} on {}, dependencies unresolved",
                    heuristic.name(),
                    class.name
                );
                deferred.push(heuristic);
                continue;
            }
            match heuristic.extract(class, self) {
                Ok(found) => {
                    for (key, value) in found {
                        if self.facts.record(key, value.clone()) {
                            log::info!(
                                "resolved {key} = {value} via {} on {}",
                                heuristic.name(),
                                class.name
                            );
                            self.events.record_for(
                                EventKind::FactResolved,
                                &class.name,
                                format!("{key} = {value}"),
                            );
                            inserted += 1;
                        }
                    }
                }
                Err(err) => {
                    log::warn!("{} failed on {}: {err}", heuristic.name(), class.name);
                    self.events.record_for(
                        EventKind::HeuristicFailed,
                        &class.name,
                        format!("{}: {err}", heuristic.name()),
                    );
                }
            }
        }
        let mut revisit = false;
        if !deferred.is_empty() {
            self.retained.insert(class.name.clone(), class.clone());
            // A dependency may land on another thread between the check above and this
            // insert, after that thread already drained. Re-checking here keeps the
            // class from waiting on a fact write that has already happened.
            revisit = deferred
                .iter()
                .any(|heuristic| heuristic.dependencies_met(&self.facts));
        }
        (inserted, revisit)
    }

    fn drain_retained(&self) {
        loop {
            let names: Vec<String> = self
                .retained
                .iter()
                .map(|entry| entry.key().clone())
                .collect();
            if names.is_empty() {
                return;
            }
            let mut progress = 0;
            for name in names {
                let Some((_, class)) = self.retained.remove(&name) else {
                    continue;
                };
                let (inserted, revisit) = self.scan(&class);
                progress += inserted + usize::from(revisit);
            }
            if progress == 0 {
                return;
            }
        }
    }

    /// The method reference and invocation kind behind a method fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when unresolved.
    pub fn method_fact(&self, key: FactKey) -> Result<(InvokeKind, MethodRef)> {
        self.facts.method_fact(key)
    }

    /// The field reference and staticness behind a field fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when unresolved.
    pub fn field_fact(&self, key: FactKey) -> Result<(bool, FieldRef)> {
        self.facts.field_fact(key)
    }

    /// The internal name behind a class fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when unresolved.
    pub fn class_fact(&self, key: FactKey) -> Result<String> {
        self.facts.class_fact(key)
    }

    /// The text behind a string fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when unresolved.
    pub fn string_fact(&self, key: FactKey) -> Result<String> {
        self.facts.string_fact(key)
    }

    /// Internal name of the client bridge type, derived from the bridge accessor's
    /// return type.
    ///
    /// # Errors
    /// Fails when the accessor is unresolved or does not return a reference type.
    pub fn client_bridge_class(&self) -> Result<String> {
        self.return_type_of(FactKey::GetClientBridgeMethod)
    }

    /// Internal name of the player bridge type, derived from the player accessor's
    /// return type.
    ///
    /// # Errors
    /// Fails when the accessor is unresolved or does not return a reference type.
    pub fn player_bridge_class(&self) -> Result<String> {
        self.return_type_of(FactKey::GetPlayerMethod)
    }

    fn return_type_of(&self, key: FactKey) -> Result<String> {
        let (_, target) = self.facts.method_fact(key)?;
        target
            .desc
            .ret()
            .internal_name()
            .map(str::to_string)
            .ok_or_else(|| malformed_error!("{} does not return a reference type", target))
    }

    /// Record a fact directly, bypassing the rules.
    ///
    /// Mostly useful in tests and for pre-seeding a context from a previous run.
    pub fn record(&self, key: FactKey, value: FactValue) -> bool {
        self.facts.record(key, value)
    }
}
