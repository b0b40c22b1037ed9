//! Declarative evidence-to-extraction rules.

use crate::classfile::{ClassFile, ConstValue};
use crate::resolution::{FactKey, FactTable, FactValue, ResolutionContext};
use crate::Result;

/// Structural evidence that nominates a class for extraction.
///
/// Obfuscators rename symbols but keep string constants, interface flags and call
/// topology intact, so evidence is phrased purely over those. Checking evidence is cheap
/// and runs against every observed class; extraction only runs on nominated ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    /// The class carries the given constant in any method body or field initializer.
    HasConstant(ConstValue),
    /// The class carries every one of the given constants.
    AllConstants(Vec<ConstValue>),
    /// The class is declared as an interface.
    IsInterface,
    /// Some method body invokes a method with the given name.
    CallsNamed(String),
}

impl Evidence {
    /// Whether the class exhibits this evidence.
    #[must_use]
    pub fn matches(&self, class: &ClassFile) -> bool {
        match self {
            Evidence::HasConstant(value) => class.has_constant(value),
            Evidence::AllConstants(values) => {
                values.iter().all(|value| class.has_constant(value))
            }
            Evidence::IsInterface => class.is_interface(),
            Evidence::CallsNamed(name) => class
                .methods
                .iter()
                .any(|method| method.calls().any(|(_, mref)| mref.name == *name)),
        }
    }
}

/// Extraction callback of a [`Heuristic`].
///
/// Runs against a nominated class and returns the facts it could derive, possibly none.
/// The context gives access to facts resolved earlier, for rules that correlate across
/// classes.
pub type ExtractFn =
    Box<dyn Fn(&ClassFile, &ResolutionContext) -> Result<Vec<(FactKey, FactValue)>> + Send + Sync>;

/// One named rule binding evidence to fact extraction.
///
/// A heuristic fires when its evidence matches and every dependency is already resolved.
/// A nominated class whose dependencies are not met yet is retained by the context and
/// revisited when new facts land, so observation order between classes does not matter.
pub struct Heuristic {
    name: &'static str,
    evidence: Evidence,
    depends_on: Vec<FactKey>,
    provides: Vec<FactKey>,
    extract: ExtractFn,
}

impl std::fmt::Debug for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heuristic")
            .field("name", &self.name)
            .field("evidence", &self.evidence)
            .field("depends_on", &self.depends_on)
            .field("provides", &self.provides)
            .finish()
    }
}

impl Heuristic {
    /// A heuristic with the given evidence and extraction callback.
    pub fn new<F>(name: &'static str, evidence: Evidence, extract: F) -> Self
    where
        F: Fn(&ClassFile, &ResolutionContext) -> Result<Vec<(FactKey, FactValue)>>
            + Send
            + Sync
            + 'static,
    {
        Heuristic {
            name,
            evidence,
            depends_on: Vec::new(),
            provides: Vec::new(),
            extract: Box::new(extract),
        }
    }

    /// Declare facts that must be resolved before extraction may run.
    #[must_use]
    pub fn depends_on(mut self, keys: &[FactKey]) -> Self {
        self.depends_on.extend_from_slice(keys);
        self
    }

    /// Declare the facts this heuristic can produce.
    ///
    /// Once every declared fact is resolved the heuristic stops being evaluated.
    #[must_use]
    pub fn provides(mut self, keys: &[FactKey]) -> Self {
        self.provides.extend_from_slice(keys);
        self
    }

    /// The rule's name, used in events and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The nominating evidence.
    #[must_use]
    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// Whether the class is nominated by this rule's evidence.
    #[must_use]
    pub fn matches(&self, class: &ClassFile) -> bool {
        self.evidence.matches(class)
    }

    /// Whether every dependency is resolved.
    #[must_use]
    pub fn dependencies_met(&self, facts: &FactTable) -> bool {
        self.depends_on.iter().all(|key| facts.contains(*key))
    }

    /// Whether everything this rule can provide is already resolved.
    ///
    /// A rule with no declared provides is never satisfied and keeps running.
    #[must_use]
    pub fn is_satisfied(&self, facts: &FactTable) -> bool {
        !self.provides.is_empty() && self.provides.iter().all(|key| facts.contains(*key))
    }

    /// Run the extraction callback against a nominated class.
    ///
    /// # Errors
    ///
    /// Propagates errors from the callback; the caller treats them as a failed attempt,
    /// not a fatal condition.
    pub fn extract(
        &self,
        class: &ClassFile,
        ctx: &ResolutionContext,
    ) -> Result<Vec<(FactKey, FactValue)>> {
        (self.extract)(class, ctx)
    }
}
