//! Runtime facts and the concurrent table that stores them.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_skiplist::SkipMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::classfile::{FieldRef, InvokeKind, MethodRef};
use crate::Result;

/// Identity of a single runtime fact a heuristic can resolve.
///
/// Keys are stable identifiers independent of the obfuscated names they resolve to, so
/// woven code and generated classes can reference symbols before any class has been
/// observed. The display form is the camelCase name facts are reported under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum FactKey {
    /// Internal name of the client entry point class.
    #[strum(serialize = "lunarClientClass")]
    LunarClientClass,
    /// Internal name of the class exposing the bridge accessors.
    #[strum(serialize = "bridgeClass")]
    BridgeClass,
    /// Internal name of the server mappings lookup class.
    #[strum(serialize = "serverMappingsClass")]
    ServerMappingsClass,
    /// Static accessor returning the client singleton.
    #[strum(serialize = "getLunarMainMethod")]
    GetLunarMainMethod,
    /// Accessor returning the client bridge instance.
    #[strum(serialize = "getClientBridgeMethod")]
    GetClientBridgeMethod,
    /// Accessor returning the current server data.
    #[strum(serialize = "getServerDataMethod")]
    GetServerDataMethod,
    /// Accessor on the client returning the server mappings instance.
    #[strum(serialize = "getServerMappingsMethod")]
    GetServerMappingsMethod,
    /// Lookup translating display names to server addresses.
    #[strum(serialize = "getDisplayToIpMapMethod")]
    GetDisplayToIpMapMethod,
    /// Static converter from an adventure component to the bridge component type.
    #[strum(serialize = "toBridgeComponentMethod")]
    ToBridgeComponentMethod,
    /// Accessor on the client bridge returning the player bridge.
    #[strum(serialize = "getPlayerMethod")]
    GetPlayerMethod,
    /// Player bridge method that displays a chat message.
    #[strum(serialize = "displayMessageMethod")]
    DisplayMessageMethod,
    /// Field on the client holding the asset server socket.
    #[strum(serialize = "assetsSocketField")]
    AssetsSocketField,
    /// Socket method that sends a popup packet.
    #[strum(serialize = "sendPopupMethod")]
    SendPopupMethod,
    /// Internal name of the outgoing packet event class.
    #[strum(serialize = "outgoingPacketEvent")]
    OutgoingPacketEvent,
    /// Client version string baked into the entry point.
    #[strum(serialize = "clientVersion")]
    ClientVersion,
    /// Operating system string baked into the entry point.
    #[strum(serialize = "clientOs")]
    ClientOs,
    /// Architecture string baked into the entry point.
    #[strum(serialize = "clientArch")]
    ClientArch,
}

/// Value resolved for a [`FactKey`].
///
/// Method and field facts carry the access shape observed at extraction time, so code
/// emitting them later produces the same invocation or field access the client itself
/// uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FactValue {
    /// A resolved method together with how it is invoked.
    Method {
        /// Invocation kind observed where the method was extracted.
        kind: InvokeKind,
        /// The resolved method reference.
        target: MethodRef,
    },
    /// A resolved field together with its access shape.
    Field {
        /// True when the field is static.
        is_static: bool,
        /// The resolved field reference.
        field: FieldRef,
    },
    /// A resolved class internal name.
    Class(String),
    /// A plain string value, such as the client version.
    Str(String),
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Method { kind, target } => write!(f, "{kind} {target}"),
            FactValue::Field { is_static: true, field } => write!(f, "static {field}"),
            FactValue::Field { is_static: false, field } => write!(f, "{field}"),
            FactValue::Class(name) => f.write_str(name),
            FactValue::Str(text) => f.write_str(text),
        }
    }
}

/// A stored fact together with the stamp of the call that recorded it.
#[derive(Debug)]
struct Recorded {
    stamp: u64,
    value: FactValue,
}

/// Concurrent, insert-once table of resolved facts.
///
/// Scanning threads record facts as they find them; consumers read through the typed
/// accessors. The first write for a key wins and later writes are ignored, which keeps
/// resolution idempotent when several threads observe equivalent evidence.
#[derive(Debug, Default)]
pub struct FactTable {
    facts: SkipMap<FactKey, Recorded>,
    stamps: AtomicU64,
}

impl FactTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fact unless the key is already resolved.
    ///
    /// Returns `true` when this call inserted the value. Two threads racing on the same
    /// key both observe a resolved table afterwards; exactly one sees `true`.
    pub fn record(&self, key: FactKey, value: FactValue) -> bool {
        if self.facts.contains_key(&key) {
            return false;
        }
        // The returned entry is the canonical one for the key even when a concurrent
        // insert wins, so the stamp identifies whether this call's value landed.
        let stamp = self.stamps.fetch_add(1, Ordering::Relaxed);
        let entry = self.facts.get_or_insert_with(key, || Recorded { stamp, value });
        entry.value().stamp == stamp
    }

    /// Whether the key has been resolved.
    #[must_use]
    pub fn contains(&self, key: FactKey) -> bool {
        self.facts.contains_key(&key)
    }

    /// Number of resolved facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether no fact has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// The raw value for a key, if resolved.
    #[must_use]
    pub fn get(&self, key: FactKey) -> Option<FactValue> {
        self.facts.get(&key).map(|entry| entry.value().value.clone())
    }

    /// The method reference and invocation kind behind a method fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when the key is
    /// unresolved or resolved to a non-method value.
    pub fn method_fact(&self, key: FactKey) -> Result<(InvokeKind, MethodRef)> {
        match self.get(key) {
            Some(FactValue::Method { kind, target }) => Ok((kind, target)),
            _ => Err(crate::Error::ResolutionMiss(key)),
        }
    }

    /// The field reference and staticness behind a field fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when the key is
    /// unresolved or resolved to a non-field value.
    pub fn field_fact(&self, key: FactKey) -> Result<(bool, FieldRef)> {
        match self.get(key) {
            Some(FactValue::Field { is_static, field }) => Ok((is_static, field)),
            _ => Err(crate::Error::ResolutionMiss(key)),
        }
    }

    /// The internal name behind a class fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when the key is
    /// unresolved or resolved to a non-class value.
    pub fn class_fact(&self, key: FactKey) -> Result<String> {
        match self.get(key) {
            Some(FactValue::Class(name)) => Ok(name),
            _ => Err(crate::Error::ResolutionMiss(key)),
        }
    }

    /// The text behind a string fact.
    ///
    /// # Errors
    /// Returns [`Error::ResolutionMiss`](crate::Error::ResolutionMiss) when the key is
    /// unresolved or resolved to a non-string value.
    pub fn string_fact(&self, key: FactKey) -> Result<String> {
        match self.get(key) {
            Some(FactValue::Str(text)) => Ok(text),
            _ => Err(crate::Error::ResolutionMiss(key)),
        }
    }

    /// Iterates over resolved facts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FactKey, FactValue)> + '_ {
        self.facts
            .iter()
            .map(|entry| (*entry.key(), entry.value().value.clone()))
    }
}
