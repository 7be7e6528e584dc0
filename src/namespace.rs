//! Compiled-in XML namespace table and per-run warning bookkeeping.
//!
//! The registry maps short prefixes (`tt`, `tds`, ...) to the long namespace
//! URIs they stand for. It is immutable after construction. Which unknown
//! identifiers have already been reported is tracked separately in
//! [`WarnedNamespaces`], owned by whoever drives a run.

use std::collections::{BTreeSet, HashMap};

/// Short prefix to long URI pairs known to the tool.
const NAMESPACES: &[(&str, &str)] = &[
    ("d", "http://schemas.xmlsoap.org/ws/2005/04/discovery"),
    ("dn", "http://www.onvif.org/ver10/network/wsdl"),
    ("SOAP-ENV", "http://www.w3.org/2003/05/soap-envelope"),
    ("tt", "http://www.onvif.org/ver10/schema"),
    ("tds", "http://www.onvif.org/ver10/device/wsdl"),
    ("timg", "http://www.onvif.org/ver20/imaging/wsdl"),
    ("trt", "http://www.onvif.org/ver10/media/wsdl"),
    ("tns1", "http://www.onvif.org/ver10/topics"),
    ("etns1", "http://elvees.com/onvif"),
    ("tev", "http://www.onvif.org/ver10/events/wsdl"),
    ("tptz", "http://www.onvif.org/ver20/ptz/wsdl"),
    ("trc", "http://www.onvif.org/ver10/recording/wsdl"),
    ("tan", "http://www.onvif.org/ver20/analytics/wsdl"),
    ("axt", "http://www.onvif.org/ver20/analytics"),
    ("wsa", "http://schemas.xmlsoap.org/ws/2004/08/addressing"),
    ("wstop", "http://docs.oasis-open.org/wsn/t-1"),
    ("wsnt", "http://docs.oasis-open.org/wsn/b-2"),
    ("xsd", "http://www.w3.org/2001/XMLSchema"),
    ("tae", "http://www.onvif.org/ver10/actionengine/wsdl"),
    ("tas", "http://www.onvif.org/ver10/advancedsecurity/wsdl"),
    ("ter", "http://www.onvif.org/ver10/error"),
];

/// Prefixes with built-in meaning in XML; never reported as unknown.
const SPECIAL_PREFIXES: &[&str] = &["xml", "xmlns"];

/// Bidirectional long URI <-> short prefix table.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    long_by_short: HashMap<&'static str, &'static str>,
    short_by_long: HashMap<&'static str, &'static str>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NamespaceRegistry {
    /// Registry backed by the compiled-in table.
    pub fn builtin() -> Self {
        Self::from_pairs(NAMESPACES)
    }

    /// Build a registry from `(short, long)` pairs; the reverse map is derived here.
    pub fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        let long_by_short: HashMap<_, _> = pairs.iter().copied().collect();
        let short_by_long = long_by_short
            .iter()
            .map(|(short, long)| (*long, *short))
            .collect();
        Self {
            long_by_short,
            short_by_long,
        }
    }

    pub fn short_for(&self, long: &str) -> Option<&'static str> {
        self.short_by_long.get(long).copied()
    }

    pub fn long_for(&self, short: &str) -> Option<&'static str> {
        self.long_by_short.get(short).copied()
    }

    pub fn is_known_short(&self, prefix: &str) -> bool {
        self.long_by_short.contains_key(prefix)
    }

    pub fn is_special(prefix: &str) -> bool {
        SPECIAL_PREFIXES.contains(&prefix)
    }

    /// All entries sorted by prefix.
    pub fn entries(&self) -> Vec<(&'static str, &'static str)> {
        let mut entries: Vec<_> = self
            .long_by_short
            .iter()
            .map(|(short, long)| (*short, *long))
            .collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.long_by_short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long_by_short.is_empty()
    }
}

/// Which identifier space an unknown namespace was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    /// A long URI with no registered prefix
    Long,
    /// A `prefix:` in a tag name that is not registered
    Short,
    /// The `X` of an `xmlns:X` tag name that is not registered
    Xmlns,
}

/// Identifiers already reported during a run.
///
/// Each distinct identifier is reported once per run. Workers processing
/// files independently can each own one and [`merge`](Self::merge) at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarnedNamespaces {
    long: BTreeSet<String>,
    short: BTreeSet<String>,
    xmlns: BTreeSet<String>,
}

impl WarnedNamespaces {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_mut(&mut self, kind: NamespaceKind) -> &mut BTreeSet<String> {
        match kind {
            NamespaceKind::Long => &mut self.long,
            NamespaceKind::Short => &mut self.short,
            NamespaceKind::Xmlns => &mut self.xmlns,
        }
    }

    /// Record `id`; returns `true` the first time it is seen for `kind`.
    pub fn first_sighting(&mut self, kind: NamespaceKind, id: &str) -> bool {
        let set = self.set_mut(kind);
        if set.contains(id) {
            return false;
        }
        set.insert(id.to_string());
        true
    }

    pub fn merge(&mut self, other: WarnedNamespaces) {
        self.long.extend(other.long);
        self.short.extend(other.short);
        self.xmlns.extend(other.xmlns);
    }

    pub fn len(&self) -> usize {
        self.long.len() + self.short.len() + self.xmlns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
