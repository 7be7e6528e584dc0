//! Per-field tag optimization.
//!
//! Sub-tags are resolved in [`KINDS`] order: the primary (xml) first, then
//! the secondaries, which may borrow the primary's resolved name and options.
//! Derivation only ever flows from the primary to a secondary.

use crate::config::OptimizationPolicy;
use crate::diagnostics::Notes;
use crate::namespace::{NamespaceKind, NamespaceRegistry, WarnedNamespaces};
use crate::parse::{parse_tag, parse_value, FieldDeclaration, FieldError, SubTag, TagSet};
use crate::policy::kinds::{is_internal_type, primary, KINDS, OMIT_EMPTY};
use std::collections::HashSet;

/// What a secondary sub-tag may learn from the resolved primary.
#[derive(Debug, Clone)]
struct PrimaryView<'a> {
    id: &'a str,
    present: bool,
    emit_name: String,
    omit_empty: bool,
    anchor: Option<usize>,
}

impl<'a> PrimaryView<'a> {
    fn of(entry: &SubTag<'a>) -> Self {
        Self {
            id: entry.id,
            present: entry.present,
            emit_name: entry.emit_name.clone().unwrap_or_default(),
            omit_empty: entry.has_option(OMIT_EMPTY),
            anchor: entry.anchor(),
        }
    }
}

/// Applies an [`OptimizationPolicy`] to the tags of one field at a time.
#[derive(Debug, Clone)]
pub struct PolicyEngine<'p> {
    policy: OptimizationPolicy,
    registry: &'p NamespaceRegistry,
}

impl<'p> PolicyEngine<'p> {
    pub fn new(policy: OptimizationPolicy, registry: &'p NamespaceRegistry) -> Self {
        Self { policy, registry }
    }

    pub fn policy(&self) -> &OptimizationPolicy {
        &self.policy
    }

    /// Compute the field's new tag text, backticks included.
    ///
    /// `Ok(None)` means no sub-tag was rewritten. `Ok(Some(""))` means every
    /// sub-tag resolved to an empty value and the tag should disappear.
    pub fn optimize<'a>(
        &self,
        source: &'a str,
        decl: &FieldDeclaration<'a>,
        warned: &mut WarnedNamespaces,
        notes: &mut Notes,
    ) -> Result<Option<String>, FieldError> {
        let mut set = self.resolve_tags(source, decl, warned, notes)?;
        if !set.iter().any(|entry| entry.emit_result.is_some()) {
            return Ok(None);
        }

        set.sort_by_weight();
        let parts: Vec<String> = set
            .iter()
            .map(|entry| (entry.id, entry.output_value()))
            .filter(|(_, value)| value.len() > 2)
            .map(|(id, value)| format!("{id}:{value}"))
            .collect();

        if parts.is_empty() {
            Ok(Some(String::new()))
        } else {
            Ok(Some(format!("`{}`", parts.join(" "))))
        }
    }

    /// Parse the field's tag and resolve every known sub-tag.
    ///
    /// Absent known kinds are added as placeholders. Entries keep their
    /// source order; weights are assigned but not yet applied.
    pub fn resolve_tags<'a>(
        &self,
        source: &'a str,
        decl: &FieldDeclaration<'a>,
        warned: &mut WarnedNamespaces,
        notes: &mut Notes,
    ) -> Result<TagSet<'a>, FieldError> {
        let Some(tag) = decl.source_tag() else {
            return Ok(TagSet::default());
        };
        let mut set = parse_tag(source, tag)?;
        if set.is_empty() {
            return Ok(set);
        }

        let has_codec_tag = KINDS
            .iter()
            .filter(|kind| kind.id == primary().id || kind.derives_from_primary)
            .any(|kind| set.get(kind.id).is_some());

        let mut primary_view: Option<PrimaryView<'a>> = None;
        for kind in KINDS {
            let index = match set.position(kind.id) {
                Some(index) => {
                    parse_value(source, set.entry_mut(index), kind.allows_namespace)?;
                    index
                }
                None => set.push_placeholder(kind.id),
            };

            let entry = set.entry_mut(index);
            entry.weight = kind.weight;
            let from = if kind.derives_from_primary {
                primary_view.as_ref()
            } else {
                None
            };
            self.resolve(decl, entry, from, has_codec_tag, warned, notes);

            if kind.id == primary().id {
                primary_view = Some(PrimaryView::of(entry));
            }
        }
        Ok(set)
    }

    fn resolve<'a>(
        &self,
        decl: &FieldDeclaration<'a>,
        entry: &mut SubTag<'a>,
        primary: Option<&PrimaryView<'a>>,
        has_codec_tag: bool,
        warned: &mut WarnedNamespaces,
        notes: &mut Notes,
    ) {
        let policy = &self.policy;
        let field_name = decl.name_text();
        let namespace = entry.namespace.map(|t| t.text());
        let tag_name = entry.tag_name.map(|t| t.text());
        let mut new_namespace = namespace;
        let mut new_name: Option<String> = tag_name.map(str::to_string);
        let mut options: Vec<&'a str> = entry.options.clone();
        let mut options_added = false;
        let mut anchor = entry.anchor();

        let short_ns = entry.namespace.and_then(|ns| {
            let short = self.registry.short_for(ns.text());
            if short.is_none() && warned.first_sighting(NamespaceKind::Long, ns.text()) {
                notes.warning(
                    Some(ns.start()),
                    format!("cannot find short namespace for '{}'", ns.text()),
                );
            }
            short
        });

        let mut pure_name = field_name;
        let mut wants_short_ns = false;
        match tag_name {
            Some(tag_name) => {
                let (prefix, mut pure) = tag_name.split_once(':').unwrap_or(("", tag_name));
                if pure.is_empty() {
                    notes.warning(
                        anchor,
                        format!("empty tag name after namespace prefix '{prefix}'"),
                    );
                    pure = field_name;
                }
                pure_name = pure;

                if pure == "-" {
                    new_name = Some("-".to_string());
                    self.drop_namespace(&mut new_namespace, anchor, notes);
                } else if !prefix.is_empty() {
                    if !self.registry.is_known_short(prefix) {
                        if !NamespaceRegistry::is_special(prefix) {
                            if warned.first_sighting(NamespaceKind::Short, prefix) {
                                notes.warning(
                                    anchor,
                                    format!("unknown short namespace '{prefix}' in tag"),
                                );
                            }
                        } else if prefix == "xmlns"
                            && !self.registry.is_known_short(pure)
                            && warned.first_sighting(NamespaceKind::Xmlns, pure)
                        {
                            notes.warning(
                                anchor,
                                format!("short XMLNS namespace '{pure}' is not registered"),
                            );
                        }
                    }
                    self.drop_namespace(&mut new_namespace, anchor, notes);
                } else if namespace.is_some() {
                    wants_short_ns = true;
                } else if pure == field_name && policy.omit_redundant_name {
                    new_name = None;
                    notes.info(
                        anchor,
                        format!("tag name '{pure}' matches the field name and can be removed"),
                    );
                }
            }
            None => wants_short_ns = namespace.is_some(),
        }

        if wants_short_ns && policy.transform_namespace {
            if let Some(short) = short_ns {
                new_namespace = None;
                new_name = Some(format!("{short}:{pure_name}"));
                notes.info(
                    anchor,
                    format!("short namespace '{short}' applied to '{pure_name}'"),
                );
            }
        }

        let emit_name = pure_name.to_string();

        if let Some(primary) = primary {
            if !entry.present {
                anchor = primary.anchor;
            }
            let type_text = decl.type_text();
            let internal = is_internal_type(type_text);
            if policy.hide_internal_types && internal {
                new_name = Some("-".to_string());
                new_namespace = None;
                options.clear();
                options_added = true;
                notes.info(
                    Some(decl.type_span.start),
                    format!("internal XML type '{type_text}' is hidden from {}", entry.id),
                );
            } else {
                if !internal
                    && primary.present
                    && policy.derive_secondary_from_primary
                    && primary.emit_name != emit_name
                {
                    self.derive_name(entry.id, tag_name, primary, &mut new_name, anchor, notes);
                }
                // `-,omitempty` would turn a hidden field into one keyed "-".
                let hidden = new_name.as_deref() == Some("-");
                if policy.derive_omit_empty
                    && !hidden
                    && primary.omit_empty
                    && !options.contains(&OMIT_EMPTY)
                {
                    options.push(OMIT_EMPTY);
                    options_added = true;
                    notes.info(
                        anchor,
                        format!("'{OMIT_EMPTY}' derived from {} options", primary.id),
                    );
                }
                if policy.add_omit_empty_for_optional
                    && !hidden
                    && has_codec_tag
                    && (decl.is_pointer || decl.is_array)
                    && !options.contains(&OMIT_EMPTY)
                {
                    options.push(OMIT_EMPTY);
                    options_added = true;
                    notes.info(
                        anchor,
                        format!("'{OMIT_EMPTY}' added for pointer or slice type"),
                    );
                }
            }
        }
        entry.emit_name = Some(emit_name);

        if policy.sort_options || options_added {
            let mut seen = HashSet::new();
            options.retain(|option| seen.insert(*option));
            options.sort_unstable();
        }
        let options_changed = options != entry.options;

        if policy.omit_redundant_name
            && new_namespace.is_none()
            && new_name.as_deref() == Some(field_name)
        {
            new_name = None;
            notes.info(
                anchor,
                format!("tag name '{field_name}' matches the field name and can be removed"),
            );
        }

        if options_changed || namespace != new_namespace || tag_name != new_name.as_deref() {
            let mut value = String::new();
            if let Some(ns) = new_namespace {
                value.push_str(ns);
                value.push(' ');
                if new_name.is_none() {
                    new_name = Some(field_name.to_string());
                }
            }
            if let Some(name) = &new_name {
                value.push_str(name);
            }
            if !options.is_empty() {
                value.push(',');
                value.push_str(&options.join(","));
            }
            let result = format!("\"{value}\"");
            tracing::debug!(
                id = entry.id,
                from = entry.value,
                to = result.as_str(),
                "sub-tag optimized"
            );
            entry.emit_result = Some(result);
        }
    }

    fn drop_namespace(&self, namespace: &mut Option<&str>, anchor: Option<usize>, notes: &mut Notes) {
        if !self.policy.transform_namespace {
            return;
        }
        if let Some(ns) = namespace.take() {
            notes.info(anchor, format!("removing unnecessary namespace '{ns}'"));
        }
    }

    fn derive_name(
        &self,
        id: &str,
        tag_name: Option<&str>,
        primary: &PrimaryView<'_>,
        new_name: &mut Option<String>,
        anchor: Option<usize>,
        notes: &mut Notes,
    ) {
        let derived = primary.emit_name.as_str();
        let source = primary.id;
        match tag_name {
            Some(explicit) if self.policy.allow_override_by_secondary => {
                let message = if derived == "-" {
                    format!("visible {id} key '{explicit}' is hidden by {source} settings")
                } else if explicit == "-" {
                    format!("visible {source} name '{derived}' is hidden by {id} settings")
                } else {
                    format!("specified {id} key '{explicit}' differs from {source} name '{derived}'")
                };
                notes.warning(anchor, message);
            }
            _ => {
                *new_name = Some(derived.to_string());
                let message = match (tag_name, derived == "-") {
                    (None, true) => format!("{id} key is hidden by {source} settings"),
                    (None, false) => format!("{id} key derived from {source} name '{derived}'"),
                    (Some(explicit), _) => {
                        format!("{id} key '{explicit}' is overridden by {source} name '{derived}'")
                    }
                };
                notes.info(anchor, message);
            }
        }
    }
}
