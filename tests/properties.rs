use go_retag::config::OptimizationPolicy;
use go_retag::{process_source, NamespaceRegistry, PolicyEngine, WarnedNamespaces};
use proptest::prelude::*;

fn field_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{0,8}"
}

fn field_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("string"),
        Just("int"),
        Just("*string"),
        Just("[]Item"),
        Just("[]*Item"),
        Just("map[string]int"),
        Just("xml.Name"),
    ]
}

/// xml value: a name shape plus options.
fn xml_value(field: String) -> impl Strategy<Value = String> {
    let names = prop_oneof![
        Just(String::new()),
        Just(field.clone()),
        Just("Other".to_string()),
        Just(format!("tt:{field}")),
        Just("-".to_string()),
        Just(format!("http://www.onvif.org/ver10/schema {field}")),
        Just("http://www.onvif.org/ver10/topics Other".to_string()),
    ];
    let options = prop::sample::subsequence(vec!["omitempty", "attr"], 0..=2);
    (names, options).prop_map(|(name, options)| {
        let mut value = name;
        for option in options {
            value.push(',');
            value.push_str(option);
        }
        value
    })
}

fn json_value(field: String) -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(field.to_lowercase())),
        Just(Some(field)),
        Just(Some("-".to_string())),
        Just(Some(",string,omitempty".to_string())),
    ]
}

fn field_line() -> impl Strategy<Value = String> {
    (field_name(), field_type())
        .prop_flat_map(|(name, ty)| {
            (
                Just(name.clone()),
                Just(ty),
                prop::option::of(xml_value(name.clone())),
                json_value(name),
                any::<bool>(),
            )
        })
        .prop_map(|(name, ty, xml, json, commented)| {
            let mut parts = Vec::new();
            if let Some(xml) = xml {
                parts.push(format!("xml:\"{xml}\""));
            }
            if let Some(json) = json {
                parts.push(format!("json:\"{json}\""));
            }
            if parts.is_empty() {
                parts.push("yaml:\"x\"".to_string());
            }
            let comment = if commented { " // note" } else { "" };
            format!("\t{name} {ty} `{}`{comment}", parts.join(" "))
        })
}

fn policy() -> impl Strategy<Value = OptimizationPolicy> {
    prop::array::uniform9(any::<bool>()).prop_map(|s| OptimizationPolicy {
        omit_redundant_name: s[0],
        transform_namespace: s[1],
        sort_options: s[2],
        derive_secondary_from_primary: s[3],
        allow_override_by_secondary: s[4],
        hide_internal_types: s[5],
        derive_omit_empty: s[6],
        add_omit_empty_for_optional: s[7],
        preserve_original_as_comment: s[8],
    })
}

fn source_of(fields: &[String]) -> String {
    let mut source = String::from("package api\n\n// leading  comment\ntype Device struct {\n");
    for field in fields {
        source.push_str(field);
        source.push('\n');
    }
    source.push_str("}\n\nfunc (d *Device) Tag() string { return `xml:\"x\"` }\n");
    source
}

proptest! {
    #[test]
    fn rewriting_is_idempotent(fields in prop::collection::vec(field_line(), 1..6), policy in policy()) {
        let registry = NamespaceRegistry::builtin();
        let engine = PolicyEngine::new(policy, &registry);
        let mut warned = WarnedNamespaces::new();

        let first = process_source(&source_of(&fields), &engine, &mut warned);
        let second = process_source(&first.text, &engine, &mut warned);
        prop_assert_eq!(second.changed_lines, 0);
        prop_assert_eq!(second.text, first.text);
    }

    #[test]
    fn bytes_outside_fields_are_preserved(fields in prop::collection::vec(field_line(), 1..6), policy in policy()) {
        let registry = NamespaceRegistry::builtin();
        let engine = PolicyEngine::new(policy, &registry);
        let mut warned = WarnedNamespaces::new();

        let source = source_of(&fields);
        let outcome = process_source(&source, &engine, &mut warned);
        let before: Vec<&str> = source.split('\n').collect();
        let after: Vec<&str> = outcome.text.split('\n').collect();
        prop_assert_eq!(before.len(), after.len());

        for (index, (old, new)) in before.iter().zip(&after).enumerate() {
            let is_field = index >= 4 && index < 4 + fields.len();
            if !is_field {
                prop_assert_eq!(old, new);
                continue;
            }
            // Name and type text up to the tag are untouched.
            let head = &old[..old.find('`').unwrap()];
            prop_assert!(new.starts_with(head.trim_end()));
        }
    }

    #[test]
    fn duplicate_ids_never_rewrite(name in field_name(), policy in policy()) {
        let registry = NamespaceRegistry::builtin();
        let engine = PolicyEngine::new(policy, &registry);
        let mut warned = WarnedNamespaces::new();

        let line = format!("\t{name} *string `xml:\"{name}\" json:\"a\" json:\"b\"`");
        let source = source_of(&[line]);
        let outcome = process_source(&source, &engine, &mut warned);
        prop_assert_eq!(outcome.errors, 1);
        prop_assert_eq!(outcome.text, source);
    }
}
