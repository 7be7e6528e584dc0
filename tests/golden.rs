use go_retag::config::OptimizationPolicy;
use go_retag::{process_source, NamespaceRegistry, PolicyEngine, WarnedNamespaces};
use std::fs;

fn load_fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

fn retag(source: &str, policy: OptimizationPolicy) -> String {
    let registry = NamespaceRegistry::builtin();
    let engine = PolicyEngine::new(policy, &registry);
    let mut warned = WarnedNamespaces::new();
    let outcome = process_source(source, &engine, &mut warned);
    assert_eq!(outcome.errors, 0, "unexpected errors: {:?}", outcome.diagnostics);
    outcome.text
}

#[test]
fn complete_preset_fixture() {
    let input = load_fixture("device.go.input");
    let expected = load_fixture("device.go.expected");

    let output = retag(&input, OptimizationPolicy::complete());
    assert_eq!(output, expected);

    let again = retag(&output, OptimizationPolicy::complete());
    assert_eq!(again, expected, "second run must not change anything");
}

#[test]
fn none_preset_leaves_fixture_untouched() {
    let input = load_fixture("device.go.input");
    assert_eq!(retag(&input, OptimizationPolicy::none()), input);
}

#[test]
fn origin_comments_round_trip() {
    let input = load_fixture("device.go.input");
    let expected = load_fixture("device.go.expected");
    let preserving = OptimizationPolicy {
        preserve_original_as_comment: true,
        ..OptimizationPolicy::complete()
    };

    let annotated = retag(&input, preserving);
    assert!(annotated
        .contains("`xml:\"tds:Device\" json:\"-\"` // origin:`xml:\"http://www.onvif.org/ver10/device/wsdl Device\"`"));
    assert!(annotated.contains("// vendor serial origin:`xml:\"SerialNumber\" yaml:\"serial\"`"));
    assert_eq!(retag(&annotated, preserving), annotated);

    // With the stored tags kept, the plain complete output is recoverable.
    let stripped: String = annotated
        .split('\n')
        .map(|line| match line.find(" // origin:") {
            Some(at) => &line[..at],
            None => line,
        })
        .map(|line| line.replace(" origin:`xml:\"SerialNumber\" yaml:\"serial\"`", ""))
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(stripped, expected);

    // Every switch off restores the original tags and comments.
    assert_eq!(retag(&annotated, OptimizationPolicy::none()), input);
}

#[test]
fn prefixed_primary_name_is_kept() {
    let source = "type Event struct {\n\tName string `xml:\"tns1:Name\" json:\"name,omitempty\"`\n}\n";
    let policy = OptimizationPolicy {
        omit_redundant_name: true,
        sort_options: true,
        ..OptimizationPolicy::none()
    };
    assert_eq!(retag(source, policy), source);
}
