use super::*;

#[test]
fn bare_verb_has_no_nouns() {
    let parsed = parse("continue").unwrap();
    assert!(parsed.nouns.is_empty());
    assert_eq!(parsed.verb.as_deref(), Some("continue"));
}

#[test]
fn noun_with_index_then_verb() {
    let parsed = parse("process 2 thread 1 continue").unwrap();
    assert_eq!(
        parsed.nouns,
        vec![
            NounRef { noun: Noun::Process, index: Some(2) },
            NounRef { noun: Noun::Thread, index: Some(1) },
        ]
    );
    assert_eq!(parsed.verb.as_deref(), Some("continue"));
}

#[test]
fn noun_without_index_is_a_bare_selector() {
    let parsed = parse("breakpoint").unwrap();
    assert_eq!(parsed.nouns, vec![NounRef { noun: Noun::Breakpoint, index: None }]);
    assert!(parsed.verb.is_none());
}

#[test]
fn break_is_a_verb_not_the_breakpoint_noun() {
    let parsed = parse("break main.cc:10").unwrap();
    assert!(parsed.nouns.is_empty());
    assert_eq!(parsed.verb.as_deref(), Some("break"));
    assert_eq!(parsed.args, vec!["main.cc:10".to_string()]);
}

#[test]
fn switches_are_separated_from_positional_args() {
    let parsed = parse("step --unsymbolized -n=4 0x1000").unwrap();
    assert_eq!(parsed.verb.as_deref(), Some("step"));
    assert_eq!(
        parsed.switches,
        vec![
            Switch { name: "unsymbolized".into(), value: None },
            Switch { name: "n".into(), value: Some("4".into()) },
        ]
    );
    assert_eq!(parsed.args, vec!["0x1000".to_string()]);
}

#[test]
fn negative_numbers_are_arguments_not_switches() {
    let parsed = parse("print -1").unwrap();
    assert!(parsed.switches.is_empty());
    assert_eq!(parsed.args, vec!["-1".to_string()]);
}

#[test]
fn noun_aliases_resolve_case_insensitively() {
    let parsed = parse("TH 3 STEP").unwrap();
    assert_eq!(parsed.nouns, vec![NounRef { noun: Noun::Thread, index: Some(3) }]);
    assert_eq!(parsed.verb.as_deref(), Some("step"));
}

#[test]
fn has_switch_finds_bare_flags() {
    let parsed = parse("libs --unsymbolized").unwrap();
    assert!(has_switch(&parsed.switches, "unsymbolized"));
    assert!(!has_switch(&parsed.switches, "other"));
}

#[test]
fn switch_value_errors_when_bare_flag_expected_to_carry_a_value() {
    let parsed = parse("mem-read --size").unwrap();
    assert!(switch_value(&parsed.switches, "size").is_err());
}

#[test]
fn switch_value_returns_none_when_absent() {
    let parsed = parse("mem-read 0x1000").unwrap();
    assert_eq!(switch_value(&parsed.switches, "size").unwrap(), None);
}
