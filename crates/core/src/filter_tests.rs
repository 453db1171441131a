use super::*;

#[test]
fn substring_pattern_matches_partial_name() {
    let filter = Filter::new(FilterId::from(1), FilterPattern::Substring("hello".into()), None);
    assert!(filter.matches("hello_world.cm", None, None));
    assert!(!filter.matches("goodbye.cm", None, None));
}

#[test]
fn exact_name_pattern_requires_full_match() {
    let filter = Filter::new(FilterId::from(1), FilterPattern::ExactName("hello".into()), None);
    assert!(filter.matches("hello", None, None));
    assert!(!filter.matches("hello_world", None, None));
}

#[test]
fn url_pattern_matches_candidate_url() {
    let filter = Filter::new(
        FilterId::from(1),
        FilterPattern::Url("fuchsia-pkg://fuchsia.com/hello".into()),
        None,
    );
    assert!(filter.matches("hello", Some("fuchsia-pkg://fuchsia.com/hello"), None));
    assert!(!filter.matches("hello", Some("fuchsia-pkg://fuchsia.com/other"), None));
}

#[test]
fn job_scoped_filter_ignores_processes_outside_scope() {
    let filter = Filter::new(
        FilterId::from(1),
        FilterPattern::Substring("hello".into()),
        Some(JobContextId::from(3)),
    );
    assert!(filter.matches("hello_world", None, Some(JobContextId::from(3))));
    assert!(!filter.matches("hello_world", None, Some(JobContextId::from(4))));
    assert!(!filter.matches("hello_world", None, None));
}
