// tests/listing.rs
//! Bounded list queries.

mod common;

use common::{site_with, test_config, RecordingSleeper, ScriptedTransport};
use serde_json::json;
use wikiq::{Direction, ListLimit, ListQuery, WikiError, FEATURE_CONTINUE};

fn log_batch(titles: &[&str], next: Option<&str>) -> serde_json::Value {
    let events: Vec<_> = titles.iter().map(|title| json!({"title": title})).collect();
    let mut body = json!({"query": {"logevents": events}});
    if let Some(next) = next {
        body["continue"] = json!({"lecontinue": next, "continue": "-||"});
    }
    body
}

#[test]
fn collect_stops_at_the_requested_limit() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(log_batch(&["A", "B"], Some("2")))
        .push_json(log_batch(&["C"], Some("3")));
    let sleeper = RecordingSleeper::new();
    let mut site = site_with(test_config().limit(2), &transport, &sleeper);
    site.add_feature(FEATURE_CONTINUE);

    let entries = ListQuery::list("logevents", "le")
        .limit(ListLimit::Max(3))
        .direction(Direction::Newer)
        .collect(&site)
        .unwrap();

    assert_eq!(entries.len(), 3);
    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].field("lelimit"), Some("2"));
    assert_eq!(calls[0].field("ledir"), Some("newer"));
    assert_eq!(calls[1].field("lelimit"), Some("1"));
    assert_eq!(calls[1].field("lecontinue"), Some("2"));
}

#[test]
fn collect_all_follows_until_no_continue() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(log_batch(&["A", "B"], Some("2")))
        .push_json(log_batch(&["C"], None));
    let sleeper = RecordingSleeper::new();
    let mut site = site_with(test_config(), &transport, &sleeper);
    site.add_feature(FEATURE_CONTINUE);

    let entries = ListQuery::list("logevents", "le").collect(&site).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(transport.calls()[0].field("lelimit"), Some("500"));
    assert_eq!(transport.calls()[0].field("ledir"), Some("older"));
}

#[test]
fn low_limit_uses_a_tenth_of_the_site_limit() {
    let transport = ScriptedTransport::new();
    transport.push_json(log_batch(&["A"], None));
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    ListQuery::list("logevents", "le")
        .low_limit(true)
        .collect(&site)
        .unwrap();

    assert_eq!(transport.calls()[0].field("lelimit"), Some("50"));
}

#[test]
fn prop_module_missing_from_the_page_yields_nothing() {
    let transport = ScriptedTransport::new();
    transport.push_json(json!({"query": {"pages": {"1": {"title": "A"}}}}));
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let entries = ListQuery::prop("revisions", "rv")
        .param("titles", "A")
        .collect(&site)
        .unwrap();

    assert!(entries.is_empty());
    assert_eq!(transport.calls()[0].field("prop"), Some("revisions"));
}

#[test]
fn entries_require_the_continue_feature() {
    let transport = ScriptedTransport::new();
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let result = ListQuery::list("logevents", "le").entries(&site);

    assert!(matches!(result, Err(WikiError::Unsupported(_))));
}

#[test]
fn entries_fetch_batches_on_demand() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(log_batch(&["A", "B"], Some("2")))
        .push_json(log_batch(&["C", "D"], Some("4")));
    let sleeper = RecordingSleeper::new();
    let mut site = site_with(test_config().limit(2), &transport, &sleeper);
    site.add_feature(FEATURE_CONTINUE);

    let mut entries = ListQuery::list("logevents", "le")
        .limit(ListLimit::Max(3))
        .entries(&site)
        .unwrap();
    assert_eq!(transport.call_count(), 0);

    assert_eq!(entries.next().unwrap().unwrap()["title"], "A");
    assert_eq!(entries.next().unwrap().unwrap()["title"], "B");
    assert_eq!(transport.call_count(), 1);

    assert_eq!(entries.next().unwrap().unwrap()["title"], "C");
    assert_eq!(transport.call_count(), 2);
    assert_eq!(transport.calls()[1].field("lelimit"), Some("1"));

    assert!(entries.next().is_none());
    assert_eq!(transport.call_count(), 2);
}
