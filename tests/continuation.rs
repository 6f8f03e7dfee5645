// tests/continuation.rs
//! Following continuation markers in eager and lazy mode.

mod common;

use common::{site_with, test_config, RecordingSleeper, ScriptedTransport};
use pretty_assertions::assert_eq;
use serde_json::json;
use wikiq::{Params, Request, WikiError, FEATURE_CONTINUE};

fn allpages() -> Params {
    Params::new()
        .with("action", "query")
        .with("list", "allpages")
}

#[test]
fn eager_mode_without_markers_returns_the_single_result() {
    let transport = ScriptedTransport::new();
    let body = json!({"batchcomplete": "", "query": {"allpages": [{"title": "A"}]}});
    transport.push_json(body.clone());
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let result = Request::new(&site, allpages()).query_all().unwrap();

    assert_eq!(result.to_value(), body);
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn eager_list_continuation_appends_the_second_page() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(json!({
            "query": {"allpages": [{"title": "A"}, {"title": "B"}]},
            "query-continue": {"allpages": {"apcontinue": "C"}}
        }))
        .push_json(json!({"query": {"allpages": [{"title": "C"}]}}));
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let result = Request::new(&site, allpages()).query_all().unwrap();

    assert_eq!(transport.call_count(), 2);
    let second = &transport.calls()[1];
    assert_eq!(second.field("apcontinue"), Some("C"));
    assert_eq!(second.field("list"), Some("allpages"));
    assert_eq!(second.field("format"), Some("json"));
    assert_eq!(
        result.query().unwrap()["allpages"],
        json!([{"title": "A"}, {"title": "B"}, {"title": "C"}])
    );
}

#[test]
fn eager_list_results_collapse_repeats_across_three_rounds() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(json!({
            "query": {"categorymembers": [{"title": "A"}, {"title": "B"}]},
            "query-continue": {"categorymembers": {"cmcontinue": "page|B"}}
        }))
        .push_json(json!({
            "query": {"categorymembers": [{"title": "B"}, {"title": "C"}]},
            "query-continue": {"categorymembers": {"cmcontinue": "page|D"}}
        }))
        .push_json(json!({"query": {"categorymembers": [{"title": "D"}]}}));
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let params = Params::new()
        .with("action", "query")
        .with("list", "categorymembers")
        .with("cmtitle", "Category:Example");
    let result = Request::new(&site, params).query_all().unwrap();

    assert_eq!(transport.call_count(), 3);
    assert_eq!(transport.calls()[2].field("cmcontinue"), Some("page|D"));
    assert_eq!(
        result.query().unwrap()["categorymembers"],
        json!([{"title": "A"}, {"title": "B"}, {"title": "C"}, {"title": "D"}])
    );
}

#[test]
fn eager_page_keyed_results_are_merged_across_three_rounds() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(json!({
            "query": {"pages": {
                "1": {"pageid": 1, "title": "Alpha", "links": [{"ns": 0, "title": "X"}]},
                "2": {"pageid": 2, "title": "Beta"}
            }},
            "query-continue": {"links": {"plcontinue": "1|0|Y"}}
        }))
        .push_json(json!({
            "query": {"pages": {
                "1": {"pageid": 1, "title": "Alpha", "links": [{"ns": 0, "title": "X"}, {"ns": 0, "title": "Y"}]},
                "2": {"pageid": 2, "title": "Beta"}
            }},
            "query-continue": {"links": {"plcontinue": "2|0|Z"}}
        }))
        .push_json(json!({
            "query": {"pages": {
                "1": {"pageid": 1, "title": "Alpha"},
                "2": {"pageid": 2, "title": "Beta", "links": [{"ns": 0, "title": "Z"}]}
            }}
        }));
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let params = Params::new()
        .with("action", "query")
        .with("prop", "links")
        .with("titles", vec!["Alpha", "Beta"]);
    let result = Request::new(&site, params).query_all().unwrap();

    assert_eq!(transport.call_count(), 3);
    assert_eq!(transport.calls()[2].field("plcontinue"), Some("2|0|Z"));
    assert_eq!(transport.calls()[2].field("titles"), Some("Alpha|Beta"));
    assert_eq!(
        result.query().unwrap()["pages"],
        json!({
            "1": {"pageid": 1, "title": "Alpha", "links": [{"ns": 0, "title": "X"}, {"ns": 0, "title": "Y"}]},
            "2": {"pageid": 2, "title": "Beta", "links": [{"ns": 0, "title": "Z"}]}
        })
    );
}

#[test]
fn new_generator_token_drops_stale_property_tokens() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(json!({
            "query": {"pages": {"1": {"title": "A", "links": [{"title": "L1"}]}}},
            "query-continue": {
                "links": {"plcontinue": "1|0|L2"},
                "allpages": {"gapcontinue": "B"}
            }
        }))
        .push_json(json!({
            "query": {"pages": {"1": {"title": "A", "links": [{"title": "L2"}]}}},
            "query-continue": {"allpages": {"gapcontinue": "B"}}
        }))
        .push_json(json!({
            "query": {"pages": {"2": {"title": "B", "links": [{"title": "L3"}]}}}
        }));
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let params = Params::new()
        .with("action", "query")
        .with("generator", "allpages")
        .with("prop", "links");
    let result = Request::new(&site, params).query_all().unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].field("plcontinue"), Some("1|0|L2"));
    assert_eq!(calls[1].field("gapcontinue"), None);
    assert_eq!(calls[2].field("gapcontinue"), Some("B"));
    assert_eq!(calls[2].field("plcontinue"), None);

    let pages = &result.query().unwrap()["pages"];
    assert_eq!(pages["1"]["links"], json!([{"title": "L1"}, {"title": "L2"}]));
    assert_eq!(pages["2"]["links"], json!([{"title": "L3"}]));
}

#[test]
fn lazy_mode_requires_the_continue_feature() {
    let transport = ScriptedTransport::new();
    let sleeper = RecordingSleeper::new();
    let site = site_with(test_config(), &transport, &sleeper);

    let result = Request::new(&site, allpages()).query_pages();

    assert!(matches!(result, Err(WikiError::Unsupported(_))));
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn lazy_mode_requests_one_page_per_step() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(json!({
            "continue": {"apcontinue": "B", "continue": "-||"},
            "query": {"allpages": [{"title": "A"}]}
        }))
        .push_json(json!({
            "continue": {"apcontinue": "C", "continue": "-||"},
            "query": {"allpages": [{"title": "B"}]}
        }))
        .push_json(json!({"batchcomplete": "", "query": {"allpages": [{"title": "C"}]}}));
    let sleeper = RecordingSleeper::new();
    let mut site = site_with(test_config(), &transport, &sleeper);
    site.add_feature(FEATURE_CONTINUE);

    let pages = Request::new(&site, allpages()).query_pages().unwrap();
    assert!(transport.events().is_empty());

    let mut titles = Vec::new();
    for page in pages {
        let page = page.unwrap();
        transport.note("consumed");
        titles.push(page.query().unwrap()["allpages"][0]["title"].clone());
    }

    assert_eq!(
        transport.events(),
        vec!["request", "consumed", "request", "consumed", "request", "consumed"]
    );
    assert_eq!(titles, vec![json!("A"), json!("B"), json!("C")]);

    let calls = transport.calls();
    assert_eq!(calls[0].field("continue"), Some(""));
    assert_eq!(calls[0].field("apcontinue"), None);
    assert_eq!(calls[1].field("apcontinue"), Some("B"));
    assert_eq!(calls[1].field("continue"), Some("-||"));
    assert_eq!(calls[2].field("apcontinue"), Some("C"));
    assert!(calls.iter().all(|call| call.field("list") == Some("allpages")));
}

#[test]
fn lazy_mode_stops_after_an_error() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(json!({
            "continue": {"apcontinue": "B", "continue": "-||"},
            "query": {"allpages": [{"title": "A"}]}
        }))
        .push_json(json!({"error": {"code": "readapidenied", "info": "You need read permission"}}));
    let sleeper = RecordingSleeper::new();
    let mut site = site_with(test_config(), &transport, &sleeper);
    site.add_feature(FEATURE_CONTINUE);

    let mut pages = Request::new(&site, allpages()).query_pages().unwrap();

    assert!(pages.next().unwrap().is_ok());
    assert!(matches!(pages.next(), Some(Err(WikiError::ApiQuery { .. }))));
    assert!(pages.next().is_none());
    assert_eq!(transport.call_count(), 2);
}
