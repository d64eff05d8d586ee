//! Rendered names read back by a submission parser rebuild the same values.

use std::sync::Arc;

use fers_fields::{
    FieldDefinition, FieldRegistry, FieldValue, Form, RenderConfig, RepeaterOptions, Row,
    SorterOptions, SorterState, Submission, Values, TEMPLATE_PREFIX,
};
use proptest::prelude::*;
use regex::Regex;

/// What a browser would submit for the rendered markup, ignoring template groups.
fn submit_rendered(html: &str) -> Submission {
    let inputs = Regex::new(r#"name="([^"]*)" value="([^"]*)""#).unwrap();
    let pairs = inputs
        .captures_iter(html)
        .map(|c| {
            (
                html_escape::decode_html_entities(&c[1]).into_owned(),
                html_escape::decode_html_entities(&c[2]).into_owned(),
            )
        })
        .filter(|(name, _)| !name.starts_with(TEMPLATE_PREFIX));
    Submission::from_pairs(pairs).unwrap()
}

fn page() -> Form {
    let links = FieldDefinition::repeater(
        "links",
        RepeaterOptions::new(vec![
            FieldDefinition::text("url").with_default("https://"),
            FieldDefinition::text("label"),
            FieldDefinition::repeater(
                "tags",
                RepeaterOptions::new(vec![FieldDefinition::text("name")]),
            ),
        ]),
    );
    let modules = FieldDefinition::sorter(
        "modules",
        SorterOptions::new(
            [("x", "X <b>"), ("y", "Y & co"), ("z", "Z")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
    );
    Form::new(
        Arc::new(FieldRegistry::with_defaults()),
        RenderConfig::default(),
        Some("opts"),
        vec![FieldDefinition::text("title"), links, modules],
    )
    .unwrap()
}

fn link(url: &str, label: &str, tags: &[&str]) -> Row {
    let tags: Vec<Row> = tags
        .iter()
        .map(|t| [("name".to_string(), FieldValue::from(*t))].into_iter().collect())
        .collect();
    [
        ("url".to_string(), FieldValue::from(url)),
        ("label".to_string(), FieldValue::from(label)),
        ("tags".to_string(), FieldValue::Rows(tags)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn save_of_render_is_identity() {
    let form = page();
    let modules = SorterState {
        enabled: [("z", "Z"), ("x", "X <b>")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        disabled: [("y".to_string(), "Y & co".to_string())].into_iter().collect(),
    };
    let values: Values = [
        ("title".to_string(), FieldValue::from("Say \"hi\"")),
        (
            "links".to_string(),
            FieldValue::Rows(vec![
                link("a.com", "A", &["one", "two"]),
                link("b.com?x=1&y=2", "B", &[]),
            ]),
        ),
        ("modules".to_string(), FieldValue::Sorter(modules)),
    ]
    .into_iter()
    .collect();

    let rendered = form.render(&values);
    assert!(rendered.errors.is_empty(), "{:?}", rendered.errors);

    let outcome = form.save(&submit_rendered(&rendered.html));
    assert!(outcome.is_ok(), "{:?}", outcome.errors);
    assert_eq!(outcome.values, values);
    let saved_order: Vec<_> = outcome.values["modules"]
        .as_sorter()
        .unwrap()
        .enabled
        .keys()
        .cloned()
        .collect();
    assert_eq!(saved_order, vec!["z", "x"]);
}

#[test]
fn empty_repeater_round_trips_to_no_rows() {
    let form = page();
    let values: Values = [("links".to_string(), FieldValue::Rows(vec![]))]
        .into_iter()
        .collect();
    let rendered = form.render(&values);
    let outcome = form.save(&submit_rendered(&rendered.html));
    assert_eq!(outcome.values["links"], FieldValue::Rows(vec![]));
    // The template group is in the markup but never submitted back.
    assert!(rendered.html.contains(r#"name="___opts[links][0][url]" value="https://""#));
}

proptest! {
    #[test]
    fn row_count_and_order_survive(urls in prop::collection::vec("[a-z0-9.&<>\" ]{0,12}", 0..8)) {
        let form = page();
        let rows: Vec<Row> = urls.iter().map(|u| link(u, "", &[])).collect();
        let values: Values = [("links".to_string(), FieldValue::Rows(rows))]
            .into_iter()
            .collect();

        let rendered = form.render(&values);
        let outcome = form.save(&submit_rendered(&rendered.html));
        let saved = outcome.values["links"].as_rows().unwrap();
        prop_assert_eq!(saved.len(), urls.len());
        for (row, url) in saved.iter().zip(&urls) {
            prop_assert_eq!(row["url"].as_text(), Some(url.as_str()));
        }
    }
}
