use assert_matches::assert_matches;

use statee::error::StatError;
use statee::fetch::{MAX_VALUES_PER_VARIABLE, build_form_params};
use statee::listing::DatasetDescriptor;

fn descriptor() -> DatasetDescriptor {
    DatasetDescriptor {
        name: "12345: Some Table".to_string(),
        url: "path=A01&ti=T1&extra=1?v1&v2".to_string(),
        updated: None,
        var_counts: vec![2, 3],
        vars: vec!["A".to_string(), "B".to_string()],
    }
}

fn values<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    params
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
        .collect()
}

#[test]
fn form_parameters_for_two_variables() {
    let params = build_form_params(&descriptor()).unwrap();

    assert_eq!(values(&params, "matrix"), vec!["12345"]);
    assert_eq!(values(&params, "infofile"), vec!["12_345.htm"]);
    assert_eq!(values(&params, "root"), vec!["A01"]);
    assert_eq!(values(&params, "classdir"), vec!["A01"]);
    assert_eq!(values(&params, "ti"), vec!["T1"]);
    assert_eq!(values(&params, "noofvar"), vec!["2"]);
    assert_eq!(values(&params, "varparm"), vec!["v1&v2"]);
    assert_eq!(values(&params, "Valdavarden1"), vec!["2"]);
    assert_eq!(values(&params, "values1"), vec!["1", "2"]);
    assert_eq!(values(&params, "Valdavarden2"), vec!["3"]);
    assert_eq!(values(&params, "values2"), vec!["1", "2", "3"]);
    assert_eq!(values(&params, "var1"), vec!["A"]);
    assert_eq!(values(&params, "context1"), vec![""]);
    assert_eq!(values(&params, "var2"), vec!["B"]);
    assert_eq!(values(&params, "context2"), vec![""]);
}

#[test]
fn fixed_constants_are_present() {
    let params = build_form_params(&descriptor()).unwrap();
    for (key, value) in [
        ("elim", "NNNN"),
        ("numberstub", "2"),
        ("lang", "2"),
        ("stubceller", "4"),
        ("headceller", "1"),
        ("timevalvar", "Aasta"),
        ("classdir2", ""),
        ("hasAggregno", "0"),
    ] {
        assert_eq!(values(&params, key), vec![value], "{key}");
    }
    assert_eq!(values(&params, "sel").len(), 1);
    assert_eq!(values(&params, "pxkonv").len(), 1);
}

#[test]
fn parameter_order_is_stable() {
    let params = build_form_params(&descriptor()).unwrap();
    let keys = params.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();
    assert_eq!(
        &keys[..7],
        &["matrix", "infofile", "root", "classdir", "ti", "noofvar", "varparm"]
    );

    let tail = &keys[keys.len() - 11..];
    assert_eq!(
        tail,
        &[
            "Valdavarden1",
            "values1",
            "values1",
            "Valdavarden2",
            "values2",
            "values2",
            "values2",
            "var1",
            "context1",
            "var2",
            "context2",
        ]
    );
    assert_eq!(params, build_form_params(&descriptor()).unwrap());
}

#[test]
fn name_without_colon_is_invalid() {
    let mut bad = descriptor();
    bad.name = "12345 Some Table".to_string();
    let err = build_form_params(&bad).unwrap_err();
    assert_matches!(err, StatError::Validation(_));
}

#[test]
fn non_numeric_table_id_is_invalid() {
    let mut bad = descriptor();
    bad.name = "KE01: Heitmed".to_string();
    let err = build_form_params(&bad).unwrap_err();
    assert_matches!(err, StatError::Validation(_));
}

#[test]
fn url_missing_required_parts_is_invalid() {
    for url in ["ti=T1&extra=1?v1", "path=A01&extra=1?v1", "path=A01&ti=T1"] {
        let mut bad = descriptor();
        bad.url = url.to_string();
        let err = build_form_params(&bad).unwrap_err();
        assert_matches!(err, StatError::Validation(_), "{url}");
    }
}

#[test]
fn oversized_value_count_is_invalid() {
    let mut bad = descriptor();
    bad.var_counts = vec![2, 50_000_000];
    let err = build_form_params(&bad).unwrap_err();
    assert_matches!(err, StatError::Validation(message) if message.contains("variable 2"));
}

#[test]
fn value_count_at_limit_is_expanded() {
    let mut wide = descriptor();
    wide.var_counts = vec![MAX_VALUES_PER_VARIABLE, 1];
    let params = build_form_params(&wide).unwrap();
    let first = values(&params, "values1");
    assert_eq!(first.len(), MAX_VALUES_PER_VARIABLE as usize);
    assert_eq!(first.last().copied(), Some("100000"));
}
