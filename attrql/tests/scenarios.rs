use anyhow::Result;
use attrql::selection::{evaluate_expr, Value};
use attrql::{
    build_filter_expression, build_filter_from_json, build_projection_expression, evaluate_predicate, flatten, parse_conditions, AttributePath,
    CastTag, EvaluationError, FilterOperator, JsonColumn, Literal, Predicate,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;

#[ctor::ctor]
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| Level::from_str(&level).ok()).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).with_test_writer().init();
}

fn attributes() -> JsonColumn { JsonColumn::new("attributes") }

fn record(attributes: serde_json::Value) -> BTreeMap<String, serde_json::Value> {
    let mut record = BTreeMap::new();
    record.insert("attributes".to_string(), attributes);
    record
}

fn matches(predicate: &Predicate, attributes: serde_json::Value) -> Result<bool> { Ok(evaluate_predicate(&record(attributes), predicate)?) }

#[test]
fn eq_matches_only_values_of_the_same_kind() -> Result<()> {
    let samples = vec![json!(null), json!(true), json!(false), json!(1), json!(1.5), json!("x"), json!("1"), json!([1]), json!({"a": 1})];
    for wanted in &samples {
        let predicate = build_filter_expression(&attributes(), &"p".into(), FilterOperator::Eq, Literal::try_from(wanted.clone())?)?;
        for stored in &samples {
            assert_eq!(matches(&predicate, json!({ "p": stored }))?, wanted == stored, "{} == {}", stored, wanted);
        }
        assert!(!matches(&predicate, json!({}))?, "absent == {}", wanted);
    }
    Ok(())
}

#[test]
fn integral_and_fractional_numbers_compare_equal() -> Result<()> {
    let predicate = build_filter_expression(&attributes(), &"p".into(), FilterOperator::Eq, 7)?;
    assert!(matches(&predicate, json!({"p": 7.0}))?);
    assert!(matches(&predicate, json!({"p": 7}))?);
    Ok(())
}

#[test]
fn length_operators_are_false_on_non_arrays() -> Result<()> {
    let stored = vec![json!({"tags": null}), json!({"tags": 3}), json!({"tags": "abc"}), json!({"tags": {"a": 1, "b": 2, "c": 3}}), json!({})];
    for operator in [FilterOperator::OfLength, FilterOperator::Longer, FilterOperator::Shorter] {
        for n in 0..5 {
            let predicate = build_filter_expression(&attributes(), &"tags".into(), operator, n)?;
            for attributes in &stored {
                assert!(!matches(&predicate, attributes.clone())?, "{} {} on {}", operator, n, attributes);
            }
        }
    }
    Ok(())
}

#[test]
fn tags_of_length_three() -> Result<()> {
    let predicate = build_filter_expression(&attributes(), &"tags".into(), FilterOperator::OfLength, 3)?;
    assert!(matches(&predicate, json!({"tags": ["a", "b", "c"]}))?);
    assert!(!matches(&predicate, json!({"tags": {"a": 1, "b": 2, "c": 3}}))?);
    assert!(!matches(&predicate, json!({"tags": ["a"]}))?);

    let longer = build_filter_expression(&attributes(), &"tags".into(), FilterOperator::Longer, 2)?;
    let shorter = build_filter_expression(&attributes(), &"tags".into(), FilterOperator::Shorter, 2)?;
    assert!(matches(&longer, json!({"tags": ["a", "b", "c"]}))?);
    assert!(matches(&shorter, json!({"tags": []}))?);
    Ok(())
}

#[test]
fn flatten_round_trips_through_navigation() -> Result<()> {
    let document = json!({
        "metadata": {"count": 10, "labels": ["a", {"b": null}], "dotted.key": true, "empty": {}},
        "tags": [],
        "0": "zero",
        "energy": -12.5
    });
    let leaves: Vec<_> = flatten(&document).collect();
    assert_eq!(leaves.len(), 6);
    for (path, value) in &leaves {
        assert_eq!(path.navigate(&document), Some(*value), "{}", path);
    }

    // restartable
    let again: Vec<_> = flatten(&document).map(|(path, _)| path.to_string()).collect();
    assert_eq!(again, leaves.iter().map(|(path, _)| path.to_string()).collect::<Vec<_>>());

    assert_eq!(flatten(&json!("scalar")).collect::<Vec<_>>(), vec![(AttributePath::root(), &json!("scalar"))]);
    Ok(())
}

#[test]
fn in_classifies_by_first_candidate() -> Result<()> {
    let predicate = build_filter_from_json(&attributes(), "n", "in", json!([1, 2, "3"]))?;
    assert!(!matches(&predicate, json!({"n": "3"}))?);
    assert!(matches(&predicate, json!({"n": 2}))?);
    assert!(matches(&predicate, json!({"n": 1.0}))?);
    assert!(!matches(&predicate, json!({"n": 3}))?);

    let strings = build_filter_from_json(&attributes(), "n", "in", json!(["3", 1]))?;
    assert!(matches(&strings, json!({"n": "3"}))?);
    assert!(!matches(&strings, json!({"n": 1}))?);
    Ok(())
}

#[test]
fn greater_than_requires_a_number() -> Result<()> {
    let predicate = build_filter_expression(&attributes(), &"metadata.count".into(), FilterOperator::Gt, 5)?;
    assert!(matches(&predicate, json!({"metadata": {"count": 10}}))?);
    assert!(!matches(&predicate, json!({"metadata": {"count": "10"}}))?);
    assert!(!matches(&predicate, json!({"metadata": {"count": 5}}))?);
    assert!(!matches(&predicate, json!({"metadata": {}}))?);
    assert!(!matches(&predicate, json!({"metadata": 10}))?);
    Ok(())
}

#[test]
fn has_key_is_independent_of_value_kind() -> Result<()> {
    let predicate = build_filter_expression(&attributes(), &AttributePath::root(), FilterOperator::HasKey, "x")?;
    assert!(matches(&predicate, json!({"x": null}))?);
    assert!(!matches(&predicate, json!({}))?);
    Ok(())
}

#[test]
fn contains_matches_structurally() -> Result<()> {
    let predicate = build_filter_from_json(&attributes(), "metadata", "contains", json!({"labels": ["a"]}))?;
    assert!(matches(&predicate, json!({"metadata": {"labels": ["b", "a"], "count": 1}}))?);
    assert!(!matches(&predicate, json!({"metadata": {"labels": ["b"]}}))?);
    assert!(!matches(&predicate, json!({"metadata": "a"}))?);
    Ok(())
}

#[test]
fn like_and_ilike_on_strings() -> Result<()> {
    let like = build_filter_expression(&attributes(), &"kind".into(), FilterOperator::Like, "scf%")?;
    let ilike = build_filter_expression(&attributes(), &"kind".into(), FilterOperator::ILike, "SCF%")?;
    assert!(matches(&like, json!({"kind": "scf.relax"}))?);
    assert!(!matches(&like, json!({"kind": "SCF.relax"}))?);
    assert!(matches(&ilike, json!({"kind": "scf.relax"}))?);
    assert!(!matches(&like, json!({"kind": ["scf"]}))?);
    Ok(())
}

#[test]
fn datetime_comparisons_need_timestamp_shaped_strings() -> Result<()> {
    let since = chrono::DateTime::parse_from_rfc3339("2016-01-01T00:00:00+00:00")?;
    let predicate = build_filter_expression(&attributes(), &"ctime".into(), FilterOperator::Gte, since)?;

    assert!(matches(&predicate, json!({"ctime": "2016-04-01T12:00:00.123456+02:00"}))?);
    assert!(matches(&predicate, json!({"ctime": "2016-04-01T12:00:00.5"}))?);
    assert!(!matches(&predicate, json!({"ctime": "2015-12-31T23:59:59.999999+00:00"}))?);
    // no fractional seconds, so the pattern does not match
    assert!(!matches(&predicate, json!({"ctime": "2016-04-01T12:00:00+00:00"}))?);
    assert!(!matches(&predicate, json!({"ctime": "2016-04-01"}))?);
    assert!(!matches(&predicate, json!({"ctime": 20160401}))?);
    Ok(())
}

#[test]
fn datetime_pattern_does_not_validate_the_calendar() -> Result<()> {
    let since = chrono::DateTime::parse_from_rfc3339("2016-01-01T00:00:00+00:00")?;
    let predicate = build_filter_expression(&attributes(), &"ctime".into(), FilterOperator::Gte, since)?;
    let result = evaluate_predicate(&record(json!({"ctime": "2016-19-39T10:00:00.0"})), &predicate);
    assert!(matches!(result, Err(EvaluationError::InvalidCast { .. })));
    Ok(())
}

#[test]
fn datetime_guard_rejects_non_ascii_digits() -> Result<()> {
    let since = chrono::DateTime::parse_from_rfc3339("2016-01-01T00:00:00+00:00")?;
    let predicate = build_filter_expression(&attributes(), &"ctime".into(), FilterOperator::Gte, since)?;
    assert!(!matches(&predicate, json!({"ctime": "२०१६-0१-0१T0१:0१:0१.१"}))?);
    assert!(!matches(&predicate, json!({"ctime": "２０１６-04-01T12:00:00.5"}))?);
    Ok(())
}

#[test]
fn ordering_objects_compares_as_jsonb() -> Result<()> {
    let predicate = build_filter_from_json(&attributes(), "meta", ">", json!({"a": 1}))?;
    assert!(matches(&predicate, json!({"meta": {"a": 2}}))?);
    assert!(matches(&predicate, json!({"meta": {"a": 0, "b": 0}}))?);
    assert!(!matches(&predicate, json!({"meta": {"a": 1}}))?);
    assert!(!matches(&predicate, json!({"meta": {}}))?);
    assert!(!matches(&predicate, json!({"meta": 5}))?);
    assert!(!matches(&predicate, json!({"meta": [1, 2]}))?);

    let arrays = build_filter_from_json(&attributes(), "tags", "<=", json!(["b"]))?;
    assert!(matches(&arrays, json!({"tags": ["a"]}))?);
    assert!(!matches(&arrays, json!({"tags": ["a", "b"]}))?);
    Ok(())
}

#[test]
fn ordering_null_compares_as_jsonb() -> Result<()> {
    let lt = build_filter_expression(&attributes(), &"x".into(), FilterOperator::Lt, Literal::Null)?;
    let lte = build_filter_expression(&attributes(), &"x".into(), FilterOperator::Lte, Literal::Null)?;
    assert!(!matches(&lt, json!({"x": null}))?);
    assert!(matches(&lte, json!({"x": null}))?);
    assert!(!matches(&lte, json!({"x": 0}))?);
    assert!(!matches(&lte, json!({}))?);
    Ok(())
}

#[test]
fn null_and_absent_filter_values_are_the_same() -> Result<()> {
    let absent = build_filter_expression(&attributes(), &"x".into(), FilterOperator::Eq, None::<&str>)?;
    let null = build_filter_from_json(&attributes(), "x", "==", json!(null))?;
    assert_eq!(absent, null);
    assert!(matches(&null, json!({"x": null}))?);
    assert!(!matches(&null, json!({}))?);
    assert!(!matches(&null, json!({"x": 0}))?);
    Ok(())
}

#[test]
fn integer_projection_truncates() -> Result<()> {
    let expr = build_projection_expression(&attributes(), &"count".into(), Some(CastTag::Integer));
    assert_eq!(evaluate_expr(&record(json!({"count": 7.0})), &expr)?, Some(Value::Integer(7)));
    assert_eq!(evaluate_expr(&record(json!({"count": -7.9})), &expr)?, Some(Value::Integer(-7)));
    assert_eq!(evaluate_expr(&record(json!({"count": "12"})), &expr)?, Some(Value::Integer(12)));
    assert_eq!(evaluate_expr(&record(json!({})), &expr)?, None);
    assert!(matches!(evaluate_expr(&record(json!({"count": 1e300})), &expr), Err(EvaluationError::NumericOverflow { .. })));
    Ok(())
}

#[test]
fn untagged_projection_returns_raw_json() -> Result<()> {
    let expr = build_projection_expression(&attributes(), &"metadata".into(), None);
    let result = evaluate_expr(&record(json!({"metadata": {"count": 1}})), &expr)?;
    assert_eq!(result, Some(Value::Json(json!({"count": 1}))));
    Ok(())
}

#[test]
fn conditions_document_end_to_end() -> Result<()> {
    let predicate = parse_conditions(
        &attributes(),
        &json!({
            "metadata.count": {">": 5, "<=": 10},
            "tags": {"!of_length": 0},
            "or": [{"kind": {"==": "relax"}}, {"kind": {"like": "scf%"}}]
        }),
    )?;
    assert!(matches(&predicate, json!({"metadata": {"count": 10}, "tags": ["a"], "kind": "scf"}))?);
    assert!(!matches(&predicate, json!({"metadata": {"count": 11}, "tags": ["a"], "kind": "scf"}))?);
    assert!(!matches(&predicate, json!({"metadata": {"count": 6}, "tags": [], "kind": "relax"}))?);
    assert!(!matches(&predicate, json!({"metadata": {"count": 6}, "tags": ["a"], "kind": "md"}))?);
    // a non-array is not of length zero, so the negation holds
    assert!(matches(&predicate, json!({"metadata": {"count": 6}, "tags": "a", "kind": "relax"}))?);
    Ok(())
}
