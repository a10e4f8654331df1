// tests/query_tests.rs

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use conditions_lang::query::QueryResults;
use conditions_lang::{
    Args, CompiledQuery, EvalError, ParserConfig, PathEngine, QueryEngine, QueryError, Value,
    args_from_json, evaluate, parse, parse_with,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn order() -> Args {
    args_from_json(json!({
        "customer": {"name": "ada", "tier": "gold"},
        "items": [
            {"sku": "a-1", "qty": 2, "price": 9.5},
            {"sku": "b-2", "qty": 1, "price": 20}
        ],
        "total": 39,
        "coupons": [],
        "notes": null
    }))
    .unwrap()
}

// ============================================================================
// Built-in path engine
// ============================================================================

#[rstest]
#[case(r#"$jq(.customer.name) == "ada""#, true)]
#[case(r#"$jq(.customer["tier"]) IN ["gold", "silver"]"#, true)]
#[case("$jq(.items[0].qty) == 2", true)]
#[case("$jq(.items[-1].price) >= 20", true)]
#[case("$jq(.items[] | .qty) == 2", true)]
#[case("$jq[last](.items[] | .qty) == 1", true)]
#[case("$jq[array](.items[].price) == [9.5, 20]", false)]
#[case("3 IN $jq[array](.items[].qty)", false)]
#[case("1 IN $jq[array](.items[].qty)", true)]
#[case(r#""b-2" IN $jq[array](.items[].sku)"#, true)]
#[case("$jq(.total) > 30 AND total == 39", true)]
fn test_sub_queries(#[case] input: &str, #[case] expected: bool) {
    let expr = parse(input).unwrap();
    assert_eq!(evaluate(&expr, &order()).unwrap(), expected);
}

#[rstest]
#[case("$jq(.notes) == 1")]
#[case("$jq(.missing) == 1")]
#[case("$jq(.coupons[]) == 1")]
#[case("$jq[last](.coupons[]) == 1")]
#[case("1 IN $jq[array](.coupons[])")]
fn test_empty_sub_query_results(#[case] input: &str) {
    let err = evaluate(&parse(input).unwrap(), &order()).unwrap_err();
    assert!(
        matches!(err.root_cause(), EvalError::NoSubQueryResult { .. }),
        "unexpected error {err:?}"
    );
}

#[rstest]
#[case("$jq(.customer) == 1", "object")]
#[case("$jq(.items) == 1", "array")]
#[case("$jq[array](.items[]) == 1", "object")]
#[case("1 IN $jq[array](.items[0].qty, .customer.name)", "string")]
fn test_unsupported_sub_query_values(#[case] input: &str, #[case] found: &str) {
    let err = evaluate(&parse(input).unwrap(), &order()).unwrap_err();
    match err.root_cause() {
        EvalError::SubQueryValue { found: f, .. } => assert_eq!(*f, found),
        other => panic!("expected an unsupported sub-query value, got {other:?}"),
    }
}

#[test]
fn test_sub_query_runtime_error() {
    let err = evaluate(&parse("$jq(.customer.name[0]) == 1").unwrap(), &order()).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        EvalError::SubQuery {
            source: QueryError::Type { .. },
            ..
        }
    ));
}

#[test]
fn test_sub_query_sees_all_arguments() {
    let mut args = Args::new();
    args.insert("n".to_string(), Value::from(4));
    args.insert("tags".to_string(), Value::from(vec!["x", "y"]));
    let expr = parse(r#"$jq(.n) == n AND $jq(.tags[1]) == "y""#).unwrap();
    assert!(evaluate(&expr, &args).unwrap());
}

// ============================================================================
// Custom engines
// ============================================================================

#[derive(Debug)]
struct Counting {
    runs: Arc<AtomicUsize>,
    values: Vec<serde_json::Value>,
}

impl CompiledQuery for Counting {
    fn run<'a>(&'a self, _input: &'a serde_json::Value) -> QueryResults<'a> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Box::new(self.values.iter().cloned().map(Ok))
    }
}

struct CountingEngine {
    compiles: AtomicUsize,
    runs: Arc<AtomicUsize>,
}

impl CountingEngine {
    fn new() -> Self {
        CountingEngine {
            compiles: AtomicUsize::new(0),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl QueryEngine for CountingEngine {
    fn compile(&self, text: &str) -> Result<Arc<dyn CompiledQuery>, QueryError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        let values = serde_json::from_str(text).map_err(|e| QueryError::Other(Box::new(e)))?;
        Ok(Arc::new(Counting {
            runs: Arc::clone(&self.runs),
            values,
        }))
    }
}

#[test]
fn test_sub_query_runs_on_every_evaluation() {
    let engine = CountingEngine::new();
    let expr = parse_with("$jq([1, 2]) == 1", ParserConfig::default(), &engine).unwrap();
    assert_eq!(engine.compiles.load(Ordering::SeqCst), 1);

    let args = Args::new();
    for _ in 0..3 {
        assert!(evaluate(&expr, &args).unwrap());
    }
    assert_eq!(engine.compiles.load(Ordering::SeqCst), 1);
    assert_eq!(engine.runs.load(Ordering::SeqCst), 3);
}

#[rstest]
#[case(r#"$jq(["a", "b", "c"]) == "a""#)]
#[case(r#"$jq[last](["a", "b", "c"]) == "c""#)]
#[case(r#""b" IN $jq[array](["a", "b", "c"])"#)]
fn test_modes_pick_from_produced_values(#[case] input: &str) {
    let engine = CountingEngine::new();
    let expr = parse_with(input, ParserConfig::default(), &engine).unwrap();
    assert!(evaluate(&expr, &Args::new()).unwrap());
}

#[test]
fn test_engine_compile_errors_surface_at_parse_time() {
    let engine = CountingEngine::new();
    assert!(parse_with("$jq(not json) == 1", ParserConfig::default(), &engine).is_err());
}

#[test]
fn test_parsed_tree_outlives_engine() {
    let expr = {
        let engine = CountingEngine::new();
        parse_with("$jq([5]) > 4", ParserConfig::default(), &engine).unwrap()
    };
    assert!(evaluate(&expr, &Args::new()).unwrap());
}

#[test]
fn test_path_engine_is_the_default() {
    let expr = parse_with("$jq(.a) == 1", ParserConfig::default(), &PathEngine).unwrap();
    let args = args_from_json(json!({"a": 1})).unwrap();
    assert!(evaluate(&expr, &args).unwrap());
    assert_eq!(
        parse("$jq(.a) == 1").unwrap(),
        expr,
        "sub-queries compare by source and mode"
    );
}
