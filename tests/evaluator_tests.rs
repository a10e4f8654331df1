// tests/evaluator_tests.rs

use conditions_lang::{Args, EvalError, Evaluator, Literal, Value, evaluate, parse};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn eval(input: &str, args: &Args) -> Result<bool, EvalError> {
    let expr = parse(input).unwrap_or_else(|e| panic!("cannot parse {input}: {e}"));
    evaluate(&expr, args)
}

fn eval_literal(input: &str) -> Result<bool, EvalError> {
    eval(input, &Args::new())
}

fn args(pairs: Vec<(&str, Value)>) -> Args {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// ============================================================================
// Literal conditions
// ============================================================================

#[rstest]
#[case("TRUE", true)]
#[case("NOT TRUE", false)]
#[case("TRUE AND FALSE", false)]
#[case("TRUE NAND FALSE", true)]
#[case("TRUE NAND TRUE", false)]
#[case("FALSE OR TRUE", true)]
#[case("TRUE XOR TRUE", false)]
#[case("TRUE XOR FALSE", true)]
#[case("1 == 1", true)]
#[case("1 != 1", false)]
#[case(r#""a" == "a""#, true)]
#[case(r#""a" != "b""#, true)]
#[case("TRUE == FALSE", false)]
#[case("2 > 1", true)]
#[case("2 >= 2", true)]
#[case("2 <= 2", true)]
#[case("-5 < 0", true)]
#[case("1.5 > 1", true)]
fn test_literal_conditions(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(eval_literal(input).unwrap(), expected);
}

#[test]
fn test_precedence_changes_the_result() {
    assert!(eval_literal("TRUE OR FALSE AND FALSE").unwrap());
    assert!(!eval_literal("(TRUE OR FALSE) AND FALSE").unwrap());
}

#[test]
fn test_equal_chains_group_left_to_right() {
    // (1 == 1) == TRUE; grouping the other way would compare a number
    // against a boolean
    assert!(eval_literal("1 == 1 == TRUE").unwrap());
}

#[test]
fn test_long_chains_evaluate() {
    let chain = vec!["TRUE"; 5000].join(" AND ");
    assert!(eval_literal(&chain).unwrap());

    let mixed = (0..5000)
        .map(|i| if i % 2 == 0 { "FALSE" } else { "1 < 2" })
        .collect::<Vec<_>>()
        .join(" OR ");
    assert!(eval_literal(&mixed).unwrap());
}

#[test]
fn test_error_at_the_end_of_a_long_chain() {
    let chain = format!("{} AND 1", vec!["TRUE"; 5000].join(" AND "));
    let err = eval_literal(&chain).unwrap_err();
    assert_eq!(err.to_string(), "cannot apply AND");
    assert!(matches!(
        err.root_cause(),
        EvalError::TypeMismatch {
            expected: "boolean",
            found: "number"
        }
    ));
}

#[test]
fn test_less_than_is_strict() {
    assert!(!eval_literal("2 < 2").unwrap());
    assert!(eval_literal("2 <= 2").unwrap());
    assert!(eval_literal("1 < 2").unwrap());
}

#[test]
fn test_repeated_evaluation_is_stable() {
    let expr = parse(r#"(3 > 2 AND "x" IN ["x", "y"]) XOR FALSE"#).unwrap();
    let args = Args::new();
    for _ in 0..5 {
        assert!(evaluate(&expr, &args).unwrap());
    }
}

// ============================================================================
// Membership
// ============================================================================

#[rstest]
#[case("2 IN [1, 2, 3]", true)]
#[case("2 NOT IN [1, 2, 3]", false)]
#[case("4 IN [1, 2, 3]", false)]
#[case(r#""b" IN ["a", "b"]"#, true)]
#[case(r#""c" NOT IN ["a", "b"]"#, true)]
fn test_membership(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(eval_literal(input).unwrap(), expected);
}

#[test]
fn test_membership_kind_mismatch() {
    let err = eval_literal(r#""x" IN [1, 2, 3]"#).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        EvalError::TypeMismatch {
            expected: "string list",
            found: "number list"
        }
    ));
}

#[test]
fn test_membership_with_boolean_needle() {
    let err = eval_literal("TRUE IN [1, 2]").unwrap_err();
    assert!(matches!(
        err.root_cause(),
        EvalError::UnsupportedOperand { found: "boolean", .. }
    ));
}

// ============================================================================
// Regular expressions
// ============================================================================

#[rstest]
#[case(r#""abc" =~ "^a""#, true)]
#[case(r#""abc" !~ "^a""#, false)]
#[case(r#""abc" =~ "c$""#, true)]
#[case(r#""abc" =~ "b""#, true)]
#[case(r#""abc" =~ /^b/"#, false)]
#[case(r#""a1" =~ "\d""#, true)]
fn test_pattern_match(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(eval_literal(input).unwrap(), expected);
}

#[test]
fn test_pattern_operand_from_variable() {
    let a = args(vec![("name", Value::from("ada")), ("re", Value::from("^a"))]);
    assert!(eval("name =~ re", &a).unwrap());
    assert!(!eval("name !~ re", &a).unwrap());
}

#[test]
fn test_compiled_pattern_needs_string_subject() {
    let err = eval_literal(r#"1 =~ "^1""#).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        EvalError::TypeMismatch {
            expected: "string",
            found: "number"
        }
    ));
}

#[rstest]
#[case(r#""abc" =~ "(""#)]
#[case(r#""abc" !~ "(""#)]
fn test_invalid_pattern_is_an_error(#[case] input: &str) {
    let err = eval_literal(input).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        EvalError::InvalidPattern { pattern, .. } if pattern == "("
    ));
}

// ============================================================================
// Equality edge cases
// ============================================================================

#[test]
fn test_list_equality_is_false_without_error() {
    assert!(!eval_literal("[1, 2] == [1, 2]").unwrap());
    assert!(eval_literal("[1, 2] != [1, 2]").unwrap());
}

#[rstest]
#[case(r#""1" == 1"#, "number")]
#[case(r#"1 == "1""#, "string")]
#[case("TRUE == 1", "number")]
#[case(r#"1 != "1""#, "string")]
fn test_equality_kind_mismatch(#[case] input: &str, #[case] found: &str) {
    let err = eval_literal(input).unwrap_err();
    match err.root_cause() {
        EvalError::TypeMismatch { found: f, .. } => assert_eq!(*f, found),
        other => panic!("expected a type mismatch, got {other:?}"),
    }
}

#[rstest]
#[case("1 AND TRUE")]
#[case(r#""a" > 1"#)]
#[case("TRUE < 1")]
#[case("1 =~ 1")]
fn test_operand_kind_errors(#[case] input: &str) {
    let err = eval_literal(input).unwrap_err();
    assert!(
        matches!(err.root_cause(), EvalError::TypeMismatch { .. }),
        "unexpected error {err:?}"
    );
}

#[test]
fn test_result_must_be_boolean() {
    assert!(matches!(
        eval_literal("1"),
        Err(EvalError::NotBoolean { found: "number" })
    ));
    assert!(matches!(
        eval_literal("(\"a\")"),
        Err(EvalError::NotBoolean { found: "string" })
    ));
}

#[test]
fn test_error_in_left_operand_stops_evaluation() {
    let a = args(vec![("n", Value::from(1))]);
    let err = eval("(missing > 1) OR (n =~ \"(\")", &a).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        EvalError::MissingArgument { name } if name == "missing"
    ));
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_variable_resolution() {
    let a = args(vec![("n", Value::from(5))]);
    assert!(eval("n > 3", &a).unwrap());

    let err = eval("missing > 3", &a).unwrap_err();
    assert!(matches!(
        err,
        EvalError::MissingArgument { ref name } if name == "missing"
    ));
}

#[test]
fn test_integer_list_compares_by_value() {
    let a = args(vec![
        ("arr", Value::from(vec![1_i32, 2, 3])),
        ("n", Value::from(2_u64)),
    ]);
    assert!(eval("n IN arr", &a).unwrap());
    assert!(eval("3 IN arr", &a).unwrap());
    assert!(!eval("4 IN arr", &a).unwrap());
}

#[test]
fn test_variables_of_every_kind() {
    let a = args(vec![
        ("name", Value::from("ada")),
        ("ratio", Value::from(0.5_f32)),
        ("active", Value::from(true)),
        ("roles", Value::from(vec!["admin", "dev"])),
    ]);
    assert!(eval(r#"name == "ada" AND name =~ "^a""#, &a).unwrap());
    assert!(eval("ratio < 1 AND ratio >= 0.5", &a).unwrap());
    assert!(eval("active == TRUE AND active", &a).unwrap());
    assert!(eval(r#""dev" IN roles AND "ops" NOT IN roles"#, &a).unwrap());
}

#[test]
fn test_dotted_and_indexed_names_are_looked_up_verbatim() {
    let a = args(vec![
        ("user.age", Value::from(30)),
        ("$1", Value::from("x")),
    ]);
    assert!(eval("[user][age] > 18", &a).unwrap());
    assert!(eval(r#"$1 == "x""#, &a).unwrap());
}

#[test]
fn test_empty_json_array_is_an_empty_list() {
    let a = conditions_lang::args_from_json(serde_json::json!({"tags": []})).unwrap();
    assert!(!eval(r#""x" IN tags"#, &a).unwrap());
    assert!(!eval("1 IN tags", &a).unwrap());
    assert!(eval(r#""x" NOT IN tags"#, &a).unwrap());
}

#[test]
fn test_document_argument_is_not_an_operand() {
    let a = args(vec![("user", Value::from(serde_json::json!({"id": 1})))]);
    let err = eval("user == 1", &a).unwrap_err();
    assert!(matches!(
        err,
        EvalError::UnsupportedValue { ref name, kind: "document" } if name == "user"
    ));
}

// ============================================================================
// Evaluator API
// ============================================================================

#[test]
fn test_reduce_returns_literals() {
    let a = args(vec![("tags", Value::from(vec!["a"]))]);
    let evaluator = Evaluator::new(&a);
    assert_eq!(
        evaluator.reduce(&parse("tags").unwrap()).unwrap(),
        Literal::StringList(vec!["a".to_string()])
    );
    assert_eq!(
        evaluator.reduce(&parse("(2.5)").unwrap()).unwrap(),
        Literal::Number(2.5)
    );
}

#[test]
fn test_concurrent_evaluation_of_one_tree() {
    let expr = parse("n > 10 AND $jq(.n) == n").unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let expr = &expr;
                scope.spawn(move || {
                    let a = args(vec![("n", Value::from(i * 3))]);
                    (i * 3 > 10, evaluate(expr, &a).unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (expected, actual) = handle.join().unwrap();
            assert_eq!(actual, expected);
        }
    });
}
