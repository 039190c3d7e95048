use interleave::{simulate, Error, OutcomeTally};
use interleave_script::Error as ScriptError;

struct Test {
    prelude: &'static str,
    threads: Vec<&'static str>,
    epilogue: &'static str,
    /// Outcomes in first-seen order.
    outcomes: Vec<(&'static str, u64)>,
}

impl Test {
    fn new(
        prelude: &'static str,
        threads: Vec<&'static str>,
        epilogue: &'static str,
        outcomes: Vec<(&'static str, u64)>,
    ) -> Self {
        Test {
            prelude,
            threads,
            epilogue,
            outcomes,
        }
    }
}

fn get_tests() -> Vec<Test> {
    vec![
        // Lost update through temporaries
        Test::new(
            "let x = 0;",
            vec!["let a = x;\nx = a + 1;", "let b = x;\nx = b + 1;"],
            "return x;",
            vec![("2", 2), ("1", 4)],
        ),
        // Single-instruction increments are atomic
        Test::new(
            "let x = 0;",
            vec!["x++;", "x++;", "x++;"],
            "return x;",
            vec![("3", 6)],
        ),
        // Check-then-act overdraws when both checks run first
        Test::new(
            "let balance = 100, paid = 0;",
            vec![
                "let ok1 = balance >= 80;\nif (ok1) balance -= 80;\nif (ok1) paid++;",
                "let ok2 = balance >= 80;\nif (ok2) balance -= 80;\nif (ok2) paid++;",
            ],
            "return [balance, paid];",
            vec![("[20,1]", 8), ("[-60,2]", 12)],
        ),
        // Key order is part of the outcome
        Test::new(
            "let o = {};",
            vec!["o.a = 1;", "o.b = 2;"],
            "return o;",
            vec![(r#"{"a":1,"b":2}"#, 1), (r#"{"b":2,"a":1}"#, 1)],
        ),
        // Non-finite numbers keep their names
        Test::new(
            "let v = 1;",
            vec!["v = v / 0;", "v = v - 1;"],
            "return v;",
            vec![("Infinity", 1), ("NaN", 1)],
        ),
        // `undefined` differs from the string "undefined"
        Test::new(
            "let r = null;",
            vec!["r = undefined;", "r = 'undefined';"],
            "return r;",
            vec![("\"undefined\"", 1), ("undefined", 1)],
        ),
        // Comments and blank lines are not instructions
        Test::new(
            "let s = '';",
            vec!["\n// first\n\ns += 'a';\n/* tail */\n", "s += 'b'; // trailing"],
            "return s;",
            vec![("\"ab\"", 1), ("\"ba\"", 1)],
        ),
    ]
}

fn outcomes(tally: &OutcomeTally) -> Vec<(&str, u64)> {
    tally.iter().map(|(k, &n)| (k.as_str(), n)).collect()
}

#[test]
fn scenarios() {
    for test in get_tests() {
        let tally = simulate(test.prelude, &test.threads, test.epilogue)
            .unwrap_or_else(|err| panic!("{:?}: {err}", test.threads));
        assert_eq!(outcomes(&tally), test.outcomes, "{:?}", test.threads);
    }
}

#[test]
fn failure_discards_the_batch() {
    let err = simulate("let x = 1;", &["x = 2;", "x = 3;"], "return x +;").unwrap_err();
    assert!(
        matches!(err, Error::Execution(ScriptError::Syntax(_))),
        "unexpected error: {err}",
    );

    // Only the second interleaving throws, but no tally comes back.
    let err = simulate(
        "let x = 0;",
        &["x = 1;", "if (x == 0) throw 'raced';"],
        "return x;",
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Uncaught raced");
}
