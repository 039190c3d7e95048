use crate::engine::{Engine, Limits, Sandbox};
use crate::error::{Error, SyntaxError};

fn eval(src: &str) -> Result<String, Error> {
    Sandbox::new().evaluate(src)
}

fn test(src: &str, expected: &str) {
    match eval(src) {
        Ok(actual) => assert_eq!(actual, expected, "{src:?}"),
        Err(err) => panic!("{src:?}: {err}"),
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn increment_then_double() {
        test("let x = 1;\nx = x + 1;\nx = x * 2;\nreturn x;", "4");
        test("let x = 1;\nx = x * 2;\nx = x + 1;\nreturn x;", "3");
    }

    #[test]
    fn temporaries() {
        test(
            "let x = 1, y = 2;\nlet tmp0 = x;\nlet tmp1 = y;\ntmp0 += tmp1;\nx = tmp0;\ny = 3;\nreturn [x, y];",
            "[3,3]",
        );
    }

    #[test]
    fn floats_and_specials() {
        test("return 0.1 + 0.2", "0.30000000000000004");
        test("return 1 / 0", "Infinity");
        test("return -1 / 0", "-Infinity");
        test("return 0 / 0", "NaN");
        test("return 7 % 3", "1");
        test("return -7 % 3", "-1");
    }

    #[test]
    fn coercion() {
        test("return '1' + 2", "\"12\"");
        test("return '3' * '4'", "12");
        test("return [1, 2] + ''", "\"1,2\"");
        test("return true + 1", "2");
        test("return null + 1", "1");
        test("return undefined + 1", "NaN");
    }

    #[test]
    fn update_operators() {
        test("let i = 0; let a = i++; let b = ++i; return [a, b, i]", "[0,2,2]");
        test("let a = [5]; let i = 0; a[i++] += 1; return [a, i]", "[[6],1]");
    }
}

mod control {
    use super::*;

    #[test]
    fn if_else() {
        test("let x = 3; if (x > 2) { x = 0 } else x = 1; return x", "0");
        test("let r; if (false) r = 1; else if (true) r = 2; return r", "2");
    }

    #[test]
    fn while_loop() {
        test("let i = 0, s = 0; while (i < 5) { s += i; i++ } return s", "10");
    }

    #[test]
    fn for_loop() {
        test("let s = 0; for (let i = 0; i < 3; i++) s += i; return s", "3");
        test("let i = 5, n = 0; for (; i > 0; i -= 2) { n++ } return [i, n]", "[-1,3]");
        test("let a = []; for (let i = 0; ; i++) { if (i == 2) return a; a.push(i) }", "[0,1]");
        test("let n = 0; for (n = 10; n < 3;) n = 99; return n", "10");
    }

    #[test]
    fn for_loop_scoping() {
        // The initializer and the body are scoped to the loop.
        test("let i = 'outer'; for (let i = 0; i < 2; i++) { let i = 9 } return i", "\"outer\"");
        test("for (let i = 0; i < 2; i++) {} for (let i = 5; i < 6; i++) {} return typeof i", "\"undefined\"");
        assert!(matches!(eval("for (const i = 0; i < 0;) {} return i"), Err(Error::Reference(_))));
    }

    #[test]
    fn for_loop_step_limit() {
        let sandbox = Sandbox::with_limits(Limits { max_steps: Some(100) });
        assert_eq!(sandbox.evaluate("for (;;) {}"), Err(Error::StepLimit(100)));
        assert_eq!(
            sandbox.evaluate("let s = 0; for (let i = 0; i < 4; i++) s++; return s"),
            Ok("4".to_owned()),
        );
    }

    #[test]
    fn first_return_wins() {
        test("return 1; return 2;", "1");
        test("{ return 'inner' } return 'outer'", "\"inner\"");
    }

    #[test]
    fn no_return_is_undefined() {
        test("let x = 1;", "undefined");
        test("", "undefined");
    }

    #[test]
    fn logical_operators() {
        test("return [0 || 'a', 1 && 'b', null ?? 3, 0 ?? 3]", "[\"a\",\"b\",3,0]");
        test("return [1 == '1', 1 === '1', null == undefined, NaN == NaN]", "[true,false,true,false]");
        test("return 'b' > 'a' ? 'yes' : 'no'", "\"yes\"");
    }

    #[test]
    fn block_scoping() {
        test("let x = 1; { let x = 2; } return x", "1");
        test("let x = 1; { x = 2; } return x", "2");
    }
}

mod values {
    use super::*;

    #[test]
    fn arrays_alias() {
        test("let a = [1]; let b = a; b.push(2, 3); return [a, a.length]", "[[1,2,3],3]");
        test("let a = [1, 2]; let p = a.pop(); return [a, p, [].pop()]", "[[1],2,undefined]");
        test("let a = []; a[2] = 1; return a", "[undefined,undefined,1]");
        test("return [[1, NaN].includes(NaN), [1, NaN].indexOf(NaN), [1, 2].join('-')]", "[true,-1,\"1-2\"]");
    }

    #[test]
    fn objects_keep_insertion_order() {
        test("let o = {b: 1, a: 2}; o.c = 3; o.b = 4; return o", r#"{"b":4,"a":2,"c":3}"#);
        test("let o = {}; o['k' + 1] = true; return o.k1", "true");
    }

    #[test]
    fn large_indexes() {
        test("let a = []; a[1000] = 1; return a.length", "1001");
        test("let a = [1, 2, 3]; a.length = 1; return a", "[1]");
        let invalid = Err(Error::Range("Invalid array length".to_owned()));
        assert_eq!(eval("let a = []; a[4294967294] = 1"), invalid);
        assert_eq!(eval("let a = []; a.length = 1e9"), invalid);
        assert_eq!(eval("let a = []; a.length = -1"), invalid);
    }

    #[test]
    fn rounding() {
        test(
            "return [Math.round(0.49999999999999994), Math.round(-2.5), Math.round(-2.6), Math.round(2.5)]",
            "[0,-2,-3,3]",
        );
        test("return Math.round(4503599627370497) === 4503599627370497", "true");
        test("return Math.round(-4503599627370497) === -4503599627370497", "true");
        test("return [1 / Math.round(-0.4), 1 / Math.round(0.4)]", "[-Infinity,Infinity]");
    }

    #[test]
    fn utf16_strings() {
        test("return ['\u{1F600}'.length, 'é'.length, 'a\u{1F600}b'[3]]", "[2,1,\"b\"]");
        test("let s = '\u{1F600}'; return s[0] === s[1]", "true");
        test("return ['\u{FF5E}' > '\u{1F600}', 'b' > 'a']", "[true,true]");
    }

    #[test]
    fn builtins() {
        test("return [Math.max(1, 5, 3), Math.min(), Math.floor(-1.5), Math.round(2.5)]", "[5,Infinity,-2,3]");
        test("return [String(12), Number('0x10'), Boolean('')]", "[\"12\",16,false]");
        test("return [typeof 1, typeof 'a', typeof null, typeof nope, typeof Math.abs]", "[\"number\",\"string\",\"object\",\"undefined\",\"function\"]");
    }
}

mod errors {
    use super::*;

    #[test]
    fn syntax() {
        assert_eq!(
            eval("let x = 1;\nreturn x +;"),
            Err(SyntaxError::new("unexpected `;`", 2).into()),
        );
        assert!(matches!(eval("let x = 1;\nlet x = 2;"), Err(Error::Syntax(_))));
    }

    #[test]
    fn reference() {
        assert_eq!(eval("return y"), Err(Error::Reference("y is not defined".to_owned())));
        assert_eq!(eval("y = 1"), Err(Error::Reference("y is not defined".to_owned())));
    }

    #[test]
    fn type_errors() {
        assert_eq!(
            eval("const c = 1; c = 2"),
            Err(Error::Type("Assignment to constant variable.".to_owned())),
        );
        assert_eq!(
            eval("let o; return o.x"),
            Err(Error::Type("Cannot read properties of undefined (reading 'x')".to_owned())),
        );
        assert_eq!(
            eval("let f = 1; f()"),
            Err(Error::Type("f is not a function".to_owned())),
        );
        assert_eq!(
            eval("let a = []; a.push(a); return a"),
            Err(Error::Type("Converting circular structure to JSON".to_owned())),
        );
    }

    #[test]
    fn thrown() {
        assert_eq!(eval("throw 'boom'"), Err(Error::Thrown("boom".to_owned())));
        assert_eq!(eval("throw {code: 1}"), Err(Error::Thrown(r#"{"code":1}"#.to_owned())));
        assert_eq!(
            eval("throw 'boom'").unwrap_err().to_string(),
            "Uncaught boom",
        );
    }

    #[test]
    fn thrown_errors() {
        assert_eq!(eval("throw new Error('boom')"), Err(Error::Thrown("Error: boom".to_owned())));
        assert_eq!(
            eval("throw new Error('boom')").unwrap_err().to_string(),
            "Uncaught Error: boom",
        );
        assert_eq!(
            eval("throw new TypeError('bad ' + 1)").unwrap_err().to_string(),
            "Uncaught TypeError: bad 1",
        );
        assert_eq!(eval("throw new RangeError"), Err(Error::Thrown("RangeError".to_owned())));
        assert_eq!(eval("throw Error('plain call')"), Err(Error::Thrown("Error: plain call".to_owned())));
    }

    #[test]
    fn error_values() {
        test(
            "let e = new Error('m'); return [e.message, e.name, String(e), typeof e]",
            r#"["m","Error","Error: m","object"]"#,
        );
        test("return new ReferenceError('x')", r#"ReferenceError("x")"#);
        assert_eq!(
            eval("new Math.floor(1)"),
            Err(Error::Type("Math.floor is not a constructor".to_owned())),
        );
    }

    #[test]
    fn step_limit() {
        let sandbox = Sandbox::with_limits(Limits { max_steps: Some(100) });
        assert_eq!(
            sandbox.evaluate("while (true) {}"),
            Err(Error::StepLimit(100)),
        );
        assert_eq!(sandbox.evaluate("let i = 0; while (i < 3) i++; return i"), Ok("3".to_owned()));
    }
}

mod isolation {
    use super::*;

    #[test]
    fn runs_do_not_share_state() {
        let sandbox = Sandbox::new();
        let prog = sandbox.compile("let a = [1]; a.push(2); return a").unwrap();
        let first = sandbox.run(&prog).unwrap().to_json().unwrap();
        let second = sandbox.run(&prog).unwrap().to_json().unwrap();
        assert_eq!(first, "[1,2]");
        assert_eq!(second, "[1,2]");
    }

    #[test]
    fn globals_are_fresh() {
        let sandbox = Sandbox::new();
        assert_eq!(sandbox.evaluate("Math.floor = 1; return Math.floor"), Ok("1".to_owned()));
        assert_eq!(sandbox.evaluate("return Math.floor(1.5)"), Ok("1".to_owned()));
    }
}

mod nesting {
    use super::*;

    #[test]
    fn shallow_syntax() {
        let parens = format!("return {}1{}", "(".repeat(50), ")".repeat(50));
        test(&parens, "1");
        let blocks = format!("{}return 2{}", "{".repeat(50), "}".repeat(50));
        test(&blocks, "2");
    }

    #[test]
    fn deep_syntax() {
        let deep = 100_000;
        for src in [
            format!("return {}1{}", "(".repeat(deep), ")".repeat(deep)),
            format!("return {}{}", "[".repeat(deep), "]".repeat(deep)),
            format!("{}{}", "{".repeat(deep), "}".repeat(deep)),
            format!("return {}1", "!".repeat(deep)),
            format!("return 1{}", "+1".repeat(deep)),
            format!("let x; x{}", " = x".repeat(deep)),
            format!("return {}", "a.".repeat(deep) + "b"),
            "if (1) ".repeat(deep) + ";",
        ] {
            assert!(matches!(eval(&src), Err(Error::Syntax(_))), "{}", &src[..20]);
        }
    }

    #[test]
    fn deep_values() {
        let build = "let a = []; for (let i = 0; i < 100000; i++) a = [a];";
        test(&format!("{build} return 1"), "1");
        test(&format!("{build} return String(a)"), "\"\"");
        assert_eq!(eval(&format!("{build} return a")), Err(Error::too_deep()));
        let build = "let o = {}; for (let i = 0; i < 100000; i++) o = {next: o};";
        assert_eq!(eval(&format!("{build} return o")), Err(Error::too_deep()));
        assert_eq!(eval(&format!("{build} throw o")), Err(Error::Thrown("[object Object]".to_owned())));
    }
}
