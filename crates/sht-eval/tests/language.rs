/// Integration tests for core language evaluation

use std::sync::mpsc;

use sht_ast::build::*;
use sht_ast::{BinaryOperator, Node, PostfixOperator};
use sht_eval::{run, Interpreter, Options};

/// Run a tree and return its display, failing the test on an unhandled error.
fn run_ok(tree: &Node) -> String {
    let result = run(tree);
    assert!(result.is_ok(), "Run failed: {}", result.display);
    result.display
}

fn add(l: Node, r: Node) -> Node {
    binary(BinaryOperator::Add, l, r)
}

#[test]
fn test_default_parameter() {
    // fn foo(a, b, c = 2) { a + b + c }; foo(1, 3)
    let tree = block(vec![
        function(
            "foo",
            vec![param("a"), param("b"), param_default("c", number(2.0))],
            block(vec![add(add(ident("a"), ident("b")), ident("c"))]),
        ),
        call(ident("foo"), vec![number(1.0), number(3.0)]),
    ]);
    assert_eq!(run_ok(&tree), "6");
}

#[test]
fn test_closure_captures_argument() {
    // fn adder(n) { fn(x) { x + n } }; let add10 = adder(10); add10(5)
    let tree = block(vec![
        function(
            "adder",
            vec![param("n")],
            block(vec![lambda(vec![param("x")], block(vec![add(ident("x"), ident("n"))]))]),
        ),
        let_("add10", call(ident("adder"), vec![number(10.0)])),
        call(ident("add10"), vec![number(5.0)]),
    ]);
    assert_eq!(run_ok(&tree), "15");
}

#[test]
fn test_closure_sees_later_assignment() {
    // let x = 1; fn get() { x }; x = 2; get()
    let tree = block(vec![
        let_("x", number(1.0)),
        function("get", vec![], block(vec![ident("x")])),
        assign("x", number(2.0)),
        call(ident("get"), vec![]),
    ]);
    assert_eq!(run_ok(&tree), "2");
}

#[test]
fn test_early_return() {
    // fn f() { return 5; 6 }; f()
    let tree = block(vec![
        function("f", vec![], block(vec![return_(number(5.0)), number(6.0)])),
        call(ident("f"), vec![]),
    ]);
    assert_eq!(run_ok(&tree), "5");
}

#[test]
fn test_tuple_indexing() {
    let tree = block(vec![
        let_("t", tuple(vec![number(1.0), number(2.0), number(3.0)])),
        index(ident("t"), vec![number(1.0)]),
    ]);
    assert_eq!(run_ok(&tree), "2");
}

#[test]
fn test_incompatible_operands_report_error() {
    let result = run(&add(number(1.0), boolean(true)));
    assert!(!result.is_ok());
    assert_eq!(
        result.display,
        "ERR! incompatible types for operation +: Number and Boolean"
    );
    assert!(result.error.is_some());
}

#[test]
fn test_undefined_variable() {
    let result = run(&block(vec![ident("nope")]));
    assert_eq!(result.display, "ERR! undefined variable 'nope'");
}

#[test]
fn test_wrap_and_coalesce() {
    // let m = (raise 'bad')?; m ?? 7
    let tree = block(vec![
        let_("m", wrap(raise(string("bad")))),
        binary(BinaryOperator::Coalesce, ident("m"), number(7.0)),
    ]);
    assert_eq!(run_ok(&tree), "7");

    // (5)? ?? 7
    let tree = binary(BinaryOperator::Coalesce, wrap(number(5.0)), number(7.0));
    assert_eq!(run_ok(&tree), "5");
}

#[test]
fn test_wrap_error_raised_inside_function() {
    // fn bad() { raise 'x' }; let m = (bad())?
    let setup = || {
        vec![
            function("bad", vec![], block(vec![raise(string("x"))])),
            let_("m", wrap(call(ident("bad"), vec![]))),
        ]
    };

    let mut tree = setup();
    tree.push(ident("m"));
    assert_eq!(run_ok(&block(tree)), "<Maybe:error>");

    let mut tree = setup();
    tree.push(unwrap(ident("m")));
    let result = run(&block(tree));
    assert!(result.error.is_some());
    assert_eq!(result.display, "ERR! x");

    let mut tree = setup();
    tree.push(binary(BinaryOperator::Coalesce, ident("m"), string("fallback")));
    assert_eq!(run_ok(&block(tree)), "fallback");
}

#[test]
fn test_unwrap() {
    assert_eq!(run_ok(&unwrap(wrap(number(5.0)))), "5");
    assert_eq!(run_ok(&wrap(number(5.0))), "<Maybe:value>");

    let result = run(&unwrap(wrap(raise(string("bad")))));
    assert_eq!(result.display, "ERR! bad");
}

#[test]
fn test_raise_non_string_value() {
    let result = run(&raise(number(3.0)));
    assert!(!result.is_ok());
    assert_eq!(result.display, "ERR! 3");
}

#[test]
fn test_spread_arguments() {
    // fn sum3(a, b, c) { a + b + c }; let t = (1, 2, 3); sum3(t...)
    let tree = block(vec![
        function(
            "sum3",
            vec![param("a"), param("b"), param("c")],
            block(vec![add(add(ident("a"), ident("b")), ident("c"))]),
        ),
        let_("t", tuple(vec![number(1.0), number(2.0), number(3.0)])),
        call(ident("sum3"), vec![spread(ident("t"))]),
    ]);
    assert_eq!(run_ok(&tree), "6");
}

#[test]
fn test_spread_parameter_collects_rest() {
    // fn f(first, ...rest) { rest }; f(1, 2, 3)
    let tree = block(vec![
        function(
            "f",
            vec![param("first"), param_spread("rest")],
            block(vec![ident("rest")]),
        ),
        call(ident("f"), vec![number(1.0), number(2.0), number(3.0)]),
    ]);
    assert_eq!(run_ok(&tree), "[2, 3]");
}

#[test]
fn test_missing_argument() {
    let tree = block(vec![
        function("f", vec![param("a")], block(vec![ident("a")])),
        call(ident("f"), vec![]),
    ]);
    assert_eq!(run(&tree).display, "ERR! missing argument 'a'");
}

#[test]
fn test_membership_type_test_and_conversion() {
    let numbers = tuple(vec![number(1.0), number(2.0), number(3.0)]);
    assert_eq!(run_ok(&binary(BinaryOperator::In, number(2.0), numbers)), "true");
    assert_eq!(run_ok(&binary(BinaryOperator::Is, number(1.0), ident("Number"))), "true");
    assert_eq!(run_ok(&binary(BinaryOperator::Is, string("a"), ident("Number"))), "false");
    assert_eq!(run_ok(&binary(BinaryOperator::As, string("42"), ident("Number"))), "42");
}

#[test]
fn test_list_and_dict_item_assignment() {
    // let xs = List { 1, 2, 3 }; xs[0] = 10; xs
    let tree = block(vec![
        let_(
            "xs",
            call_list(ident("List"), vec![], vec![number(1.0), number(2.0), number(3.0)]),
        ),
        assign_to(vec![index(ident("xs"), vec![number(0.0)])], number(10.0)),
        ident("xs"),
    ]);
    assert_eq!(run_ok(&tree), "[10, 2, 3]");

    // let d = Dict { a: 1 }; d['b'] = 2; d
    let tree = block(vec![
        let_("d", call_map(ident("Dict"), vec![], vec![("a", number(1.0))])),
        assign_to(vec![index(ident("d"), vec![string("b")])], number(2.0)),
        ident("d"),
    ]);
    assert_eq!(run_ok(&tree), "{a: 1, b: 2}");
}

#[test]
fn test_self_containing_list_renders() {
    // let l = List { 1 }; l[0] = l; l
    let tree = block(vec![
        let_("l", call_list(ident("List"), vec![], vec![number(1.0)])),
        assign_to(vec![index(ident("l"), vec![number(0.0)])], ident("l")),
        ident("l"),
    ]);
    assert_eq!(run_ok(&tree), "[[...]]");
}

#[test]
fn test_postfix_returns_old_value() {
    // let i = 1; let old = i++; (old, i)
    let tree = block(vec![
        let_("i", number(1.0)),
        let_("old", postfix(PostfixOperator::Increment, "i")),
        tuple(vec![ident("old"), ident("i")]),
    ]);
    assert_eq!(run_ok(&tree), "(1, 2)");
}

#[test]
fn test_integer_division_and_modulo() {
    assert_eq!(run_ok(&binary(BinaryOperator::IntDiv, number(7.0), number(2.0))), "3");
    assert_eq!(run_ok(&binary(BinaryOperator::Mod, number(7.0), number(3.0))), "1");
    assert_eq!(run_ok(&binary(BinaryOperator::Div, number(1.0), number(4.0))), "0.250000");
}

#[test]
fn test_match_by_value_type_and_wildcard() {
    let cases = |subject: Node| {
        match_(
            subject,
            vec![
                (number(1.0), string("one")),
                (ident("Number"), string("number")),
                (ident("_"), string("other")),
            ],
        )
    };
    assert_eq!(run_ok(&cases(number(1.0))), "one");
    assert_eq!(run_ok(&cases(number(3.0))), "number");
    assert_eq!(run_ok(&cases(string("x"))), "other");
}

#[test]
fn test_destructuring_with_spread_target() {
    // let a, ...rest = (1, 2, 3); rest
    let tree = block(vec![
        let_many(
            vec![ident("a"), spread(ident("rest"))],
            tuple(vec![number(1.0), number(2.0), number(3.0)]),
        ),
        ident("rest"),
    ]);
    assert_eq!(run_ok(&tree), "(2, 3)");
}

#[test]
fn test_print_goes_to_sink() {
    let (tx, rx) = mpsc::channel();
    let interp = Interpreter::with_options(Options::default().print_sink(tx));
    let result = interp.run(&call(ident("print"), vec![string("a"), number(1.0)]));
    assert!(result.is_ok(), "Run failed: {}", result.display);
    assert_eq!(result.display, "false");
    assert_eq!(rx.recv().unwrap(), "a 1");
}

#[test]
fn test_concat_and_logic() {
    assert_eq!(run_ok(&binary(BinaryOperator::Concat, string("n="), number(4.0))), "n=4");
    assert_eq!(run_ok(&binary(BinaryOperator::Xor, boolean(true), boolean(false))), "true");
    assert_eq!(run_ok(&binary(BinaryOperator::Nor, boolean(false), boolean(false))), "true");
}

#[test]
fn test_math_module() {
    let tree = call(access(ident("math"), "pow"), vec![number(2.0), number(8.0)]);
    assert_eq!(run_ok(&tree), "256");
}
