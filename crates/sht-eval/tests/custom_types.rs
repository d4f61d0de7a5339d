/// Integration tests for `data` declarations and meta functions

use sht_ast::build::*;
use sht_ast::{BinaryOperator, Node, UnaryOperator};
use sht_eval::run;

fn run_ok(tree: &Node) -> String {
    let result = run(tree);
    assert!(result.is_ok(), "Run failed: {}", result.display);
    result.display
}

fn field(target: &str, name: &str) -> Node {
    access(ident(target), name)
}

fn op(operator: BinaryOperator, l: Node, r: Node) -> Node {
    binary(operator, l, r)
}

fn concat(parts: Vec<Node>) -> Node {
    let mut parts = parts.into_iter();
    let first = parts.next().unwrap_or_else(|| string(""));
    parts.fold(first, |acc, part| op(BinaryOperator::Concat, acc, part))
}

/// data Vec2 {
///     x = 0; y = 0
///     fn length2(self) { self.x * self.x + self.y * self.y }
///     static fn unit() { Vec2 { x: 1, y: 1 } }
///     meta +(self, other) { Vec2 { x: self.x + other.x, y: self.y + other.y } }
///     meta repr(self) { 'Vec2(' .. self.x .. ', ' .. self.y .. ')' }
/// }
fn vec2() -> Node {
    data("Vec2")
        .property("x", number(0.0))
        .property("y", number(0.0))
        .function(function(
            "length2",
            vec![param("self")],
            block(vec![op(
                BinaryOperator::Add,
                op(BinaryOperator::Mul, field("self", "x"), field("self", "x")),
                op(BinaryOperator::Mul, field("self", "y"), field("self", "y")),
            )]),
        ))
        .static_function(function(
            "unit",
            vec![],
            block(vec![call_map(
                ident("Vec2"),
                vec![],
                vec![("x", number(1.0)), ("y", number(1.0))],
            )]),
        ))
        .meta(function(
            "+",
            vec![param("self"), param("other")],
            block(vec![call_map(
                ident("Vec2"),
                vec![],
                vec![
                    ("x", op(BinaryOperator::Add, field("self", "x"), field("other", "x"))),
                    ("y", op(BinaryOperator::Add, field("self", "y"), field("other", "y"))),
                ],
            )]),
        ))
        .meta(function(
            "repr",
            vec![param("self")],
            block(vec![concat(vec![
                string("Vec2("),
                field("self", "x"),
                string(", "),
                field("self", "y"),
                string(")"),
            ])]),
        ))
        .build()
}

fn vec2_of(x: f64, y: f64) -> Node {
    call_map(ident("Vec2"), vec![], vec![("x", number(x)), ("y", number(y))])
}

#[test]
fn test_operator_and_repr_meta() {
    let tree = block(vec![
        vec2(),
        op(BinaryOperator::Add, vec2_of(1.0, 2.0), vec2_of(3.0, 4.0)),
    ]);
    assert_eq!(run_ok(&tree), "Vec2(4, 6)");
}

#[test]
fn test_defaults_fill_missing_properties() {
    let tree = block(vec![
        vec2(),
        call_map(ident("Vec2"), vec![], vec![("y", number(5.0))]),
    ]);
    assert_eq!(run_ok(&tree), "Vec2(0, 5)");
}

#[test]
fn test_supplied_properties_skip_their_defaults() {
    // data Slot { value = raise 'default evaluated' }
    let slot = || data("Slot").property("value", raise(string("default evaluated"))).build();

    let tree = block(vec![
        slot(),
        access(call_map(ident("Slot"), vec![], vec![("value", number(3.0))]), "value"),
    ]);
    assert_eq!(run_ok(&tree), "3");

    let tree = block(vec![slot(), call_map(ident("Slot"), vec![], vec![])]);
    assert_eq!(run(&tree).display, "ERR! default evaluated");
}

#[test]
fn test_missing_operator_meta() {
    let tree = block(vec![
        vec2(),
        op(BinaryOperator::Sub, vec2_of(1.0, 2.0), vec2_of(3.0, 4.0)),
    ]);
    let result = run(&tree);
    assert!(!result.is_ok());
    assert_eq!(result.display, "ERR! type Vec2 does not implement operation -");
}

#[test]
fn test_instance_function() {
    let tree = block(vec![
        vec2(),
        call(access(vec2_of(3.0, 4.0), "length2"), vec![]),
    ]);
    assert_eq!(run_ok(&tree), "25");
}

#[test]
fn test_static_function() {
    let tree = block(vec![vec2(), call(access(ident("Vec2"), "unit"), vec![])]);
    assert_eq!(run_ok(&tree), "Vec2(1, 1)");
}

#[test]
fn test_property_assignment() {
    let tree = block(vec![
        vec2(),
        let_("v", vec2_of(1.0, 2.0)),
        assign_to(vec![field("v", "x")], number(9.0)),
        ident("v"),
    ]);
    assert_eq!(run_ok(&tree), "Vec2(9, 2)");
}

#[test]
fn test_undeclared_initializer_key() {
    let tree = block(vec![
        vec2(),
        call_map(ident("Vec2"), vec![], vec![("z", number(1.0))]),
    ]);
    assert_eq!(run(&tree).display, "ERR! type Vec2 has no property 'z'");
}

#[test]
fn test_list_initializer_rejected() {
    let tree = block(vec![
        vec2(),
        call_list(ident("Vec2"), vec![], vec![number(1.0)]),
    ]);
    assert_eq!(
        run(&tree).display,
        "ERR! invalid argument: Vec2 expects a map initializer"
    );
}

#[test]
fn test_type_test() {
    let tree = block(vec![
        vec2(),
        let_("v", vec2_of(1.0, 1.0)),
        tuple(vec![
            op(BinaryOperator::Is, ident("v"), ident("Vec2")),
            op(BinaryOperator::Is, ident("v"), ident("Number")),
            op(BinaryOperator::Is, number(1.0), ident("Vec2")),
        ]),
    ]);
    assert_eq!(run_ok(&tree), "(true, false, false)");
}

#[test]
fn test_equality_defaults_to_identity() {
    let tree = block(vec![
        data("P").build(),
        let_("a", call_map(ident("P"), vec![], vec![])),
        let_("b", call_map(ident("P"), vec![], vec![])),
        tuple(vec![
            op(BinaryOperator::Eq, ident("a"), ident("a")),
            op(BinaryOperator::Eq, ident("a"), ident("b")),
            op(BinaryOperator::Neq, ident("a"), ident("b")),
        ]),
    ]);
    assert_eq!(run_ok(&tree), "(true, false, true)");
}

#[test]
fn test_default_repr() {
    let tree = block(vec![data("Plain").build(), call(ident("Plain"), vec![])]);
    assert_eq!(run_ok(&tree), "<Plain>");
}

#[test]
fn test_new_meta_receives_arguments() {
    // data Point { x = 0; y = 0; meta new(self, a, b) { self.x = a; self.y = b } }
    let point = data("Point")
        .property("x", number(0.0))
        .property("y", number(0.0))
        .meta(function(
            "new",
            vec![param("self"), param("a"), param("b")],
            block(vec![
                assign_to(vec![field("self", "x")], ident("a")),
                assign_to(vec![field("self", "y")], ident("b")),
            ]),
        ))
        .build();
    let tree = block(vec![
        point,
        let_("p", call(ident("Point"), vec![number(3.0), number(4.0)])),
        op(BinaryOperator::Add, field("p", "x"), field("p", "y")),
    ]);
    assert_eq!(run_ok(&tree), "7");
}

#[test]
fn test_arguments_without_new_meta() {
    let tree = block(vec![data("P").build(), call(ident("P"), vec![number(1.0)])]);
    assert_eq!(
        run(&tree).display,
        "ERR! invalid argument: P takes no arguments without a 'new' meta function"
    );
}

#[test]
fn test_get_and_set_meta() {
    // data Box {
    //     x = 1
    //     meta get(self, name, current) { if name == 'magic' { 42 } else { current } }
    //     meta set(self, name, old, value) { value * 2 }
    // }
    let boxed = data("Box")
        .property("x", number(1.0))
        .meta(function(
            "get",
            vec![param("self"), param("name"), param("current")],
            block(vec![if_(
                op(BinaryOperator::Eq, ident("name"), string("magic")),
                block(vec![number(42.0)]),
                Some(block(vec![ident("current")])),
            )]),
        ))
        .meta(function(
            "set",
            vec![param("self"), param("name"), param("old"), param("value")],
            block(vec![op(BinaryOperator::Mul, ident("value"), number(2.0))]),
        ))
        .build();
    let tree = block(vec![
        boxed,
        let_("b", call_map(ident("Box"), vec![], vec![])),
        assign_to(vec![field("b", "x")], number(5.0)),
        tuple(vec![field("b", "magic"), field("b", "x")]),
    ]);
    assert_eq!(run_ok(&tree), "(42, 10)");
}

#[test]
fn test_len_meta_must_return_number() {
    let sized = data("Sized")
        .meta(function("len", vec![param("self")], block(vec![string("big")])))
        .build();
    let tree = block(vec![
        sized,
        call(ident("len"), vec![call(ident("Sized"), vec![])]),
    ]);
    assert_eq!(
        run(&tree).display,
        "ERR! expected number on meta function 'len', got String"
    );
}

#[test]
fn test_missing_action_meta() {
    let tree = block(vec![
        data("P").build(),
        call(ident("len"), vec![call(ident("P"), vec![])]),
    ]);
    assert_eq!(run(&tree).display, "ERR! type P does not implement action len");
}

#[test]
fn test_iter_meta() {
    // data Bag { items = (1, 2, 3); meta iter(self) { self.items | map fn(x) { x * 10 } } }
    let bag = data("Bag")
        .property("items", tuple(vec![number(1.0), number(2.0), number(3.0)]))
        .meta(function(
            "iter",
            vec![param("self")],
            block(vec![pipe(
                field("self", "items"),
                ident("map"),
                Some(lambda(
                    vec![param("x")],
                    block(vec![op(BinaryOperator::Mul, ident("x"), number(10.0))]),
                )),
            )]),
        ))
        .build();
    let tree = block(vec![
        bag,
        op(BinaryOperator::As, call(ident("Bag"), vec![]), ident("Tuple")),
    ]);
    assert_eq!(run_ok(&tree), "(10, 20, 30)");
}

#[test]
fn test_call_meta() {
    // data Adder { n = 1; meta call(self, x) { x + self.n } }; Adder { n: 5 }(2)
    let adder = data("Adder")
        .property("n", number(1.0))
        .meta(function(
            "call",
            vec![param("self"), param("x")],
            block(vec![op(BinaryOperator::Add, ident("x"), field("self", "n"))]),
        ))
        .build();
    let tree = block(vec![
        adder,
        call(call_map(ident("Adder"), vec![], vec![("n", number(5.0))]), vec![number(2.0)]),
    ]);
    assert_eq!(run_ok(&tree), "7");
}

#[test]
fn test_to_meta_converts_source() {
    // data Celsius { deg = 0; meta to(value) { Celsius { deg: value } } }; (21 as Celsius).deg
    let celsius = data("Celsius")
        .property("deg", number(0.0))
        .meta(function(
            "to",
            vec![param("value")],
            block(vec![call_map(ident("Celsius"), vec![], vec![("deg", ident("value"))])]),
        ))
        .build();
    let tree = block(vec![
        celsius,
        access(op(BinaryOperator::As, number(21.0), ident("Celsius")), "deg"),
    ]);
    assert_eq!(run_ok(&tree), "21");
}

#[test]
fn test_boolean_meta_drives_conditions_and_not() {
    let empty = data("Empty")
        .meta(function("boolean", vec![param("self")], block(vec![boolean(false)])))
        .build();
    let tree = block(vec![
        empty,
        let_("e", call(ident("Empty"), vec![])),
        tuple(vec![
            if_(ident("e"), number(1.0), Some(number(2.0))),
            unary(UnaryOperator::Not, ident("e")),
        ]),
    ]);
    assert_eq!(run_ok(&tree), "(2, true)");
}

#[test]
fn test_get_item_and_in_meta() {
    let grid = data("Grid")
        .meta(function(
            "getItem",
            vec![param("self"), param("i"), param("j")],
            block(vec![op(
                BinaryOperator::Add,
                op(BinaryOperator::Mul, ident("i"), number(10.0)),
                ident("j"),
            )]),
        ))
        .meta(function(
            "in",
            vec![param("self"), param("x")],
            block(vec![op(
                BinaryOperator::Eq,
                op(BinaryOperator::Mod, ident("x"), number(2.0)),
                number(0.0),
            )]),
        ))
        .build();
    let tree = block(vec![
        grid,
        let_("g", call(ident("Grid"), vec![])),
        tuple(vec![
            index(ident("g"), vec![number(2.0), number(3.0)]),
            op(BinaryOperator::In, number(4.0), ident("g")),
            op(BinaryOperator::In, number(5.0), ident("g")),
        ]),
    ]);
    assert_eq!(run_ok(&tree), "(23, true, false)");
}

#[test]
fn test_unknown_meta_name() {
    let bad = data("Bad")
        .meta(function("frobnicate", vec![param("self")], block(vec![number(1.0)])))
        .build();
    assert_eq!(
        run(&bad).display,
        "ERR! invalid definition: unknown meta function 'frobnicate'"
    );
}

#[test]
fn test_type_binding_is_constant() {
    let tree = block(vec![data("P").build(), assign("P", number(1.0))]);
    assert_eq!(run(&tree).display, "ERR! cannot reassign constant 'P'");
}
