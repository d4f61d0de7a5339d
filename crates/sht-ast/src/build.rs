//! Constructors for assembling trees by hand.
//!
//! Mostly used by tests and embedders that have no parser at hand.

use std::sync::Arc;

use crate::ast::*;

pub fn number(value: f64) -> Node {
    Node::Number(value)
}

pub fn boolean(value: bool) -> Node {
    Node::Boolean(value)
}

pub fn string(value: &str) -> Node {
    Node::String(value.to_string())
}

pub fn ident(name: &str) -> Node {
    Node::Identifier(name.to_string())
}

pub fn tuple(items: Vec<Node>) -> Node {
    Node::Tuple(items)
}

pub fn block(statements: Vec<Node>) -> Node {
    Node::Block(statements)
}

pub fn unary(operator: UnaryOperator, right: Node) -> Node {
    Node::Unary {
        operator,
        right: Box::new(right),
    }
}

pub fn binary(operator: BinaryOperator, left: Node, right: Node) -> Node {
    Node::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// `name++` / `name--`
pub fn postfix(operator: PostfixOperator, name: &str) -> Node {
    Node::Postfix {
        operator,
        left: Box::new(ident(name)),
    }
}

fn assignment(targets: Vec<Node>, expression: Node, definition: bool, constant: bool) -> Node {
    Node::Assignment {
        targets,
        expression: Box::new(expression),
        definition,
        constant,
    }
}

/// `let name = expression`
pub fn let_(name: &str, expression: Node) -> Node {
    assignment(vec![ident(name)], expression, true, false)
}

/// `const name = expression`
pub fn const_(name: &str, expression: Node) -> Node {
    assignment(vec![ident(name)], expression, true, true)
}

/// `name = expression`
pub fn assign(name: &str, expression: Node) -> Node {
    assignment(vec![ident(name)], expression, false, false)
}

/// `let a, b, ...rest = expression`
pub fn let_many(targets: Vec<Node>, expression: Node) -> Node {
    assignment(targets, expression, true, false)
}

/// Plain assignment to arbitrary targets: `p.x = 1`, `xs[0] = 2`, `a, b = t`
pub fn assign_to(targets: Vec<Node>, expression: Node) -> Node {
    assignment(targets, expression, false, false)
}

pub fn spread(value: Node) -> Node {
    Node::Spread(Box::new(value))
}

pub fn param(name: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        default: None,
        spread: false,
    }
}

pub fn param_default(name: &str, default: Node) -> Parameter {
    Parameter {
        name: name.to_string(),
        default: Some(default),
        spread: false,
    }
}

pub fn param_spread(name: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        default: None,
        spread: true,
    }
}

/// Named function: `fn name(params) body`
pub fn function(name: &str, params: Vec<Parameter>, body: Node) -> Node {
    Node::FunctionDef(Arc::new(FunctionDef {
        name: Some(name.to_string()),
        params,
        body,
        generator: false,
    }))
}

/// Anonymous function: `fn (params) body`
pub fn lambda(params: Vec<Parameter>, body: Node) -> Node {
    Node::FunctionDef(Arc::new(FunctionDef {
        name: None,
        params,
        body,
        generator: false,
    }))
}

pub fn call(target: Node, arguments: Vec<Node>) -> Node {
    Node::Call {
        target: Box::new(target),
        arguments,
        initializer: None,
    }
}

/// `target(arguments) { key: value, ... }`
pub fn call_map(target: Node, arguments: Vec<Node>, entries: Vec<(&str, Node)>) -> Node {
    Node::Call {
        target: Box::new(target),
        arguments,
        initializer: Some(Initializer::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )),
    }
}

/// `target(arguments) { a, b, ... }`
pub fn call_list(target: Node, arguments: Vec<Node>, values: Vec<Node>) -> Node {
    Node::Call {
        target: Box::new(target),
        arguments,
        initializer: Some(Initializer::List(values)),
    }
}

pub fn access(target: Node, name: &str) -> Node {
    Node::Access {
        target: Box::new(target),
        name: name.to_string(),
    }
}

pub fn index(target: Node, values: Vec<Node>) -> Node {
    Node::Indexing {
        target: Box::new(target),
        values,
    }
}

pub fn return_(value: Node) -> Node {
    Node::Return(Some(Box::new(value)))
}

pub fn raise(value: Node) -> Node {
    Node::Raise(Box::new(value))
}

pub fn yield_(value: Node) -> Node {
    Node::Yield(Some(Box::new(value)))
}

pub fn wrap(value: Node) -> Node {
    Node::Wrap(Box::new(value))
}

pub fn unwrap(value: Node) -> Node {
    Node::Unwrap(Box::new(value))
}

pub fn if_(condition: Node, then_body: Node, else_body: Option<Node>) -> Node {
    Node::If {
        condition: Box::new(condition),
        then_body: Box::new(then_body),
        else_body: else_body.map(Box::new),
    }
}

/// `for condition { body }`; `None` loops until `break`
pub fn for_(condition: Option<Node>, body: Node) -> Node {
    Node::For {
        condition: condition.map(Box::new),
        body: Box::new(body),
    }
}

/// `for a, b in iterator { body }`
pub fn for_in(targets: Vec<Node>, iterator: Node, body: Node) -> Node {
    Node::PipeLoop {
        iterator: Box::new(iterator),
        targets,
        body: Box::new(body),
    }
}

/// `left | function argument`
pub fn pipe(left: Node, function: Node, argument: Option<Node>) -> Node {
    Node::Pipe {
        left: Box::new(left),
        function: Box::new(function),
        argument: argument.map(Box::new),
    }
}

pub fn match_(subject: Node, cases: Vec<(Node, Node)>) -> Node {
    Node::Match {
        subject: Box::new(subject),
        cases: cases
            .into_iter()
            .map(|(condition, body)| MatchCase { condition, body })
            .collect(),
    }
}

/// Start a `data` declaration.
pub fn data(name: &str) -> DataBuilder {
    DataBuilder {
        def: DataDef {
            name: name.to_string(),
            properties: Vec::new(),
            functions: Vec::new(),
            static_functions: Vec::new(),
            meta_functions: Vec::new(),
        },
    }
}

/// Builder for [`DataDef`] nodes.
pub struct DataBuilder {
    def: DataDef,
}

impl DataBuilder {
    pub fn property(mut self, name: &str, value: Node) -> Self {
        self.def.properties.push(Property {
            name: name.to_string(),
            value,
        });
        self
    }

    /// Instance function; its first parameter receives the instance.
    pub fn function(mut self, function: Node) -> Self {
        self.def.functions.push(function);
        self
    }

    pub fn static_function(mut self, function: Node) -> Self {
        self.def.static_functions.push(function);
        self
    }

    /// Meta function named after its operation (`add`, `+`, `repr`, ...).
    pub fn meta(mut self, function: Node) -> Self {
        self.def.meta_functions.push(function);
        self
    }

    pub fn build(self) -> Node {
        Node::DataDef(Arc::new(self.def))
    }
}
