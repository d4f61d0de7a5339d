/// Syntax tree types for sht
///
/// The evaluator consumes these nodes; producing them is the job of an
/// external parser. Every node derives serde so a tree can be handed over
/// as JSON.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Numeric literal: `42`, `1.5`
    Number(f64),
    /// Boolean literal: `true`, `false`
    Boolean(bool),
    /// String literal: `'hello'`
    String(String),
    /// Variable reference: `x`
    Identifier(String),
    /// Tuple literal: `(1, 2, xs...)`
    Tuple(Vec<Node>),

    /// Prefix operator: `-x`, `!x`
    Unary {
        operator: UnaryOperator,
        right: Box<Node>,
    },
    /// Infix operator: `a + b`, `a and b`, `x is Number`
    Binary {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Postfix operator on an identifier: `i++`
    Postfix {
        operator: PostfixOperator,
        left: Box<Node>,
    },

    /// Assignment: `x = 1`, `let a, b = t`, `const c = 2`
    ///
    /// Targets are identifiers, at most one spread, or (for plain
    /// assignment) property access and indexing nodes.
    Assignment {
        targets: Vec<Node>,
        expression: Box<Node>,
        #[serde(default)]
        definition: bool,
        #[serde(default)]
        constant: bool,
    },

    /// Function definition: `fn name(a, b = 1) { ... }`
    FunctionDef(Arc<FunctionDef>),
    /// Call: `f(a, b)`, `Point { x: 1 }`, `Point(1) { y: 2 }`
    Call {
        target: Box<Node>,
        #[serde(default)]
        arguments: Vec<Node>,
        #[serde(default)]
        initializer: Option<Initializer>,
    },
    /// Property access: `point.x`
    Access { target: Box<Node>, name: String },
    /// Indexing: `xs[1]`, `xs[1, 3]`
    Indexing { target: Box<Node>, values: Vec<Node> },

    /// `return` with an optional value
    Return(Option<Box<Node>>),
    /// `raise expr`
    Raise(Box<Node>),
    /// `yield` with an optional value
    Yield(Option<Box<Node>>),
    Break,
    Continue,

    /// Postfix `?`: capture a raised error as a Maybe
    Wrap(Box<Node>),
    /// Postfix `!`: unpack a Maybe or re-raise its error
    Unwrap(Box<Node>),

    /// `if cond { ... } else { ... }`
    If {
        condition: Box<Node>,
        then_body: Box<Node>,
        #[serde(default)]
        else_body: Option<Box<Node>>,
    },
    /// Spread: `xs...` in tuples and arguments, `...rest` in targets
    Spread(Box<Node>),
    /// Statement sequence: `{ a; b }`
    Block(Vec<Node>),
    /// Conditional loop: `for cond { ... }`, or `for { ... }` without one
    For {
        #[serde(default)]
        condition: Option<Box<Node>>,
        body: Box<Node>,
    },
    /// Iterator loop: `for x, y in iterable { ... }`
    PipeLoop {
        iterator: Box<Node>,
        #[serde(default)]
        targets: Vec<Node>,
        body: Box<Node>,
    },
    /// Pipe into a combinator: `xs | map double`
    Pipe {
        left: Box<Node>,
        function: Box<Node>,
        #[serde(default)]
        argument: Option<Box<Node>>,
    },
    /// `match subject { cond => body, _ => body }`
    Match {
        subject: Box<Node>,
        cases: Vec<MatchCase>,
    },
    /// Custom type declaration: `data Point { x = 0; y = 0 }`
    DataDef(Arc<DataDef>),
}

/// Function definition shared between the tree and every closure made from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub params: Vec<Parameter>,
    pub body: Node,
    /// Forces generator semantics even when the body has no `yield`.
    #[serde(default)]
    pub generator: bool,
}

/// Function parameter: `a`, `b = 1`, `...rest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub default: Option<Node>,
    #[serde(default)]
    pub spread: bool,
}

/// Initializer attached to a call: `T { a, b }` or `T { k: v }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    List(Vec<Node>),
    Map(Vec<(String, Node)>),
}

/// One arm of a `match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCase {
    pub condition: Node,
    pub body: Node,
}

/// Custom type declaration.
///
/// The function lists hold `Node::FunctionDef` entries. Instance functions
/// take the receiver as their first parameter, as do meta functions, which
/// are named after the operation they implement (`add` or `+`, `repr`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDef {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub functions: Vec<Node>,
    #[serde(default)]
    pub static_functions: Vec<Node>,
    #[serde(default)]
    pub meta_functions: Vec<Node>,
}

/// Property with its default value expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: Node,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "//")]
    IntDiv,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Pow,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "nand")]
    Nand,
    #[serde(rename = "or")]
    Or,
    #[serde(rename = "nor")]
    Nor,
    #[serde(rename = "xor")]
    Xor,
    #[serde(rename = "nxor")]
    Nxor,
    #[serde(rename = "..")]
    Concat,
    #[serde(rename = "??")]
    Coalesce,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "as")]
    As,
}

impl BinaryOperator {
    /// Surface spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::IntDiv => "//",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
            BinaryOperator::Eq => "==",
            BinaryOperator::Neq => "!=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gte => ">=",
            BinaryOperator::Lte => "<=",
            BinaryOperator::And => "and",
            BinaryOperator::Nand => "nand",
            BinaryOperator::Or => "or",
            BinaryOperator::Nor => "nor",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Nxor => "nxor",
            BinaryOperator::Concat => "..",
            BinaryOperator::Coalesce => "??",
            BinaryOperator::Is => "is",
            BinaryOperator::In => "in",
            BinaryOperator::As => "as",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "+")]
    Pos,
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "!")]
    Not,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Pos => "+",
            UnaryOperator::Neg => "-",
            UnaryOperator::Not => "!",
        }
    }
}

/// Postfix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostfixOperator {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

impl PostfixOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            PostfixOperator::Increment => "++",
            PostfixOperator::Decrement => "--",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for PostfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FunctionDef {
    /// Whether calling this function produces a generator.
    ///
    /// True when flagged explicitly or when a `yield` appears in the body
    /// outside of nested function definitions.
    pub fn is_generator(&self) -> bool {
        self.generator || contains_yield(&self.body)
    }

    /// Signature rendering used in labels: `add(a, b=, ...rest)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let spread = if p.spread { "..." } else { "" };
                let default = if p.default.is_some() { "=" } else { "" };
                format!("{}{}{}", spread, p.name, default)
            })
            .collect();
        format!(
            "{}({})",
            self.name.as_deref().unwrap_or(""),
            params.join(", ")
        )
    }
}

fn contains_yield(node: &Node) -> bool {
    match node {
        Node::Yield(_) => true,
        Node::FunctionDef(_) | Node::DataDef(_) => false,
        other => other.children().into_iter().any(contains_yield),
    }
}

impl Node {
    /// Textual debug label, e.g. `<operator:+>` or `<funcdef:add(a, b=)>`.
    pub fn label(&self) -> String {
        match self {
            Node::Number(n) => format!("<number:{}>", n),
            Node::Boolean(b) => format!("<boolean:{}>", b),
            Node::String(s) => format!("<string:{:?}>", s),
            Node::Identifier(name) => format!("<identifier:{}>", name),
            Node::Tuple(_) => "<tuple>".to_string(),
            Node::Unary { operator, .. } => format!("<unary:{}>", operator),
            Node::Binary { operator, .. } => format!("<operator:{}>", operator),
            Node::Postfix { operator, .. } => format!("<postfix:{}>", operator),
            Node::Assignment {
                definition,
                constant,
                ..
            } => {
                let mut label = String::from("<assignment");
                if *definition {
                    label.push_str(";def");
                }
                if *constant {
                    label.push_str(";const");
                }
                label.push('>');
                label
            }
            Node::FunctionDef(def) => {
                let kind = if def.is_generator() { "generator" } else { "funcdef" };
                format!("<{}:{}>", kind, def.signature())
            }
            Node::Call { initializer, .. } => match initializer {
                Some(Initializer::List(_)) => "<call;list>".to_string(),
                Some(Initializer::Map(entries)) => {
                    let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                    format!("<call;map:{}>", keys.join(","))
                }
                None => "<call>".to_string(),
            },
            Node::Access { name, .. } => format!("<access:{}>", name),
            Node::Indexing { .. } => "<indexing>".to_string(),
            Node::Return(_) => "<return>".to_string(),
            Node::Raise(_) => "<raise>".to_string(),
            Node::Yield(_) => "<yield>".to_string(),
            Node::Break => "<break>".to_string(),
            Node::Continue => "<continue>".to_string(),
            Node::Wrap(_) => "<wrapping>".to_string(),
            Node::Unwrap(_) => "<unwrapping>".to_string(),
            Node::If { else_body, .. } => {
                if else_body.is_some() {
                    "<if;else>".to_string()
                } else {
                    "<if>".to_string()
                }
            }
            Node::Spread(_) => "<spread>".to_string(),
            Node::Block(_) => "<block>".to_string(),
            Node::For { .. } => "<for>".to_string(),
            Node::PipeLoop { .. } => "<pipeloop>".to_string(),
            Node::Pipe { .. } => "<pipe>".to_string(),
            Node::Match { cases, .. } => format!("<match:{}>", cases.len()),
            Node::DataDef(def) => {
                let names: Vec<&str> = def.properties.iter().map(|p| p.name.as_str()).collect();
                format!("<data:{}:{}>", def.name, names.join(","))
            }
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Number(_)
            | Node::Boolean(_)
            | Node::String(_)
            | Node::Identifier(_)
            | Node::Break
            | Node::Continue => Vec::new(),
            Node::Tuple(items) | Node::Block(items) => items.iter().collect(),
            Node::Unary { right, .. } => vec![right.as_ref()],
            Node::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Node::Postfix { left, .. } => vec![left.as_ref()],
            Node::Assignment {
                targets,
                expression,
                ..
            } => {
                let mut out: Vec<&Node> = targets.iter().collect();
                out.push(expression);
                out
            }
            Node::FunctionDef(def) => {
                let mut out: Vec<&Node> =
                    def.params.iter().filter_map(|p| p.default.as_ref()).collect();
                out.push(&def.body);
                out
            }
            Node::Call {
                target,
                arguments,
                initializer,
            } => {
                let mut out: Vec<&Node> = vec![target.as_ref()];
                out.extend(arguments.iter());
                match initializer {
                    Some(Initializer::List(values)) => out.extend(values.iter()),
                    Some(Initializer::Map(entries)) => out.extend(entries.iter().map(|(_, v)| v)),
                    None => {}
                }
                out
            }
            Node::Access { target, .. } => vec![target.as_ref()],
            Node::Indexing { target, values } => {
                let mut out: Vec<&Node> = vec![target.as_ref()];
                out.extend(values.iter());
                out
            }
            Node::Return(value) | Node::Yield(value) => value.iter().map(|v| v.as_ref()).collect(),
            Node::Raise(value) | Node::Wrap(value) | Node::Unwrap(value) | Node::Spread(value) => {
                vec![value.as_ref()]
            }
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                let mut out: Vec<&Node> = vec![condition.as_ref(), then_body.as_ref()];
                if let Some(e) = else_body {
                    out.push(e);
                }
                out
            }
            Node::For { condition, body } => {
                let mut out: Vec<&Node> = condition.iter().map(|c| c.as_ref()).collect();
                out.push(body);
                out
            }
            Node::PipeLoop {
                iterator,
                targets,
                body,
            } => {
                let mut out: Vec<&Node> = vec![iterator.as_ref()];
                out.extend(targets.iter());
                out.push(body);
                out
            }
            Node::Pipe {
                left,
                function,
                argument,
            } => {
                let mut out: Vec<&Node> = vec![left.as_ref(), function.as_ref()];
                if let Some(a) = argument {
                    out.push(a);
                }
                out
            }
            Node::Match { subject, cases } => {
                let mut out: Vec<&Node> = vec![subject.as_ref()];
                for case in cases {
                    out.push(&case.condition);
                    out.push(&case.body);
                }
                out
            }
            Node::DataDef(def) => {
                let mut out: Vec<&Node> = def.properties.iter().map(|p| &p.value).collect();
                out.extend(def.functions.iter());
                out.extend(def.static_functions.iter());
                out.extend(def.meta_functions.iter());
                out
            }
        }
    }

    /// Visit this node and then its children, depth first.
    ///
    /// The callback receives the depth of each visited node, starting at `level`.
    pub fn traverse<F>(&self, level: usize, visit: &mut F)
    where
        F: FnMut(usize, &Node),
    {
        visit(level, self);
        for child in self.children() {
            child.traverse(level + 1, visit);
        }
    }

    /// Parse a JSON-encoded tree.
    pub fn from_json(source: &str) -> crate::Result<Node> {
        Ok(serde_json::from_str(source)?)
    }

    /// Encode this tree as JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
