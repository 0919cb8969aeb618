/**
quadc | ast.rs
Syntax tree produced by the front end. Node kinds form a closed set;
each kind owns only the child slots that are meaningful for it, and
every slot the language allows to be absent is an Option.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Increment,
    Decrement,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Increment => "++",
            UnaryOperator::Decrement => "--",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        !matches!(self, BinaryOperator::Add | BinaryOperator::Subtract)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterOrEqual => ">=",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Constant(i64),
    Variable(Identifier),
    Unary(UnaryOperator, Option<Box<Node>>),
    Binary(BinaryOperator, Option<Box<Node>>, Option<Box<Node>>),
    Assign(Identifier, Option<Box<Node>>),
    If {
        condition: Option<Box<Node>>,
        then_branch: Option<Box<Node>>,
        else_branch: Option<Box<Node>>,
    },
    While {
        condition: Option<Box<Node>>,
        body: Option<Box<Node>>,
    },
    For {
        init: Option<Box<Node>>,
        condition: Option<Box<Node>>,
        increment: Option<Box<Node>>,
        body: Option<Box<Node>>,
    },
    Switch {
        scrutinee: Option<Box<Node>>,
        arms: Vec<Node>,
    },
    Case {
        value: Option<Box<Node>>,
        body: Option<Box<Node>>,
    },
    Default {
        body: Option<Box<Node>>,
    },
    Break,
    Sequence(Option<Box<Node>>, Option<Box<Node>>),
}

impl Node {
    pub fn constant(value: i64) -> Node {
        Node::Constant(value)
    }

    pub fn variable(name: impl Into<String>) -> Node {
        Node::Variable(Identifier::new(name))
    }

    pub fn binary(op: BinaryOperator, left: Node, right: Node) -> Node {
        Node::Binary(op, Some(left.boxed()), Some(right.boxed()))
    }

    pub fn unary(op: UnaryOperator, operand: Node) -> Node {
        Node::Unary(op, Some(operand.boxed()))
    }

    pub fn assign(target: impl Into<String>, value: Node) -> Node {
        Node::Assign(Identifier::new(target), Some(value.boxed()))
    }

    /// Fold a list of statements into a left-leaning statement-sequence
    /// spine, so generation visits them in order.
    pub fn sequence(stmts: impl IntoIterator<Item = Node>) -> Node {
        let mut iter = stmts.into_iter();
        match iter.next() {
            None => Node::Sequence(None, None),
            Some(first) => iter.fold(first, |acc, stmt| {
                Node::Sequence(Some(acc.boxed()), Some(stmt.boxed()))
            }),
        }
    }

    pub fn boxed(self) -> Box<Node> {
        Box::new(self)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Constant(_) => "literal",
            Node::Variable(_) => "identifier",
            Node::Unary(..) => "unary operation",
            Node::Binary(..) => "binary operation",
            Node::Assign(..) => "assignment",
            Node::If { .. } => "if",
            Node::While { .. } => "while",
            Node::For { .. } => "for",
            Node::Switch { .. } => "switch",
            Node::Case { .. } => "case",
            Node::Default { .. } => "default",
            Node::Break => "break",
            Node::Sequence(..) => "statement sequence",
        }
    }
}

pub trait PrettyPrint {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result;
}

fn ind(n: usize) -> String {
    "  ".repeat(n)
}

fn print_slot(f: &mut Formatter, slot: &Option<Box<Node>>, indent: usize) -> fmt::Result {
    match slot {
        Some(node) => node.pretty_print(f, indent),
        None => writeln!(f, "{}<empty>", ind(indent)),
    }
}

impl PrettyPrint for Node {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        let pad = ind(indent);
        match self {
            Node::Constant(value) => writeln!(f, "{}Constant({})", pad, value),
            Node::Variable(id) => writeln!(f, "{}Variable({})", pad, id),
            Node::Unary(op, operand) => {
                writeln!(f, "{}Unary({},", pad, op.symbol())?;
                print_slot(f, operand, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::Binary(op, left, right) => {
                writeln!(f, "{}Binary({},", pad, op)?;
                print_slot(f, left, indent + 1)?;
                print_slot(f, right, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::Assign(target, value) => {
                writeln!(f, "{}Assign({},", pad, target)?;
                print_slot(f, value, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                writeln!(f, "{}If(", pad)?;
                print_slot(f, condition, indent + 1)?;
                print_slot(f, then_branch, indent + 1)?;
                print_slot(f, else_branch, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::While { condition, body } => {
                writeln!(f, "{}While(", pad)?;
                print_slot(f, condition, indent + 1)?;
                print_slot(f, body, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::For {
                init,
                condition,
                increment,
                body,
            } => {
                writeln!(f, "{}For(", pad)?;
                print_slot(f, init, indent + 1)?;
                print_slot(f, condition, indent + 1)?;
                print_slot(f, increment, indent + 1)?;
                print_slot(f, body, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::Switch { scrutinee, arms } => {
                writeln!(f, "{}Switch(", pad)?;
                print_slot(f, scrutinee, indent + 1)?;
                for arm in arms {
                    arm.pretty_print(f, indent + 1)?;
                }
                writeln!(f, "{})", pad)
            }
            Node::Case { value, body } => {
                writeln!(f, "{}Case(", pad)?;
                print_slot(f, value, indent + 1)?;
                print_slot(f, body, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::Default { body } => {
                writeln!(f, "{}Default(", pad)?;
                print_slot(f, body, indent + 1)?;
                writeln!(f, "{})", pad)
            }
            Node::Break => writeln!(f, "{}Break", pad),
            Node::Sequence(left, right) => {
                writeln!(f, "{}Sequence(", pad)?;
                print_slot(f, left, indent + 1)?;
                print_slot(f, right, indent + 1)?;
                writeln!(f, "{})", pad)
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.pretty_print(f, 0)
    }
}
