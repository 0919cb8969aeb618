use crate::ast::{BinaryOperator, Identifier};
use std::fmt;
use std::fmt::Formatter;

/**
quadc | tac/ast.rs
Defines the quadruple instruction set. One generation run produces a
totally ordered sequence of these; control transfers are explicit
label/goto/ifFalse instructions and everything else falls through.
*/

/// A quadruple operand: a variable or temporary name, an integer
/// literal, or the explicit marker left behind for a missing child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Constant(i64),
    Variable(Identifier),
    Missing,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Constant(value) => write!(f, "{}", value),
            Value::Variable(id) => write!(f, "{}", id),
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `=`: assign a value to a named destination.
    Assign(Value, Identifier),
    //                        src1   src2   dest
    Binary(BinaryOperator, Value, Value, Identifier),
    /// `goto`: unconditional transfer.
    Jump(Identifier),
    /// `ifFalse`: transfer when the condition is zero.
    JumpIfFalse(Value, Identifier),
    /// `if`: transfer when the condition is nonzero (switch dispatch).
    JumpIfTrue(Value, Identifier),
    Label(Identifier),
    /// Placeholder marker for a construct the generator does not
    /// support, kept in the stream so downstream passes can see it.
    Unsupported(String),
}

impl fmt::Display for Instruction {
    /// Renders the classic quadruple tuple `(op, arg1, arg2, result)`,
    /// with `-` standing in for an absent field.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Instruction::Assign(src, dest) => write!(f, "(=, {}, -, {})", src, dest),
            Instruction::Binary(op, src1, src2, dest) => {
                write!(f, "({}, {}, {}, {})", op, src1, src2, dest)
            }
            Instruction::Jump(target) => write!(f, "(goto, -, -, {})", target),
            Instruction::JumpIfFalse(cond, target) => {
                write!(f, "(ifFalse, {}, -, {})", cond, target)
            }
            Instruction::JumpIfTrue(cond, target) => write!(f, "(if, {}, -, {})", cond, target),
            Instruction::Label(label) => write!(f, "(label, -, -, {})", label),
            Instruction::Unsupported(kind) => write!(f, "(unsupported, -, -, {})", kind),
        }
    }
}
