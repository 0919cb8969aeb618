/**
quadc | semantic.rs
Optional declare-before-use pre-pass. An assignment declares its
target; reading a variable that no assignment has reached yet is an
error. Separately invokable: the core lowering does not depend on it.
*/

use std::collections::HashSet;

use crate::ast::Node;
use crate::compile_error::CompileError;

pub fn check_declared(tree: &Node) -> Result<(), CompileError> {
    let mut declared = HashSet::new();
    check(tree, &mut declared)
}

fn check_slot(slot: &Option<Box<Node>>, declared: &mut HashSet<String>) -> Result<(), CompileError> {
    match slot {
        Some(node) => check(node, declared),
        None => Ok(()),
    }
}

/// Walks the tree in generation order so the pass sees exactly the
/// reads the generated code would perform.
fn check(node: &Node, declared: &mut HashSet<String>) -> Result<(), CompileError> {
    match node {
        Node::Constant(_) | Node::Break => Ok(()),

        Node::Variable(id) => {
            if declared.contains(&id.name) {
                Ok(())
            } else {
                Err(CompileError::Semantic(format!(
                    "undeclared variable: {}",
                    id.name
                )))
            }
        }

        Node::Unary(_, operand) => check_slot(operand, declared),

        Node::Binary(_, left, right) => {
            check_slot(left, declared)?;
            check_slot(right, declared)
        }

        Node::Assign(target, value) => {
            check_slot(value, declared)?;
            declared.insert(target.name.clone());
            Ok(())
        }

        Node::If {
            condition,
            then_branch,
            else_branch,
        } => {
            check_slot(condition, declared)?;
            check_slot(then_branch, declared)?;
            check_slot(else_branch, declared)
        }

        Node::While { condition, body } => {
            check_slot(condition, declared)?;
            check_slot(body, declared)
        }

        Node::For {
            init,
            condition,
            increment,
            body,
        } => {
            check_slot(init, declared)?;
            check_slot(condition, declared)?;
            check_slot(body, declared)?;
            check_slot(increment, declared)
        }

        Node::Switch { scrutinee, arms } => {
            check_slot(scrutinee, declared)?;
            for arm in arms {
                check(arm, declared)?;
            }
            Ok(())
        }

        Node::Case { value, body } => {
            check_slot(value, declared)?;
            check_slot(body, declared)
        }

        Node::Default { body } => check_slot(body, declared),

        Node::Sequence(left, right) => {
            check_slot(left, declared)?;
            check_slot(right, declared)
        }
    }
}
