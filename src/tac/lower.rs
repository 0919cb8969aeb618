use crate::ast::{BinaryOperator, Identifier, Node, UnaryOperator};
use crate::diagnostics::Diagnostic;
use crate::tac::ast::{Instruction, Value};

/**
quadc | tac/lower.rs
Lowers the syntax tree into an ordered quadruple sequence. All naming
state (temp counter, label counter, break-target stack) lives in a
context created fresh per call, so two runs over the same tree yield
identical output.
*/

/// The result of one generation run: the quadruple sequence plus any
/// diagnostics recovered along the way.
#[derive(Debug)]
pub struct Lowering {
    pub instructions: Vec<Instruction>,
    pub diagnostics: Vec<Diagnostic>,
}

struct GenContext {
    temp: u32,
    label: u32,
    break_targets: Vec<Identifier>,
    instructions: Vec<Instruction>,
    diagnostics: Vec<Diagnostic>,
}

impl GenContext {
    fn new() -> Self {
        Self {
            temp: 0,
            label: 0,
            break_targets: Vec::new(),
            instructions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn new_temp(&mut self) -> Identifier {
        self.temp += 1;
        Identifier::new(format!("t{}", self.temp))
    }

    fn new_label(&mut self) -> Identifier {
        self.label += 1;
        Identifier::new(format!("L{}", self.label))
    }

    fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

pub fn generate(tree: &Node) -> Lowering {
    let mut ctx = GenContext::new();
    gen_statement(tree, &mut ctx);
    log::debug!(
        "lowered tree into {} quadruples ({} diagnostics)",
        ctx.instructions.len(),
        ctx.diagnostics.len()
    );
    Lowering {
        instructions: ctx.instructions,
        diagnostics: ctx.diagnostics,
    }
}

fn gen_statement(node: &Node, ctx: &mut GenContext) {
    match node {
        Node::Sequence(left, right) => {
            if let Some(left) = left {
                gen_statement(left, ctx);
            }
            if let Some(right) = right {
                gen_statement(right, ctx);
            }
        }

        Node::Assign(target, value) => {
            let rhs = gen_operand(value.as_deref(), ctx, "assignment value");
            ctx.push(Instruction::Assign(rhs, target.clone()));
        }

        Node::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = gen_operand(condition.as_deref(), ctx, "if condition");
            let else_label = ctx.new_label();
            ctx.push(Instruction::JumpIfFalse(cond, else_label.clone()));

            if let Some(then_branch) = then_branch {
                gen_statement(then_branch, ctx);
            }

            match else_branch {
                Some(else_branch) => {
                    let end_label = ctx.new_label();
                    ctx.push(Instruction::Jump(end_label.clone()));
                    ctx.push(Instruction::Label(else_label));
                    gen_statement(else_branch, ctx);
                    ctx.push(Instruction::Label(end_label));
                }
                None => ctx.push(Instruction::Label(else_label)),
            }
        }

        Node::While { condition, body } => {
            let start_label = ctx.new_label();
            let end_label = ctx.new_label();
            ctx.break_targets.push(end_label.clone());

            ctx.push(Instruction::Label(start_label.clone()));
            // An absent condition leaves the loop unconditional.
            if let Some(condition) = condition {
                let cond = gen_value(condition, ctx);
                ctx.push(Instruction::JumpIfFalse(cond, end_label.clone()));
            }
            if let Some(body) = body {
                gen_statement(body, ctx);
            }
            ctx.push(Instruction::Jump(start_label));
            ctx.push(Instruction::Label(end_label));

            ctx.break_targets.pop();
        }

        Node::For {
            init,
            condition,
            increment,
            body,
        } => {
            if let Some(init) = init {
                gen_statement(init, ctx);
            }

            let start_label = ctx.new_label();
            let end_label = ctx.new_label();
            ctx.break_targets.push(end_label.clone());

            ctx.push(Instruction::Label(start_label.clone()));
            if let Some(condition) = condition {
                let cond = gen_value(condition, ctx);
                ctx.push(Instruction::JumpIfFalse(cond, end_label.clone()));
            }
            if let Some(body) = body {
                gen_statement(body, ctx);
            }
            // Increment runs after the body, before looping back.
            if let Some(increment) = increment {
                gen_statement(increment, ctx);
            }
            ctx.push(Instruction::Jump(start_label));
            ctx.push(Instruction::Label(end_label));

            ctx.break_targets.pop();
        }

        Node::Switch { scrutinee, arms } => {
            let scrutinee = gen_operand(scrutinee.as_deref(), ctx, "switch expression");
            let end_label = ctx.new_label();
            ctx.break_targets.push(end_label.clone());

            // Dispatch chain first, in source order; case bodies are
            // deferred until the whole chain is emitted.
            let mut cases: Vec<(Identifier, Option<&Node>)> = Vec::new();
            let mut default_body: Option<&Node> = None;

            for arm in arms {
                match arm {
                    Node::Case { value, body } => {
                        let case_value = gen_operand(value.as_deref(), ctx, "case value");
                        let case_label = ctx.new_label();
                        let cond = ctx.new_temp();
                        ctx.push(Instruction::Binary(
                            BinaryOperator::Equal,
                            scrutinee.clone(),
                            case_value,
                            cond.clone(),
                        ));
                        ctx.push(Instruction::JumpIfTrue(
                            Value::Variable(cond),
                            case_label.clone(),
                        ));
                        cases.push((case_label, body.as_deref()));
                    }
                    Node::Default { body } => {
                        default_body = body.as_deref();
                    }
                    other => {
                        ctx.diagnose(Diagnostic::error(format!(
                            "switch arm must be a case or default, found {}",
                            other.kind_name()
                        )));
                        ctx.push(Instruction::Unsupported(other.kind_name().to_string()));
                    }
                }
            }

            let fallback = match default_body {
                Some(_) => ctx.new_label(),
                None => end_label.clone(),
            };
            ctx.push(Instruction::Jump(fallback.clone()));

            for (case_label, body) in cases {
                ctx.push(Instruction::Label(case_label));
                if let Some(body) = body {
                    gen_statement(body, ctx);
                }
            }
            if let Some(body) = default_body {
                ctx.push(Instruction::Label(fallback));
                gen_statement(body, ctx);
            }
            ctx.push(Instruction::Label(end_label));

            ctx.break_targets.pop();
        }

        Node::Break => match ctx.break_targets.last().cloned() {
            Some(target) => ctx.push(Instruction::Jump(target)),
            None => {
                // Recovered: the statement is dropped, not fatal.
                ctx.diagnose(Diagnostic::error(
                    "'break' statement not within a loop or switch",
                ));
            }
        },

        Node::Case { .. } | Node::Default { .. } => {
            ctx.diagnose(Diagnostic::error(format!(
                "unsupported construct in statement position: {}",
                node.kind_name()
            )));
            ctx.push(Instruction::Unsupported(node.kind_name().to_string()));
        }

        // Expression used as a statement: evaluate it for effect.
        Node::Constant(_) | Node::Variable(_) | Node::Unary(..) | Node::Binary(..) => {
            gen_value(node, ctx);
        }
    }
}

fn gen_value(node: &Node, ctx: &mut GenContext) -> Value {
    match node {
        Node::Constant(value) => Value::Constant(*value),

        Node::Variable(id) => Value::Variable(id.clone()),

        Node::Binary(op, left, right) => {
            let lhs = gen_operand(left.as_deref(), ctx, "left operand");
            let rhs = gen_operand(right.as_deref(), ctx, "right operand");
            let dest = ctx.new_temp();
            ctx.push(Instruction::Binary(*op, lhs, rhs, dest.clone()));
            Value::Variable(dest)
        }

        Node::Unary(op, operand) => {
            // ++x / --x desugars to:
            //   tmp = x +/- 1
            //   x = tmp
            //   value is x
            let operand = gen_operand(operand.as_deref(), ctx, "increment operand");
            let arith = match op {
                UnaryOperator::Increment => BinaryOperator::Add,
                UnaryOperator::Decrement => BinaryOperator::Subtract,
            };

            let tmp = ctx.new_temp();
            ctx.push(Instruction::Binary(
                arith,
                operand.clone(),
                Value::Constant(1),
                tmp.clone(),
            ));

            match operand {
                Value::Variable(var) => {
                    ctx.push(Instruction::Assign(Value::Variable(tmp), var.clone()));
                    Value::Variable(var)
                }
                _ => {
                    ctx.diagnose(Diagnostic::error(format!(
                        "operand of '{}' is not assignable",
                        op.symbol()
                    )));
                    Value::Variable(tmp)
                }
            }
        }

        // A statement form in expression position produces no value;
        // generate it anyway and surface the gap.
        _ => {
            ctx.diagnose(Diagnostic::error(format!(
                "{} cannot produce a value",
                node.kind_name()
            )));
            gen_statement(node, ctx);
            Value::Missing
        }
    }
}

/// Generates an operand from an optional child. A missing required
/// child yields an explicit sentinel so the quadruple stream stays
/// well-formed, with the anomaly reported on the side channel.
fn gen_operand(node: Option<&Node>, ctx: &mut GenContext, what: &str) -> Value {
    match node {
        Some(node) => gen_value(node, ctx),
        None => {
            ctx.diagnose(Diagnostic::error(format!("missing {}", what)));
            Value::Missing
        }
    }
}
