use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ast::BinaryOperator;
use crate::compile_error::CompileError;
use crate::diagnostics::Diagnostic;
use crate::tac::ast::{Instruction, Value};

/**
quadc | asm8086/emit.rs
Two-pass translation from quadruples to assembly text. Pass 1 discovers
the variable set and indexes comparison quadruples by their destination
temporary; pass 2 lowers each quadruple, fusing an indexed comparison
with its consuming conditional jump so the boolean temporary is never
materialized. AX and BX are the only scratch registers.
*/

/// Rendered assembly plus the diagnostics recovered while rendering.
#[derive(Debug)]
pub struct Assembly {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generated temporaries are `t` followed by digits; anything else is a
/// source-level name.
fn is_temp(name: &str) -> bool {
    match name.strip_prefix('t') {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// The conditional-jump mnemonic for a comparison. `negated` selects
/// the jump taken when the comparison is false (the `ifFalse` case).
fn comparison_jump(op: BinaryOperator, negated: bool) -> Option<&'static str> {
    let (positive, negative) = match op {
        BinaryOperator::Equal => ("JE", "JNE"),
        BinaryOperator::NotEqual => ("JNE", "JE"),
        BinaryOperator::LessThan => ("JL", "JGE"),
        BinaryOperator::LessOrEqual => ("JLE", "JG"),
        BinaryOperator::GreaterThan => ("JG", "JLE"),
        BinaryOperator::GreaterOrEqual => ("JGE", "JL"),
        BinaryOperator::Add | BinaryOperator::Subtract => return None,
    };
    Some(if negated { negative } else { positive })
}

struct Emitter<'a> {
    /// Comparison quadruples indexed by destination temporary.
    fused: HashMap<&'a str, &'a Instruction>,
    out: String,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Emitter<'a> {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Renders an operand, or reports and returns None so the caller
    /// can skip the instruction. Unrenderable operands are the missing
    /// sentinel and reads of a temporary that fusion never
    /// materializes: both would leave an unassemblable reference.
    fn operand(&mut self, value: &Value, context: &str) -> Option<String> {
        match value {
            Value::Constant(c) => Some(c.to_string()),
            Value::Variable(id) => {
                if self.fused.contains_key(id.name.as_str()) {
                    self.diagnose(Diagnostic::warning(format!(
                        "{} reads fused comparison temporary '{}'; instruction skipped",
                        context, id.name
                    )));
                    return None;
                }
                Some(id.name.clone())
            }
            Value::Missing => {
                self.diagnose(Diagnostic::warning(format!(
                    "{} has a missing operand; instruction skipped",
                    context
                )));
                None
            }
        }
    }

    fn lower(&mut self, instruction: &'a Instruction) {
        match instruction {
            Instruction::Label(label) => {
                self.line(&format!("{}:", label.name));
            }

            Instruction::Assign(src, dest) => match src {
                Value::Constant(c) => {
                    self.line(&format!("    MOV {}, {}", dest.name, c));
                }
                src => {
                    let context = format!("assignment to '{}'", dest.name);
                    let Some(src) = self.operand(src, &context) else {
                        return;
                    };
                    // Never variable-to-variable in one step.
                    self.line(&format!("    MOV AX, {}", src));
                    self.line(&format!("    MOV {}, AX", dest.name));
                }
            },

            Instruction::Binary(op @ (BinaryOperator::Add | BinaryOperator::Subtract), a, b, dest) => {
                // One skipped instruction, one report.
                let Some(a) = self.operand(a, "arithmetic instruction") else {
                    return;
                };
                let Some(b) = self.operand(b, "arithmetic instruction") else {
                    return;
                };
                self.line(&format!("    MOV AX, {}", a));
                self.line(&format!("    MOV BX, {}", b));
                match op {
                    BinaryOperator::Add => self.line("    ADD AX, BX"),
                    _ => self.line("    SUB AX, BX"),
                }
                self.line(&format!("    MOV {}, AX", dest.name));
            }

            Instruction::Binary(op, _, _, dest) => {
                // A comparison into a temporary is inert here: it only
                // feeds the fusion index consulted by conditional jumps.
                if !(is_temp(&dest.name) && self.fused.contains_key(dest.name.as_str())) {
                    self.diagnose(Diagnostic::warning(format!(
                        "comparison '{}' into '{}' is not materialized; instruction skipped",
                        op, dest.name
                    )));
                }
            }

            Instruction::Jump(target) => {
                self.line(&format!("    JMP {}", target.name));
            }

            Instruction::JumpIfFalse(cond, target) => {
                self.fuse_conditional(cond, &target.name, true);
            }

            Instruction::JumpIfTrue(cond, target) => {
                self.fuse_conditional(cond, &target.name, false);
            }

            Instruction::Unsupported(kind) => {
                self.line(&format!("    ; unsupported construct: {}", kind));
            }
        }
    }

    /// Fuses a conditional jump with the comparison that produced its
    /// condition temporary. An unindexed or malformed condition is a
    /// surfaced correctness gap: report it and emit nothing.
    fn fuse_conditional(&mut self, cond: &Value, target: &str, negated: bool) {
        let name = match cond {
            Value::Variable(id) => id.name.as_str(),
            _ => {
                self.diagnose(Diagnostic::warning(format!(
                    "conditional jump to {} has no condition temporary; instruction skipped",
                    target
                )));
                return;
            }
        };

        let Some(Instruction::Binary(op, lhs, rhs, _)) = self.fused.get(name).copied() else {
            self.diagnose(Diagnostic::warning(format!(
                "condition '{}' does not name an indexed comparison; conditional jump to {} skipped",
                name, target
            )));
            return;
        };

        let (Value::Constant(_) | Value::Variable(_), Value::Constant(_) | Value::Variable(_)) =
            (lhs, rhs)
        else {
            self.diagnose(Diagnostic::warning(format!(
                "malformed comparison behind '{}'; conditional jump to {} skipped",
                name, target
            )));
            return;
        };

        // Comparisons are the only instructions indexed, so a jump
        // mnemonic always exists.
        let Some(jump) = comparison_jump(*op, negated) else {
            return;
        };

        let lhs = match lhs {
            Value::Constant(c) => c.to_string(),
            Value::Variable(id) => id.name.clone(),
            Value::Missing => unreachable!(),
        };
        let rhs = match rhs {
            Value::Constant(c) => c.to_string(),
            Value::Variable(id) => id.name.clone(),
            Value::Missing => unreachable!(),
        };

        self.line(&format!("    MOV AX, {}", lhs));
        self.line(&format!("    CMP AX, {}", rhs));
        self.line(&format!("    {} {}", jump, target));
    }
}

/// Builds the fusion index: every comparison quadruple whose result is
/// a generated temporary, keyed by that temporary's name.
fn index_comparisons(instructions: &[Instruction]) -> HashMap<&str, &Instruction> {
    let mut fused = HashMap::new();
    for instruction in instructions {
        if let Instruction::Binary(op, _, _, dest) = instruction {
            if op.is_comparison() && is_temp(&dest.name) {
                fused.insert(dest.name.as_str(), instruction);
            }
        }
    }
    fused
}

/// Pass 1: the declared-variable set. Every non-literal operand or
/// result is a variable, except label/goto targets and temporaries
/// that exist only to be fused away.
fn discover_variables<'a>(
    instructions: &'a [Instruction],
    fused: &HashMap<&str, &Instruction>,
) -> BTreeSet<&'a str> {
    let mut variables = BTreeSet::new();

    let mut collect = |value: &'a Value, variables: &mut BTreeSet<&'a str>| {
        if let Value::Variable(id) = value {
            if !fused.contains_key(id.name.as_str()) {
                variables.insert(id.name.as_str());
            }
        }
    };

    for instruction in instructions {
        match instruction {
            Instruction::Assign(src, dest) => {
                collect(src, &mut variables);
                variables.insert(dest.name.as_str());
            }
            Instruction::Binary(_, a, b, dest) => {
                collect(a, &mut variables);
                collect(b, &mut variables);
                if !fused.contains_key(dest.name.as_str()) {
                    variables.insert(dest.name.as_str());
                }
            }
            Instruction::JumpIfFalse(cond, _) | Instruction::JumpIfTrue(cond, _) => {
                collect(cond, &mut variables);
            }
            Instruction::Jump(_) | Instruction::Label(_) | Instruction::Unsupported(_) => {}
        }
    }

    variables
}

/// Renders the full assembly artifact for a quadruple sequence.
pub fn assemble(instructions: &[Instruction]) -> Assembly {
    let fused = index_comparisons(instructions);
    let variables = discover_variables(instructions, &fused);

    let mut emitter = Emitter {
        fused,
        out: String::new(),
        diagnostics: Vec::new(),
    };

    emitter.line(".MODEL SMALL");
    emitter.line(".STACK 100h");
    emitter.line(".DATA");
    for variable in &variables {
        emitter.line(&format!("    {} DW ?", variable));
    }

    emitter.line("");
    emitter.line(".CODE");
    emitter.line("MAIN PROC");
    emitter.line("    MOV AX, @DATA");
    emitter.line("    MOV DS, AX");

    for instruction in instructions {
        emitter.lower(instruction);
    }

    emitter.line("");
    emitter.line("    ; Exit the program");
    emitter.line("    MOV AH, 4Ch");
    emitter.line("    INT 21h");
    emitter.line("MAIN ENDP");
    emitter.line("END MAIN");

    log::debug!(
        "assembled {} quadruples into {} bytes ({} diagnostics)",
        instructions.len(),
        emitter.out.len(),
        emitter.diagnostics.len()
    );

    Assembly {
        text: emitter.out,
        diagnostics: emitter.diagnostics,
    }
}

/// Renders and writes the artifact. An unopenable destination yields an
/// error without leaving a partial file; the write is flushed before
/// returning.
pub fn write_assembly(
    instructions: &[Instruction],
    destination: &Path,
) -> Result<Vec<Diagnostic>, CompileError> {
    let assembly = assemble(instructions);

    let file = File::create(destination)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(assembly.text.as_bytes())?;
    writer.flush()?;

    Ok(assembly.diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator::{Add, Equal, GreaterThan};
    use crate::ast::Identifier;
    use Instruction::{Assign, Binary, Jump, JumpIfFalse, JumpIfTrue, Label};

    fn id(name: &str) -> Identifier {
        Identifier::new(name)
    }

    fn var(name: &str) -> Value {
        Value::Variable(id(name))
    }

    /// Quads for: x = 5; if (x > 3) { y = 1; } else { y = 2; }
    fn if_else_quads() -> Vec<Instruction> {
        vec![
            Assign(Value::Constant(5), id("x")),
            Binary(GreaterThan, var("x"), Value::Constant(3), id("t1")),
            JumpIfFalse(var("t1"), id("L1")),
            Assign(Value::Constant(1), id("y")),
            Jump(id("L2")),
            Label(id("L1")),
            Assign(Value::Constant(2), id("y")),
            Label(id("L2")),
        ]
    }

    #[test]
    fn emits_full_artifact_for_if_else() {
        let assembly = assemble(&if_else_quads());
        assert!(assembly.diagnostics.is_empty());
        let expected = "\
.MODEL SMALL
.STACK 100h
.DATA
    x DW ?
    y DW ?

.CODE
MAIN PROC
    MOV AX, @DATA
    MOV DS, AX
    MOV x, 5
    MOV AX, x
    CMP AX, 3
    JLE L1
    MOV y, 1
    JMP L2
L1:
    MOV y, 2
L2:

    ; Exit the program
    MOV AH, 4Ch
    INT 21h
MAIN ENDP
END MAIN
";
        assert_eq!(assembly.text, expected);
    }

    #[test]
    fn declares_variables_but_not_fused_temps_or_labels() {
        let assembly = assemble(&if_else_quads());
        assert!(assembly.text.contains("    x DW ?"));
        assert!(assembly.text.contains("    y DW ?"));
        assert!(!assembly.text.contains("t1 DW"));
        assert!(!assembly.text.contains("L1 DW"));
        assert!(!assembly.text.contains("L2 DW"));
    }

    #[test]
    fn arithmetic_uses_two_scratch_registers() {
        let quads = vec![Binary(Add, var("a"), Value::Constant(2), id("b"))];
        let assembly = assemble(&quads);
        let body: Vec<&str> = assembly
            .text
            .lines()
            .skip_while(|l| *l != "    MOV DS, AX")
            .skip(1)
            .take(4)
            .collect();
        assert_eq!(
            body,
            vec![
                "    MOV AX, a",
                "    MOV BX, 2",
                "    ADD AX, BX",
                "    MOV b, AX",
            ]
        );
    }

    #[test]
    fn variable_to_variable_moves_through_scratch() {
        let quads = vec![Assign(var("a"), id("b"))];
        let assembly = assemble(&quads);
        assert!(assembly.text.contains("    MOV AX, a\n    MOV b, AX"));
    }

    #[test]
    fn positive_jump_for_switch_dispatch() {
        let quads = vec![
            Binary(Equal, var("x"), Value::Constant(1), id("t1")),
            JumpIfTrue(var("t1"), id("L2")),
        ];
        let assembly = assemble(&quads);
        assert!(assembly.text.contains("    MOV AX, x\n    CMP AX, 1\n    JE L2"));
        assert!(assembly.diagnostics.is_empty());
    }

    #[test]
    fn unindexed_condition_is_reported_and_skipped() {
        // `while (x)` style: the condition is a plain variable, not a
        // fusable comparison temporary.
        let quads = vec![
            Label(id("L1")),
            JumpIfFalse(var("x"), id("L2")),
            Jump(id("L1")),
            Label(id("L2")),
        ];
        let assembly = assemble(&quads);
        assert_eq!(assembly.diagnostics.len(), 1);
        assert!(!assembly.text.contains("CMP"));
        // The rest of the stream still lowers.
        assert!(assembly.text.contains("    JMP L1"));
    }

    #[test]
    fn malformed_fused_condition_is_reported_and_skipped() {
        let quads = vec![
            Binary(Equal, Value::Missing, Value::Constant(1), id("t1")),
            JumpIfFalse(var("t1"), id("L1")),
        ];
        let assembly = assemble(&quads);
        assert!(assembly
            .diagnostics
            .iter()
            .any(|d| d.message.contains("malformed comparison")));
        assert!(!assembly.text.contains("CMP"));
    }

    #[test]
    fn missing_assignment_source_is_skipped_not_rendered() {
        let quads = vec![Assign(Value::Missing, id("x"))];
        let assembly = assemble(&quads);
        assert_eq!(assembly.diagnostics.len(), 1);
        assert!(!assembly.text.contains("<missing>"));
    }

    #[test]
    fn jump_only_stream_declares_no_variables() {
        let quads = vec![Label(id("L1")), Jump(id("L1"))];
        let assembly = assemble(&quads);
        assert!(!assembly.text.contains("DW ?"));
    }

    #[test]
    fn unsupported_marker_stays_visible() {
        let quads = vec![Instruction::Unsupported("case".to_string())];
        let assembly = assemble(&quads);
        assert!(assembly.text.contains("; unsupported construct: case"));
    }

    #[test]
    fn reading_a_fused_temp_is_reported_and_skipped() {
        // flag = (x == 1): fusion keeps t1 out of the data section, so
        // the assignment that reads it cannot be lowered either; the
        // gap must be surfaced, not left as an undeclared reference.
        let quads = vec![
            Binary(Equal, var("x"), Value::Constant(1), id("t1")),
            Assign(var("t1"), id("flag")),
        ];
        let assembly = assemble(&quads);
        assert!(!assembly.text.contains("t1 DW"));
        assert!(!assembly.text.contains("MOV AX, t1"));
        assert!(assembly
            .diagnostics
            .iter()
            .any(|d| d.message.contains("fused comparison temporary 't1'")));
        // The destination was still discovered.
        assert!(assembly.text.contains("    flag DW ?"));
        assert!(assembly.text.contains("    x DW ?"));
    }

    #[test]
    fn arithmetic_reading_a_fused_temp_is_reported_and_skipped() {
        let quads = vec![
            Binary(Equal, var("x"), Value::Constant(1), id("t1")),
            Binary(Add, var("t1"), Value::Constant(1), id("y")),
        ];
        let assembly = assemble(&quads);
        assert!(!assembly.text.contains("MOV AX, t1"));
        assert!(!assembly.text.contains("ADD AX, BX"));
        assert_eq!(assembly.diagnostics.len(), 1);
    }

    #[test]
    fn doubly_missing_arithmetic_reports_once() {
        let quads = vec![Binary(Add, Value::Missing, Value::Missing, id("x"))];
        let assembly = assemble(&quads);
        assert_eq!(assembly.diagnostics.len(), 1);
        assert!(!assembly.text.contains("ADD"));
    }

    #[test]
    fn write_assembly_reports_unopenable_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("no-such-dir").join("out.asm");
        let result = write_assembly(&if_else_quads(), &missing);
        assert!(matches!(result, Err(CompileError::Io(_))));
    }

    #[test]
    fn write_assembly_flushes_full_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.asm");
        let diagnostics = write_assembly(&if_else_quads(), &path).expect("write");
        assert!(diagnostics.is_empty());
        let written = std::fs::read_to_string(&path).expect("read back");
        assert!(written.starts_with(".MODEL SMALL"));
        assert!(written.ends_with("END MAIN\n"));
    }
}
