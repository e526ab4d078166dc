//! Render-program interpreter.

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::value::{is_truthy, stringify};
use brackets_types::program::{Instr, Program};
use serde_json::Value;

/// Render `program` against a plain state snapshot.
pub fn render(program: &Program, snapshot: &Value) -> EvalResult<String> {
    Machine::new(program).run(snapshot)
}

/// Executes one render of a [`Program`].
pub struct Machine<'p> {
    program: &'p Program,
    env: Environment,
    output: String,
    /// Instructions executed so far.
    pub gas: u64,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            env: Environment::new(),
            output: String::new(),
            gas: 0,
        }
    }

    /// Consume one unit of gas. Returns error if exhausted.
    fn tick(&mut self) -> EvalResult<()> {
        self.gas += 1;
        if self.gas > self.program.gas_limit {
            Err(EvalError::GasExhausted(self.program.gas_limit))
        } else {
            Ok(())
        }
    }

    pub fn run(mut self, snapshot: &Value) -> EvalResult<String> {
        let program = self.program;
        let instrs = &program.instrs;
        let mut pc = 0usize;

        while let Some(instr) = instrs.get(pc) {
            self.tick()?;
            let mut next = pc + 1;

            match instr {
                Instr::BindSnapshot => match snapshot {
                    Value::Object(map) => self.env.bind_all(map),
                    Value::Null => {}
                    other => {
                        return Err(EvalError::TypeMismatch(format!(
                            "state snapshot must be an object, got {}",
                            crate::value::type_name(other)
                        )))
                    }
                },
                Instr::Text(text) => self.output.push_str(text),
                Instr::Emit(expr) => {
                    let value = Evaluator::new(&self.env).eval(expr)?;
                    self.output.push_str(&stringify(&value));
                    self.output.push_str(&program.separator);
                }
                Instr::Let { name, value } => {
                    let value = Evaluator::new(&self.env).eval(value)?;
                    self.env.define(name, value);
                }
                Instr::Assign { name, value } => {
                    let value = Evaluator::new(&self.env).eval(value)?;
                    if !self.env.assign(name, value) {
                        return Err(EvalError::UndefinedVariable(name.clone()));
                    }
                }
                Instr::PushScope => self.env.push_scope(),
                Instr::PopScope => {
                    if !self.env.pop_scope() {
                        return Err(EvalError::Runtime(format!(
                            "scope underflow at instruction {pc}"
                        )));
                    }
                }
                Instr::JumpUnless { cond, skip } => {
                    let cond = Evaluator::new(&self.env).eval(cond)?;
                    if !is_truthy(&cond) {
                        next += skip;
                    }
                }
                Instr::Jump { offset } => {
                    next = next
                        .checked_add_signed(*offset)
                        .filter(|target| *target <= instrs.len())
                        .ok_or_else(|| {
                            EvalError::Runtime(format!(
                                "jump out of bounds at instruction {pc}"
                            ))
                        })?;
                }
                Instr::Return => break,
            }

            pc = next;
        }

        Ok(self.output)
    }
}
