//! Render-program IR.
//!
//! The code generator lowers a template AST into a flat list of
//! [`Instr`]s. Jumps are relative to the instruction that follows them,
//! so a [`Fragment`] can be spliced anywhere without relocation. A
//! complete [`Program`] starts with [`Instr::BindSnapshot`] and ends with
//! [`Instr::Return`].

use crate::expr::Expr;
use std::fmt;

/// A single render instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Preamble: expose every top-level key of the snapshot by name.
    BindSnapshot,
    /// Append literal text.
    Text(String),
    /// Evaluate, append the stringified value and the statement separator.
    Emit(Expr),
    /// Define `name` in the innermost scope.
    Let { name: String, value: Expr },
    /// Update the nearest existing binding of `name`.
    Assign { name: String, value: Expr },
    PushScope,
    PopScope,
    /// Skip the next `skip` instructions when `cond` is falsy.
    JumpUnless { cond: Expr, skip: usize },
    /// Move by `offset` relative to the next instruction.
    Jump { offset: isize },
    /// Postamble: stop and hand back the accumulated output.
    Return,
}

/// A composable run of instructions produced by a code generator step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    instrs: Vec<Instr>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    pub fn append(&mut self, other: Fragment) {
        self.instrs.extend(other.instrs);
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    pub fn into_instrs(self) -> Vec<Instr> {
        self.instrs
    }
}

impl From<Vec<Instr>> for Fragment {
    fn from(instrs: Vec<Instr>) -> Self {
        Self { instrs }
    }
}

impl FromIterator<Instr> for Fragment {
    fn from_iter<I: IntoIterator<Item = Instr>>(iter: I) -> Self {
        Self {
            instrs: iter.into_iter().collect(),
        }
    }
}

/// A complete render procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instrs: Vec<Instr>,
    /// Appended after every emitted statement value.
    pub separator: String,
    /// Maximum instructions executed per render.
    pub gas_limit: u64,
}

impl Program {
    /// Wrap a generated body with the snapshot preamble and return postamble.
    pub fn assemble(body: Fragment, separator: impl Into<String>, gas_limit: u64) -> Self {
        let mut instrs = Vec::with_capacity(body.len() + 2);
        instrs.push(Instr::BindSnapshot);
        instrs.extend(body.into_instrs());
        instrs.push(Instr::Return);
        Self {
            instrs,
            separator: separator.into(),
            gas_limit,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::BindSnapshot => write!(f, "bind_snapshot"),
            Instr::Text(text) => write!(f, "text {text:?}"),
            Instr::Emit(expr) => write!(f, "emit {expr}"),
            Instr::Let { name, value } => write!(f, "let {name} = {value}"),
            Instr::Assign { name, value } => write!(f, "assign {name} = {value}"),
            Instr::PushScope => write!(f, "push_scope"),
            Instr::PopScope => write!(f, "pop_scope"),
            Instr::JumpUnless { cond, skip } => write!(f, "jump_unless {cond} +{skip}"),
            Instr::Jump { offset } => write!(f, "jump {offset:+}"),
            Instr::Return => write!(f, "return"),
        }
    }
}

/// Prints the procedure one numbered instruction per line.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instr) in self.instrs.iter().enumerate() {
            writeln!(f, "{pc:04} {instr}")?;
        }
        Ok(())
    }
}
