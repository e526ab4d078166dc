//! Built-in block commands: `if` (with `elif`/`else`) and `for … of …`.

use crate::commands::Command;
use crate::error::{CodegenError, CodegenResult};
use crate::generator::Generator;
use brackets_lexer::expr_lexer::{is_ident_continue, is_ident_start};
use brackets_types::ast::BlockNode;
use brackets_types::expr::{BinOp, Expr};
use brackets_types::program::{Fragment, Instr};

/// Prefix of the per-loop counter variable.
pub const LOOP_COUNTER_PREFIX: &str = "__brackets_index_";

pub(crate) fn builtin_commands() -> Vec<Command> {
    vec![
        Command::new("if", if_command).chains(["elif", "else"]),
        Command::new("for", for_command)
            .binds(for_bindings)
            .reads(for_reads),
    ]
}

// ══════════════════════════════════════════════════════════════════════════
// if / elif / else
// ══════════════════════════════════════════════════════════════════════════

/// One `if` arm: `None` condition means a plain `else`.
struct Branch {
    cond: Option<Expr>,
    body: Fragment,
}

fn if_command(
    args: &str,
    block: &BlockNode,
    generator: &mut Generator<'_>,
    chain_blocks: &[BlockNode],
) -> CodegenResult<Fragment> {
    if !block.has_args() {
        return Err(CodegenError::invalid_arguments("if", "expected a condition"));
    }

    let mut branches = vec![Branch {
        cond: Some(generator.expression_at(args, block.span)?),
        body: generator.generate(&block.children)?,
    }];

    for (i, segment) in chain_blocks.iter().enumerate() {
        if branches.last().is_some_and(|b| b.cond.is_none()) {
            return Err(CodegenError::invalid_arguments(
                "if",
                format!("`{}` follows the final `else` branch", segment.name),
            ));
        }
        let cond = if segment.has_args() {
            Some(generator.expression_at(&segment.args, segment.span)?)
        } else if segment.name == "elif" {
            return Err(CodegenError::invalid_arguments(
                "elif",
                format!("chain segment {} has no condition", i + 1),
            ));
        } else {
            None
        };
        branches.push(Branch {
            cond,
            body: generator.generate(&segment.children)?,
        });
    }

    // Back to front: each conditional arm jumps over its body to the rest of
    // the chain, and past the rest once its body ran.
    let mut tail = Fragment::new();
    for branch in branches.into_iter().rev() {
        let Some(cond) = branch.cond else {
            tail = branch.body;
            continue;
        };
        let mut arm = Fragment::new();
        let exit = usize::from(!tail.is_empty());
        arm.push(Instr::JumpUnless {
            cond,
            skip: branch.body.len() + exit,
        });
        arm.append(branch.body);
        if !tail.is_empty() {
            arm.push(Instr::Jump {
                offset: tail.len() as isize,
            });
        }
        arm.append(tail);
        tail = arm;
    }
    Ok(tail)
}

// ══════════════════════════════════════════════════════════════════════════
// for <item> of <iterable>
// ══════════════════════════════════════════════════════════════════════════

/// Split `item of iterable` into its two halves.
fn parse_for_args(args: &str) -> CodegenResult<(&str, &str)> {
    let args = args.trim();
    let (item, rest) = args
        .split_once(char::is_whitespace)
        .ok_or_else(|| CodegenError::invalid_arguments("for", "expected `<item> of <iterable>`"))?;
    let iterable = rest
        .trim_start()
        .strip_prefix("of")
        .filter(|after| after.starts_with(char::is_whitespace))
        .map(str::trim)
        .filter(|iterable| !iterable.is_empty())
        .ok_or_else(|| CodegenError::invalid_arguments("for", "expected `<item> of <iterable>`"))?;

    let mut chars = item.chars();
    let valid = chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue);
    if !valid || crate::variables::RESERVED_WORDS.contains(&item) {
        return Err(CodegenError::invalid_arguments(
            "for",
            format!("`{item}` is not a valid loop variable name"),
        ));
    }
    Ok((item, iterable))
}

fn index_alias(item: &str) -> String {
    format!("${item}Index")
}

/// `for x of xs` binds `x`, `$index` and `$xIndex`.
fn for_bindings(args: &str) -> Vec<String> {
    match parse_for_args(args) {
        Ok((item, _)) => vec![item.to_string(), "$index".to_string(), index_alias(item)],
        Err(_) => Vec::new(),
    }
}

/// Only the iterable is evaluated before the loop binds its names.
fn for_reads(args: &str) -> String {
    match parse_for_args(args) {
        Ok((_, iterable)) => iterable.to_string(),
        Err(_) => args.to_string(),
    }
}

fn for_command(
    args: &str,
    block: &BlockNode,
    generator: &mut Generator<'_>,
    _chain_blocks: &[BlockNode],
) -> CodegenResult<Fragment> {
    let (item, iterable_src) = parse_for_args(args)?;
    let iterable = generator.expression_at(iterable_src, block.span)?;
    let counter = generator.fresh_name(LOOP_COUNTER_PREFIX);
    let body = generator.generate(&block.children)?;

    let mut inner = Fragment::new();
    inner.push(Instr::PushScope);
    inner.push(Instr::Let {
        name: item.to_string(),
        value: Expr::Index {
            object: Box::new(iterable.clone()),
            index: Box::new(Expr::ident(&counter)),
        },
    });
    inner.push(Instr::Let {
        name: "$index".to_string(),
        value: Expr::ident(&counter),
    });
    inner.push(Instr::Let {
        name: index_alias(item),
        value: Expr::ident("$index"),
    });
    inner.append(body);
    inner.push(Instr::PopScope);
    inner.push(Instr::Assign {
        name: counter.clone(),
        value: Expr::binary(Expr::ident(&counter), BinOp::Add, Expr::Number(1.0)),
    });

    let mut fragment = Fragment::new();
    fragment.push(Instr::PushScope);
    fragment.push(Instr::Let {
        name: counter.clone(),
        value: Expr::Number(0.0),
    });
    fragment.push(Instr::JumpUnless {
        cond: Expr::binary(
            Expr::ident(&counter),
            BinOp::Less,
            Expr::Member {
                object: Box::new(iterable),
                property: "length".to_string(),
            },
        ),
        skip: inner.len() + 1,
    });
    let loop_len = inner.len() as isize;
    fragment.append(inner);
    fragment.push(Instr::Jump {
        offset: -(loop_len + 2),
    });
    fragment.push(Instr::PopScope);
    Ok(fragment)
}
