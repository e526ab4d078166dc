use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::template::CompiledTemplate;
use brackets_codegen::{
    extract_variables, generate_program, CodegenError, CodegenResult, Command, CommandRegistry,
    Generator,
};
use brackets_lexer::Scanner;
use brackets_parser::Parser;
use brackets_types::ast::BlockNode;
use brackets_types::program::Fragment;
use brackets_types::SourceFile;
use sha2::{Digest, Sha256};

/// Compile `text` with the built-in commands and default options.
pub fn compile(text: &str) -> Result<CompiledTemplate, CompileError> {
    Compiler::new().compile(text)
}

/// Hex SHA-256 of template source text.
pub fn source_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Owns the command registry and compile options.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    registry: CommandRegistry,
    options: CompileOptions,
}

impl Compiler {
    /// A compiler with the built-in commands.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            registry: CommandRegistry::with_builtins(),
            options,
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn register(&mut self, command: Command) -> CodegenResult<()> {
        self.registry.register(command)
    }

    /// Register a block command. Fails if `name` is already registered.
    pub fn command<F, I, S>(&mut self, name: &str, handler: F, chain_names: I) -> CodegenResult<()>
    where
        F: Fn(&str, &BlockNode, &mut Generator<'_>, &[BlockNode]) -> CodegenResult<Fragment>
            + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.command(name, handler, chain_names)
    }

    /// Run the whole pipeline on `text`.
    pub fn compile(&self, text: &str) -> Result<CompiledTemplate, CompileError> {
        let source = SourceFile::new("template", text);

        let tokens = Scanner::new(text)
            .lex()
            .map_err(|err| err.with_source(&source))?;
        let root = Parser::new(tokens, &self.registry)
            .parse()
            .map_err(|err| err.with_source(&source))?;

        let program = generate_program(
            &root,
            &self.registry,
            &self.options.statement_separator,
            self.options.gas_limit,
        )
        .map_err(|err| match err {
            CodegenError::Template(err) => CodegenError::Template(err.with_source(&source)),
            other => other,
        })?;
        let variables = extract_variables(&root, &self.registry);
        let source_hash = source_hash(text);

        tracing::debug!(
            hash = %&source_hash[..12],
            instructions = program.instrs.len(),
            variables = ?variables,
            "compiled template"
        );
        Ok(CompiledTemplate::new(program, variables, source_hash))
    }
}
