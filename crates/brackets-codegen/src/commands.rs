//! Block-command registry.

use crate::builtins;
use crate::error::{CodegenError, CodegenResult};
use crate::generator::Generator;
use brackets_parser::CommandLookup;
use brackets_types::ast::BlockNode;
use brackets_types::program::Fragment;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Lowers one block: `(args, block, generator, chain_blocks) -> fragment`.
pub type CommandHandler = Rc<
    dyn Fn(&str, &BlockNode, &mut Generator<'_>, &[BlockNode]) -> CodegenResult<Fragment>,
>;

/// Names a block introduces into its body scope, given its argument text.
pub type BindingsFn = Rc<dyn Fn(&str) -> Vec<String>>;

/// The part of a block's argument text evaluated in the enclosing scope.
pub type ReadsFn = Rc<dyn Fn(&str) -> String>;

/// A named block command.
#[derive(Clone)]
pub struct Command {
    name: String,
    handler: CommandHandler,
    chain_names: Vec<String>,
    bindings: Option<BindingsFn>,
    reads: Option<ReadsFn>,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str, &BlockNode, &mut Generator<'_>, &[BlockNode]) -> CodegenResult<Fragment>
            + 'static,
    {
        Self {
            name: name.into(),
            handler: Rc::new(handler),
            chain_names: Vec::new(),
            bindings: None,
            reads: None,
        }
    }

    /// Declare the chain segments (`{{#else}}`, …) this command accepts.
    pub fn chains<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chain_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the names the block binds in its body.
    pub fn binds<F>(mut self, bindings: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + 'static,
    {
        self.bindings = Some(Rc::new(bindings));
        self
    }

    /// Declare which part of the argument text is read from the enclosing
    /// scope. Without it the whole argument text is.
    pub fn reads<F>(mut self, reads: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.reads = Some(Rc::new(reads));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain_names(&self) -> &[String] {
        &self.chain_names
    }

    pub fn has_chain(&self, name: &str) -> bool {
        self.chain_names.iter().any(|chain| chain == name)
    }

    /// Names bound inside a block with argument text `args`.
    pub fn bound_names(&self, args: &str) -> Vec<String> {
        self.bindings
            .as_ref()
            .map(|bindings| bindings(args))
            .unwrap_or_default()
    }

    /// Expression source the block evaluates outside its own bindings.
    pub fn read_source(&self, args: &str) -> String {
        match &self.reads {
            Some(reads) => reads(args),
            None => args.to_string(),
        }
    }

    pub(crate) fn lower(
        &self,
        block: &BlockNode,
        generator: &mut Generator<'_>,
    ) -> CodegenResult<Fragment> {
        (self.handler)(&block.args, block, generator, &block.chain_blocks)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("chain_names", &self.chain_names)
            .field("binds", &self.bindings.is_some())
            .field("reads", &self.reads.is_some())
            .finish_non_exhaustive()
    }
}

/// Name → command table. Owned by a compiler; duplicate names are rejected.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: IndexMap<String, Command>,
}

impl CommandRegistry {
    /// A registry with no commands at all.
    pub fn empty() -> Self {
        Self {
            commands: IndexMap::new(),
        }
    }

    /// A registry holding the built-in `if` and `for` commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for command in builtins::builtin_commands() {
            registry.commands.insert(command.name().to_string(), command);
        }
        registry
    }

    /// Add a command. Fails if the name is taken.
    pub fn register(&mut self, command: Command) -> CodegenResult<()> {
        if self.commands.contains_key(command.name()) {
            return Err(CodegenError::DuplicateCommand(command.name().to_string()));
        }
        tracing::debug!(
            command = command.name(),
            chains = ?command.chain_names(),
            "registered template command"
        );
        self.commands.insert(command.name().to_string(), command);
        Ok(())
    }

    /// Register `name` with `handler` and its chain names.
    pub fn command<F, I, S>(&mut self, name: &str, handler: F, chain_names: I) -> CodegenResult<()>
    where
        F: Fn(&str, &BlockNode, &mut Generator<'_>, &[BlockNode]) -> CodegenResult<Fragment>
            + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(Command::new(name, handler).chains(chain_names))
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CommandLookup for CommandRegistry {
    fn is_command(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn is_chain_of(&self, owner: &str, name: &str) -> bool {
        self.get(owner).is_some_and(|command| command.has_chain(name))
    }

    fn is_chain_name(&self, name: &str) -> bool {
        self.commands.values().any(|command| command.has_chain(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &str, _: &BlockNode, _: &mut Generator<'_>, _: &[BlockNode]) -> CodegenResult<Fragment> {
        Ok(Fragment::new())
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = CommandRegistry::with_builtins();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["if", "for"]);
        assert!(registry.is_chain_of("if", "elif"));
        assert!(registry.is_chain_of("if", "else"));
        assert!(!registry.is_chain_of("for", "else"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = CommandRegistry::empty();
        registry.command("alreadyexists", noop, Vec::<String>::new()).unwrap();
        let err = registry
            .command("alreadyexists", noop, Vec::<String>::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Command alreadyexists already exists");
    }

    #[test]
    fn test_builtin_names_cannot_be_replaced() {
        let mut registry = CommandRegistry::with_builtins();
        assert!(matches!(
            registry.register(Command::new("if", noop)),
            Err(CodegenError::DuplicateCommand(name)) if name == "if"
        ));
    }
}
