//! The seam between the parser and the command registry.

/// Answers the parser's questions about block names.
pub trait CommandLookup {
    /// `true` if `name` is a registered command that may open a block.
    fn is_command(&self, name: &str) -> bool;

    /// `true` if `name` is declared as a chain segment of `owner`.
    fn is_chain_of(&self, owner: &str, name: &str) -> bool;

    /// `true` if any registered command declares `name` as a chain segment.
    fn is_chain_name(&self, name: &str) -> bool;
}

impl<T: CommandLookup + ?Sized> CommandLookup for &T {
    fn is_command(&self, name: &str) -> bool {
        (**self).is_command(name)
    }

    fn is_chain_of(&self, owner: &str, name: &str) -> bool {
        (**self).is_chain_of(owner, name)
    }

    fn is_chain_name(&self, name: &str) -> bool {
        (**self).is_chain_name(name)
    }
}
