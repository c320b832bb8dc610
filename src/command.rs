//! Command traits and the console diagnostics.

use std::io::Write;

use anyhow::Result;
use thiserror::Error;

use crate::session::Session;

/// Conventional exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates that a
/// diagnostic was printed. The interactive loop continues either way.
pub type ExitCode = i32;

/// Diagnostics a command can raise. Each renders as exactly the line the
/// console prints; none of them ever crosses into the interactive loop.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("** class name missing **")]
    MissingClassName,
    #[error("** class doesn't exist **")]
    UnknownClass,
    #[error("** instance id missing **")]
    MissingInstanceId,
    #[error("** no instance found **")]
    InstanceNotFound,
    #[error("** attribute name missing **")]
    MissingAttributeName,
    #[error("** value missing **")]
    MissingAttributeValue,
    /// Malformed map literal or wrong positional arity in a method call.
    #[error("** invalid format **")]
    InvalidFormat,
    /// Type coercion failed while applying an attribute update.
    #[error("** invalid value **")]
    InvalidValue,
}

/// Object-safe trait for any command the interpreter can execute.
///
/// Implemented by the built-in console commands via a blanket impl.
pub trait ExecutableCommand {
    /// Executes the command against the session, writing output to `stdout`.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, session: &mut Session)
        -> Result<ExitCode>;
}

/// Factory that tries to create a command from a verb and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Canonical name of the command this factory builds.
    fn command_name(&self) -> &'static str;

    /// Usage text shown by `help`.
    fn usage(&self) -> &'static str;

    /// Attempt to create a command instance for the provided name and
    /// arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}

#[cfg(test)]
mod tests {
    use super::ConsoleError;

    #[test]
    fn test_diagnostics_render_console_lines() {
        assert_eq!(
            ConsoleError::MissingClassName.to_string(),
            "** class name missing **"
        );
        assert_eq!(
            ConsoleError::UnknownClass.to_string(),
            "** class doesn't exist **"
        );
        assert_eq!(
            ConsoleError::MissingInstanceId.to_string(),
            "** instance id missing **"
        );
        assert_eq!(
            ConsoleError::InstanceNotFound.to_string(),
            "** no instance found **"
        );
        assert_eq!(
            ConsoleError::MissingAttributeName.to_string(),
            "** attribute name missing **"
        );
        assert_eq!(
            ConsoleError::MissingAttributeValue.to_string(),
            "** value missing **"
        );
        assert_eq!(
            ConsoleError::InvalidFormat.to_string(),
            "** invalid format **"
        );
        assert_eq!(ConsoleError::InvalidValue.to_string(), "** invalid value **");
    }
}
