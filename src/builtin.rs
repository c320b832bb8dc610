//! Built-in console commands.
//!
//! Every command is a small `argh`-derived struct registered through a typed
//! [`Factory`]. Domain failures are raised as [`ConsoleError`] values; the
//! blanket [`ExecutableCommand`] impl converts them into the printed
//! diagnostic line, so the interactive loop never sees an error.

use std::io::Write;

use anyhow::Result;
use argh::{EarlyExit, FromArgs};

use crate::command::{CommandFactory, ConsoleError, ExecutableCommand, ExitCode};
use crate::model::AttrValue;
use crate::parser;
use crate::session::Session;

/// Built-in commands known to the console at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "create" or "show".
    fn name() -> &'static str;

    /// Usage text shown by `help`.
    fn usage() -> &'static str;

    /// Executes the command using the provided output sink and session.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero when
    /// a diagnostic was printed.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        match T::execute(*self, stdout, session) {
            Ok(code) => Ok(code),
            Err(e) => {
                writeln!(stdout, "{}", e)?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _session: &mut Session,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        if !self.output.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        Ok(if self.is_error { 1 } else { 0 })
    }
}

/// Factory allows creating instances of one builtin command type.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn command_name(&self) -> &'static str {
        T::name()
    }

    fn usage(&self) -> &'static str {
        T::usage()
    }

    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

fn known_class<'a>(session: &Session, args: &'a [String]) -> Result<&'a str, ConsoleError> {
    let class = args.first().ok_or(ConsoleError::MissingClassName)?;
    if !session.registry.is_known(class) {
        return Err(ConsoleError::UnknownClass);
    }
    Ok(class.as_str())
}

fn identity_key(class: &str, args: &[String]) -> Result<String, ConsoleError> {
    let id = args.get(1).ok_or(ConsoleError::MissingInstanceId)?;
    Ok(format!("{}.{}", class, id))
}

#[derive(FromArgs)]
/// Create a new record of a known class, persist the store and print the
/// record's id.
pub struct Create {
    #[argh(positional)]
    /// class name, e.g. User
    pub args: Vec<String>,
}

impl BuiltinCommand for Create {
    fn name() -> &'static str {
        "create"
    }

    fn usage() -> &'static str {
        "Creates a new record, saves it and prints the id.\nUsage: create <class name>"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let class = self.args.first().ok_or(ConsoleError::MissingClassName)?;
        let record = session
            .registry
            .instantiate(class)
            .ok_or(ConsoleError::UnknownClass)?;
        let id = record.id().to_string();
        session.storage.add(record);
        session.storage.save()?;
        writeln!(stdout, "{}", id)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the rendered form of one record, looked up by class name and id.
pub struct Show {
    #[argh(positional)]
    /// class name followed by the record id
    pub args: Vec<String>,
}

impl BuiltinCommand for Show {
    fn name() -> &'static str {
        "show"
    }

    fn usage() -> &'static str {
        "Prints the rendered form of a record.\nUsage: show <class name> <id>"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let class = known_class(session, &self.args)?;
        let key = identity_key(class, &self.args)?;
        let record = session
            .storage
            .get(&key)
            .ok_or(ConsoleError::InstanceNotFound)?;
        writeln!(stdout, "{}", record)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the rendered form of every record, optionally restricted to one
/// class, one record per line in store order.
pub struct All {
    #[argh(positional)]
    /// optional class name filter
    pub args: Vec<String>,
}

impl BuiltinCommand for All {
    fn name() -> &'static str {
        "all"
    }

    fn usage() -> &'static str {
        "Prints all records, or all records of one class.\nUsage: all [<class name>]"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        match self.args.first() {
            Some(class) => {
                if !session.registry.is_known(class) {
                    return Err(ConsoleError::UnknownClass.into());
                }
                for record in session.storage.class_records(class) {
                    writeln!(stdout, "{}", record)?;
                }
            }
            None => {
                for record in session.storage.all().values() {
                    writeln!(stdout, "{}", record)?;
                }
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Delete one record by class name and id and persist the change.
pub struct Destroy {
    #[argh(positional)]
    /// class name followed by the record id
    pub args: Vec<String>,
}

impl BuiltinCommand for Destroy {
    fn name() -> &'static str {
        "destroy"
    }

    fn usage() -> &'static str {
        "Deletes a record and saves the change.\nUsage: destroy <class name> <id>"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let class = known_class(session, &self.args)?;
        let key = identity_key(class, &self.args)?;
        if !session.storage.delete(&key) {
            return Err(ConsoleError::InstanceNotFound.into());
        }
        session.storage.save()?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Add or update one attribute of a record and persist the change. The value
/// is stripped of one layer of surrounding double quotes; updates to an
/// existing attribute are coerced to its current kind.
pub struct Update {
    #[argh(positional)]
    /// class name, record id, attribute name and new value
    pub args: Vec<String>,
}

impl BuiltinCommand for Update {
    fn name() -> &'static str {
        "update"
    }

    fn usage() -> &'static str {
        "Adds or updates a record attribute.\n\
         Usage: update <class name> <id> <attribute name> \"<attribute value>\""
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let class = known_class(session, &self.args)?;
        let key = identity_key(class, &self.args)?;
        if !session.storage.contains(&key) {
            return Err(ConsoleError::InstanceNotFound.into());
        }
        let attr = self.args.get(2).ok_or(ConsoleError::MissingAttributeName)?;
        let raw = self.args.get(3).ok_or(ConsoleError::MissingAttributeValue)?;
        let value = parser::unquote_double(raw);

        let record = session
            .storage
            .get_mut(&key)
            .ok_or(ConsoleError::InstanceNotFound)?;
        record
            .update_attr(attr, AttrValue::Str(value.to_string()))
            .map_err(|_| ConsoleError::InvalidValue)?;
        record.touch();
        session.storage.save()?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print how many records of one class the store holds. Reached through the
/// `Class.count()` call form.
pub struct Count {
    #[argh(positional)]
    /// class name
    pub args: Vec<String>,
}

impl BuiltinCommand for Count {
    fn name() -> &'static str {
        "count"
    }

    fn usage() -> &'static str {
        "Prints the number of records of a class.\nUsage: <class name>.count()"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let class = known_class(session, &self.args)?;
        writeln!(stdout, "{}", session.storage.count_class(class))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Quit command to exit the program.
pub struct Quit {
    #[argh(positional)]
    /// ignored
    pub args: Vec<String>,
}

impl BuiltinCommand for Quit {
    fn name() -> &'static str {
        "quit"
    }

    fn usage() -> &'static str {
        "Quit command to exit the program."
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        session.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// EOF command to exit the program.
pub struct Eof {
    #[argh(positional)]
    /// ignored
    pub args: Vec<String>,
}

impl BuiltinCommand for Eof {
    fn name() -> &'static str {
        "EOF"
    }

    fn usage() -> &'static str {
        "EOF command to exit the program."
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        writeln!(stdout)?;
        session.should_exit = true;
        Ok(0)
    }
}
