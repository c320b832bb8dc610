//! Line dispatch and the interactive loop.

use std::io::Write;

use anyhow::Result;
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::builtin::{All, Count, Create, Destroy, Eof, Factory, Quit, Show, Update};
use crate::command::{CommandFactory, ConsoleError, ExecutableCommand, ExitCode};
use crate::parser::{self, MethodCall};
use crate::session::Session;

const PROMPT: &str = "(hbnb) ";

/// The console interpreter.
///
/// Holds the [`Session`] and two sets of [`CommandFactory`] objects: one for
/// the primary verb commands and one for the verbs reachable through the
/// `Class.method(args)` call form. Each input line is tried against the
/// primary verbs first, then against the call form, and finally reported as
/// unknown syntax.
pub struct Interpreter {
    session: Session,
    commands: Vec<Box<dyn CommandFactory>>,
    methods: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter with custom factory sets.
    pub fn new(
        session: Session,
        commands: Vec<Box<dyn CommandFactory>>,
        methods: Vec<Box<dyn CommandFactory>>,
    ) -> Self {
        Self {
            session,
            commands,
            methods,
        }
    }

    /// Create an interpreter with the full console command set:
    /// - verbs: `create`, `show`, `all`, `destroy`, `update`, `quit`, `EOF`
    /// - call-form methods: `all`, `count`, `show`, `destroy`, `update`
    pub fn with_defaults(session: Session) -> Self {
        Self::new(
            session,
            vec![
                Box::new(Factory::<Create>::default()),
                Box::new(Factory::<Show>::default()),
                Box::new(Factory::<All>::default()),
                Box::new(Factory::<Destroy>::default()),
                Box::new(Factory::<Update>::default()),
                Box::new(Factory::<Quit>::default()),
                Box::new(Factory::<Eof>::default()),
            ],
            vec![
                Box::new(Factory::<All>::default()),
                Box::new(Factory::<Count>::default()),
                Box::new(Factory::<Show>::default()),
                Box::new(Factory::<Destroy>::default()),
                Box::new(Factory::<Update>::default()),
            ],
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Execute one input line, writing all output to `out`.
    ///
    /// Domain failures are printed, never returned; the only `Err` this can
    /// produce is a failure to write to `out` itself.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<ExitCode> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(0);
        }
        let mut tokens = line.split_whitespace();
        let verb = match tokens.next() {
            Some(verb) => verb,
            None => return Ok(0),
        };
        let args: Vec<&str> = tokens.collect();

        if verb == "help" {
            return self.run_help(&args, out);
        }
        if let Some(result) = Self::dispatch(&self.commands, verb, &args, out, &mut self.session)
        {
            debug!("event=dispatch kind=verb name={}", verb);
            return result;
        }
        if let Some(call) = parser::parse_method_call(line) {
            return self.run_method_call(&call, out);
        }
        writeln!(out, "*** Unknown syntax: {}", line)?;
        Ok(1)
    }

    fn dispatch(
        factories: &[Box<dyn CommandFactory>],
        name: &str,
        args: &[&str],
        out: &mut dyn Write,
        session: &mut Session,
    ) -> Option<Result<ExitCode>> {
        for factory in factories {
            if let Some(cmd) = factory.try_create(name, args) {
                return Some(cmd.execute(out, session));
            }
        }
        None
    }

    fn run_method(&mut self, name: &str, args: &[&str], out: &mut dyn Write) -> Result<ExitCode> {
        match Self::dispatch(&self.methods, name, args, out, &mut self.session) {
            Some(result) => result,
            None => {
                writeln!(out, "*** Unknown syntax: {}", name)?;
                Ok(1)
            }
        }
    }

    fn run_method_call(&mut self, call: &MethodCall, out: &mut dyn Write) -> Result<ExitCode> {
        debug!(
            "event=dispatch kind=method class={} method={}",
            call.class, call.method
        );
        match call.method.as_str() {
            // listing forms take no arguments at all
            "all" | "count" if call.args.trim().is_empty() => {
                self.run_method(&call.method, &[&call.class], out)
            }
            "show" | "destroy" => {
                let id = parser::unquote(call.args.trim());
                self.run_method(&call.method, &[&call.class, id], out)
            }
            "update" => self.run_update_call(call, out),
            _ => {
                writeln!(
                    out,
                    "*** Unknown syntax: {}.{}({})",
                    call.class, call.method, call.args
                )?;
                Ok(1)
            }
        }
    }

    /// The `Class.update(...)` form: either a positional id/attribute/value
    /// triple or an id plus a flat map literal applied pair by pair.
    fn run_update_call(&mut self, call: &MethodCall, out: &mut dyn Write) -> Result<ExitCode> {
        if !self.session.registry.is_known(&call.class) {
            writeln!(out, "{}", ConsoleError::UnknownClass)?;
            return Ok(1);
        }
        if let Some(brace) = call.args.find('{') {
            return self.run_bulk_update(call, brace, out);
        }
        let parts = parser::split_args(&call.args);
        if parts.len() != 3 {
            writeln!(out, "{}", ConsoleError::InvalidFormat)?;
            return Ok(1);
        }
        let id = parser::unquote(parts[0]);
        let attr = parser::unquote(parts[1]);
        let value = parser::unquote(parts[2]);
        self.run_method("update", &[&call.class, id, attr, value], out)
    }

    fn run_bulk_update(
        &mut self,
        call: &MethodCall,
        brace: usize,
        out: &mut dyn Write,
    ) -> Result<ExitCode> {
        let pairs = match parser::parse_map_literal(&call.args[brace..]) {
            Ok(pairs) => pairs,
            Err(_) => {
                writeln!(out, "{}", ConsoleError::InvalidFormat)?;
                return Ok(1);
            }
        };
        let id_part = call.args[..brace].trim().trim_end_matches(',').trim_end();
        let key = format!("{}.{}", call.class, parser::unquote(id_part));
        if !self.session.storage.contains(&key) {
            writeln!(out, "{}", ConsoleError::InstanceNotFound)?;
            return Ok(1);
        }
        // the record is persisted after every single assignment
        for (name, value) in pairs {
            match self.session.storage.get_mut(&key) {
                Some(record) => {
                    if record.update_attr(&name, value).is_err() {
                        writeln!(out, "{}", ConsoleError::InvalidValue)?;
                        return Ok(1);
                    }
                    record.touch();
                }
                None => {
                    writeln!(out, "{}", ConsoleError::InstanceNotFound)?;
                    return Ok(1);
                }
            }
            if let Err(err) = self.session.storage.save() {
                writeln!(out, "{}", err)?;
                return Ok(1);
            }
        }
        Ok(0)
    }

    fn run_help(&mut self, args: &[&str], out: &mut dyn Write) -> Result<ExitCode> {
        match args.first() {
            None => {
                let mut names: Vec<&str> =
                    self.commands.iter().map(|f| f.command_name()).collect();
                names.push("help");
                names.sort_unstable();
                writeln!(out, "Documented commands (type help <topic>):")?;
                writeln!(out, "========================================")?;
                writeln!(out, "{}", names.join("  "))?;
                Ok(0)
            }
            Some(&"help") => {
                writeln!(
                    out,
                    "List available commands or show usage for one.\nUsage: help [<command>]"
                )?;
                Ok(0)
            }
            Some(name) => match self.commands.iter().find(|f| f.command_name() == *name) {
                Some(factory) => {
                    writeln!(out, "{}", factory.usage())?;
                    Ok(0)
                }
                None => {
                    writeln!(out, "*** No help on {}", name)?;
                    Ok(1)
                }
            },
        }
    }

    /// The interactive Read-Eval-Print Loop.
    ///
    /// Terminates on `quit`, a typed `EOF`, end-of-input or an interrupt;
    /// every other line keeps the prompt alive.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut stdout = std::io::stdout();
        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.execute_line(&line, &mut stdout)?;
                    if self.session.should_exit {
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    writeln!(stdout)?;
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    writeln!(stdout)?;
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
