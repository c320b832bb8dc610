use std::path::Path;

use argh::FromArgs;
use hbnb_console::{logging, FileStorage, Interpreter, Session};

#[derive(FromArgs)]
/// Interactive console for creating, inspecting and mutating stored records.
struct ConsoleArgs {
    /// path of the JSON storage file
    #[argh(option, default = "String::from(\"file.json\")")]
    file: String,

    /// directory for log files; logging stays disabled when omitted
    #[argh(option)]
    log_dir: Option<String>,

    /// log level: trace, debug, info, warn or error
    #[argh(option, default = "String::from(\"info\")")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args: ConsoleArgs = argh::from_env();

    if let Some(log_dir) = &args.log_dir {
        logging::init_logging(&args.log_level, Path::new(log_dir))?;
    }

    let mut storage = FileStorage::new(&args.file);
    storage.reload()?;

    let mut interpreter = Interpreter::with_defaults(Session::new(storage));
    interpreter.repl()
}
