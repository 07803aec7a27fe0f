use anyhow::Result;
use argh::FromArgs;
use scs::{Actor, AuditLog, Config, Dispatcher, Editor, Repl};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(FromArgs)]
/// scs: a small interactive command shell.
struct Args {
    #[argh(option)]
    /// file that receives one audit line per submitted command (default: .scs_history)
    audit_log: Option<PathBuf>,

    #[argh(switch)]
    /// do not load or save the line editor history file
    no_history: bool,

    #[argh(switch, short = 'v')]
    /// log debug diagnostics to standard error
    verbose: bool,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("scs: could not install logger: {}", e);
    }

    let mut config = Config::default();
    if let Some(path) = args.audit_log {
        config.audit_log = path;
    }
    if args.no_history {
        config.history_file = None;
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("scs: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<()> {
    let reader = Editor::new(config.history_file)?;
    let audit = AuditLog::open(&config.audit_log);
    let mut repl = Repl::new(reader, Dispatcher::default(), audit, Actor::current());
    repl.run()
}
