//! thumb - render and manage thumbnail compositions
//!
//! Usage: thumb <command> [args] [options]

use std::path::Path;
use std::process::ExitCode;

use thumb_cli::{CliError, Settings, commands};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("thumb", String::as_str);

    let Some(command) = args.get(1).map(String::as_str) else {
        print_usage(program);
        return ExitCode::FAILURE;
    };

    match command {
        "--help" | "-h" | "help" => {
            print_usage(program);
            return ExitCode::SUCCESS;
        }
        "--version" | "-V" => {
            println!("thumb {VERSION}");
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let mut settings = Settings::from_env();
    let result = match settings.apply_flags(&args[2..]) {
        Ok(positional) => run(command, &settings, &positional).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            eprintln!("Error: {msg}\n");
            print_usage(program);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &str, settings: &Settings, args: &[String]) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    match (command, args) {
        ("render", [config, out]) => {
            commands::render(settings, Path::new(config), Path::new(out)).await?;
        }
        ("save", [config]) => {
            commands::save(settings, Path::new(config), None, &mut stdout)?;
        }
        ("save", [config, id]) => {
            commands::save(settings, Path::new(config), Some(id.as_str()), &mut stdout)?;
        }
        ("load", [id]) => commands::load(settings, id, &mut stdout)?,
        ("delete", [id]) => commands::delete(settings, id)?,
        ("list", []) => {
            commands::list(settings, &mut stdout)?;
        }
        ("render" | "save" | "load" | "delete" | "list", _) => {
            return Err(CliError::Usage(format!("wrong arguments for `{command}`")));
        }
        _ => return Err(CliError::Usage(format!("unknown command `{command}`"))),
    }
    Ok(())
}

fn print_usage(program: &str) {
    println!(
        r#"thumb {VERSION} - thumbnail compositor

USAGE:
    {program} <COMMAND> [ARGS] [OPTIONS]

COMMANDS:
    render <config.json> <out.png>   Fetch images, draw and export a PNG
    save <config.json> [id]          Store a config, print its id
    load <id>                        Print a stored config as JSON
    delete <id>                      Remove a stored config
    list                             List stored ids

OPTIONS:
    --font <family>=<path>     Register a font file for export (repeatable)
    --default-font <path>      Fallback font file (env: THUMB_FONT)
    --no-system-fonts          Do not look for system fonts
    --store <dir>              Store directory (env: THUMB_STORE_DIR)
    -h, --help                 Print this help message
    -V, --version              Print version information

Set RUST_LOG=debug for load and render details.
"#
    );
}
