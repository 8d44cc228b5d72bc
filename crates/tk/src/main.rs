//! `tk` -- issue tracker with workflow-driven custom fields.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);

    if ctx.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("tk=debug,ticketry_core=debug,ticketry_storage=debug,ticketry_config=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
        Some(Commands::Create(args)) => commands::create::run(&ctx, &args),
        Some(Commands::Show(args)) => commands::show::run(&ctx, &args),
        Some(Commands::List(args)) => commands::list::run(&ctx, &args),
        Some(Commands::SetField(args)) => commands::set_field::run(&ctx, &args),
        Some(Commands::Fields(args)) => commands::fields::run(&ctx, &args),
        Some(Commands::Transition(args)) => commands::transition::run(&ctx, &args),
        Some(Commands::Excluded(args)) => commands::excluded::run(&ctx, &args),
        Some(Commands::Delete(args)) => commands::delete::run(&ctx, &args),
        Some(Commands::Workflow(args)) => commands::workflow::run(&ctx, &args),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if ctx.json_output() {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
