//! Alliant CLI - command-line interface for the Alliant REST API

mod cli;
mod config;
mod error;
mod logging;
mod output;

use alliant_client::{
    AlliantClient, ApiResponse, CollectionParameters, Filter, ResourceParameters,
};
use clap::Parser;
use cli::{Args, Command};
use config::Config;
use error::CliError;
use output::OutputFormatter;

fn main() {
    let args = Args::parse();
    logging::init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = Config::from_args(args)?;
    let mut client = config.client()?;
    let formatter = OutputFormatter::new(config.quiet);

    let response = if config.command.needs_session() {
        // Logs out on every path out of the closure
        client.with_session(|api| execute(api, &config.command))?
    } else {
        execute(&client, &config.command)?
    };

    formatter.print_response(&response)?;
    Ok(())
}

/// Run one command against the API
fn execute(client: &AlliantClient, command: &Command) -> Result<ApiResponse, CliError> {
    let response = match command {
        Command::SystemLayers => client.system_layers()?,
        Command::ApplicationLayers { system_layer } => client.application_layers(system_layer)?,
        Command::Lookup {
            resource,
            filter_field,
            filter_value,
            top,
            skip,
            verbosity,
        } => {
            let mut params = CollectionParameters::new().verbosity(*verbosity);
            if let (Some(field), Some(value)) = (filter_field, filter_value) {
                params = params.filter(Filter::eq(field, value));
            }
            if let Some(top) = top {
                params = params.top(*top);
            }
            if let Some(skip) = skip {
                params = params.skip(*skip);
            }
            let collection = client.lookup_collection(*resource, &params)?;
            tracing::info!(
                resource = %resource,
                items = collection.items().len(),
                total = ?collection.total_item_count(),
                "lookup finished"
            );
            ApiResponse::clone(&collection)
        }
        Command::Get {
            resource,
            guid,
            include,
        } => {
            let params = ResourceParameters::new().include(include);
            client.lookup(*resource, guid, &params)?
        }
        Command::Action {
            resource,
            guid,
            action,
            comment,
        } => client.action(*resource, guid, *action, comment.as_deref())?,
        Command::Delete { resource, guid } => client.delete(*resource, guid)?,
    };
    Ok(response)
}
