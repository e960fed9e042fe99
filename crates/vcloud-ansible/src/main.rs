use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::debug;

use vcloud_ansible::cli::InventoryCli;
use vcloud_ansible::error::CliError;
use vcloud_ansible::{init_tracing, output};
use vcloud_core::{ApiSource, Inventory, Query};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = InventoryCli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: InventoryCli) -> Result<(), CliError> {
    if let Some(shell) = cli.completions {
        let mut cmd = InventoryCli::command();
        generate(shell, &mut cmd, "vcd-inventory", &mut std::io::stdout());
        return Ok(());
    }

    // Credentials first: a missing variable is the most common failure.
    let credentials = vcloud_config::load_credentials()?;
    let config = vcloud_config::load_config(cli.config.as_deref())?;

    let cache_path = config.cache_path(&credentials);
    let source = ApiSource::new(config.connection(credentials), config.inventory.clone());
    let inventory = Inventory::new(source, cache_path);

    let query = query_for(&cli);
    debug!(?query, cache = %inventory.cache_path().display(), "answering inventory query");

    let document = inventory.run(&query).await?;
    output::print_json(&document)
}

fn query_for(cli: &InventoryCli) -> Query {
    match (&cli.host, cli.refresh_cache) {
        (Some(host), _) => Query::Host(host.clone()),
        (None, true) => Query::Refresh,
        (None, false) => Query::List,
    }
}
