use clap::Parser;

use vcloud_ansible::cli::NetworkModuleCli;
use vcloud_ansible::error::{CliError, exit_code};
use vcloud_ansible::module::{self, ModuleArgs, ModuleResult};
use vcloud_ansible::{init_tracing, output};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = NetworkModuleCli::parse();

    init_tracing(cli.verbose);

    let result = match run(&cli).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "module failed");
            ModuleResult::failure(&err)
        }
    };

    // Ansible reads the verdict from stdout; nothing else goes there.
    let code = if result.failed {
        exit_code::GENERAL
    } else {
        exit_code::SUCCESS
    };
    if let Err(err) = output::print_json(&result) {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(exit_code::GENERAL);
    }
    std::process::exit(code);
}

async fn run(cli: &NetworkModuleCli) -> Result<ModuleResult, CliError> {
    let args = ModuleArgs::from_file(&cli.args_file)?;
    let config = vcloud_config::load_config(None)?;
    module::run(&args, &config).await
}
