use clap::{Parser, Subcommand};
use hiro_system_kit::{self, Logger};
use kiwi_core::constants::DEFAULT_MANIFEST_PATH;
use std::process;

mod deploy;

#[derive(Clone)]
pub struct Context {
    pub logger: Logger,
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    #[clap(subcommand)]
    command: Option<Command>,
    /// Deploy options, used when no subcommand is given
    #[clap(flatten)]
    deploy: DeployContract,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Deploy a contract listed in the manifest (default)
    #[clap(name = "deploy", bin_name = "deploy")]
    Deploy(DeployContract),
    /// Print block number, connectivity and sender nonce
    #[clap(name = "status", bin_name = "status")]
    Status(CheckStatus),
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct DeployContract {
    /// Path to the manifest
    #[arg(long = "manifest-file-path", short = 'm', default_value = DEFAULT_MANIFEST_PATH)]
    pub manifest_path: String,
    /// Choose the environment to deploy to from those configured in the kiwi.yml
    #[arg(long = "env")]
    pub environment: Option<String>,
    /// Name of the deployment as indexed in the kiwi.yml (defaults to the first one)
    #[arg(long = "deployment", short = 'd')]
    pub deployment: Option<String>,
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct CheckStatus {
    /// Path to the manifest
    #[arg(long = "manifest-file-path", short = 'm', default_value = DEFAULT_MANIFEST_PATH)]
    pub manifest_path: String,
    /// Choose the environment to query from those configured in the kiwi.yml
    #[arg(long = "env")]
    pub environment: Option<String>,
}

pub fn main() {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    let ctx = Context { logger };

    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            println!("{}", e);
            process::exit(1);
        }
    };

    match hiro_system_kit::nestable_block_on(handle_command(opts, &ctx)) {
        Err(e) => {
            error!(ctx.logger, "{e}");
            std::thread::sleep(std::time::Duration::from_millis(500));
            process::exit(1);
        }
        Ok(_) => {}
    }
}

async fn handle_command(opts: Opts, ctx: &Context) -> Result<(), String> {
    match opts.command {
        None => deploy::handle_deploy_command(&opts.deploy, ctx).await?,
        Some(Command::Deploy(cmd)) => deploy::handle_deploy_command(&cmd, ctx).await?,
        Some(Command::Status(cmd)) => deploy::handle_status_command(&cmd, ctx).await?,
    }
    Ok(())
}
