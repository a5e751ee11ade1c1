use std::path::Path;

use kiwi_core::codec::transaction::{transaction_cost, TransactionType};
use kiwi_core::codec::{format_transaction_for_display, value_to_abi_constructor_args, ContractArtifact};
use kiwi_core::manifest::{EnvironmentConfig, KiwiManifest};
use kiwi_core::signers::secret_key_to_address;
use kiwi_core::{Deployer, EvmResult, EvmRpc};

use super::{CheckStatus, Context, DeployContract};

fn report_to_string<T>(result: EvmResult<T>) -> Result<T, String> {
    result.map_err(|e| format!("{:?}", e))
}

fn load_manifest(manifest_path: &str, ctx: &Context) -> Result<KiwiManifest, String> {
    let manifest = report_to_string(KiwiManifest::from_path(Path::new(manifest_path)))?;
    manifest.load_dotenv();
    info!(ctx.logger, "Using manifest {} ({})", manifest_path, manifest.name);
    Ok(manifest)
}

/// Prints block number and connectivity, then the sender's nonce
async fn print_status(
    rpc: &EvmRpc,
    env_config: &EnvironmentConfig,
    ctx: &Context,
) -> Result<(), String> {
    let block_number = report_to_string(rpc.get_block_number().await)?;
    let connected = rpc.is_connected().await;
    println!("{} {}", block_number, connected);

    let sender = match report_to_string(env_config.expected_sender())? {
        Some(sender) => sender,
        None => {
            let secret_key = report_to_string(env_config.secret_source().resolve())?;
            report_to_string(secret_key_to_address(&secret_key))?
        }
    };
    let nonce = report_to_string(rpc.get_nonce(&sender).await)?;
    println!("{}", nonce);
    info!(ctx.logger, "Sender {} has nonce {}", sender, nonce);
    Ok(())
}

pub async fn handle_status_command(cmd: &CheckStatus, ctx: &Context) -> Result<(), String> {
    let manifest = load_manifest(&cmd.manifest_path, ctx)?;
    let (env_name, env_config) =
        report_to_string(manifest.select_environment(cmd.environment.as_deref()))?;
    info!(ctx.logger, "Querying environment '{}' at {}", env_name, env_config.rpc_api_url);

    let rpc = report_to_string(EvmRpc::new(&env_config.rpc_api_url))?;
    print_status(&rpc, env_config, ctx).await
}

pub async fn handle_deploy_command(cmd: &DeployContract, ctx: &Context) -> Result<(), String> {
    let manifest = load_manifest(&cmd.manifest_path, ctx)?;
    let (env_name, env_config) =
        report_to_string(manifest.select_environment(cmd.environment.as_deref()))?;
    let (deployment_name, deployment) =
        report_to_string(manifest.get_deployment(cmd.deployment.as_deref()))?;
    info!(
        ctx.logger,
        "Deploying '{}' to environment '{}' at {}",
        deployment_name,
        env_name,
        env_config.rpc_api_url
    );

    let rpc = report_to_string(EvmRpc::new(&env_config.rpc_api_url))?;
    print_status(&rpc, env_config, ctx).await?;

    let artifact =
        report_to_string(ContractArtifact::from_file(&manifest.artifact_path(deployment)))?;
    let constructor_args = report_to_string(value_to_abi_constructor_args(
        &deployment.constructor_args,
        artifact.abi.constructor.as_ref(),
    ))?;

    if env_config.tx_type == TransactionType::Eip2930 {
        info!(
            ctx.logger,
            "{}",
            yellow!("Unsupported tx type EIP-2930 was used. Defaulting to EIP-1559 tx")
        );
    }
    let settings = report_to_string(env_config.transaction_settings())?;
    let deployer = report_to_string(Deployer::new(rpc, env_config.secret_source()))?
        .with_settings(settings);

    if let Some(expected) = report_to_string(env_config.expected_sender())? {
        if expected != deployer.sender {
            return Err(format!(
                "secret key in {} belongs to {}, but the manifest expects sender {}",
                env_config.secret_key_env, deployer.sender, expected
            ));
        }
    }

    let tx = report_to_string(deployer.prepare_deployment(&artifact, &constructor_args).await)?;
    let (_, cost) = report_to_string(transaction_cost(&tx))?;
    info!(
        ctx.logger,
        "Deployment transaction: {}",
        format_transaction_for_display(&tx)
    );
    info!(ctx.logger, "Maximum cost: {} (native units)", cost);

    let (contract, receipt) =
        report_to_string(deployer.submit_deployment(&artifact, tx).await).map_err(|e| {
            format!("{} {}", red!("deployment of {} failed", artifact.name), e)
        })?;
    info!(
        ctx.logger,
        "{}",
        green!(
            "{} deployed in block {} (tx {}, gas used {})",
            contract,
            receipt.block_number().unwrap_or_default(),
            receipt.tx_hash(),
            receipt.gas_used()
        )
    );
    println!("{}", contract.address.to_checksum(None));
    Ok(())
}
