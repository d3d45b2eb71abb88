use anyhow::anyhow;
use clap::{Parser, Subcommand};
use log::{error, info};
use mlplatform_ingress::k8s::apply::apply_declarations;
use mlplatform_ingress::route::build;
use mlplatform_ingress::{config, render, MANAGER};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(version, about = "Publishes ML platform services behind Traefik path prefixes", long_about = None)]
struct CliArgs {
    #[arg(short, long, default_value = "/etc/mlplatform/ingress.yaml")]
    config_file: String,

    #[arg(long, default_value_t = log::LevelFilter::Info)]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Traefik objects as YAML without contacting the cluster
    Render,
    /// Server-side apply the Traefik objects to the current cluster
    Apply {
        #[arg(long, default_value = MANAGER)]
        field_manager: String,
    },
}

fn main() {
    let cli_args = CliArgs::parse();
    env_logger::builder()
        .filter_level(cli_args.log_level)
        .init();

    if let Err(e) = run(cli_args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<(), anyhow::Error> {
    let config = config::load(&args.config_file)?;

    match args.command {
        Command::Render => {
            let bundles: Vec<_> = config
                .offline_specs()?
                .iter()
                .map(|(name, spec)| build(name, spec))
                .collect();
            print!("{}", render::render(&bundles)?);
            Ok(())
        }
        Command::Apply { field_manager } => {
            let rt = Runtime::new().map_err(|e| anyhow!("Failed to create runtime {}", e))?;
            rt.block_on(apply(config, &field_manager))
        }
    }
}

async fn apply(config: config::Config, field_manager: &str) -> Result<(), anyhow::Error> {
    let client = kube::Client::try_default()
        .await
        .map_err(|e| anyhow!("unable to create Kubernetes client: {}", e))?;
    let applied = apply_declarations(config.declarations(), client, field_manager).await?;
    info!("Applied {} objects", applied);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_apply_with_defaults() {
        let args = CliArgs::try_parse_from(["mlplatform-ingress", "apply"]).unwrap();
        assert_eq!(args.config_file, "/etc/mlplatform/ingress.yaml");
        assert_eq!(args.log_level, log::LevelFilter::Info);
        assert!(matches!(
            args.command,
            Command::Apply { ref field_manager } if field_manager == MANAGER
        ));
    }

    #[test]
    fn parses_render_with_config_file() {
        let args = CliArgs::try_parse_from([
            "mlplatform-ingress",
            "-c",
            "deploy/ingress.yaml",
            "--log-level",
            "debug",
            "render",
        ])
        .unwrap();
        assert_eq!(args.config_file, "deploy/ingress.yaml");
        assert_eq!(args.log_level, log::LevelFilter::Debug);
        assert!(matches!(args.command, Command::Render));
    }

    #[test]
    fn renders_bundled_deployment_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../deploy/ingress.yaml");
        let config = config::load(path).unwrap();
        let bundles: Vec<_> = config
            .offline_specs()
            .unwrap()
            .iter()
            .map(|(name, spec)| build(name, spec))
            .collect();
        let out = render::render(&bundles).unwrap();
        assert!(out.contains("PathPrefix(`/mlflow`)"));
    }
}
