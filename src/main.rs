use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use mc_mod_resolver::core::http::build_http_client;
use mc_mod_resolver::{
    HttpManifestSource, ReleaseCatalog, ResolveError, ResolveResult, Resolver, ResolverConfig,
    UploadTarget,
};

#[derive(Parser)]
#[command(
    name = "mc-mod-resolver",
    version,
    about = "Detect a mod jar's loaders and resolve its supported Minecraft versions"
)]
struct Cli {
    /// Config file (default: <config dir>/mc-mod-resolver/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also look up CurseForge game version ids
    #[arg(long)]
    curseforge_ids: bool,
    /// Mod jar to inspect
    jar: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mc_mod_resolver=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("[{}] {}", e.kind().as_str(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ResolveResult<ExitCode> {
    let config = ResolverConfig::load_or_default(cli.config.as_deref())?;
    let client = build_http_client(&config.user_agent)?;

    let manifest = HttpManifestSource::new(client.clone(), &config.catalog.manifest_url);
    let catalog = ReleaseCatalog::new(Arc::new(manifest), config.catalog.refresh_policy());
    let resolver = Resolver::new(catalog);

    let bytes = tokio::fs::read(&cli.jar)
        .await
        .map_err(|source| ResolveError::Io {
            path: cli.jar.clone(),
            source,
        })?;
    let resolved = resolver.process(bytes).await?;
    if resolved.metadata.is_unrecognised() {
        error!("{} is not a fabric, quilt, forge or neoforge mod", cli.jar.display());
        return Ok(ExitCode::from(2));
    }

    let mut output = serde_json::json!({
        "build": resolved.build_meta(),
        "sha512": resolved.sha512,
    });

    if cli.curseforge_ids {
        let target = UploadTarget::from_config(
            client,
            &config.curseforge,
            config.target_user_agent(&config.curseforge),
        )?;
        if target.is_enabled() {
            let ids = resolver.platform_ids(&target, &resolved).await?;
            output["curseforge_ids"] = serde_json::json!(ids);
        } else {
            warn!("--curseforge-ids given but no CurseForge endpoint/token is configured");
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}
