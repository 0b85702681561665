use crate::config::{ConfigError, Settings};
use crate::credentials::{load_credentials, Credential};
use crate::nitro::{client::NitroClient, RecordApi};
use clap::{CommandFactory, Parser};
use opts::Opts;
use std::{env, process};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
mod config;
mod credentials;
mod nitro;
mod opts;
mod record;
use die_exit::die;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Reads the configuration and the token file. Anything failing here ends the run
/// before a single request is sent.
fn prepare(opts: &Opts) -> anyhow::Result<(Settings, Vec<Credential>)> {
    let conf = config::load_config(opts)?;
    let settings = config::settings(opts, &conf)?;
    let credentials = load_credentials(&settings.token_file)
        .map_err(|err| ConfigError::TokenFile(settings.token_file.clone(), err))?;
    Ok((settings, credentials))
}

async fn run(api: &dyn RecordApi, credentials: &[Credential], settings: &Settings) -> Summary {
    let mut summary = Summary::default();
    let resource = settings.descriptor.resource_type();

    for credential in credentials {
        info!(
            address = %credential.address,
            "{:?} {} on {}", settings.operation, resource, credential.address
        );
        match api
            .apply(credential, &settings.descriptor, settings.operation)
            .await
        {
            Ok(outcome) => {
                info!(
                    address = %credential.address,
                    "Response from {}: {}", credential.address, outcome
                );
                summary.succeeded += 1;
            }
            Err(err) => {
                error!(
                    address = %credential.address,
                    "Error calling API for {}: {}", credential.address, err
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        "Done with {} targets, {} succeeded and {} failed",
        credentials.len(),
        summary.succeeded,
        summary.failed
    );
    summary
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init()
        .ok();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if env::args_os().len() <= 1 {
        Opts::command().print_long_help().ok();
        process::exit(1);
    }

    init_tracing();
    let opts = Opts::parse();
    let (settings, credentials) = match prepare(&opts) {
        Ok(prepared) => prepared,
        Err(err) => die!("{:#}", err),
    };
    if credentials.is_empty() {
        warn!(
            "No usable entries in {}, nothing to do",
            settings.token_file.display()
        );
    }

    let api = NitroClient::new(settings.scheme);
    run(&api, &credentials, &settings).await;
}
