use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::nitro::Operation;
use crate::opts;
use crate::record::{build_descriptor, RecordDescriptor};

/// Used when neither the command line nor the configuration file names a token file.
pub const DEFAULT_TOKEN_FILE: &str = "nstoken.txt";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Record type is required, use --rrtype")]
    MissingRecordType,
    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(String),
    #[error("Unsupported action: {0}, expected ADD, DELETE or GET")]
    UnsupportedAction(String),
    #[error("Deleting a {0} record requires a non-empty {1}")]
    MissingLookupKey(&'static str, &'static str),
    #[error("Unable to read the configuration file {}: {}", .0.display(), .1)]
    Io(PathBuf, io::Error),
    #[error("Unable to parse the configuration file {}: {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Error reading tokens from {}: {}", .0.display(), .1)]
    TokenFile(PathBuf, io::Error),
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Optional defaults read from `config.toml`.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub token_file: Option<String>,
    #[serde(default)]
    pub scheme: Scheme,
    pub ttl: Option<u32>,
}

/// Everything a run needs, fixed before the first request goes out.
#[derive(Debug, Clone)]
pub struct Settings {
    pub operation: Operation,
    pub token_file: PathBuf,
    pub scheme: Scheme,
    pub descriptor: RecordDescriptor,
}

pub fn config_path(opts: &opts::Opts) -> PathBuf {
    return opts
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            ProjectDirs::from("", "", "nitro-dns")
                .map(|dir| dir.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
                .join("config.toml")
        });
}

/// Loads the configuration file. A missing file is only an error when it was asked for explicitly.
pub fn load_config(opts: &opts::Opts) -> Result<Config, ConfigError> {
    let path = config_path(opts);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound && opts.config.is_none() => {
            return Ok(Config::default())
        }
        Err(err) => return Err(ConfigError::Io(path, err)),
    };

    toml::from_str(&contents).map_err(|err| ConfigError::Parse(path, err))
}

pub fn settings(opts: &opts::Opts, conf: &Config) -> Result<Settings, ConfigError> {
    let keyword = opts
        .rrtype
        .as_deref()
        .filter(|keyword| !keyword.is_empty())
        .ok_or(ConfigError::MissingRecordType)?;
    let descriptor = build_descriptor(keyword, &opts.fields, conf.ttl.unwrap_or_default())?;

    if opts.action == Operation::Delete && descriptor.lookup_key.is_empty() {
        let resource = descriptor.resource_type();
        return Err(ConfigError::MissingLookupKey(
            resource.api_name(),
            resource.lookup_flag(),
        ));
    }

    let token_file = opts
        .token_file
        .clone()
        .or_else(|| conf.token_file.clone())
        .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());

    Ok(Settings {
        operation: opts.action,
        token_file: PathBuf::from(token_file),
        scheme: conf.scheme,
        descriptor,
    })
}
