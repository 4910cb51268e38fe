// Copyright (c) Microsoft. All rights reserved.

//! Arguments and helpers shared by every subcommand.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use iotc_client_async::{AzureCliCredential, Client, Configuration, StaticToken, TokenCredential};
use iotc_common::{ApiVersion, DeviceGroup, JobRun, OperationResult, ScheduledJob};

use crate::settings::Settings;

pub const DEFAULT_API_VERSION: ApiVersion = ApiVersion::V2022_07_31;

#[derive(clap::Args)]
pub struct CommonArgs {
    /// Id of the IoT Central application, i.e. the subdomain of its URL.
    #[arg(long, value_name = "APP_ID")]
    pub app_id: String,

    /// Authorization header value, e.g. an API token ("SharedAccessSignature sr=...")
    /// or "Bearer <token>". Without it, a token is requested from the Azure CLI.
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// DNS suffix of the IoT Central applications. Defaults to "azureiotcentral.com".
    #[arg(long, value_name = "SUFFIX")]
    pub central_dns_suffix: Option<String>,

    /// REST API version. Defaults to "2022-07-31".
    #[arg(long, value_name = "VERSION")]
    pub api_version: Option<ApiVersion>,

    /// Output format.
    #[arg(short, long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    #[arg(long, hide = true)]
    pub endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

impl CommonArgs {
    pub fn client(&self, settings: &Settings) -> Result<Client> {
        let credential: Arc<dyn TokenCredential> =
            match self.token.as_ref().or(settings.token.as_ref()) {
                Some(token) => Arc::new(StaticToken::new(token.clone())),
                None => Arc::new(AzureCliCredential::new()),
            };

        let api_version = self
            .api_version
            .or(settings.api_version)
            .unwrap_or(DEFAULT_API_VERSION);

        // An explicit endpoint is reached directly unless the settings file names a proxy.
        let proxy = match (&self.endpoint, &settings.https_proxy) {
            (Some(_), None) => None,
            (_, https_proxy) => http_common::get_proxy_uri(https_proxy.clone())
                .context("could not parse HTTPS proxy")?,
        };

        let mut config = Configuration::new(self.app_id.clone(), credential)
            .with_api_version(api_version)
            .with_proxy(proxy);

        if let Some(central_dns_suffix) = self
            .central_dns_suffix
            .as_ref()
            .or(settings.central_dns_suffix.as_ref())
        {
            config = config.with_base_domain(central_dns_suffix.clone());
        }
        if let Some(timeout) = settings.cloud_timeout_sec {
            config = config.with_timeout(Duration::from_secs(timeout));
        }
        if let Some(retries) = settings.cloud_retries {
            config = config.with_retry(retries);
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }

        log::debug!("{:?}", config);

        let client = Client::new(config).context("could not create IoT Central client")?;

        Ok(client)
    }
}

/// `--max-pages`, falling back to the settings file. 0 means no limit.
pub fn max_pages(arg: Option<u32>, settings: &Settings) -> u32 {
    arg.or(settings.max_pages).unwrap_or(0)
}

/// Parses a JSON argument given either inline or as the path of a JSON file.
pub fn process_json_arg(value: &str, argument_name: &str) -> Result<serde_json::Value> {
    let path = std::path::Path::new(value);

    if path.is_file() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read --{} file {}", argument_name, path.display()))?;

        return serde_json::from_str(&contents).with_context(|| {
            format!(
                "--{} file {} does not contain valid JSON",
                argument_name,
                path.display()
            )
        });
    }

    serde_json::from_str(value).map_err(|err| {
        anyhow!(
            "--{} is neither a path to an existing file nor valid JSON: {}",
            argument_name,
            err
        )
    })
}

/// "percentage" in any case selects a percentage. Anything else is a count.
pub fn is_percentage(value_type: Option<&str>) -> bool {
    value_type.map_or(false, |value_type| {
        value_type.eq_ignore_ascii_case("percentage")
    })
}

/// Resources that can be rendered as a table row.
pub trait Row {
    fn id(&self) -> &str;

    fn display_name(&self) -> Option<&str>;
}

impl Row for DeviceGroup {
    fn id(&self) -> &str {
        DeviceGroup::id(self)
    }

    fn display_name(&self) -> Option<&str> {
        DeviceGroup::display_name(self)
    }
}

impl Row for ScheduledJob {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

impl Row for JobRun {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

pub fn write_one<W, T>(out: &mut W, output: OutputFormat, item: &T) -> Result<()>
where
    W: Write,
    T: serde::Serialize + Row,
{
    match output {
        OutputFormat::Json => write_json(out, item),
        OutputFormat::Table => write_list(out, output, std::slice::from_ref(item)),
    }
}

pub fn write_list<W, T>(out: &mut W, output: OutputFormat, items: &[T]) -> Result<()>
where
    W: Write,
    T: serde::Serialize + Row,
{
    match output {
        OutputFormat::Json => write_json(out, items),
        OutputFormat::Table => {
            let rows: Vec<_> = items
                .iter()
                .map(|item| (item.id(), item.display_name().unwrap_or("")))
                .collect();

            out.write_all(table(&rows).as_bytes())
                .context("could not output to stdout")
        }
    }
}

pub fn write_result<W>(out: &mut W, output: OutputFormat, result: &OperationResult) -> Result<()>
where
    W: Write,
{
    match output {
        OutputFormat::Json => write_json(out, result),
        OutputFormat::Table => {
            writeln!(out, "{}", result.result).context("could not output to stdout")
        }
    }
}

fn write_json<W, T>(out: &mut W, value: &T) -> Result<()>
where
    W: Write,
    T: serde::Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut *out, value).context("could not output to stdout")?;
    writeln!(out).context("could not output to stdout")?;

    Ok(())
}

fn table(rows: &[(&str, &str)]) -> String {
    const ID_HEADER: &str = "ID";
    const NAME_HEADER: &str = "DISPLAY NAME";

    // Ids and names may be non-ASCII, so measure width in chars.
    let id_width = rows
        .iter()
        .map(|(id, _)| id.chars().count())
        .chain(std::iter::once(ID_HEADER.len()))
        .max()
        .unwrap_or_default();

    let mut table = format!("{:id_width$}  {}\n", ID_HEADER, NAME_HEADER);
    for (id, display_name) in rows {
        table.push_str(&format!("{:id_width$}  {}\n", id, display_name));
    }

    table
}
