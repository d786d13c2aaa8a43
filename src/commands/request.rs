use anyhow::{Context, Result};
use log::info;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use crate::{
    http::{ApiClient, RequestOptions},
    runtime::Runtime,
};

/// Field name used for uploads when none is given.
pub const DEFAULT_UPLOAD_FIELD: &str = "file";

fn print_json<W: Write>(out: &mut W, data: &Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(data).context("Failed to format response")?;
    writeln!(out, "{}", pretty).context("Failed to write output")?;
    Ok(())
}

fn parse_body(data: Option<&str>) -> Result<Option<Value>> {
    data.map(|raw| serde_json::from_str(raw).context("Request body is not valid JSON"))
        .transpose()
}

#[tracing::instrument(skip(client, opts, out))]
pub async fn get<W: Write>(
    client: &ApiClient,
    url: &str,
    opts: RequestOptions,
    out: &mut W,
) -> Result<()> {
    let data: Value = client.get(url, opts).await?;
    print_json(out, &data)
}

#[tracing::instrument(skip(client, opts, out))]
pub async fn post<W: Write>(
    client: &ApiClient,
    url: &str,
    data: Option<&str>,
    opts: RequestOptions,
    out: &mut W,
) -> Result<()> {
    let body = parse_body(data)?;
    let data: Value = client.post(url, body.as_ref(), opts).await?;
    print_json(out, &data)
}

#[tracing::instrument(skip(client, opts, out))]
pub async fn put<W: Write>(
    client: &ApiClient,
    url: &str,
    data: Option<&str>,
    opts: RequestOptions,
    out: &mut W,
) -> Result<()> {
    let body = parse_body(data)?;
    let data: Value = client.put(url, body.as_ref(), opts).await?;
    print_json(out, &data)
}

#[tracing::instrument(skip(client, opts, out))]
pub async fn delete<W: Write>(
    client: &ApiClient,
    url: &str,
    opts: RequestOptions,
    out: &mut W,
) -> Result<()> {
    let data: Value = client.delete(url, opts).await?;
    print_json(out, &data)
}

#[tracing::instrument(skip(client, runtime, opts, out))]
pub async fn upload<R: Runtime, W: Write>(
    client: &ApiClient,
    runtime: &R,
    url: &str,
    file: &Path,
    field: &str,
    opts: RequestOptions,
    out: &mut W,
) -> Result<()> {
    let bytes = runtime.read(file)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{:?} does not name a file", file))?;

    info!("Uploading {} ({} bytes) as field {:?}", file_name, bytes.len(), field);
    let form = Form::new().part(field.to_string(), Part::bytes(bytes).file_name(file_name));

    let data: Value = client.upload(url, form, opts).await?;
    print_json(out, &data)
}

#[tracing::instrument(skip(client, opts, out))]
pub async fn download<W: Write>(
    client: &ApiClient,
    url: &str,
    opts: RequestOptions,
    out: &mut W,
) -> Result<()> {
    let blob = client.download(url, opts).await?;
    writeln!(out, "{}", blob.saved_to.display()).context("Failed to write output")?;
    Ok(())
}
