//! Authenticated API calls
use anyhow::{bail, Context};
use clap::Args;

use teapos_core::Method;

use crate::state::AppState;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// API path, for example /menu
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// JSON request body
    #[arg(short = 'd', long)]
    pub data: Option<String>,
}

pub async fn run(state: &AppState, args: FetchArgs) -> anyhow::Result<()> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method {:?}", args.method))?;

    let mut request = state.storefront().request(method, &args.path)?;
    if let Some(data) = args.data {
        let body: serde_json::Value =
            serde_json::from_str(&data).context("--data must be valid JSON")?;
        request = request.json(&body)?;
    }

    let response = state.storefront().fetch(request).await?;
    let status = response.status();

    match response.json::<serde_json::Value>() {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", response.text()),
    }

    if !status.is_success() {
        bail!("request failed with status {}", status);
    }
    Ok(())
}
