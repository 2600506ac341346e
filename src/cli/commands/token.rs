use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;

/// Mint an access token in the provider's format for local testing of
/// admin-only routes.
pub fn mint(
    account: Uuid,
    email: Option<String>,
    hours: i64,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let security = &config().security;
    let claims = Claims::new(account, email, &security.jwt_audience, hours);
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Token minted",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
