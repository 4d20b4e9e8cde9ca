//! Bearer-token acquisition for the Google APIs.
//!
//! Resolution order: explicit token from configuration, then the
//! `GOOGLE_OAUTH_ACCESS_TOKEN` environment variable, then asking the local
//! `gcloud` installation. The token is resolved once per run and reused for
//! every call.

use crate::error::{Error, Result};
use std::env;
use tokio::process::Command;
use tracing::debug;

pub async fn resolve_access_token(explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit {
        debug!("Using explicitly provided OAuth token");
        return Ok(token.to_string());
    }

    if let Ok(token) = env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
        if !token.trim().is_empty() {
            debug!("Using OAuth token from GOOGLE_OAUTH_ACCESS_TOKEN");
            return Ok(token.trim().to_string());
        }
    }

    gcloud_access_token().await
}

/// `gcloud auth print-access-token`, the application-default fallback.
async fn gcloud_access_token() -> Result<String> {
    debug!("Requesting access token from gcloud");

    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| {
            Error::Auth(format!(
                "Could not run gcloud to obtain an access token: {e}. \
                 Provide a token via --oauth-token or GOOGLE_OAUTH_ACCESS_TOKEN."
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Auth(format!(
            "gcloud auth print-access-token failed: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth(
            "gcloud returned an empty access token".to_string(),
        ));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_token_wins() {
        let token = resolve_access_token(Some("ya29.explicit")).await.unwrap();
        assert_eq!(token, "ya29.explicit");
    }
}
