//! `gog auth remote-token`: mint one access token from a remote endpoint.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use gog_core::RemoteTokenSource;
use serde::Serialize;

use crate::context::CommandContext;
use crate::error::CommandError;

/// Arguments for `gog auth remote-token`.
#[derive(Debug, Clone, Args)]
pub struct RemoteTokenArgs {
    /// Token endpoint URL
    #[arg(long, env = "GOG_REMOTE_TOKEN_ENDPOINT")]
    pub endpoint: String,

    /// Identity to mint a token for
    #[arg(long)]
    pub email: String,

    /// Scope to request (repeatable)
    #[arg(long = "scope")]
    pub scopes: Vec<String>,

    /// Bearer credential for the endpoint itself
    #[arg(long, env = "GOG_REMOTE_TOKEN_AUTH", hide_env_values = true, default_value = "")]
    pub auth: String,
}

#[derive(Debug, Serialize)]
struct TokenOutput<'a> {
    access_token: &'a str,
    expiry: Option<DateTime<Utc>>,
}

impl RemoteTokenArgs {
    /// The token source these arguments describe.
    pub fn source(&self) -> RemoteTokenSource {
        RemoteTokenSource::new(&self.endpoint, &self.email, self.scopes.clone())
            .with_auth(self.auth.as_str())
    }

    pub async fn run(&self, ctx: &mut CommandContext) -> Result<(), CommandError> {
        let token = self.source().fetch().await?;

        if ctx.mode.is_json() {
            return ctx.write_json(&TokenOutput {
                access_token: token.access_token.expose(),
                expiry: token.expiry,
            });
        }

        let Some(ui) = ctx.ui.as_mut() else {
            return Ok(());
        };
        let expiry = token
            .expiry
            .map(|e| e.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        writeln!(ui.out(), "access_token\t{}", token.access_token.expose())?;
        writeln!(ui.out(), "expiry\t{}", expiry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OutputMode;
    use crate::context::testing::capture_context;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method},
    };

    fn args(endpoint: String, auth: &str) -> RemoteTokenArgs {
        RemoteTokenArgs {
            endpoint,
            email: "user@example.com".to_string(),
            scopes: vec!["scope1".to_string(), "scope2".to_string()],
            auth: auth.to_string(),
        }
    }

    async fn token_server() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "email": "user@example.com",
                "scopes": ["scope1", "scope2"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-123",
                "expiry": "2025-01-01T00:00:00Z"
            })))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_text_output() {
        let mock_server = token_server().await;
        let (mut ctx, captured) = capture_context(OutputMode::Text, &[]);

        args(mock_server.uri(), "test-token").run(&mut ctx).await.unwrap();

        assert_eq!(
            captured.out.contents(),
            "access_token\taccess-123\nexpiry\t2025-01-01T00:00:00Z\n"
        );
    }

    #[tokio::test]
    async fn test_json_output() {
        let mock_server = token_server().await;
        let (mut ctx, captured) = capture_context(OutputMode::Json, &[]);

        args(mock_server.uri(), "test-token").run(&mut ctx).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&captured.stdout.contents()).unwrap();
        assert_eq!(value["access_token"], "access-123");
        assert_eq!(value["expiry"], "2025-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_server_error_exits_with_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&mock_server)
            .await;
        let (mut ctx, captured) = capture_context(OutputMode::Text, &[]);

        let err = args(mock_server.uri(), "").run(&mut ctx).await.unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("500"));
        assert!(captured.out.contents().is_empty());
    }
}
