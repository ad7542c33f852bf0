use serde::Serialize;

use crate::msx_api::client::MsxClient;
use crate::msx_api::codec;
use crate::msx_api::envelope;
use crate::msx_api::types::{CommandOutput, MsxError};

/// Request payload for remote command execution
#[derive(Debug, Serialize)]
struct CommandRequest<'a> {
    command: &'a str,
    args: Vec<String>,
}

/// Remote command execution, borrowed from a connected [`MsxClient`]
#[derive(Debug, Clone, Copy)]
pub struct Commands<'a> {
    client: &'a MsxClient,
}

impl<'a> Commands<'a> {
    pub(crate) fn new(client: &'a MsxClient) -> Self {
        Self { client }
    }

    /// Run a platform command and collect its output
    ///
    /// # Arguments
    ///
    /// * `command` - Name of the platform tool, e.g. `metastore`
    /// * `args` - Arguments passed to the tool
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msx_sdk::{Identity, MsxClient};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MsxClient::new(Identity::from_credentials("a@b.com", "secret"))?;
    /// let output = client.commands().run("metastore", ["list", "-b", "default"])?;
    /// print!("{}", output.stdout);
    /// # Ok(())
    /// # }
    /// ```
    pub fn run<I, S>(&self, command: &str, args: I) -> Result<CommandOutput, MsxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let payload = CommandRequest {
            command,
            args: args.into_iter().map(Into::into).collect(),
        };

        let url = self.client.url("/commands");
        let headers = self
            .client
            .with_org_header(self.client.authenticated_headers(true, true)?)?;
        let body = codec::encode(&payload)?;

        tracing::debug!("Running command {} {:?} via {}", command, payload.args, url);

        let request = self.client.http().post(&url).headers(headers).body(body);
        let raw = self.client.execute(request, "command")?;
        envelope::classify(&raw, Some("command"))
    }
}
