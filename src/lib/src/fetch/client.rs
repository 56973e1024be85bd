//! # HTTP client for artifact downloads
//!

use std::time;

use reqwest::{Client, ClientBuilder};

use crate::constants;
use crate::error::MirrorError;

/// One shared client for the whole worker pool: keep-alive across requests,
/// 30 second deadline per GET. reqwest picks up `HTTP_PROXY`/`HTTPS_PROXY`
/// from the environment on its own.
pub fn new() -> Result<Client, MirrorError> {
    match builder()
        .timeout(time::Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => Ok(client),
        Err(reqwest_err) => Err(MirrorError::HTTP(reqwest_err)),
    }
}

fn builder() -> ClientBuilder {
    Client::builder().user_agent(constants::USER_AGENT)
}
