use anyhow::{anyhow, Context, Result};
use serde::{Serialize, Serializer};
use serde_json::Value;

use courier_core::{ApiClient, ApiError, TOKEN_KEY};

#[derive(Debug, Clone, Copy)]
pub enum Verb {
    Post,
    Put,
    Patch,
}

/// Form fields in command-line order, encoded as a flat map
#[derive(Debug, Default, PartialEq)]
pub struct FormFields(pub Vec<(String, String)>);

impl Serialize for FormFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(key, value)| (key, value)))
    }
}

/// Split `key=value` arguments into form fields. A bare `key` has an empty value.
pub fn parse_fields(fields: &[String]) -> Result<FormFields> {
    fields
        .iter()
        .map(|field| {
            let (key, value) = field.split_once('=').unwrap_or((field.as_str(), ""));
            if key.is_empty() {
                return Err(anyhow!("Invalid field '{}': expected KEY=VALUE", field));
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect::<Result<Vec<_>>>()
        .map(FormFields)
}

pub async fn get(client: &ApiClient, path: &str) -> Result<()> {
    print_outcome(client.get(path).await)
}

pub async fn delete(client: &ApiClient, path: &str) -> Result<()> {
    print_outcome(client.delete(path).await)
}

pub async fn send(client: &ApiClient, verb: Verb, path: &str, fields: &[String]) -> Result<()> {
    let form = parse_fields(fields)?;
    let outcome: Result<Option<Value>, ApiError> = match verb {
        Verb::Post => client.post(path, &form).await,
        Verb::Put => client.put(path, &form).await,
        Verb::Patch => client.patch(path, &form).await,
    };
    print_outcome(outcome)
}

pub fn login(client: &ApiClient, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Token: ").context("Failed to read token")?,
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(anyhow!("Token must not be empty"));
    }
    client
        .store()
        .set_item(TOKEN_KEY, token)
        .context("Failed to store token")?;
    eprintln!("Token stored");
    Ok(())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    client
        .store()
        .remove_item(TOKEN_KEY)
        .context("Failed to remove token")?;
    eprintln!("Token removed");
    Ok(())
}

fn print_outcome(outcome: Result<Option<Value>, ApiError>) -> Result<()> {
    match outcome {
        Ok(Some(payload)) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Ok(None) => {
            eprintln!("offline: no response");
            Ok(())
        }
        Err(ApiError::Forbidden(response)) => Err(anyhow!(
            "{} (stored token was removed, log in again)",
            response
        )),
        Err(e) => Err(e.into()),
    }
}
