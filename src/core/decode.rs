//! Decoding `op` output into records.
//!
//! Every record that can act on itself implements [`Attach`]; the decoder
//! attaches the issuing client to each one before returning it, list
//! elements included.

use std::fmt;

use serde::de::DeserializeOwned;
use tracing::{error, trace};

use crate::core::client::Client;
use crate::error::{DecodeError, Error, Result};

/// A record that keeps a handle to the client it came from.
pub trait Attach {
    fn attach(&mut self, client: &Client);
}

/// Non-serialized back-reference from a record to its client.
///
/// Compares equal to any other back-reference so records compare by their
/// visible fields only.
#[derive(Clone, Default)]
pub struct ClientRef(Option<Client>);

impl ClientRef {
    pub fn set(&mut self, client: &Client) {
        self.0 = Some(client.clone());
    }

    pub fn get(&self) -> Option<&Client> {
        self.0.as_ref()
    }

    /// The client, or `Error::Detached` for records built locally.
    pub fn require(&self) -> Result<&Client> {
        self.0.as_ref().ok_or(Error::Detached)
    }
}

impl PartialEq for ClientRef {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "attached" } else { "detached" })
    }
}

/// Parse output without attaching anything.
///
/// # Errors
///
/// Returns `DecodeError::Json` on malformed output or a shape mismatch.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    trace!(bytes = bytes.len(), "decoding op output");
    serde_json::from_slice(bytes).map_err(|e| {
        error!(error = %e, "failed to decode op response");
        DecodeError::Json(e).into()
    })
}

/// Parse a single record and attach `client` to it.
pub fn decode_one<T>(client: &Client, bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned + Attach,
{
    let mut record: T = decode(bytes)?;
    record.attach(client);
    Ok(record)
}

/// Parse a list of records and attach `client` to every element.
pub fn decode_list<T>(client: &Client, bytes: &[u8]) -> Result<Vec<T>>
where
    T: DeserializeOwned + Attach,
{
    // `op` prints nothing at all for some empty listings
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let mut records: Vec<T> = decode(bytes)?;
    for record in &mut records {
        record.attach(client);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Thing {
        id: String,
        #[serde(skip)]
        client: ClientRef,
    }

    impl Attach for Thing {
        fn attach(&mut self, client: &Client) {
            self.client.set(client);
        }
    }

    fn client() -> Client {
        Client::builder().binary("/nonexistent/op").build().unwrap()
    }

    #[test]
    fn test_every_list_element_attached() {
        let client = client();
        let json = br#"[{"id":"a"},{"id":"b"},{"id":"c"}]"#;
        let things: Vec<Thing> = decode_list(&client, json).unwrap();
        assert_eq!(things.len(), 3);
        for thing in &things {
            assert!(thing.client.get().unwrap().ptr_eq(&client));
        }
        assert_eq!(things[2].id, "c");
    }

    #[test]
    fn test_single_record_attached() {
        let client = client();
        let thing: Thing = decode_one(&client, br#"{"id":"a"}"#).unwrap();
        assert!(thing.client.require().is_ok());
    }

    #[test]
    fn test_malformed_output_is_decode_error() {
        let client = client();
        let err = decode_list::<Thing>(&client, b"not json").unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Json(_))));

        let err = decode_one::<Thing>(&client, br#"[{"id":"a"}]"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_empty_output_is_empty_list() {
        let things: Vec<Thing> = decode_list(&client(), b"\n").unwrap();
        assert!(things.is_empty());
    }

    #[test]
    fn test_detached_record() {
        let r = ClientRef::default();
        assert!(matches!(r.require(), Err(Error::Detached)));
    }
}
