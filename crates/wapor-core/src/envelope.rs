//! Response envelope handling
//!
//! Every API response is wrapped as `{"message": "OK", "response": ...}`.
//! Anything other than `OK` is an application-level rejection.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, WaporError};
use crate::ports::{ApiRequest, Transport};

const OK: &str = "OK";

/// Take the `response` payload out of an envelope
pub fn unwrap(url: &str, body: Value) -> Result<Value> {
    let Value::Object(mut map) = body else {
        return Err(WaporError::malformed(url, "response is not a JSON object"));
    };

    let message = match map.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => return Err(WaporError::malformed(url, "missing \"message\" field")),
    };

    if message != OK {
        return Err(WaporError::Api {
            url: url.to_string(),
            message,
        });
    }

    Ok(map.remove("response").unwrap_or(Value::Null))
}

/// Unwrap an envelope and decode its payload
pub fn decode<T: DeserializeOwned>(url: &str, body: Value) -> Result<T> {
    let payload = unwrap(url, body)?;
    serde_json::from_value(payload).map_err(|e| WaporError::malformed(url, e.to_string()))
}

/// Send a request and decode the payload of its envelope
pub fn fetch<T, R>(transport: &R, request: &ApiRequest) -> Result<T>
where
    T: DeserializeOwned,
    R: Transport + ?Sized,
{
    let body = transport.send(request)?;
    decode(&request.url, body)
}

/// Send a request and return the raw payload of its envelope
pub fn fetch_value<R: Transport + ?Sized>(transport: &R, request: &ApiRequest) -> Result<Value> {
    let body = transport.send(request)?;
    unwrap(&request.url, body)
}
