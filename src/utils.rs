use crate::error::AppError;
use crate::plivo_types::{wrap_xml, Response};

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{error, trace};

/// Prefix a bare US number with its country code.  Anything not made purely of ASCII digits
/// (`+1555...`, sip uris) is passed through.
pub fn normalize_number(number: &str) -> String {
    if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
        format!("1{number}")
    } else {
        number.to_string()
    }
}

/// Read request parameters from both the query string and a form-encoded body.  Plivo sends
/// webhook parameters in the query for GET callbacks and in the body for POST ones; when both
/// carry the same key the query string wins.
pub fn request_params<T: DeserializeOwned>(query: Option<&str>, body: &str) -> Result<T, AppError> {
    // Bodies that are not form-encoded are ignored.
    let mut merged: BTreeMap<String, String> = serde_urlencoded::from_str(body).unwrap_or_default();
    if let Some(query) = query {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).map_err(|e| {
            error!(error=%e, "failed to parse query string");
            AppError::Request("malformed query string")
        })?;
        merged.extend(pairs);
    }
    let encoded =
        serde_urlencoded::to_string(&merged).map_err(|_| AppError::Request("re-encoding"))?;
    serde_urlencoded::from_str::<T>(&encoded).map_err(|e| {
        error!(error=%e, "failed to deserialize request parameters");
        AppError::Request("unexpected parameters")
    })
}

/// Serialize a markup document and wrap it in a `text/xml` response.
pub fn xml_response(response: Response) -> impl IntoResponse {
    let xml = wrap_xml(xmlserde::xml_serialize(response));
    trace!("xml: '{}'", xml);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/xml"));
    (StatusCode::OK, headers, xml)
}
