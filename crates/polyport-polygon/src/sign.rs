//! Polygon request signing
//!
//! Every API call carries `time`, `apiKey`, the method parameters, and an
//! `apiSig`. The signature is a 6-char random hex prefix followed by
//! `sha512(prefix + "/" + method + "?" + sortedParams + "#" + secret)`, where
//! `sortedParams` joins `k=v` pairs ordered by key.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use sha2::{Digest, Sha512};

/// Build the string that gets hashed
fn signature_source(rand_prefix: &str, method: &str, params: &BTreeMap<String, String>) -> String {
    let sorted = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{rand_prefix}/{method}?{sorted}")
}

/// Compute `apiSig` for already-sorted parameters
pub fn api_sig(
    rand_prefix: &str,
    method: &str,
    params: &BTreeMap<String, String>,
    api_secret: &str,
) -> String {
    let source = format!(
        "{}#{api_secret}",
        signature_source(rand_prefix, method, params)
    );
    let digest = Sha512::digest(source.as_bytes());
    format!("{rand_prefix}{}", hex::encode(digest))
}

/// Sign a parameter set for `method`, returning the full parameter list to
/// send (caller params + `time` + `apiKey` + `apiSig`).
pub fn sign(
    method: &str,
    params: impl IntoIterator<Item = (String, String)>,
    api_key: &str,
    api_secret: &str,
) -> Vec<(String, String)> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut sorted: BTreeMap<String, String> = params.into_iter().collect();
    sorted.insert("time".to_string(), timestamp.to_string());
    sorted.insert("apiKey".to_string(), api_key.to_string());

    let rand_prefix: String = hex::encode(rand::thread_rng().gen::<[u8; 3]>());
    let signature = api_sig(&rand_prefix, method, &sorted, api_secret);

    let mut out: Vec<(String, String)> = sorted.into_iter().collect();
    out.push(("apiSig".to_string(), signature));
    out
}
