use super::{CorrelationToken, DeviceRequest, DeviceResponse, ResponseStatus, decode, encode};
use crate::utils::error::CodecError;
use serde_json::{Map, json};

fn params() -> Map<String, serde_json::Value> {
    let mut params = Map::new();
    params.insert("on".to_string(), json!(true));
    params.insert("openPercent".to_string(), json!(80));
    params
}

#[test]
fn test_generated_tokens_are_unique() {
    let a = CorrelationToken::generate();
    let b = CorrelationToken::generate();
    assert_ne!(a, b);
    assert!(!a.as_str().is_empty());
}

#[test]
fn test_request_wire_shape() {
    let request = DeviceRequest::new("onOff", params()).with_correlation("abc123");
    let bytes = encode(&request).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(value["correlationData"], "abc123");
    assert_eq!(value["command"], "onOff");
    assert_eq!(value["params"]["openPercent"], 80);
}

#[test]
fn test_decode_response() {
    let bytes = br#"{"correlationData":"abc123","status":"success","state":{"on":true}}"#;
    let response: DeviceResponse = decode(bytes).unwrap();

    assert_eq!(response.correlation_data, CorrelationToken::from("abc123"));
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.error, None);
    assert_eq!(response.state["on"], json!(true));
}

#[test]
fn test_decode_error_response_without_state() {
    let bytes = br#"{"correlationData":"x","status":"error","error":"jammed"}"#;
    let response: DeviceResponse = decode(bytes).unwrap();

    assert_eq!(response.status, ResponseStatus::Error);
    assert_eq!(response.error.as_deref(), Some("jammed"));
    assert!(response.state.is_empty());
}

#[test]
fn test_decode_malformed_bytes() {
    let result = decode::<DeviceResponse>(b"{not json");
    assert!(matches!(result, Err(CodecError::Decode(_))));

    let result = decode::<DeviceResponse>(br#"{"status":"success"}"#);
    assert!(matches!(result, Err(CodecError::Decode(_))));
}

#[test]
fn test_response_constructors_copy_correlation() {
    let request = DeviceRequest::new("onOff", params());

    let ok = DeviceResponse::success(&request, params());
    assert_eq!(ok.correlation_data, request.correlation_data);
    assert_eq!(ok.status, ResponseStatus::Success);

    let failed = DeviceResponse::failure(&request, "unsupported");
    assert_eq!(failed.correlation_data, request.correlation_data);
    assert_eq!(failed.error.as_deref(), Some("unsupported"));
}
