use super::{combine, split};
use crate::crypto::{PrivateKey, SIGNATURE_BASE64_SIZE, Signature};
use crate::utils::error::FrameError;

#[test]
fn test_split_recovers_combined_parts() {
    let key = PrivateKey::generate();
    let payload = br#"{"correlationData":"abc123","state":{"on":true}}"#;
    let sig = key.sign(payload);

    let frame = combine(&sig, payload);
    assert_eq!(frame[SIGNATURE_BASE64_SIZE], b'.');

    let (body, parsed) = split(&frame).unwrap();
    assert_eq!(body, payload);
    assert_eq!(parsed, sig);
}

#[test]
fn test_first_separator_is_authoritative() {
    let sig = Signature::from_bytes([9; 64]);
    let payload = b"1.5 degrees. then.more";

    let frame = combine(&sig, payload);
    let (body, parsed) = split(&frame).unwrap();
    assert_eq!(body, payload);
    assert_eq!(parsed, sig);
}

#[test]
fn test_empty_payload() {
    let sig = Signature::from_bytes([1; 64]);
    let frame = combine(&sig, b"");
    let (body, _) = split(&frame).unwrap();
    assert!(body.is_empty());
}

#[test]
fn test_missing_separator() {
    assert!(matches!(
        split(b"no separator here"),
        Err(FrameError::MissingSeparator)
    ));
    assert!(matches!(split(b""), Err(FrameError::MissingSeparator)));
}

#[test]
fn test_wrong_prefix_width() {
    match split(b"c2ln.{}") {
        Err(FrameError::InvalidSignatureLength { expected, received }) => {
            assert_eq!(expected, SIGNATURE_BASE64_SIZE);
            assert_eq!(received, 4);
        }
        other => panic!("expected InvalidSignatureLength, got {:?}", other),
    }
}

#[test]
fn test_undecodable_prefix() {
    let mut frame = vec![b'*'; SIGNATURE_BASE64_SIZE];
    frame.extend_from_slice(b".{}");
    assert!(matches!(split(&frame), Err(FrameError::Signature(_))));
}
