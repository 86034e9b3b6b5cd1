use super::{Device, DeviceDirectory, DeviceId, DeviceResponder, DeviceTopics, InMemoryDirectory};
use crate::broker::Broker;
use crate::codec::{self, DeviceRequest, DeviceResponse, ResponseStatus};
use crate::crypto::PrivateKey;
use crate::envelope;
use crate::registry::CorrelationRegistry;
use crate::transport::{MemoryTransport, Transport};
use crate::utils::error::{DeviceIdError, KeyFormatError};
use serde_json::Map;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

#[test]
fn test_device_id_hex_round_trip() {
    let id: DeviceId = "5f3b1c2a9e8d7f6a5b4c3d2e".parse().unwrap();
    assert_eq!(id.to_string(), "5f3b1c2a9e8d7f6a5b4c3d2e");
    assert_eq!(id.as_bytes()[0], 0x5f);

    let random = DeviceId::random();
    assert_eq!(random.to_hex().len(), 24);
    assert_eq!(random.to_hex().parse::<DeviceId>().unwrap(), random);
}

#[test]
fn test_device_id_rejects_malformed() {
    assert!(matches!(
        "zz".parse::<DeviceId>(),
        Err(DeviceIdError::InvalidEncoding(_))
    ));
    assert!(matches!(
        "abcd".parse::<DeviceId>(),
        Err(DeviceIdError::InvalidLength { expected: 12, received: 2 })
    ));
}

#[test]
fn test_device_id_serde_as_string() {
    let id: DeviceId = "000102030405060708090a0b".parse().unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"000102030405060708090a0b\"");
    assert_eq!(serde_json::from_str::<DeviceId>(&json).unwrap(), id);
    assert!(serde_json::from_str::<DeviceId>("\"nothex\"").is_err());
}

#[test]
fn test_topics_for_device() {
    let id: DeviceId = "000102030405060708090a0b".parse().unwrap();
    let topics = DeviceTopics::for_device(&id);
    assert_eq!(topics.request, "000102030405060708090a0b/command/request");
    assert_eq!(topics.response, "000102030405060708090a0b/command/response");
}

#[test]
fn test_device_verifying_key() {
    let key = PrivateKey::generate();
    let device = Device::new(DeviceId::random(), key.public_key().to_base64());
    assert_eq!(device.verifying_key().unwrap(), key.public_key());

    let broken = Device::new(DeviceId::random(), "c2hvcnQ=");
    assert!(matches!(
        broken.verifying_key(),
        Err(KeyFormatError::InvalidLength { .. })
    ));
}

#[test]
fn test_in_memory_directory() {
    let device = Device::new(DeviceId::random(), "key");
    let directory: InMemoryDirectory = [device.clone()].into_iter().collect();

    assert_eq!(directory.lookup(&device.id), Some(device.clone()));
    assert_eq!(directory.lookup(&DeviceId::random()), None);

    let updated = Device::new(device.id, "rotated");
    assert_eq!(directory.insert(updated.clone()), Some(device.clone()));
    assert_eq!(directory.lookup(&device.id), Some(updated));

    assert!(directory.remove(&device.id).is_some());
    assert_eq!(directory.lookup(&device.id), None);
}

struct Harness {
    server: Arc<MemoryTransport>,
    server_key: PrivateKey,
    device_key: PrivateKey,
    device_id: DeviceId,
    registry: Arc<CorrelationRegistry>,
    broker: Arc<Mutex<Broker>>,
}

fn harness() -> Harness {
    let broker = Arc::new(Mutex::new(Broker::new()));
    Harness {
        server: Arc::new(MemoryTransport::connect(broker.clone())),
        server_key: PrivateKey::generate(),
        device_key: PrivateKey::generate(),
        device_id: DeviceId::random(),
        registry: CorrelationRegistry::new(),
        broker,
    }
}

fn echo(request: &DeviceRequest) -> DeviceResponse {
    DeviceResponse::success(request, request.params.clone())
}

async fn wait_for_subscriber(broker: &Arc<Mutex<Broker>>, topic: &str) {
    for _ in 0..100 {
        if broker.lock().unwrap().subscriber_count(topic) > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("nobody subscribed to {topic}");
}

#[tokio::test]
async fn test_responder_answers_signed_command() {
    let h = harness();
    let topics = DeviceTopics::for_device(&h.device_id);
    let device_transport = Arc::new(MemoryTransport::connect(h.broker.clone()));
    let task = DeviceResponder::new(
        device_transport,
        h.device_id,
        h.device_key.clone(),
        h.server_key.public_key(),
    )
    .spawn(echo);
    wait_for_subscriber(&h.broker, &topics.request).await;

    let mut replies = h.registry.register(&topics.response);
    h.server
        .subscribe(&topics.response, replies.delivery())
        .await
        .unwrap();

    let mut params = Map::new();
    params.insert("on".to_string(), serde_json::json!(true));
    let request = DeviceRequest::new("onOff", params).with_correlation("abc123");
    let body = codec::encode(&request).unwrap();
    let frame = envelope::combine(&h.server_key.sign(&body), &body);
    h.server.publish(&topics.request, frame).await.unwrap();

    let reply = timeout(Duration::from_secs(1), replies.recv())
        .await
        .unwrap()
        .unwrap();
    let (payload, signature) = envelope::split(&reply).unwrap();
    assert!(h.device_key.public_key().verify(payload, &signature));

    let response: DeviceResponse = codec::decode(payload).unwrap();
    assert_eq!(response.correlation_data.as_str(), "abc123");
    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.state["on"], serde_json::json!(true));

    task.abort();
}

#[tokio::test]
async fn test_responder_ignores_unauthenticated_command() {
    let h = harness();
    let topics = DeviceTopics::for_device(&h.device_id);
    let device_transport = Arc::new(MemoryTransport::connect(h.broker.clone()));
    let task = DeviceResponder::new(
        device_transport,
        h.device_id,
        h.device_key.clone(),
        h.server_key.public_key(),
    )
    .spawn(echo);
    wait_for_subscriber(&h.broker, &topics.request).await;

    let mut replies = h.registry.register(&topics.response);
    h.server
        .subscribe(&topics.response, replies.delivery())
        .await
        .unwrap();

    let request = DeviceRequest::new("onOff", Map::new());
    let body = codec::encode(&request).unwrap();
    let forged = envelope::combine(&PrivateKey::generate().sign(&body), &body);
    h.server.publish(&topics.request, forged).await.unwrap();
    h.server
        .publish(&topics.request, b"garbage".to_vec())
        .await
        .unwrap();

    let reply = timeout(Duration::from_millis(200), replies.recv()).await;
    assert!(reply.is_err(), "no reply expected");

    task.abort();
}
