use super::{Broker, Message};
use crate::client::Client;
use tokio::sync::mpsc;

fn connect(broker: &mut Broker) -> (String, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    broker.register_client(client);
    (client_id, rx)
}

#[test]
fn test_broker_new() {
    let broker = Broker::default();
    assert!(broker.topics.is_empty());
    assert!(broker.clients.is_empty());
}

#[test]
fn test_broker_register_and_remove_client() {
    let mut broker = Broker::default();
    let (client_id, _rx) = connect(&mut broker);
    assert!(broker.clients.contains_key(&client_id));
    assert_eq!(broker.client_count(), 1);

    broker.remove_client(&client_id);
    assert!(!broker.clients.contains_key(&client_id));
}

#[test]
fn test_broker_subscribe_and_unsubscribe() {
    let mut broker = Broker::default();
    let (client_id, _rx) = connect(&mut broker);

    broker.subscribe("test_topic", client_id.clone());
    assert!(broker.topics["test_topic"].contains(&client_id));
    assert_eq!(broker.subscriber_count("test_topic"), 1);

    broker.unsubscribe("test_topic", &client_id);
    assert!(!broker.topics.contains_key("test_topic"));
    assert_eq!(broker.subscriber_count("test_topic"), 0);
}

#[test]
fn test_broker_publish() {
    let mut broker = Broker::default();
    let (client_id, mut rx) = connect(&mut broker);
    broker.subscribe("test_topic", client_id);

    let delivered = broker.publish(Message::new("test_topic", "hello"));
    assert_eq!(delivered, 1);

    let received = rx.try_recv().unwrap();
    assert_eq!(received.topic, "test_topic");
    assert_eq!(received.payload, "hello");
    assert!(received.timestamp > 0);
    assert!(!received.message_id.is_empty());
}

#[test]
fn test_publish_fans_out_to_subscribers_only() {
    let mut broker = Broker::default();
    let (a, mut rx_a) = connect(&mut broker);
    let (b, mut rx_b) = connect(&mut broker);
    let (_c, mut rx_c) = connect(&mut broker);
    broker.subscribe("t", a);
    broker.subscribe("t", b);

    assert_eq!(broker.publish(Message::new("t", "x")), 2);
    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_ok());
    assert!(rx_c.try_recv().is_err());
}

#[test]
fn test_broker_cleanup_client() {
    let mut broker = Broker::default();
    let (client_id, _rx) = connect(&mut broker);
    let (other, _other_rx) = connect(&mut broker);
    broker.subscribe("test_topic", client_id.clone());
    broker.subscribe("shared", client_id.clone());
    broker.subscribe("shared", other.clone());

    broker.cleanup_client(&client_id);
    assert!(!broker.clients.contains_key(&client_id));
    assert!(!broker.topics.contains_key("test_topic"));
    assert!(broker.topics["shared"].contains(&other));
    assert!(!broker.topics["shared"].contains(&client_id));
}

#[test]
fn test_publish_to_nonexistent_topic() {
    let broker = Broker::default();
    assert_eq!(broker.publish(Message::new("nonexistent_topic", "hello")), 0);
}

#[test]
fn test_publish_to_client_with_closed_channel() {
    let mut broker = Broker::default();
    let (client_id, rx) = connect(&mut broker);
    broker.subscribe("test_topic", client_id);

    drop(rx);

    assert_eq!(broker.publish(Message::new("test_topic", "hello")), 0);
}
