//! # Delivery Flow Tests
//!
//! Exercises the full path with the in-memory bus dispatching on its own tasks:
//!
//! ```text
//! [Client] ──subscribe──→ [DeliveryCoordinator] ──add_service (once)──→ [Event Bus]
//!                                                                           │
//! [Client] ←──"<value>.<topic>"── [TopicSubscription::deliver] ←──publish───┘
//! ```

#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use relay_gateway::delivery::{service_name, OutboundMessage};

#[cfg(test)]
use relay_gateway::{ClientHandle, ConnectionId, DeliveryCoordinator, SubscribeOutcome};

#[cfg(test)]
use shared_bus::{EventPublisher, InMemoryEventBus, Payload};

#[cfg(test)]
use tokio::sync::mpsc;

#[cfg(test)]
use tokio::time::timeout;

#[cfg(test)]
const TIMEOUT: Duration = Duration::from_secs(2);

#[cfg(test)]
fn setup() -> (Arc<InMemoryEventBus>, Arc<DeliveryCoordinator>) {
    let bus = Arc::new(InMemoryEventBus::new());
    let coordinator = Arc::new(DeliveryCoordinator::new(bus.clone()));
    (bus, coordinator)
}

#[cfg(test)]
fn connect(coordinator: &DeliveryCoordinator) -> (ConnectionId, mpsc::Receiver<OutboundMessage>) {
    let id = ConnectionId::new();
    let (handle, rx) = ClientHandle::channel(id, 64);
    coordinator.on_connect(id, handle);
    (id, rx)
}

#[cfg(test)]
async fn next_message(rx: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
    timeout(TIMEOUT, rx.recv())
        .await
        .expect("timeout waiting for delivery")
        .expect("client queue closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_alert_scenario() {
        let (bus, coordinator) = setup();
        let (c1, mut rx1) = connect(&coordinator);

        coordinator.on_subscribe_request(&c1, "level", "high", "alerts");

        // The low event must not be delivered, so the first message is m1
        bus.publish("alerts", Payload::new(json!({"level": "low"}))).await;
        bus.publish("alerts", Payload::new(json!({"level": "high", "msg": "m1"})))
            .await;

        let message = next_message(&mut rx1).await;
        assert_eq!(message.channel, "high.alerts");
        assert_eq!(message.data, json!({"level": "high", "msg": "m1"}));
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_two_clients_one_handler() {
        let (bus, coordinator) = setup();
        let (c1, mut rx1) = connect(&coordinator);
        let (c2, mut rx2) = connect(&coordinator);

        coordinator.on_subscribe_request(&c1, "level", "high", "alerts");
        coordinator.on_subscribe_request(&c2, "level", "low", "alerts");

        assert_eq!(bus.handler_count("alerts"), 1);
        assert_eq!(bus.service_count(), 1);

        bus.publish("alerts", Payload::new(json!({"level": "low", "seq": 1})))
            .await;
        bus.publish("alerts", Payload::new(json!({"level": "high", "seq": 2})))
            .await;

        let to_c2 = next_message(&mut rx2).await;
        assert_eq!(to_c2.channel, "low.alerts");
        assert_eq!(to_c2.data["seq"], 1);

        let to_c1 = next_message(&mut rx1).await;
        assert_eq!(to_c1.channel, "high.alerts");
        assert_eq!(to_c1.data["seq"], 2);
    }

    #[tokio::test]
    async fn test_unknown_connection_has_no_side_effects() {
        let (bus, coordinator) = setup();

        let outcome =
            coordinator.on_subscribe_request(&ConnectionId::new(), "level", "high", "alerts");

        assert_eq!(outcome, SubscribeOutcome::UnknownClient);
        assert_eq!(bus.handler_count("alerts"), 0);
        assert!(coordinator.topic("alerts").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_first_subscribers_register_one_handler() {
        const CLIENTS: usize = 32;
        let (bus, coordinator) = setup();
        let ids: Vec<_> = (0..CLIENTS)
            .map(|_| connect(&coordinator))
            .collect();

        let tasks: Vec<_> = ids
            .iter()
            .map(|(id, _)| {
                let coordinator = coordinator.clone();
                let id = *id;
                tokio::spawn(async move {
                    coordinator.on_subscribe_request(&id, "level", "high", "alerts")
                })
            })
            .collect();

        let mut attached = 0;
        for task in tasks {
            match task.await.unwrap() {
                SubscribeOutcome::Registered { attached: true } => attached += 1,
                SubscribeOutcome::Registered { attached: false } => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(attached, 1);
        assert_eq!(bus.handler_count("alerts"), 1);
        assert_eq!(coordinator.topic("alerts").unwrap().len(), CLIENTS);

        bus.publish("alerts", Payload::new(json!({"level": "high"}))).await;
        for (_, mut rx) in ids {
            assert_eq!(next_message(&mut rx).await.channel, "high.alerts");
        }
    }

    #[tokio::test]
    async fn test_topics_get_independent_handlers() {
        let (bus, coordinator) = setup();
        let (c1, mut rx1) = connect(&coordinator);

        coordinator.on_subscribe_request(&c1, "level", "high", "alerts");
        coordinator.on_subscribe_request(&c1, "side", "buy", "orders");

        assert_eq!(bus.handler_count("alerts"), 1);
        assert_eq!(bus.handler_count("orders"), 1);
        assert_eq!(bus.service_count(), 2);
        assert_ne!(service_name("alerts"), service_name("orders"));

        bus.publish("orders", Payload::new(json!({"side": "buy", "qty": 5})))
            .await;
        let message = next_message(&mut rx1).await;
        assert_eq!(message.channel, "buy.orders");
        assert_eq!(message.data["qty"], 5);
    }

    #[tokio::test]
    async fn test_disconnected_client_does_not_block_others() {
        let (bus, coordinator) = setup();
        let (c1, rx1) = connect(&coordinator);
        let (c2, mut rx2) = connect(&coordinator);
        coordinator.on_subscribe_request(&c1, "level", "high", "alerts");
        coordinator.on_subscribe_request(&c2, "level", "high", "alerts");

        coordinator.on_disconnect(&c1);
        drop(rx1);

        bus.publish("alerts", Payload::new(json!({"level": "high"}))).await;
        assert_eq!(next_message(&mut rx2).await.channel, "high.alerts");

        assert_eq!(coordinator.topic("alerts").unwrap().len(), 2);
        assert_eq!(coordinator.sweep(), 1);
        assert_eq!(coordinator.topic("alerts").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_subscription_delivers_twice() {
        let (bus, coordinator) = setup();
        let (c1, mut rx1) = connect(&coordinator);

        coordinator.on_subscribe_request(&c1, "level", "high", "alerts");
        coordinator.on_subscribe_request(&c1, "level", "high", "alerts");

        bus.publish("alerts", Payload::new(json!({"level": "high"}))).await;
        assert_eq!(next_message(&mut rx1).await.channel, "high.alerts");
        assert_eq!(next_message(&mut rx1).await.channel, "high.alerts");
    }
}
