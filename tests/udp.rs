// tests/udp.rs

mod common;

use std::{sync::Arc, time::Duration};
use tokio::{net::UdpSocket, sync::watch, time::timeout};

use common::{synced_registry, MockDatabase};
use okra_log::comms::{Listener, UdpListener};
use okra_log::config::{ListenerConfig, PipelineConfig};
use okra_log::db::Database;
use okra_log::mission::{BatchFlusher, FlushOutcome};

fn loopback() -> ListenerConfig {
    ListenerConfig { bind: "127.0.0.1".parse().unwrap(), port: 0, separator: '|', max_datagram: 1024 }
}

#[tokio::test]
async fn datagrams_reach_the_database() {
    let pipeline = PipelineConfig::default();
    let registry = Arc::new(synced_registry(&pipeline));
    let listener = Arc::new(UdpListener::bind(&loopback()).await.unwrap());
    let addr = listener.local_addr().unwrap();

    let (tx, rx) = watch::channel(false);
    let task = listener.spawn(registry.clone(), rx);

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for datagram in ["login|1001|", "unknown|1|2", "login|1", "login|1002|Alice\r\n"] {
        client.send_to(datagram.as_bytes(), addr).await.unwrap();
    }

    let mission = registry.lookup("login").unwrap().clone();
    timeout(Duration::from_secs(2), async {
        while mission.ring().len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("records were not buffered");

    let db = Arc::new(MockDatabase::new());
    let flusher = BatchFlusher::new(mission, db.clone() as Arc<dyn Database>, pipeline.insert_mode);
    assert_eq!(flusher.tick().await, FlushOutcome::Flushed { rows: 2, skipped: 0 });
    assert_eq!(
        db.batches(),
        vec![vec![
            "INSERT INTO `login` (`uid`,`name`) VALUES (1001,'');".to_owned(),
            "INSERT INTO `login` (`uid`,`name`) VALUES (1002,'Alice');".to_owned(),
        ]]
    );

    tx.send(true).unwrap();
    timeout(Duration::from_secs(2), task).await.expect("listener did not stop").unwrap();
}

#[tokio::test]
async fn listener_stops_when_shutdown_sender_drops() {
    let registry = Arc::new(synced_registry(&PipelineConfig::default()));
    let listener = Arc::new(UdpListener::bind(&loopback()).await.unwrap());
    let (tx, rx) = watch::channel(false);
    let task = listener.spawn(registry, rx);
    drop(tx);
    timeout(Duration::from_secs(2), task).await.expect("listener did not stop").unwrap();
}
