use super::*;

#[test]
fn current_block_comes_from_the_node() {
    let solo = TestSolo::spawn();

    pretty_assert_eq!(
        solo.get::<Value>("/api/v1/currentBlock"),
        json!({"number": 100})
    );
}

#[test]
fn stats_track_miners_and_work() {
    let solo = TestSolo::spawn();

    let stats = solo.get::<Value>("/api/v1/stats");

    pretty_assert_eq!(stats["connectedMiners"], 0);
    pretty_assert_eq!(stats["currentWork"], Value::Null);
    pretty_assert_eq!(stats["bestShareDifficulty"], Value::Null);
    pretty_assert_eq!(stats["validShareCount"], 0);

    let mut miner = solo.miner();
    miner.login(PASSWORD);
    solo.notify(&work_notification());
    miner.recv();

    let stats = solo.get::<Value>("/api/v1/stats");

    pretty_assert_eq!(stats["connectedMiners"], 1);
    pretty_assert_eq!(stats["currentWork"][0], HEADER);
    pretty_assert_eq!(stats["currentWork"][2], NETWORK_TARGET);
}

#[test]
fn best_shares_are_recorded() {
    let solo = TestSolo::spawn_with_args(&["--share-difficulty", "1000000"]);

    pretty_assert_eq!(solo.get::<Vec<Value>>("/api/v1/bestShares"), Vec::<Value>::new());

    let mut miner = solo.miner();
    miner.login(PASSWORD);
    solo.notify(&work_notification());
    miner.recv();

    miner.request(json!({
        "id": 4,
        "method": "eth_submitWork",
        "params": ["0x00000000000001a4", HEADER, MIX_DIGEST],
    }));

    let best = solo.get::<Vec<Value>>("/api/v1/bestShares");

    pretty_assert_eq!(best.len(), 1);
    pretty_assert_eq!(
        best[0]["workerName"],
        "0x6e4a3f1b2c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f.rig1"
    );

    let stats = solo.get::<Value>("/api/v1/stats");
    pretty_assert_eq!(stats["shareDifficulty"], 1_000_000);
    assert!(stats["bestShareDifficulty"].as_f64().unwrap() >= 1_000_000.0 * 0.99);
}

#[test]
fn unknown_blocks_are_not_found() {
    let solo = TestSolo::spawn();

    pretty_assert_eq!(solo.get::<Vec<Value>>("/api/v1/blocks"), Vec::<Value>::new());

    pretty_assert_eq!(
        solo.get_status(&format!("/api/v1/blocks/{HEADER}")),
        reqwest::StatusCode::NOT_FOUND
    );

    pretty_assert_eq!(
        solo.get_status("/api/v1/blocks/nonsense"),
        reqwest::StatusCode::BAD_REQUEST
    );
}
