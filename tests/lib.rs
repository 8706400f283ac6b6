use {
    axum::{Json, Router, routing::post},
    mock_rpc::MockRpc,
    parking_lot::Mutex,
    pretty_assertions::assert_eq as pretty_assert_eq,
    serde::de::DeserializeOwned,
    serde_json::{Value, json},
    std::{
        io::{BufRead, BufReader, ErrorKind, Write},
        net::{TcpListener, TcpStream},
        process::{Child, Command, Stdio},
        sync::Arc,
        thread,
        time::Duration,
    },
    tempfile::TempDir,
    test_solo::TestSolo,
};

mod test_solo;

mod api;

const PASSWORD: &str = "hunter2";
const HEADER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const SEED: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const NETWORK_TARGET: &str = "0x0000000000000000000000000000000000000000000000000000000000000400";
const MIX_DIGEST: &str = "0xcccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn work_notification() -> Value {
    json!([HEADER, SEED, NETWORK_TARGET, "0x64"])
}
