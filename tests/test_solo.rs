use super::*;

pub(crate) struct TestSolo {
    child: Child,
    rpc: MockRpc,
    gateway_port: u16,
    notifications_port: u16,
    api_port: u16,
    _tempdir: TempDir,
}

impl TestSolo {
    pub(crate) fn spawn() -> Self {
        Self::spawn_with_args(&[])
    }

    pub(crate) fn spawn_with_args(args: &[&str]) -> Self {
        let rpc = MockRpc::spawn();
        let tempdir = TempDir::new().unwrap();

        let (gateway_port, notifications_port, api_port) = (free_port(), free_port(), free_port());

        let mut child = Command::new(env!("CARGO_BIN_EXE_solo"))
            .arg("--gateway-insecure-bind")
            .arg(format!("127.0.0.1:{gateway_port}"))
            .arg("--workmanager-notifications-bind")
            .arg(format!("127.0.0.1:{notifications_port}"))
            .arg("--api-bind")
            .arg(format!("127.0.0.1:{api_port}"))
            .arg("--gateway-password")
            .arg(PASSWORD)
            .arg("--node-http-rpc")
            .arg(rpc.url())
            .arg("--verifier-http-rpc")
            .arg(rpc.url())
            .arg("--db-path")
            .arg(tempdir.path().join("db"))
            .args(args)
            .env("RUST_LOG", "info")
            .current_dir(tempdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        for port in [gateway_port, notifications_port, api_port] {
            for attempt in 0.. {
                if TcpStream::connect(("127.0.0.1", port)).is_ok() {
                    break;
                }

                if let Some(status) = child.try_wait().unwrap() {
                    panic!("solo exited before listening on port {port}: {status}");
                }

                if attempt == 100 {
                    panic!("solo did not listen on port {port}");
                }

                thread::sleep(Duration::from_millis(50));
            }
        }

        Self {
            child,
            rpc,
            gateway_port,
            notifications_port,
            api_port,
            _tempdir: tempdir,
        }
    }

    pub(crate) fn rpc(&self) -> &MockRpc {
        &self.rpc
    }

    pub(crate) fn miner(&self) -> Miner {
        Miner::connect(self.gateway_port)
    }

    pub(crate) fn notify(&self, body: &Value) -> reqwest::StatusCode {
        reqwest::blocking::Client::new()
            .post(format!("http://127.0.0.1:{}/", self.notifications_port))
            .json(body)
            .send()
            .unwrap()
            .status()
    }

    #[track_caller]
    pub(crate) fn get<T: DeserializeOwned>(&self, path: &str) -> T {
        let response =
            reqwest::blocking::get(format!("http://127.0.0.1:{}{path}", self.api_port)).unwrap();

        pretty_assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {path}");

        response.json().unwrap()
    }

    pub(crate) fn get_status(&self, path: &str) -> reqwest::StatusCode {
        reqwest::blocking::get(format!("http://127.0.0.1:{}{path}", self.api_port))
            .unwrap()
            .status()
    }
}

impl Drop for TestSolo {
    fn drop(&mut self) {
        self.child.kill().unwrap();
        self.child.wait().unwrap();
    }
}

pub(crate) struct Miner {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Miner {
    fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        Self {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    pub(crate) fn send(&mut self, line: &str) {
        writeln!(self.writer, "{line}").unwrap();
    }

    #[track_caller]
    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        assert!(
            self.reader.read_line(&mut line).unwrap() > 0,
            "connection closed"
        );
        serde_json::from_str(&line).unwrap()
    }

    #[track_caller]
    pub(crate) fn request(&mut self, request: Value) -> Value {
        self.send(&request.to_string());
        self.recv()
    }

    #[track_caller]
    pub(crate) fn login(&mut self, password: &str) -> Value {
        self.request(json!({
            "id": 1,
            "method": "eth_submitLogin",
            "params": ["0x6e4a3f1b2c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f.rig1", password],
        }))
    }

    #[track_caller]
    pub(crate) fn assert_closed(&mut self) {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {}
            Err(err) if err.kind() == ErrorKind::ConnectionReset => {}
            other => panic!("expected the gateway to close the connection, got {other:?}: {line}"),
        }
    }
}
