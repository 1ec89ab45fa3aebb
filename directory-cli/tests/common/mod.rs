use directory_cli::api::ApiClient;
use directory_cli::core::{RenderDirective, ResultRenderer};
use directory_stub::StubState;
use parking_lot::Mutex;
use tokio::net::TcpListener;

/// Start a stub backend on an ephemeral port and return its base URL
#[allow(dead_code)]
pub async fn spawn_stub(state: StubState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(directory_stub::serve(listener, state));
    format!("http://{}", addr)
}

#[allow(dead_code)]
pub async fn stub_client(state: &StubState) -> ApiClient {
    ApiClient::new(&spawn_stub(state.clone()).await)
}

/// A base URL nothing is listening on
#[allow(dead_code)]
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingRenderer {
    pub directives: Mutex<Vec<RenderDirective>>,
}

impl ResultRenderer for RecordingRenderer {
    fn render(&self, directive: RenderDirective) {
        self.directives.lock().push(directive);
    }
}

#[allow(dead_code)]
impl RecordingRenderer {
    pub fn last(&self) -> Option<RenderDirective> {
        self.directives.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.directives.lock().len()
    }
}
