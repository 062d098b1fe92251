use gluetun_status::http::main::run_server;

#[tokio::main]
async fn main() {
    run_server().await;
}
