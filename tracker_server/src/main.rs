#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracker_server::run_with_config().await
}
