#[tokio::main]
async fn main() {
    // Delegate to the server framework entry point.
    invite_server::run().await;
}
