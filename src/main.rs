// Single-threaded cooperative runtime: all work interleaves on one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    chat_client::run_with_config().await
}
