#[tokio::main]
async fn main() {
    std::process::exit(wsc_cli::run().await);
}
