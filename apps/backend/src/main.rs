#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kaizen_backend::run().await
}
