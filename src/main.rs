#[tokio::main]
async fn main() -> anyhow::Result<()> {
    focusmom_lib::run().await
}
