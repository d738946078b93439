#[tokio::main]
async fn main() -> anyhow::Result<()> {
  rpgym_lib::run().await
}
