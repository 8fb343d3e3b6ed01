#[tokio::main]
async fn main() -> anyhow::Result<()> {
    covershelf_server::start().await
}
