use directory_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    DirectoryServer::new(config)?.serve().await?;

    Ok(())
}
