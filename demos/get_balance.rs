use std::io;

use clickatell::{ClickatellClient, Credentials};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let var = |name: &str| {
        std::env::var(name).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{name} environment variable is required"),
            )
        })
    };
    let credentials = Credentials::new(
        var("CLICKATELL_USER")?,
        var("CLICKATELL_PASSWORD")?,
        var("CLICKATELL_API_ID")?,
    )?;

    let mut client = ClickatellClient::new(credentials);
    client.ping().await?;
    println!("credit: {:.2}", client.get_balance().await?);

    Ok(())
}
