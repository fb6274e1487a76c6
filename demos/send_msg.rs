use std::io;

use clickatell::{
    ClickatellClient, Credentials, MessageText, Msisdn, ResponseKind, SendMsg, SendOptions,
    SenderId,
};

fn required(name: &str) -> io::Result<String> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let credentials = Credentials::new(
        required("CLICKATELL_USER")?,
        required("CLICKATELL_PASSWORD")?,
        required("CLICKATELL_API_ID")?,
    )?;
    // Comma-separated list of international numbers, e.g. 27123456781,27123456782
    let recipients = required("CLICKATELL_TO")?
        .split(',')
        .map(Msisdn::new)
        .collect::<Result<Vec<_>, _>>()?;
    let sender = std::env::var("CLICKATELL_FROM").unwrap_or_else(|_| "Clickatell".to_owned());
    let message = std::env::var("CLICKATELL_MESSAGE")
        .unwrap_or_else(|_| "Hello from the clickatell example.".to_owned());

    let mut client = ClickatellClient::new(credentials);
    let request = SendMsg::to_many(
        recipients,
        SenderId::new(sender)?,
        MessageText::new(message)?,
        SendOptions::default(),
    )?;

    for record in client.send_msg(request).await? {
        match &record.kind {
            ResponseKind::Err(reply) => {
                println!("failed: {} {} ({})", reply.code, reply.reason, record.raw)
            }
            _ => println!(
                "sent: {} to {}",
                record.payload().map_or("", |p| p.value.as_str()),
                record.to().unwrap_or("-")
            ),
        }
    }

    Ok(())
}
