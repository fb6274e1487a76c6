use std::io;

use clickatell::{
    BatchOptions, ClickatellClient, ClickatellError, Credentials, Msisdn, SendOptions, SenderId,
    Template, TemplateContext,
};

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
    // name=number pairs, e.g. "Thandi=27123456781,Sipho=27123456782"
    let people = var("CLICKATELL_BATCH")?
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, number)| Ok((name.trim().to_owned(), Msisdn::new(number)?)))
        .collect::<Result<Vec<_>, ClickatellError>>()?;

    let options = BatchOptions::new(Template::new("Hi #name#, your order has shipped.")?)
        .with_sender(SenderId::new("Acme")?);

    let mut client = ClickatellClient::new(credentials);
    let records = client
        .run_batch(options, async |batch| -> Result<_, ClickatellError> {
            let mut records = Vec::new();
            for (name, number) in &people {
                let context = TemplateContext::from([("name".to_owned(), name.clone())]);
                records.push(
                    batch
                        .send_msg(number, &context, &SendOptions::default())
                        .await?,
                );
            }
            Ok(records)
        })
        .await?;

    for record in records {
        println!("{}", record.raw);
    }
    Ok(())
}
