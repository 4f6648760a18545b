use mailinator_stream::Inbox;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("mailinator_stream=debug")
        .init();

    let target = std::env::args().nth(1).unwrap_or_else(|| "test".to_string());
    let mut inbox = Inbox::subscribe(target, None).await?;
    println!("Waiting for new messages sent to {}", inbox.address());

    while let Some(message) = inbox.recv().await {
        println!("From: {}", message.from);
        println!("Subject: {}", message.data.subject);
        for part in &message.data.parts {
            println!("--- {} ---", part.headers.contenttype);
            println!("{}", part.body);
        }
    }

    if let Some(err) = inbox.last_error() {
        eprintln!("inbox closed: {}", err);
    }
    Ok(())
}
