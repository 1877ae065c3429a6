use std::env;
use std::time::Duration;

use terneo_ax::{MessageLogMode, TerneoClient, Thermostat};

#[tokio::main]
async fn main() -> terneo_ax::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let host = args.get(1).expect("usage: monitor <host> [--log <path>]");

    let mut builder = TerneoClient::builder(host).on_telemetry(|snapshot| {
        for (name, value) in snapshot {
            println!("  {name} = {value}");
        }
    });
    if let Some(pos) = args.iter().position(|a| a == "--log")
        && let Some(path) = args.get(pos + 1)
    {
        builder = builder.message_log(MessageLogMode::Diffed, path);
    }

    let mut thermostat = Thermostat::new(builder.build()?).on_notification(|n| {
        eprintln!("[{}] {}", n.title, n.message);
    });

    println!("Polling {host}...");
    loop {
        match thermostat.update().await {
            Ok(()) => println!(
                "[{}] {:.1}\u{00b0}C | mode: {:?} | action: {:?} | preset: {:?} | target: {:?}",
                thermostat.name(),
                thermostat.current_temperature().unwrap_or(f64::NAN),
                thermostat.hvac_mode(),
                thermostat.hvac_action(),
                thermostat.preset_mode(),
                thermostat.target_temperature(),
            ),
            Err(e) => eprintln!("Update error: {e}"),
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
}
