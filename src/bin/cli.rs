//! chromalink CLI
//!
//! Command-line interface for listing OpenRGB devices and setting colors.

use std::process;

use chromalink::{ChromaError, Client, ClientConfig, RgbColor};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// chromalink CLI
#[derive(Parser, Debug)]
#[command(name = "chromalink-cli")]
#[command(about = "Control RGB devices through an OpenRGB SDK server")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6742")]
    port: u16,

    /// Client name announced to the server
    #[arg(short, long, default_value = "chromalink-cli")]
    name: String,

    /// Connect attempts before giving up
    #[arg(long, default_value = "5")]
    retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all devices
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show zones, modes and LEDs of one device
    Show {
        /// Device id
        device: u32,
    },

    /// Set a device or zone to one color
    Color {
        /// Device id
        #[arg(short, long)]
        device: u32,

        /// Zone id (whole device if omitted)
        #[arg(short, long)]
        zone: Option<u32>,

        /// Preset name, #rrggbb, or r,g,b
        color: RgbColor,
    },

    /// Switch a device to Direct mode
    Direct {
        /// Device id
        #[arg(short, long)]
        device: u32,
    },

    /// Resize a zone
    Resize {
        /// Device id
        #[arg(short, long)]
        device: u32,

        /// Zone id
        #[arg(short, long)]
        zone: u32,

        /// New LED count
        #[arg(short, long)]
        size: u32,
    },

    /// Print the server protocol version
    Version,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chromalink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .host(&args.host)
        .port(args.port)
        .client_name(&args.name)
        .max_retries(args.retries)
        .build();

    let client = match Client::connect(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            tracing::error!("Make sure OpenRGB is running with the SDK server enabled");
            process::exit(1);
        }
    };

    let result = run(&client, args.command);
    client.disconnect();

    if let Err(e) = result {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(client: &Client, command: Commands) -> Result<(), ChromaError> {
    match command {
        Commands::List { json } => {
            let devices = client.list_devices()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else if devices.is_empty() {
                println!("No RGB devices found");
            } else {
                for device in devices {
                    println!(
                        "{:>3}  {:<40} {:<12} {} zone(s), {} LED(s)",
                        device.id,
                        device.name,
                        format!("{:?}", device.device_type),
                        device.zone_count,
                        device.led_count
                    );
                }
            }
        }

        Commands::Show { device } => {
            let device = client.get_device(device)?;
            println!("{} [{:?}]", device.name, device.device_type);
            println!("Modes:");
            for (index, mode) in device.modes.iter().enumerate() {
                println!("  {:>3}  {}", index, mode.name);
            }
            println!("Zones:");
            for (index, zone) in device.zones.iter().enumerate() {
                println!(
                    "  {:>3}  {:<30} {:?}, LEDs {:?}{}",
                    index,
                    zone.name,
                    zone.zone_type,
                    zone.led_range(),
                    if zone.resizable() {
                        format!(" (resizable {}..={})", zone.leds_min, zone.leds_max)
                    } else {
                        String::new()
                    }
                );
            }
            println!("LEDs:");
            for (index, led) in device.leds.iter().enumerate() {
                println!("  {:>3}  {:<30} {}", index, led.name, led.color.to_hex());
            }
        }

        Commands::Color {
            device,
            zone,
            color,
        } => {
            match zone {
                Some(zone) => client.set_zone_color(device, zone, color)?,
                None => client.set_device_color(device, color)?,
            }
            println!("Set device {} to {}", device, color);
        }

        Commands::Direct { device } => {
            client.set_direct_mode(device)?;
            println!("Device {} switched to Direct mode", device);
        }

        Commands::Resize { device, zone, size } => {
            client.resize_zone(device, zone, size)?;
            println!("Zone {} of device {} resized to {}", zone, device, size);
        }

        Commands::Version => {
            println!("Server protocol version {}", client.protocol_version()?);
        }
    }

    Ok(())
}
