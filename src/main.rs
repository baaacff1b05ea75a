//! Motion packet dump - decode a raw telemetry capture and print its contents
//!
//! Usage:
//!   motion-packet-dump --input capture.bin
//!   motion-packet-dump --input capture.bin --samples

use clap::Parser;
use motion_module_interface::{parse_motion_packets, PACKET_SIZE};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "motion-packet-dump")]
#[command(about = "Decode raw motion-module telemetry captures", long_about = None)]
struct Args {
    /// Input file containing raw packet bytes
    #[arg(short, long)]
    input: PathBuf,

    /// Print every decoded sample and timestamp entry
    #[arg(short, long)]
    samples: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let buffer = fs::read(&args.input)?;

    println!("Motion Packet Dump");
    println!("==================");
    println!("Input: {}", args.input.display());
    println!(
        "Size: {} bytes ({} complete packets)",
        buffer.len(),
        buffer.len() / PACKET_SIZE
    );
    println!();

    let events = parse_motion_packets(&buffer);
    let dropped = buffer.len() / PACKET_SIZE - events.len();

    for (i, event) in events.iter().enumerate() {
        println!(
            "packet {:4}: error_state=0x{:04X} status=0x{:04X} samples={} timestamps={}",
            i,
            event.error_state,
            event.status,
            event.samples.len(),
            event.timestamps.len()
        );

        if args.samples {
            for sample in &event.samples {
                println!(
                    "    {:?} frame={:4} ts={:10} valid={} axes=[{:.4}, {:.4}, {:.4}]",
                    sample.source,
                    sample.frame_number,
                    sample.timestamp,
                    sample.is_valid,
                    sample.axes[0],
                    sample.axes[1],
                    sample.axes[2]
                );
            }
            for entry in &event.timestamps {
                println!(
                    "    {:?} frame={:4} ts={:10}",
                    entry.source, entry.frame_number, entry.timestamp
                );
            }
        }
    }

    println!();
    println!("Decoded {} events ({} packets dropped)", events.len(), dropped);

    Ok(())
}
