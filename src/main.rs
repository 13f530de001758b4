use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use kalupto::{ChannelPolicy, Codec, DecodeOptions, EncodeOptions};

/// kalupto: hide short messages in the DCT coefficients of ordinary images.
#[derive(Parser)]
#[command(name = "kalupto", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Luma,
    Blue,
}

impl From<ChannelArg> for ChannelPolicy {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Luma => ChannelPolicy::Luma,
            ChannelArg::Blue => ChannelPolicy::Blue,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a message in a cover image, writing a PNG
    Encode {
        /// Cover image (PNG, JPEG, GIF or BMP)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG path
        #[arg(short, long, required_unless_present = "base64")]
        output: Option<PathBuf>,

        /// Message text
        #[arg(short, long, conflicts_with = "message_file")]
        message: Option<String>,

        /// Read the message bytes from a file instead
        #[arg(long)]
        message_file: Option<PathBuf>,

        /// Encrypt the message with a password
        #[arg(short, long)]
        password: Option<String>,

        /// Plane that carries the payload in colour images
        #[arg(long, value_enum, default_value_t = ChannelArg::Luma)]
        channel: ChannelArg,

        /// Omit the CRC-16 from the frame
        #[arg(long)]
        no_checksum: bool,

        /// Print the encoded PNG as base64 instead of writing a file
        #[arg(long)]
        base64: bool,
    },

    /// Recover a hidden message
    Decode {
        /// Stego image
        #[arg(short, long)]
        input: PathBuf,

        /// Decryption password (required if the message was encrypted)
        #[arg(short, long)]
        password: Option<String>,

        /// Write the message bytes to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The input file holds the image as base64 text
        #[arg(long)]
        base64: bool,
    },

    /// Report how much an image can carry
    Capacity {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let codec = Codec::default();

    match cli.command {
        Commands::Encode {
            input,
            output,
            message,
            message_file,
            password,
            channel,
            no_checksum,
            base64,
        } => {
            let cover = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;

            let payload = match (message, message_file) {
                (Some(text), None) => text.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                _ => bail!("provide exactly one of --message or --message-file"),
            };

            let options = EncodeOptions {
                channel: channel.into(),
                checksum: !no_checksum,
                password,
            };
            let png = codec.encode(&cover, &payload, &options)?;

            match output {
                Some(path) if !base64 => {
                    std::fs::write(&path, &png)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("wrote {} ({} bytes)", path.display(), png.len());
                }
                _ => println!("{}", STANDARD.encode(&png)),
            }
        }

        Commands::Decode {
            input,
            password,
            output,
            base64,
        } => {
            let raw = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let image = if base64 {
                let text = String::from_utf8(raw).context("base64 input is not text")?;
                STANDARD
                    .decode(text.trim())
                    .context("input is not valid base64")?
            } else {
                raw
            };
            let message = codec.decode(&image, &DecodeOptions { password })?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &message)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("wrote {} ({} bytes)", path.display(), message.len());
                }
                None => {
                    let text = String::from_utf8(message)
                        .context("message is not UTF-8; use --output to save the raw bytes")?;
                    println!("{}", text);
                }
            }
        }

        Commands::Capacity { input } => {
            let image = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let plan = codec.capacity(&image)?;
            println!("{}x{} image", plan.width, plan.height);
            println!(
                "{} payload blocks of {}x{}, {} bits each",
                plan.payload_blocks, plan.block_size, plan.block_size, plan.bits_per_block
            );
            println!("capacity: {} bits", plan.capacity_bits);
            println!(
                "max message: {} bytes ({} with a password)",
                plan.max_message_bytes(true, false),
                plan.max_message_bytes(true, true)
            );
        }
    }

    Ok(())
}
