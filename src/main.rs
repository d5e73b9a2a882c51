use anyhow::Result;
use btc_message_signer::codec::base58check;
use btc_message_signer::{wallet, MessageSigner, SignerSettings};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "btc-message-signer", version, about = "Bitcoin signed-message keys, signatures and verification")]
struct Cli {
    #[clap(long, global = true, help = "Print debug log lines to stderr")]
    debug: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair
    Generate {
        #[clap(long, help = "Print the key pair as JSON")]
        json: bool,
        #[clap(long, help = "Export the WIF without the compression marker")]
        uncompressed: bool,
    },
    /// Sign a message with a WIF private key
    Sign {
        #[clap(long)]
        wif: String,
        #[clap(long)]
        message: String,
        #[clap(long, help = "Address to check the signature against (defaults to the key's own)")]
        address: Option<String>,
    },
    /// Verify a Base64 signature against a message and address
    Verify {
        #[clap(long)]
        signature: String,
        #[clap(long)]
        message: String,
        #[clap(long)]
        address: String,
        #[clap(long, help = "Print the outcome as JSON")]
        json: bool,
    },
    /// Print the address of a WIF private key
    Address {
        #[clap(long)]
        wif: String,
    },
    /// Print a WIF private key as an EC PRIVATE KEY PEM block
    Pem {
        #[clap(long)]
        wif: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut settings = SignerSettings::from_env()?;
    if cli.debug {
        settings.debug_logging = true;
    }
    settings.apply_logging();

    match cli.command {
        Command::Generate { json, uncompressed } => {
            if uncompressed {
                settings.compressed_keys = false;
            }
            let pair = wallet::generate_key_pair_with(&settings, &mut OsRng)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pair)?);
            } else {
                println!("Private key (WIF): {}", pair.private_key);
                println!("Address: {}", pair.address);
            }
        }
        Command::Sign {
            wif,
            message,
            address,
        } => {
            let signer = MessageSigner::new(settings)?;
            let address = match address {
                Some(address) => address,
                None => base58check::decode_wif(&wif)?.address()?,
            };
            println!("{}", signer.sign_message(&message, &wif, &address)?);
        }
        Command::Verify {
            signature,
            message,
            address,
            json,
        } => {
            let signer = MessageSigner::new(settings)?;
            let outcome = signer.verify_message(&signature, &message, &address)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome);
            }
            if !outcome.verified {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Address { wif } => {
            println!("{}", wallet::address_from_private_key(&wif)?);
        }
        Command::Pem { wif } => {
            print!("{}", wallet::private_key_to_pem(&wif)?.as_str());
        }
    }

    Ok(ExitCode::SUCCESS)
}
