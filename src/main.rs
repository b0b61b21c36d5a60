//! Paper Vault - hidden-layer secret cards with threshold recovery.
//!
//! Creates card payloads from secrets and restores secrets from scanned
//! payloads.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use paper_vault::{
    generate_mnemonic, validate_mnemonic, Engine, EngineConfig, Metadata, Mode, Secret, Step,
    Strength, ThresholdProfile,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Passphrase attempts before restore gives up on a card.
const MAX_ATTEMPTS: usize = 3;

#[derive(Parser)]
#[command(name = "paper-vault")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Encode secrets into paper cards and recover them",
    long_about = "Seals up to three secrets as hidden layers of one card, optionally split so that any t of n cards recover them."
)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create cards from one or more secrets
    Create {
        /// Secret message; repeat for hidden secrets (up to 3)
        #[arg(long = "secret", required_unless_present = "generate_mnemonic")]
        secrets: Vec<String>,

        /// Generate a BIP39 seed phrase (128 or 256 bits) as the first secret
        #[arg(long)]
        generate_mnemonic: Option<Strength>,

        /// Reject secrets that are not valid BIP39 seed phrases
        #[arg(long)]
        mnemonic: bool,

        /// Passphrase for the secret at the same position (prompted if omitted)
        #[arg(long = "passphrase")]
        passphrases: Vec<String>,

        /// Threshold profile such as 2of3 (default: a single card)
        #[arg(long)]
        profile: Option<ThresholdProfile>,

        /// Label printed on the cards
        #[arg(long)]
        label: Option<String>,

        /// Challenge printed on the cards
        #[arg(long)]
        challenge: Option<String>,

        /// Copies to print of each card
        #[arg(long, default_value = "1")]
        copies: u32,

        /// Output directory for card payloads
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Restore a secret from card payloads, scanned in order
    Restore {
        /// Card payload files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Passphrase (prompted if omitted)
        #[arg(long)]
        passphrase: Option<String>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Recompute a card from its payload for reprinting
    Duplicate {
        /// Card payload file
        file: PathBuf,

        /// Copies to print
        #[arg(long, default_value = "1")]
        copies: u32,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Show the hashes and layout of a card payload
    Inspect {
        /// Card payload file
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("paper_vault=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Create {
            secrets,
            generate_mnemonic: strength,
            mnemonic,
            passphrases,
            profile,
            label,
            challenge,
            copies,
            out,
        } => cmd_create(
            config,
            mnemonic_secrets(secrets, strength, mnemonic)?,
            passphrases,
            profile,
            Metadata { label, challenge },
            copies,
            &out,
        ),

        Commands::Restore {
            files,
            passphrase,
            output,
        } => cmd_restore(config, &files, passphrase, output),

        Commands::Duplicate { file, copies, out } => cmd_duplicate(config, &file, copies, &out),

        Commands::Inspect { file } => cmd_inspect(config, &file),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn prompt_password(prompt: &str) -> Result<String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Ok(password),
        Err(_) => {
            eprint!("{}", prompt);
            io::stderr().flush()?;
            let mut password = String::new();
            io::stdin().read_line(&mut password)?;
            Ok(password.trim().to_string())
        }
    }
}

/// Prepend a generated seed phrase and, if asked, check every secret is one.
fn mnemonic_secrets(
    mut secrets: Vec<String>,
    generate: Option<Strength>,
    check: bool,
) -> Result<Vec<String>> {
    if let Some(strength) = generate {
        let phrase = generate_mnemonic(strength)?;
        println!("Generated {}-bit seed phrase (write it down):", strength);
        println!("  {}", phrase.as_str());
        secrets.insert(0, phrase.as_str().to_string());
    }
    if check {
        if let Some(index) = secrets.iter().position(|s| !validate_mnemonic(s)) {
            bail!("Secret {} is not a valid BIP39 seed phrase", index + 1);
        }
    }
    Ok(secrets)
}

fn read_payload(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn cmd_create(
    config: EngineConfig,
    messages: Vec<String>,
    mut passphrases: Vec<String>,
    profile: Option<ThresholdProfile>,
    metadata: Metadata,
    copies: u32,
    out: &Path,
) -> Result<()> {
    if passphrases.len() > messages.len() {
        bail!("More passphrases than secrets");
    }
    for index in passphrases.len()..messages.len() {
        let passphrase = prompt_password(&format!("Passphrase for secret {}: ", index + 1))?;
        let confirm = prompt_password("Confirm passphrase: ")?;
        if passphrase != confirm {
            bail!("Passphrases do not match");
        }
        passphrases.push(passphrase);
    }

    let secrets: Vec<Secret> = messages
        .into_iter()
        .zip(passphrases)
        .map(|(message, passphrase)| Secret::new(message, passphrase))
        .collect();
    let mode = profile.map(|p| p.mode()).unwrap_or(Mode::Direct);

    let engine = Engine::new(config)?;
    let cards = engine.create(&secrets, mode, metadata)?;

    println!("Created {} card(s) in {}", cards.len(), out.display());
    for card in cards {
        let card = card.with_copies(copies);
        let path = card
            .save(out)
            .with_context(|| format!("writing card {}", card.short_hash))?;
        println!("  {}  x{}  {}", card.short_hash, card.copies, path.display());
    }

    Ok(())
}

fn cmd_restore(
    config: EngineConfig,
    files: &[PathBuf],
    passphrase: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut engine = Engine::new(config)?;
    let session = engine.open_session();
    let mut passphrase = match passphrase {
        Some(passphrase) => passphrase,
        None => prompt_password("Passphrase: ")?,
    };

    for file in files {
        let text = read_payload(file)?;
        let mut step = engine.scan(session, &text)?;
        let mut attempts = 1;

        loop {
            step = match step {
                Step::AwaitingPassphrase => engine.unlock(session, &[passphrase.as_str()])?,
                Step::PassphraseRejected if attempts < MAX_ATTEMPTS => {
                    eprintln!("Wrong passphrase for {}", file.display());
                    passphrase = prompt_password("Passphrase: ")?;
                    attempts += 1;
                    engine.unlock(session, &[passphrase.as_str()])?
                }
                Step::PassphraseRejected => {
                    bail!("No layer of {} opens with this passphrase", file.display())
                }
                Step::Ignored => {
                    eprintln!("{}: not a card payload, skipped", file.display());
                    break;
                }
                Step::AwaitingMoreShares(progress) => {
                    let note = if progress.duplicate { " (already scanned)" } else { "" };
                    eprintln!(
                        "{}: {} of {} shares{}",
                        file.display(),
                        progress.collected,
                        progress.threshold,
                        note
                    );
                    break;
                }
                Step::Recovered(secret) => {
                    if std::str::from_utf8(&secret).is_ok_and(validate_mnemonic) {
                        eprintln!("Recovered secret is a valid BIP39 seed phrase");
                    }
                    match &output {
                        Some(path) => {
                            fs::write(path, secret.as_slice())
                                .with_context(|| format!("writing {}", path.display()))?;
                            println!("Wrote {} bytes to {}", secret.len(), path.display());
                        }
                        None => {
                            io::stdout().write_all(&secret)?;
                            println!();
                        }
                    }
                    return Ok(());
                }
            };
        }
    }

    bail!("Not enough shares to recover the secret")
}

fn cmd_duplicate(config: EngineConfig, file: &Path, copies: u32, out: &Path) -> Result<()> {
    let engine = Engine::new(config)?;
    let record = engine.parse(&read_payload(file)?)?;
    let card = engine.duplicate(record)?.with_copies(copies);
    let path = card.save(out)?;

    println!("  {}  x{}  {}", card.short_hash, card.copies, path.display());
    Ok(())
}

fn cmd_inspect(config: EngineConfig, file: &Path) -> Result<()> {
    let engine = Engine::new(config)?;
    let record = engine.parse(&read_payload(file)?)?;
    let card = engine.duplicate(record)?;

    println!("Card Information");
    println!("================");
    println!("Hash:             {}", card.hash);
    println!("Short hash:       {}", card.short_hash);
    println!("Label:            {}", card.label.as_deref().unwrap_or("-"));
    println!(
        "Challenge:        {}",
        card.record.metadata.challenge.as_deref().unwrap_or("-")
    );
    println!();
    println!("Layout:");
    println!("  Headers:        {} bytes", card.record.headers.len());
    println!("  Data:           {} bytes", card.record.data.len());
    println!("  Total:          {} bytes", card.record.size());

    Ok(())
}
