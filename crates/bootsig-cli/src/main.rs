//! Command-line interface for bootsig Android boot image signing tool.
//!
//! Signs boot images with a PEM certificate and private key, verifies
//! embedded boot signatures, and prints boot image header information.

use bootsig::crypto::cert::parse_certificate_any;
use bootsig::{BootImage, HashAlgorithm, RsaSigningIdentity};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bootsig")]
#[command(about = "Android verified boot image signing tool")]
struct Cli {
    /// Print debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign a boot image, replacing any existing signature
    Sign {
        /// Input boot image
        input: PathBuf,

        /// Output file (default: <input>.signed)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Certificate file (PEM format)
        #[arg(short = 'c', long = "cert")]
        certificate: PathBuf,

        /// Private key file (PKCS#8 or PKCS#1 PEM)
        #[arg(short = 'k', long = "key")]
        private_key: PathBuf,

        /// Hash algorithm (SHA256 or SHA512)
        #[arg(long, default_value = "SHA256")]
        hash: HashAlgorithm,

        /// Partition the image is signed for
        #[arg(short, long, default_value = "/boot")]
        target: String,
    },

    /// Verify the signature of a boot image
    Verify {
        /// Input boot image
        input: PathBuf,

        /// Require the image to be signed by this certificate (PEM or DER)
        #[arg(short = 'c', long = "cert")]
        certificate: Option<PathBuf>,
    },

    /// Print boot image header and signature details
    Info {
        /// Input boot image
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Sign {
            input,
            output,
            certificate,
            private_key,
            hash,
            target,
        } => {
            let output = output.unwrap_or_else(|| default_output(&input));
            sign(&input, &output, &certificate, &private_key, hash, &target)?;
            println!("Signed: {}", output.display());
        }
        Command::Verify { input, certificate } => {
            let target = verify(&input, certificate.as_deref())?;
            println!("Verified: {} (target {})", input.display(), target);
        }
        Command::Info { input } => {
            print!("{}", info(&input)?);
        }
    }

    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let mut out = input.as_os_str().to_os_string();
    out.push(".signed");
    PathBuf::from(out)
}

fn sign(
    input: &Path,
    output: &Path,
    certificate: &Path,
    private_key: &Path,
    hash: HashAlgorithm,
    target: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cert_data = std::fs::read(certificate)?;
    let key_data = std::fs::read(private_key)?;
    let mut identity = RsaSigningIdentity::from_pem(&cert_data, &key_data, hash)?;

    let mut image = BootImage::new(&std::fs::read(input)?)?;
    image.sign(target, &mut identity)?;

    let signed = image.signed_bytes().ok_or("signing produced no output")?;
    std::fs::write(output, signed)?;
    Ok(())
}

fn verify(input: &Path, certificate: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    let expected = match certificate {
        Some(path) => Some(parse_certificate_any(&std::fs::read(path)?)?),
        None => None,
    };

    let mut image = BootImage::new(&std::fs::read(input)?)?;
    let verified = image.verify(expected.as_ref().map(|c| c.constructed_data()))?;
    Ok(verified.target)
}

fn info(input: &Path) -> Result<String, Box<dyn std::error::Error>> {
    use std::fmt::Write;

    let mut image = BootImage::new(&std::fs::read(input)?)?;
    let header = *image.header();
    let mut out = String::new();

    writeln!(out, "kernel:   size {:#x} addr {:#010x}", header.kernel_size, header.kernel_addr)?;
    writeln!(out, "ramdisk:  size {:#x} addr {:#010x}", header.ramdisk_size, header.ramdisk_addr)?;
    writeln!(out, "second:   size {:#x} addr {:#010x}", header.second_size, header.second_addr)?;
    writeln!(out, "tags:     addr {:#010x}", header.tags_addr)?;
    writeln!(out, "page:     {}", header.page_size)?;
    writeln!(out, "signable: {} of {} bytes", image.signable_length()?, image.raw().len())?;

    if !image.is_signed() {
        writeln!(out, "signed:   no")?;
        return Ok(out);
    }

    if let Some(signature) = image.signature() {
        let algorithm = signature
            .algorithm()
            .resolve()
            .map(|a| a.to_string())
            .unwrap_or_else(|e| e.to_string());
        writeln!(out, "signed:   yes")?;
        writeln!(out, "target:   {}", signature.target())?;
        writeln!(out, "length:   {}", signature.authenticated_length())?;
        writeln!(out, "algorithm: {}", algorithm)?;
        match signature.signer() {
            Ok(cert) => writeln!(
                out,
                "signer:   {}",
                cert.subject_common_name().unwrap_or_else(|| "<no common name>".into())
            )?,
            Err(e) => writeln!(out, "signer:   <{}>", e)?,
        }
    }

    Ok(out)
}
