use clap::Parser;
use fpgaverifier::measurements::{extract_measurements, MeasurementResponse, TcbInfoMeasurement};
use fpgaverifier::psg::{encoding, parse_chain, ChainValidator, LeafCertificate};
use fpgaverifier::rim::ReferenceManifest;
use std::error::Error;
use std::fs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
enum FpgaVerifierCli {
    Chain(ChainArgs),
    Measurements(MeasurementsArgs),
    Appraise(AppraiseArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Validate the supplied PSG certificate chain against the pinned \
    root entry")]
struct ChainArgs {
    /// Chain entries, base64 or hex
    #[arg(short, long, default_value = "chain.txt")]
    chain: String,

    /// The trusted root entry, base64 or hex
    #[arg(short, long, default_value = "root.txt")]
    root: String,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Extract the measurements from the supplied measurement response")]
struct MeasurementsArgs {
    #[arg(short, long, default_value = "measurements.bin")]
    evidence: String,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Appraise the supplied measurement response using the reference \
    measurements found in the RIM")]
struct AppraiseArgs {
    #[arg(short, long, default_value = "measurements.bin")]
    evidence: String,

    #[arg(short, long, default_value = "rim.json")]
    rim: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match FpgaVerifierCli::parse() {
        FpgaVerifierCli::Chain(args) => match validate_chain(&args) {
            Ok(leaf) => {
                println!("chain validation successful");
                println!("device key: {}", hex::encode(leaf.public_key.encode()));
            }
            Err(e) => eprintln!("chain validation failed: {e}"),
        },

        FpgaVerifierCli::Measurements(args) => match measurements(&args.evidence) {
            Ok(m) => match serde_json::to_string_pretty(&m) {
                Ok(j) => println!("{j}"),
                Err(e) => eprintln!("measurements extraction failed: {e}"),
            },
            Err(e) => eprintln!("measurements extraction failed: {e}"),
        },

        FpgaVerifierCli::Appraise(args) => match appraise(&args) {
            Ok(true) => println!("appraisal successful"),
            Ok(false) => println!("appraisal failed: measurements mismatch"),
            Err(e) => eprintln!("appraisal failed: {e}"),
        },
    }
}

fn validate_chain(args: &ChainArgs) -> Result<LeafCertificate, Box<dyn Error>> {
    let c = encoding::decode_auto(fs::read_to_string(&args.chain)?.trim())?;
    let r = encoding::decode_auto(fs::read_to_string(&args.root)?.trim())?;

    let chain = parse_chain(&c);

    Ok(ChainValidator::new(&r).validate(&chain)?)
}

fn measurements(path: &str) -> Result<Vec<TcbInfoMeasurement>, Box<dyn Error>> {
    let c: Vec<u8> = fs::read(path)?;

    let response = MeasurementResponse::decode(&c)?;

    Ok(extract_measurements(&response.records)?)
}

fn appraise(args: &AppraiseArgs) -> Result<bool, Box<dyn Error>> {
    let reported = measurements(&args.evidence)?;

    let j = fs::read_to_string(&args.rim)?;
    let rim = ReferenceManifest::parse(&j)?;

    if rim.is_empty() {
        return Err("reference manifest has no measurements".into());
    }

    Ok(rim.matches(&reported))
}
