use std::path::PathBuf;
use std::time::Duration;

use checkin_client::{
    adapters::{http::HttpBackend, line_source::LineSource},
    config::Config,
    domain::{
        models::{Attendee, DeleteRequest, RegisterRequest, Registration},
        ports::CheckinApi,
        scan::{ScanSession, ScanStatus},
        token::extract_token,
    },
    scanner::ScanVerifier,
};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(
    name = "checkin",
    version,
    about = "Event check-in desk: register attendees, verify QR tickets, export attendance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend origin, overrides `backend.base_url`
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register an attendee and save their QR code
    Register(RegisterArgs),

    /// Verify a single ticket token or verification URL
    Verify(VerifyArgs),

    /// Verify codes produced by a QR decoder on standard input
    Scan(ScanArgs),

    /// Download the attendance spreadsheet
    Export(ExportArgs),

    /// Delete an attendee record
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: Option<String>,

    /// Phone number, e.g. "+234 800 000 0000"
    #[arg(long)]
    pub phone: String,

    /// Amount paid
    #[arg(long, default_value_t = 0.0)]
    pub amount: f64,

    /// Mode of attendance, e.g. physical or virtual
    #[arg(long, default_value = "physical")]
    pub mode: String,

    /// Directory the QR image is written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub qr_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Token, or the verification URL encoded in the QR code
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Stop after the first verified or rejected code
    #[arg(long)]
    pub once: bool,

    /// Minimum delay between decode passes, overrides `scanner.scan_delay_ms`
    #[arg(long, value_name = "MS")]
    pub scan_delay_ms: Option<u64>,

    /// How long a result is shown before scanning resumes, overrides `scanner.reset_delay_ms`
    #[arg(long, value_name = "MS")]
    pub reset_delay_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(short, long, default_value = "attendance.xlsx")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: String,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let backend = HttpBackend::new(&config.backend.base_url, config.backend.timeout())?;
    tracing::debug!(base_url = %backend.base_url(), "Using backend");

    match cli.command {
        Commands::Register(args) => register(&backend, args).await,
        Commands::Verify(args) => verify(&backend, args).await,
        Commands::Scan(args) => scan(backend, &config, args).await,
        Commands::Export(args) => export(&backend, args).await,
        Commands::Delete(args) => delete(&backend, args).await,
    }
}

async fn register(backend: &HttpBackend, args: RegisterArgs) -> Result<()> {
    let request = RegisterRequest {
        name: args.name.trim().to_string(),
        email: args
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()),
        phone_number: args.phone.trim().to_string(),
        amount: args.amount,
        mode_of_attendance: args.mode.trim().to_string(),
    };

    let registration = backend.register(&request).await?;
    let path = args.qr_dir.join(registration.qr_file_name());
    let image = registration
        .qr_image()
        .wrap_err("Backend returned an unreadable QR code")?;
    tokio::fs::write(&path, image)
        .await
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;

    print_registration(&registration);
    println!("💾 QR code saved to {}", path.display());
    Ok(())
}

async fn verify(backend: &HttpBackend, args: VerifyArgs) -> Result<()> {
    let token = extract_token(args.payload.trim());
    if token.is_empty() {
        return Err(eyre!("No token found. Please scan a valid QR code."));
    }

    let verification = backend.verify(&token).await?;
    println!("✅ Ticket Confirmed");
    if let Some(message) = &verification.message {
        println!("{message}");
    }
    print_attendee(&verification.attendee);
    Ok(())
}

async fn scan(backend: HttpBackend, config: &Config, args: ScanArgs) -> Result<()> {
    let scan_delay = args
        .scan_delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.scanner.scan_delay());
    let reset_delay = args
        .reset_delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.scanner.reset_delay());

    let mut source = LineSource::new(BufReader::new(tokio::io::stdin()), scan_delay);
    let mut verifier = ScanVerifier::new(backend);

    println!("📷 Event QR Verification: waiting for codes on standard input");
    while verifier.scan_once(&mut source).await.is_some() {
        print_session(verifier.session());
        if args.once {
            break;
        }
        verifier.reset_after(&mut source, reset_delay).await;
    }
    Ok(())
}

async fn export(backend: &HttpBackend, args: ExportArgs) -> Result<()> {
    let spreadsheet = backend.export_attendance().await?;
    tokio::fs::write(&args.output, &spreadsheet)
        .await
        .wrap_err_with(|| format!("Failed to write {}", args.output.display()))?;
    println!("📄 Attendance saved to {}", args.output.display());
    Ok(())
}

async fn delete(backend: &HttpBackend, args: DeleteArgs) -> Result<()> {
    let request = DeleteRequest {
        name: args.name.trim().to_string(),
        phone_number: args.phone.trim().to_string(),
    };
    let message = backend.delete_attendee(&request).await?;
    println!("🗑️  {message}");
    Ok(())
}

fn print_session(session: &ScanSession) {
    match (session.status, &session.attendee) {
        (ScanStatus::Success, Some(attendee)) => {
            println!("✅ Verified Attendee");
            print_attendee(attendee);
        }
        (ScanStatus::Error, _) => println!("❌ {}", session.last_error),
        (status, _) => tracing::debug!(%status, "Nothing to show"),
    }
}

fn print_attendee(attendee: &Attendee) {
    println!("   Name:  {}", attendee.name);
    if !attendee.email.is_empty() {
        println!("   Email: {}", attendee.email);
    }
    if let Some(phone) = &attendee.phone_number {
        println!("   Phone: {phone}");
    }
    if !attendee.event_name.is_empty() {
        println!("   Event: {}", attendee.event_name);
    }
    if let Some(ticket_type) = &attendee.ticket_type {
        println!("   Ticket Type: {ticket_type}");
    }
    if let Some(mode) = &attendee.mode_of_attendance {
        println!("   Mode:  {mode}");
    }
}

fn print_registration(registration: &Registration) {
    if let Some(message) = &registration.message {
        println!("{message}");
    }
    if registration.already_registered() {
        println!("✓ QR Code Already Registered");
    } else {
        println!("✓ QR Code Generated!");
    }

    println!("Attendee Details");
    for (label, value) in registration.details() {
        println!("   {label}: {value}");
    }
    println!("🔗 Verification URL: {}", registration.verification_url);
}
