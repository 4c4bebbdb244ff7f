//! MedTriage command-line front end.
//!
//! Runs one intake through the assessment wizard and, with `run`, on through
//! hospital matching, navigation and handoff using the demo providers.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use medtriage::config::{self, ClassifierMode, Config};
use medtriage::core::{AssessmentGateway, Classifier, LocalClassifier, RemoteClassifier};
use medtriage::models::{PatientForm, PatientInfo, SymptomInput, VitalsForm, VitalsInput};
use medtriage::providers::{
    LedgerHandoffEmitter, SessionProvider, StaticHospitalDirectory, StaticRouteProvider, StaticSession,
};
use medtriage::report;
use medtriage::workflow::{DispositionOrchestrator, DispositionProviders, Outcome, WizardOrchestrator};

#[derive(Parser)]
#[command(name = "medtriage", about = "First-responder triage assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a patient and print the triage report
    Assess(IntakeArgs),
    /// Assess, then match a hospital, navigate and hand off
    Run(IntakeArgs),
}

#[derive(Args)]
struct IntakeArgs {
    /// Selected symptom tag, repeatable
    #[arg(short, long = "symptom")]
    symptoms: Vec<String>,
    /// Comma-separated symptoms typed as free text
    #[arg(long, default_value = "")]
    notes: String,
    #[arg(long, default_value = "")]
    age: String,
    #[arg(long, default_value = "")]
    gender: String,
    #[arg(long, default_value = "")]
    lat: String,
    #[arg(long, default_value = "")]
    lng: String,
    #[arg(long, default_value = "")]
    heart_rate: String,
    #[arg(long, default_value = "")]
    bp_systolic: String,
    #[arg(long, default_value = "")]
    bp_diastolic: String,
    #[arg(long, default_value = "")]
    temperature: String,
    #[arg(long, default_value = "")]
    spo2: String,
    #[arg(long, default_value = "")]
    respiratory_rate: String,
    /// AVPU: alert, verbal (or voice), pain or unresponsive
    #[arg(long, default_value = "")]
    consciousness: String,
    /// Use the offline rule set instead of the hosted classifier
    #[arg(long)]
    local: bool,
    /// Print the assessment as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

impl IntakeArgs {
    fn patient(&self) -> PatientInfo {
        PatientInfo::from(&PatientForm {
            age: self.age.clone(),
            gender: self.gender.clone(),
            lat: self.lat.clone(),
            lng: self.lng.clone(),
            ..PatientForm::default()
        })
    }

    fn symptoms(&self) -> SymptomInput {
        SymptomInput::new(self.symptoms.iter().cloned(), self.notes.clone())
    }

    fn vitals(&self) -> VitalsInput {
        VitalsInput::from(&VitalsForm {
            heart_rate: self.heart_rate.clone(),
            bp_systolic: self.bp_systolic.clone(),
            bp_diastolic: self.bp_diastolic.clone(),
            temperature: self.temperature.clone(),
            spo2: self.spo2.clone(),
            respiratory_rate: self.respiratory_rate.clone(),
            consciousness: self.consciousness.clone(),
        })
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medtriage=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn classifier(config: &Config, force_local: bool) -> Result<Arc<dyn Classifier>> {
    if force_local || config.classifier.mode == ClassifierMode::Local {
        info!("using offline classifier");
        return Ok(Arc::new(LocalClassifier));
    }
    let remote = RemoteClassifier::from_config(&config.classifier).context("building classifier client")?;
    info!(endpoint = %remote.endpoint(), "using remote classifier");
    Ok(Arc::new(remote))
}

/// Walk the wizard from idle to the result step.
async fn run_wizard(config: &Config, args: &IntakeArgs) -> Result<WizardOrchestrator> {
    let wizard = WizardOrchestrator::new(AssessmentGateway::new(classifier(config, args.local)?));
    wizard.start()?;
    wizard.update_patient(args.patient())?;
    wizard.next()?;
    wizard.update_symptoms(args.symptoms())?;
    wizard.next()?;
    wizard.update_vitals(args.vitals())?;

    match wizard.assess().await? {
        Outcome::Applied(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::triage_report(&result));
            }
            Ok(wizard)
        }
        Outcome::Failed(err) => bail!("assessment failed ({}): {err}", err.kind()),
        other => bail!("assessment did not complete: {other:?}"),
    }
}

async fn run_disposition(config: &Config, wizard: &WizardOrchestrator) -> Result<()> {
    wizard.proceed_to_report()?;
    let case = wizard.case().context("no completed case")?;

    let ledger = Arc::new(LedgerHandoffEmitter::new());
    let disposition = DispositionOrchestrator::new(
        case,
        DispositionProviders {
            search: Arc::new(StaticHospitalDirectory::default()),
            routes: Arc::new(StaticRouteProvider::default()),
            handoff: ledger.clone(),
        },
    )
    .with_last_known(config.dispatch.last_known());

    if let Outcome::Failed(err) = disposition.search().await? {
        bail!("hospital search failed: {err}");
    }
    let candidates = disposition.snapshot().candidates;
    println!();
    println!("Matched hospitals:");
    for hospital in &candidates {
        println!(
            "  {:>3}%  {} ({:.1} km, {} min)",
            hospital.match_score, hospital.name, hospital.distance_km, hospital.eta_minutes
        );
    }
    let top = candidates.first().context("no hospital available")?;

    match disposition.select(&top.id).await? {
        Outcome::Applied(_) => {
            println!();
            println!("Route to {}:", top.name);
            print!("{}", report::route_summary(&disposition.snapshot().route_steps));
        }
        Outcome::Failed(err) => warn!(kind = err.kind(), "route unavailable: {err}"),
        _ => {}
    }

    disposition.begin_handoff()?;
    match disposition.emit_handoff().await? {
        Outcome::Applied(confirmation) => {
            println!();
            println!("Handoff {} sent to {}", confirmation.reference, confirmation.hospital_id);
            println!("Ledger hash: {}", confirmation.hash);
        }
        Outcome::Failed(err) => bail!("handoff failed: {err}"),
        _ => {}
    }
    disposition.finish_handoff()?;

    if !ledger.verify()? {
        bail!("handoff ledger failed verification");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = config::load_config().context("loading configuration")?;
    let session = StaticSession::from(&config.session);
    if session.is_active() {
        info!(role = session.role_label(), "session active");
    } else {
        warn!("no active session role");
    }

    match &cli.command {
        Commands::Assess(args) => {
            run_wizard(&config, args).await?;
        }
        Commands::Run(args) => {
            let wizard = run_wizard(&config, args).await?;
            run_disposition(&config, &wizard).await?;
        }
    }
    Ok(())
}
