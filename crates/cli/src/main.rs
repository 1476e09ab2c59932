use clap::{Parser, Subcommand};
use opd_core::{
    Actor, CompletionWorkflow, ConsultationRequest, CoreConfig, MemoryStore, SeedData,
};
use opd_types::NonEmptyText;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "opd")]
#[command(about = "OPD encounter system CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a seed file parses
    CheckSeed {
        /// Path to the master-data JSON file
        seed_file: String,
    },
    /// Validate a consultation request file without running it
    Validate {
        /// Path to the consultation request JSON file
        request_file: String,
    },
    /// Run a consultation request against a fresh in-memory store
    Complete {
        /// Path to the consultation request JSON file
        request_file: String,
        /// Path to the master-data JSON file to seed first
        #[arg(long)]
        seed: String,
        /// Name of the acting user
        #[arg(long)]
        name: String,
        /// Role of the acting user
        #[arg(long, default_value = "Receptionist")]
        role: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckSeed { seed_file }) => {
            let seed = SeedData::from_json(&std::fs::read_to_string(&seed_file)?)?;
            println!(
                "OK: {} doctors, {} medicines, {} doses, {} advice items",
                seed.doctors.len(),
                seed.medicines.len(),
                seed.doses.len(),
                seed.advice_items.len()
            );
        }
        Some(Commands::Validate { request_file }) => {
            let request: ConsultationRequest =
                serde_json::from_str(&std::fs::read_to_string(&request_file)?)?;
            request.validate()?;
            println!("OK: request is valid");
        }
        Some(Commands::Complete {
            request_file,
            seed,
            name,
            role,
        }) => {
            let request: ConsultationRequest =
                serde_json::from_str(&std::fs::read_to_string(&request_file)?)?;
            let performed_by = Actor::new(NonEmptyText::new(name)?, NonEmptyText::new(role)?);

            let store = MemoryStore::new();
            SeedData::from_json(&std::fs::read_to_string(&seed)?)?.apply(&store)?;

            let workflow = CompletionWorkflow::new(store, Arc::new(CoreConfig::default()));
            let outcome = workflow.complete_consultation(&request, &performed_by)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        None => {
            println!("No command provided. Try --help.");
        }
    }

    Ok(())
}
