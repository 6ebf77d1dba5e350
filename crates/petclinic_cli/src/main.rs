//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `petclinic_core` linkage against a configured database.
//! - Print a deterministic report: version, vets, and an owner search.
//!
//! Usage: `petclinic_cli [last-name]`. Settings come from `PETCLINIC_*`
//! environment variables (see `petclinic_core::config`).

use log::error;
use petclinic_core::{init_from_config, ClinicConfig, ClinicService, SqliteClinicRepository};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("petclinic_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = ClinicConfig::from_env()?;
    init_from_config(&config)?;

    let conn = config.open_database()?;
    let service = ClinicService::with_config(SqliteClinicRepository::try_new(&conn)?, &config);

    println!("petclinic_core ping={}", petclinic_core::ping());
    println!("petclinic_core version={}", petclinic_core::core_version());

    for vet in service.find_vets()? {
        let specialties: Vec<&str> = vet
            .specialties()
            .iter()
            .map(|specialty| specialty.name.as_str())
            .collect();
        let specialties = if specialties.is_empty() {
            "none".to_string()
        } else {
            specialties.join(",")
        };
        println!(
            "vet id={} name={} {} specialties={}",
            vet.id.unwrap_or_default(),
            vet.first_name,
            vet.last_name,
            specialties
        );
    }

    let last_name = std::env::args().nth(1).unwrap_or_default();
    let owners = service.find_owner_by_last_name(&last_name)?;
    println!(
        "owners match={} query={:?} count={}",
        service.last_name_match().as_str(),
        last_name,
        owners.len()
    );
    for owner in owners {
        println!(
            "owner id={} name={} {} city={} pets={}",
            owner.id.unwrap_or_default(),
            owner.first_name,
            owner.last_name,
            owner.city,
            owner.pets.len()
        );
    }
    Ok(())
}
