use csv2ofx_rs::{CsvTable, ExportBuilder, ExportFormat, MappingProfile, ProfileCatalog};
use std::{env, path::Path};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // convert [input.csv] [profile name | profile.json] [output.ofx | output.qif]
    let args: Vec<String> = env::args().collect();
    let input = args.get(1).map(String::as_str).unwrap_or("demos/sample.csv");
    let profile_arg = args.get(2).map(String::as_str).unwrap_or("Credit Union");

    let catalog = ProfileCatalog::builtin()?;
    let custom;
    let profile = if profile_arg.ends_with(".json") {
        custom = MappingProfile::from_path(profile_arg)?;
        &custom
    } else {
        catalog.require(profile_arg)?
    };

    let output = match args.get(3) {
        Some(path) => path.clone(),
        None => Path::new(input)
            .with_extension(ExportFormat::Ofx.default_extension())
            .display()
            .to_string(),
    };

    let table = CsvTable::from_path(input, &profile.params)?;
    let summary = ExportBuilder::new()
        .profile(profile)
        .export_to_path(&table, &output)?;

    println!("Wrote {output} using profile '{}'", profile.name);
    println!(
        "  {} account(s), {} transaction(s), {} split(s), {} skipped",
        summary.accounts, summary.transactions, summary.splits, summary.skipped
    );
    for warning in &summary.warnings {
        println!("  warning: {warning:?}");
    }

    if args.len() < 2 {
        println!("\nAvailable profiles:");
        for name in catalog.names() {
            println!("  {name}");
        }
    }

    Ok(())
}
