//! Config validation CLI tool
//!
//! Validates a timeclock configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use timeclock_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a timeclock configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    // Check file exists
    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    // Try to load and validate
    match timeclock_config::load_config(&config_path) {
        Ok(config) => {
            let policy = &config.attendance;

            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", timeclock_config::CURRENT_CONFIG_VERSION);
            println!("  Data directory: {}", config.service.data_dir.display());
            if let Some(user) = &config.service.default_user {
                println!("  Default user:   {}", user);
            }
            println!();
            println!("Windows:");
            println!("  On-time check-in: {}", policy.on_time);
            println!("  Late check-in:    {}", policy.late);
            println!("  Check-out:        {}", policy.check_out);
            println!();
            println!("Payroll:");
            println!("  Standard work days:   {}", config.payroll.standard_work_days);
            println!("  Late penalty ratio:   {}", config.payroll.late_penalty_ratio);
            println!("  Overtime hourly rate: {}", config.payroll.overtime_hourly_rate);

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                timeclock_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                timeclock_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                timeclock_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                timeclock_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        timeclock_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
