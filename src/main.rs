use clap::Parser;
use oppworks_backup::backup::backup_config::run_backup;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;

/// Archive the OppWorks data directories into a timestamped zip file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Root directory holding the source trees and the backups output
    #[arg(short, long, env = "OPP_DATA_ROOT", default_value = ".")]
    root: PathBuf,
}

fn main() {
    // Logs go to stderr; stdout carries only the confirmation line
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    match run_backup(&args.root) {
        Ok(archive_path) => {
            println!("Backup written to {}", archive_path.display());
        }
        Err(e) => {
            error!("{e}");
            exit(1);
        }
    }
}
