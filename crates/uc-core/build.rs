use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let manifest_dir = PathBuf::from(std::env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").unwrap_or_default());
    let config = std::env::var_os(uc_config::ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|| manifest_dir.join(uc_config::CONFIG_FILE_NAME));

    match uc_config::generate(&config, &out_dir) {
        Ok(output) => {
            output.emit();
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("cargo:rerun-if-changed={}", config.display());
            println!("cargo:rerun-if-env-changed={}", uc_config::ENV_CONFIG_PATH);
            eprintln!("utils-conf: {}", err);
            if let Some(report) = err.report() {
                for e in &report.errors {
                    eprintln!("  - {}", e);
                }
            }
            ExitCode::FAILURE
        }
    }
}
