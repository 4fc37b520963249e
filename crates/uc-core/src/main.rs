//! uc-core: resolve, validate and inspect utils-conf configuration.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use uc_config::{
    get_preset, list_presets, load_options, render_bindings, BindingSet, ConfigError,
    ConfigSources, OptionMap, PresetName, Resolver, ResolutionSnapshot, SchemaVersion,
    CONFIG_FILE_NAME, OPTIONS, SCHEMA_VERSION,
};
use uc_core::exit_codes::ExitCode;
use uc_core::{baked, builtin_registry, logging};

#[derive(Parser, Debug)]
#[command(name = "uc-core", version, about = "Resolve and inspect utils-conf configuration")]
struct Cli {
    /// Output format. `rust` applies to `resolve`; other commands emit JSON
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Configuration file (TOML, or JSON by extension)
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override an option
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Ignore UTILS_CONF_* environment variables
    #[arg(long, global = true)]
    no_env: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Toml,
    Rust,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and bind the configuration
    Resolve,
    /// Report every validation error and warning
    Validate,
    /// Resolved value of one option
    Get {
        /// Option key (dashes or underscores, any case)
        key: String,
    },
    /// List recognized options with defaults and gates
    Options,
    /// Check a declared schema version against the library's
    CheckVersion {
        /// MAJOR.MINOR.PATCH
        version: String,
    },
    /// List presets, or show one preset's options
    Presets {
        /// Preset name
        name: Option<String>,
    },
    /// Write a configuration file from a preset
    Init {
        #[arg(long, default_value = "recommended")]
        preset: String,
        /// Destination (default: ./utils_conf.toml)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// JSON Schema of the binding set
    Schema,
    /// Bindings baked into this binary at build time
    Baked,
    /// Built-in plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PluginCommands {
    /// List registered plugins
    List,
    /// Invoke a plugin by id
    Invoke {
        id: String,
        /// JSON input
        #[arg(long, default_value = "null")]
        input: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let default_level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    if let Err(e) = logging::init_with_filter(
        default_level,
        uc_config::LogBackend::StandardLibrary,
        cli.log_json,
    ) {
        eprintln!("warning: {}", e);
    }

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => report_error(cli.format, &err),
    };
    std::process::exit(code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode, ConfigError> {
    match &cli.command {
        Commands::Resolve => run_resolve(cli),
        Commands::Validate => run_validate(cli),
        Commands::Get { key } => run_get(cli, key),
        Commands::Options => run_options(cli.format),
        Commands::CheckVersion { version } => run_check_version(cli.format, version),
        Commands::Presets { name } => run_presets(cli.format, name.as_deref()),
        Commands::Init {
            preset,
            output,
            force,
        } => run_init(cli.format, preset, output.clone(), *force),
        Commands::Schema => run_schema(),
        Commands::Baked => run_baked(cli.format),
        Commands::Plugin { command } => run_plugin(cli, command),
    }
}

fn sources(cli: &Cli) -> ConfigSources {
    let mut sources = ConfigSources {
        file: cli.config.clone(),
        overrides: cli.overrides.clone(),
        use_env: false,
    };
    if !cli.no_env {
        sources = sources.with_env();
    }
    sources
}

fn resolver(cli: &Cli) -> Result<(Resolver, Option<String>), ConfigError> {
    let sources = sources(cli);
    let source = sources.config_file().map(|p| p.display().to_string());
    Ok((Resolver::new(load_options(&sources)?), source))
}

fn emit<T: Serialize>(format: OutputFormat, value: &T) -> Result<(), ConfigError> {
    match format {
        OutputFormat::Toml => print!("{}", toml::to_string(value)?),
        OutputFormat::Json | OutputFormat::Rust => {
            println!("{}", serde_json::to_string_pretty(value)?)
        }
    }
    Ok(())
}

fn report_error(format: OutputFormat, err: &ConfigError) -> ExitCode {
    let code = ExitCode::from(err);
    match format {
        OutputFormat::Json => {
            let errors = err
                .report()
                .map(|r| serde_json::to_value(&r.errors).unwrap_or(Value::Null))
                .unwrap_or_else(|| json!([]));
            let body = json!({
                "status": "error",
                "exit_code": code.as_i32(),
                "error": err.to_string(),
                "errors": errors,
            });
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
        }
        OutputFormat::Toml | OutputFormat::Rust => {
            eprintln!("error: {}", err);
            if let Some(report) = err.report() {
                for e in &report.errors {
                    eprintln!("  - {}", e);
                }
            }
        }
    }
    code
}

fn run_resolve(cli: &Cli) -> Result<ExitCode, ConfigError> {
    let (resolver, source) = resolver(cli)?;
    let resolution = resolver.bind()?;
    for warning in &resolution.warnings {
        eprintln!("warning: {}", warning);
    }
    match cli.format {
        OutputFormat::Json => {
            let snapshot = ResolutionSnapshot::capture(&resolution, source)?;
            emit(cli.format, &snapshot)?;
        }
        OutputFormat::Toml => print!("{}", resolver.effective_options()?.to_toml_string()?),
        OutputFormat::Rust => print!("{}", render_bindings(&resolution.bindings)?),
    }
    Ok(ExitCode::from_warnings(!resolution.warnings.is_empty()))
}

fn run_validate(cli: &Cli) -> Result<ExitCode, ConfigError> {
    let (resolver, source) = resolver(cli)?;
    let report = resolver.validate();

    #[derive(Serialize)]
    struct ValidateOutput<'a> {
        valid: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        errors: &'a [uc_config::ValidationError],
        warnings: &'a [uc_config::ValidationWarning],
    }

    match cli.format {
        OutputFormat::Toml => {
            for e in &report.errors {
                println!("error: {}", e);
            }
            for w in &report.warnings {
                println!("warning: {}", w);
            }
        }
        _ => emit(
            cli.format,
            &ValidateOutput {
                valid: report.is_ok(),
                source,
                errors: &report.errors,
                warnings: &report.warnings,
            },
        )?,
    }

    let incompatible = report
        .errors
        .iter()
        .any(|e| matches!(e, uc_config::ValidationError::IncompatibleSchema { .. }));
    Ok(if incompatible {
        ExitCode::IncompatibleSchema
    } else if !report.is_ok() {
        ExitCode::ValidationError
    } else {
        ExitCode::from_warnings(report.has_warnings())
    })
}

fn run_get(cli: &Cli, key: &str) -> Result<ExitCode, ConfigError> {
    let (resolver, _) = resolver(cli)?;
    let key = uc_config::value::normalize_key(key);
    let spec = uc_config::lookup(&key).ok_or_else(|| ConfigError::UnknownOption(key.clone()))?;
    let value = resolver.resolve(&key)?;
    match cli.format {
        OutputFormat::Toml => print!("{}", OptionMap::new().with(&key, value).to_toml_string()?),
        _ => emit(
            cli.format,
            &json!({
                "key": key,
                "value": value,
                "set": resolver.options().contains(&key),
                "active": resolver.is_active(spec),
            }),
        )?,
    }
    Ok(ExitCode::Clean)
}

#[derive(Serialize)]
struct OptionEntry {
    key: &'static str,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gate: Option<String>,
    description: &'static str,
}

fn run_options(format: OutputFormat) -> Result<ExitCode, ConfigError> {
    let options: Vec<OptionEntry> = OPTIONS
        .iter()
        .map(|spec| OptionEntry {
            key: spec.key,
            kind: spec.kind.describe(),
            default: spec.default_value(SCHEMA_VERSION).map(|v| v.to_string()),
            gate: spec.gate.map(|g| g.describe()),
            description: spec.description,
        })
        .collect();
    emit(format, &json!({ "option": options }))?;
    Ok(ExitCode::Clean)
}

fn run_check_version(format: OutputFormat, version: &str) -> Result<ExitCode, ConfigError> {
    let declared: SchemaVersion = version.parse()?;
    let (compatible, compatibility, code) =
        match uc_common::check_compatibility(SCHEMA_VERSION, declared) {
            Ok(c) => (true, Some(c), ExitCode::from_warnings(c.is_warning())),
            Err(_) => (false, None, ExitCode::IncompatibleSchema),
        };
    let mut body = json!({
        "library": SCHEMA_VERSION,
        "declared": declared,
        "compatible": compatible,
    });
    if let Some(c) = compatibility {
        body["compatibility"] = serde_json::to_value(c)?;
    }
    emit(format, &body)?;
    Ok(code)
}

fn run_presets(format: OutputFormat, name: Option<&str>) -> Result<ExitCode, ConfigError> {
    match name {
        None => emit(format, &json!({ "preset": list_presets() }))?,
        Some(name) => {
            let preset: PresetName = name
                .parse()
                .map_err(|e: uc_config::PresetError| uc_common::Error::Config(e.to_string()))?;
            emit(format, &get_preset(preset))?;
        }
    }
    Ok(ExitCode::Clean)
}

fn run_init(
    format: OutputFormat,
    preset: &str,
    output: Option<PathBuf>,
    force: bool,
) -> Result<ExitCode, ConfigError> {
    let name: PresetName = preset
        .parse()
        .map_err(|e: uc_config::PresetError| uc_common::Error::Config(e.to_string()))?;
    let path = output.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if path.exists() && !force {
        return Err(uc_common::Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }

    let content = format!(
        "# utils-conf configuration (preset: {})\n{}",
        name,
        get_preset(name).to_toml_string()?
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    emit(
        format,
        &json!({
            "status": "created",
            "path": path.display().to_string(),
            "preset": name.as_str(),
        }),
    )?;
    Ok(ExitCode::Clean)
}

fn run_schema() -> Result<ExitCode, ConfigError> {
    let schema = schemars::schema_for!(BindingSet);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(ExitCode::Clean)
}

fn run_baked(format: OutputFormat) -> Result<ExitCode, ConfigError> {
    let bindings = baked::bindings()?;
    match format {
        OutputFormat::Toml => print!("{}", toml::to_string(&bindings)?),
        _ => emit(
            format,
            &json!({
                "fingerprint": baked::BINDINGS_FINGERPRINT,
                "bindings": bindings,
            }),
        )?,
    }
    Ok(ExitCode::Clean)
}

fn run_plugin(cli: &Cli, command: &PluginCommands) -> Result<ExitCode, ConfigError> {
    let (resolver, _) = resolver(cli)?;
    let resolution = resolver.bind()?;
    let registry = builtin_registry(&resolution.bindings, resolver.effective_options()?)?;
    match command {
        PluginCommands::List => {
            emit(cli.format, &json!({ "plugin": registry.list() }))?;
            Ok(ExitCode::Clean)
        }
        PluginCommands::Invoke { id, input } => {
            let request = uc_core::plugin::PluginRequest {
                plugin: id.clone(),
                input: serde_json::from_str(input)?,
            };
            let response = registry.dispatch(&request)?;
            emit(cli.format, &response)?;
            Ok(match response.status {
                uc_core::plugin::PluginStatus::Ok => ExitCode::Clean,
                uc_core::plugin::PluginStatus::Failed => ExitCode::InternalError,
            })
        }
    }
}
