//! Rust code generation for build scripts.
//!
//! A consuming crate's `build.rs` resolves its configuration file at build
//! time and writes the binding set as `const` items into `OUT_DIR`. Any
//! resolution error fails the build; minor schema drift surfaces as a cargo
//! warning.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::binding::{AllocBinding, BindingSet};
use crate::error::ConfigError;
use crate::resolve::{Resolution, Resolver};
use crate::sources::{load_file, ENV_CONFIG_PATH};

/// File written into `OUT_DIR`.
pub const GENERATED_FILE_NAME: &str = "utils_conf_bindings.rs";

fn str_lit(s: &str) -> String {
    format!("{:?}", s)
}

fn opt_u32(v: Option<u32>) -> String {
    match v {
        Some(n) => format!("Some({:#x})", n),
        None => "None".to_string(),
    }
}

fn opt_str(v: Option<&str>) -> String {
    match v {
        Some(s) => format!("Some({})", str_lit(s)),
        None => "None".to_string(),
    }
}

fn push_const(out: &mut String, name: &str, ty: &str, value: &str) {
    out.push_str(&format!("pub const {}: {} = {};\n", name, ty, value));
}

fn push_alloc(out: &mut String, prefix: &str, binding: Option<&AllocBinding>) {
    push_const(
        out,
        &format!("{}_DEFAULT_ENABLED", prefix),
        "bool",
        &binding.map(|b| b.default_enabled).unwrap_or(false).to_string(),
    );
    push_const(
        out,
        &format!("{}_TYPE", prefix),
        "Option<&str>",
        &opt_str(binding.map(|b| b.backend.as_str())),
    );
    push_const(
        out,
        &format!("{}_INCLUDE", prefix),
        "Option<&str>",
        &opt_str(binding.map(|b| b.include.as_str())),
    );
    push_const(
        out,
        &format!("{}_MALLOC", prefix),
        "Option<&str>",
        &opt_str(binding.map(|b| b.malloc_symbol.as_str())),
    );
    push_const(
        out,
        &format!("{}_FREE", prefix),
        "Option<&str>",
        &opt_str(binding.map(|b| b.free_symbol.as_str())),
    );
    push_const(
        out,
        &format!("{}_ALIGN", prefix),
        "Option<u32>",
        &opt_u32(binding.and_then(|b| b.align)),
    );
    push_const(
        out,
        &format!("{}_CAPS", prefix),
        "Option<u32>",
        &opt_u32(binding.and_then(|b| b.caps_mask)),
    );
}

/// Render the binding set as Rust `const` items.
pub fn render_bindings(bindings: &BindingSet) -> Result<String, ConfigError> {
    let v = bindings.schema_version;
    let mut out = String::from("// @generated by uc-config. Do not edit.\n\n");

    push_const(&mut out, "SCHEMA_VERSION_MAJOR", "u32", &v.major.to_string());
    push_const(&mut out, "SCHEMA_VERSION_MINOR", "u32", &v.minor.to_string());
    push_const(&mut out, "SCHEMA_VERSION_PATCH", "u32", &v.patch.to_string());
    out.push('\n');

    push_const(
        &mut out,
        "CHECK_HANDLE_METHOD",
        "&str",
        &str_lit(bindings.check_handle_method.as_str()),
    );
    push_const(&mut out, "LOG_LEVEL", "&str", &str_lit(bindings.log.level.as_str()));
    push_const(&mut out, "LOG_BACKEND", "&str", &str_lit(bindings.log.backend.as_str()));
    push_const(
        &mut out,
        "LOG_TRACE_ON_ENTER_EXIT",
        "bool",
        &bindings.log.trace_enter_exit.to_string(),
    );
    out.push('\n');

    push_alloc(&mut out, "GENERAL_ALLOC", Some(&bindings.general_alloc));
    out.push('\n');

    push_const(
        &mut out,
        "CXX_GLOBAL_ALLOC_OVERRIDE",
        "bool",
        &bindings.cxx_global_alloc.is_some().to_string(),
    );
    push_alloc(&mut out, "CXX_GLOBAL_ALLOC", bindings.cxx_global_alloc.as_ref());
    out.push('\n');

    push_const(&mut out, "PLUGIN_SUPPORT", "bool", &bindings.plugin_support.to_string());
    push_const(
        &mut out,
        "BINDINGS_FINGERPRINT",
        "&str",
        &str_lit(&bindings.fingerprint()?),
    );
    push_const(
        &mut out,
        "BINDINGS_JSON",
        "&str",
        &str_lit(&bindings.to_canonical_json()?),
    );
    Ok(out)
}

/// Result of running the build-time resolution.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub resolution: Resolution,
    pub out_file: PathBuf,
    /// `cargo:` lines for the build script to print.
    pub directives: Vec<String>,
}

impl BuildOutput {
    /// Print the cargo directives. Call from `build.rs` only.
    pub fn emit(&self) {
        for line in &self.directives {
            println!("{}", line);
        }
    }
}

/// Resolve `config_path` and write the generated bindings into `out_dir`.
pub fn generate(config_path: &Path, out_dir: &Path) -> Result<BuildOutput, ConfigError> {
    let mut directives = vec![
        format!("cargo:rerun-if-changed={}", config_path.display()),
        format!("cargo:rerun-if-env-changed={}", ENV_CONFIG_PATH),
    ];

    let options = load_file(config_path)?;
    let resolution = Resolver::new(options).bind()?;
    for warning in &resolution.warnings {
        directives.push(format!("cargo:warning=utils-conf: {}", warning));
    }

    let code = render_bindings(&resolution.bindings)?;
    let out_file = out_dir.join(GENERATED_FILE_NAME);
    std::fs::write(&out_file, code).map_err(|source| ConfigError::Io {
        path: out_file.clone(),
        source,
    })?;
    debug!(out = %out_file.display(), "bindings generated");

    Ok(BuildOutput {
        resolution,
        out_file,
        directives,
    })
}
