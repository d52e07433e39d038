//! External provider modules.
//!
//! An external module is an executable found in the installation root's
//! `providers` directory or as `prept-<module>` on `PATH`. Each call runs it
//! once and talks JSON over stdout (and stdin for rendering requests):
//!
//! * `describe` prints `{"resolver": bool, "exports": {"<name>": <descriptor>}}`
//! * `resolve <name>` prints a descriptor, `null`, or `{"error": "<message>"}`
//! * `path <provider>` / `content <provider>` read a request from stdin and
//!   print the transformed path or content
//!
//! A descriptor is `{"prept_provider": 1, "name": "<provider>"}`; the
//! `prept_provider` field is the capability marker.

use super::{Content, Export, ProviderFactory, ProviderModule, TemplateProvider};
use crate::constants::PROVIDER_EXECUTABLE_PREFIX;
use crate::context::{GenerationContext, TemplateFile};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::rc::Rc;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    resolver: bool,
    #[serde(default)]
    exports: IndexMap<String, Value>,
}

fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Runs `program` with `args`, feeding `input` on stdin.
fn run(program: &Path, args: &[&str], input: Option<&[u8]>) -> std::io::Result<Output> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Some(input) = input {
            stdin.write_all(input)?;
        }
    }

    child.wait_with_output()
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {stderr}", output.status)
    }
}

/// A provider module backed by an executable.
#[derive(Debug)]
pub struct CommandModule {
    program: PathBuf,
    resolver: bool,
    exports: IndexMap<String, Value>,
}

impl CommandModule {
    /// Finds the executable of module `name`.
    ///
    /// # Arguments
    /// * `search_dirs` - Directories holding executables named after the module
    /// * `search_path` - Whether to also look for `prept-<name>` on `PATH`
    pub fn locate(name: &str, search_dirs: &[PathBuf], search_path: bool) -> Option<PathBuf> {
        if !is_valid_module_name(name) {
            return None;
        }
        if let Some(path) = search_dirs.iter().map(|dir| dir.join(name)).find(|p| p.is_file()) {
            return Some(path);
        }
        if !search_path {
            return None;
        }

        let executable =
            format!("{PROVIDER_EXECUTABLE_PREFIX}{name}{}", std::env::consts::EXE_SUFFIX);
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths).map(|dir| dir.join(&executable)).find(|p| p.is_file())
    }

    /// Loads the module by asking it to describe itself.
    ///
    /// # Errors
    /// * `Error::ProviderError` if the executable fails or prints anything but
    ///   a valid manifest
    pub fn load(program: PathBuf) -> Result<Self> {
        let provider_error = |reason: String| Error::ProviderError {
            provider: program.display().to_string(),
            reason,
        };

        let output = run(&program, &["describe"], None).map_err(|e| provider_error(e.to_string()))?;
        if !output.status.success() {
            return Err(provider_error(failure_reason(&output)));
        }
        let manifest: Manifest = serde_json::from_slice(&output.stdout)
            .map_err(|e| provider_error(format!("malformed manifest: {e}")))?;
        debug!(
            "Module {} has {} exports (resolver: {})",
            program.display(),
            manifest.exports.len(),
            manifest.resolver
        );

        Ok(Self { program, resolver: manifest.resolver, exports: manifest.exports })
    }

    fn export_from_descriptor(&self, name: &str, descriptor: &Value) -> Export {
        let marker = descriptor.get("prept_provider").and_then(Value::as_u64);
        let provider = descriptor.get("name").and_then(Value::as_str).unwrap_or(name).to_string();

        let program = self.program.clone();
        let factory_name = provider.clone();
        let factory: ProviderFactory = Rc::new(move || {
            Box::new(CommandProvider { program: program.clone(), name: factory_name.clone() })
        });
        Export::with_marker(provider, marker, factory)
    }
}

impl ProviderModule for CommandModule {
    fn has_resolver(&self) -> bool {
        self.resolver
    }

    fn resolve(&self, name: &str) -> Result<Option<Export>> {
        let output = run(&self.program, &["resolve", name], None).map_err(|e| {
            Error::provider_not_found(name, format!("resolver failed to run: {e}"))
        })?;
        if !output.status.success() {
            return Err(Error::provider_not_found(name, failure_reason(&output)));
        }

        let reply: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::provider_not_found(name, format!("malformed resolver reply: {e}")))?;
        match reply {
            Value::Null => Ok(None),
            Value::Object(ref data) if data.contains_key("error") => {
                let reason = match &data["error"] {
                    Value::String(message) => message.clone(),
                    other => other.to_string(),
                };
                Err(Error::ProviderUnavailable { provider: name.to_string(), reason })
            }
            descriptor => Ok(Some(self.export_from_descriptor(name, &descriptor))),
        }
    }

    fn export(&self, name: &str) -> Option<Export> {
        self.exports.get(name).map(|descriptor| self.export_from_descriptor(name, descriptor))
    }
}

/// Provider delegating each transformation to the module executable.
#[derive(Debug)]
pub struct CommandProvider {
    program: PathBuf,
    name: String,
}

impl CommandProvider {
    fn call(&self, action: &str, request: &Value) -> Result<Vec<u8>> {
        let output = run(&self.program, &[action, &self.name], Some(request.to_string().as_bytes()))
            .map_err(|e| Error::ProviderError { provider: self.name.clone(), reason: e.to_string() })?;
        if !output.status.success() {
            return Err(Error::ProviderError {
                provider: self.name.clone(),
                reason: failure_reason(&output),
            });
        }
        Ok(output.stdout)
    }

    fn request(&self, path: &Path, file: Option<&TemplateFile>, context: &GenerationContext) -> Value {
        json!({
            "path": path.to_string_lossy(),
            "file": file.map(|file| json!({
                "name": file.name(),
                "relative": file.relative().to_string_lossy(),
                "path": file.path().to_string_lossy(),
            })),
            "variables": context.variables(),
            "output_dir": context.output_dir().to_string_lossy(),
        })
    }
}

impl TemplateProvider for CommandProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform_path(&self, path: &Path, context: &GenerationContext) -> Result<PathBuf> {
        let request = self.request(path, context.current_file(), context);
        let stdout = self.call("path", &request)?;
        let rendered = String::from_utf8(stdout).map_err(|_| Error::ProviderError {
            provider: self.name.clone(),
            reason: "path output is not valid UTF-8".to_string(),
        })?;
        Ok(PathBuf::from(rendered.trim_end_matches(['\r', '\n'])))
    }

    fn transform_content(&self, file: &TemplateFile, context: &GenerationContext) -> Result<Content> {
        let request = self.request(file.relative(), Some(file), context);
        let stdout = self.call("content", &request)?;
        Ok(match String::from_utf8(stdout) {
            Ok(text) => Content::Text(text),
            Err(e) => Content::Binary(e.into_bytes()),
        })
    }
}
