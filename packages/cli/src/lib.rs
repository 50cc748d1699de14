//! # docmodel-cli
//!
//! Inspect a model file from the command line.
//!
//! ## Usage
//!
//! ```bash
//! # The model path comes from --model, or from DOCMODEL_MODEL
//! docmodel --model model.json classes
//! docmodel --model model.json hierarchy class:task.Task
//! docmodel --model model.json domain class:task.Task
//! docmodel --model model.json get t1
//! docmodel --model model.json get t1 --mixin class:task.Assignable
//! docmodel --model model.json find class:task.Task --where name='"Fix bug"' --deep
//! docmodel --model model.json export ./cache
//! ```

pub mod commands;
mod error;

use std::{fs, path};

use clap::Parser;

use docmodel_session::Session;

pub use commands::{execute, Command};
pub use error::CliError;

/// Environment variable consulted when `--model` is not given.
pub const MODEL_ENV: &str = "DOCMODEL_MODEL";

/// docmodel - inspect document models
#[derive(Parser, Debug)]
#[command(name = "docmodel")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Model file: a JSON array of documents, or an object of domain arrays
    #[arg(long, short)]
    pub model: Option<path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// The model path, falling back to the environment.
    pub fn model_path(&self) -> Result<path::PathBuf, CliError> {
        self.model
            .clone()
            .or_else(|| std::env::var_os(MODEL_ENV).map(path::PathBuf::from))
            .ok_or(CliError::NoModel)
    }
}

/// Read a model file into a fresh session.
///
/// Files written by `export` or by a session dump may carry mixin documents,
/// so the documents are restored rather than plainly loaded.
pub fn open_session(model: &path::Path) -> Result<Session, CliError> {
    let text = fs::read_to_string(model).map_err(|error| CliError::ReadModel {
        path: model.to_path_buf(),
        error,
    })?;
    let docs = docmodel_serde::load_model_json(&text)?;
    let session = Session::default();
    session.restore(docs)?;
    Ok(session)
}

/// Open the model and run one command, returning what to print.
pub fn run(args: Args) -> Result<String, CliError> {
    let session = open_session(&args.model_path()?)?;
    execute(&args.command, &session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"[
        {"_class": "class:core.Class", "_id": "class:core.Obj"},
        {"_class": "class:core.Class", "_id": "class:core.Class", "_extends": "class:core.Obj"},
        {"_class": "class:core.Class", "_id": "class:task.Task", "_extends": "class:core.Obj",
         "_attributes": {"name": {"_class": "class:core.Type"}}},
        {"_class": "class:task.Task", "_id": "t1", "name": "Fix bug"}
    ]"#;

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from(["docmodel", "--model", "m.json", "domain", "class:x.Y"])
            .unwrap();
        assert_eq!(args.model, Some(path::PathBuf::from("m.json")));
        assert_eq!(
            args.command,
            Command::Domain {
                class: "class:x.Y".to_string()
            }
        );

        let args = Args::try_parse_from([
            "docmodel", "find", "class:x.Y", "--where", "a=1", "--where", "b=x", "--deep",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Find {
                class: "class:x.Y".to_string(),
                filters: vec!["a=1".to_string(), "b=x".to_string()],
                deep: true,
            }
        );
    }

    #[test]
    fn explicit_model_wins() {
        let args = Args::try_parse_from(["docmodel", "-m", "given.json", "classes"]).unwrap();
        assert_eq!(args.model_path().unwrap(), path::PathBuf::from("given.json"));
    }

    #[test]
    fn run_reads_the_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        fs::write(&model, MODEL).unwrap();

        let args = Args {
            model: Some(model),
            command: Command::Get {
                id: "t1".to_string(),
                raw: false,
                mixin: None,
            },
        };
        let output: serde_json::Value = serde_json::from_str(&run(args).unwrap()).unwrap();
        assert_eq!(output["name"], "Fix bug");
    }

    #[test]
    fn missing_model_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_session(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::ReadModel { .. }));
    }
}
