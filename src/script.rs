use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};

use crate::error::ScriptError;
use crate::line::DialogLine;

static DIALOGUE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/dialogues");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub character: String,
    pub text: String,
}

/// A scripted dialogue as loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogScript {
    pub title: String,
    pub lines: Vec<ScriptLine>,
}

impl DialogScript {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let script: DialogScript = serde_json::from_str(json)?;
        if script.lines.is_empty() {
            return Err(ScriptError::Empty(script.title));
        }
        Ok(script)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Loads one of the scripts shipped with the binary, by file stem
    pub fn bundled(name: &str) -> Result<Self, ScriptError> {
        let file = DIALOGUE_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| ScriptError::NotFound(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| ScriptError::NotFound(name.to_string()))?;
        Self::from_json(contents)
    }

    pub fn bundled_names() -> Vec<String> {
        let mut names: Vec<String> = DIALOGUE_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|f| f.path().file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn into_lines(self) -> Vec<DialogLine> {
        self.lines
            .into_iter()
            .enumerate()
            .map(|(order, l)| DialogLine::new(l.character, l.text, order))
            .collect()
    }
}
