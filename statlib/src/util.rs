use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;

/// Directory holding the sample inputs and their expected reports
pub fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

pub struct TestCasePaths {
    pub name: String,
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub output: PathBuf,
}

/// Finds every `expected-<name>.csv` in `dir` and pairs it with `input-<name>.csv`, plus
/// `config-<name>.json` when one exists
pub fn get_cases(dir: &Path) -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    let mut out = Vec::new();
    let output_pattern = Regex::new(r"^expected-(?P<name>[0-9a-zA-Z_]+)\.csv$")?;
    let mut files = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|file_name| output_pattern.is_match(file_name))
        .collect::<Vec<_>>();
    files.sort();
    for file_name in files {
        let tokens = output_pattern.captures(&file_name).ok_or("Couldn't parse the file name".to_string())?;
        let name = tokens.name("name").ok_or("Couldn't get the case name from the output file name".to_string())?.as_str();
        let config = dir.join(format!("config-{name}.json"));
        out.push(TestCasePaths {
            name: name.to_string(),
            input: dir.join(format!("input-{name}.csv")),
            config: config.exists().then_some(config),
            output: dir.join(&file_name),
        })
    }
    Ok(out)
}
