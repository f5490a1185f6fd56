use serde::Deserialize;

fn default_runner() -> String {
    "simple".to_string()
}

/// Body of a run request.
#[derive(Clone, Debug, Deserialize)]
pub struct RunRequestDto {
    pub code: String,
    pub language: String,
    #[serde(default = "default_runner")]
    pub runner: String,
    /// Free-form task flags, e.g. `-tests hello/expected.out`.
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub tests: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, clap::Parser, Default, PartialEq, Eq)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
pub struct TaskFlags {
    /// Test fixture reference.
    #[arg(long)]
    pub tests: Option<String>,
}
