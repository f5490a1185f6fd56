use clap::Parser;

use crate::{
    core::{
        domain::{RunRequest, RunnerKind},
        errors::RunError,
    },
    http::models::{RunRequestDto, TaskFlags},
};

impl TryFrom<RunRequestDto> for RunRequest {
    type Error = RunError;

    fn try_from(dto: RunRequestDto) -> Result<Self, RunError> {
        let runner = RunnerKind::parse(&dto.runner)?;
        let flags = dto.flags.as_deref().map(parse_flags).unwrap_or_default();

        Ok(Self {
            code: dto.code,
            language: dto.language,
            runner,
            tests: dto.tests.or(flags.tests),
            challenge: dto.challenge,
            user: dto.user,
        })
    }
}

/// Parses task flags. Single-dash long flags (`-tests`) are accepted; flags
/// other than `--tests` are logged and skipped.
pub fn parse_flags(flags: &str) -> TaskFlags {
    let mut args = flags.split_whitespace().map(|arg| {
        if arg.len() > 2 && arg.starts_with('-') && !arg.starts_with("--") {
            format!("-{}", arg)
        } else {
            arg.to_string()
        }
    });

    let mut known = Vec::new();
    let mut ignored = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--tests" {
            known.push(arg);
            known.extend(args.next());
        } else if arg.starts_with("--tests=") {
            known.push(arg);
        } else {
            ignored.push(arg);
        }
    }
    if !ignored.is_empty() {
        tracing::warn!(flags, ?ignored, "Ignoring unknown task flags");
    }

    match TaskFlags::try_parse_from(known) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(flags, error = %e, "Ignoring unparsable task flags");
            TaskFlags::default()
        }
    }
}
