//! Dockerfile rendering for an [`ImageBuild`]

use super::schema::{CopySpec, ImageBuild, ServiceAccount};
use std::fmt::Write;

const SYNTAX_HEADER: &str = "# syntax=docker/dockerfile:1";

/// Render the three stages as a multi-stage Dockerfile.
///
/// The runtime stage carries no alias so it is the default build target.
pub fn render(build: &ImageBuild) -> String {
    let mut out = String::new();
    out.push_str(SYNTAX_HEADER);
    out.push('\n');

    render_resolver(&mut out, build);
    render_installer(&mut out, build);
    render_runtime(&mut out, build);

    out
}

fn render_resolver(out: &mut String, build: &ImageBuild) {
    let stage = &build.resolver;

    let _ = writeln!(out);
    let _ = writeln!(out, "FROM {} AS {}", stage.base, stage.name);
    if !stage.dev_arg.is_empty() {
        let _ = writeln!(out, "ARG {}={}", stage.dev_arg, stage.dev_default);
    }
    if !stage.workdir.is_empty() {
        let _ = writeln!(out, "WORKDIR {}", stage.workdir);
    }
    for input in &stage.inputs {
        let _ = writeln!(out, "COPY {} ./", input);
    }
    if !stage.command.is_empty() {
        let _ = writeln!(out, "RUN {}", stage.command);
    }
}

fn render_installer(out: &mut String, build: &ImageBuild) {
    let stage = &build.installer;

    let _ = writeln!(out);
    let _ = writeln!(out, "FROM {} AS {}", stage.base, stage.name);
    for copy in &stage.copy {
        let _ = writeln!(out, "{}", copy_instruction(copy));
    }
    if !stage.commands.is_empty() {
        let _ = writeln!(out, "RUN {}", stage.commands.join(" \\\n && "));
    }
}

fn render_runtime(out: &mut String, build: &ImageBuild) {
    let stage = &build.runtime;

    let _ = writeln!(out);
    let _ = writeln!(out, "FROM {}", stage.base);

    if !stage.labels.is_empty() {
        let labels: Vec<String> = stage
            .labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, quote(v)))
            .collect();
        let _ = writeln!(out, "LABEL {}", labels.join(" \\\n      "));
    }

    if !stage.env.is_empty() {
        let env: Vec<String> = stage
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, quote(v)))
            .collect();
        let _ = writeln!(out, "ENV {}", env.join(" \\\n    "));
    }

    for copy in &stage.copy {
        let _ = writeln!(out, "{}", copy_instruction(copy));
    }

    let mut setup = Vec::new();
    if !stage.executable.is_empty() {
        setup.push(format!("chmod 0755 {}", stage.executable.join(" ")));
    }
    if !stage.user.name.is_empty() {
        setup.extend(account_commands(&stage.user));
    }
    if !setup.is_empty() {
        let _ = writeln!(out, "RUN {}", setup.join(" \\\n && "));
    }

    if !stage.workdir.is_empty() {
        let _ = writeln!(out, "WORKDIR {}", stage.workdir);
    }
    if !stage.user.name.is_empty() {
        let _ = writeln!(out, "USER {}", stage.user.name);
    }
    for port in &stage.ports {
        let _ = writeln!(out, "EXPOSE {}", port);
    }
    if !stage.command.is_empty() {
        let args: Vec<String> = stage.command.iter().map(|a| quote(a)).collect();
        let _ = writeln!(out, "CMD [{}]", args.join(", "));
    }
}

fn copy_instruction(copy: &CopySpec) -> String {
    match &copy.stage {
        Some(stage) => format!("COPY --from={} {} {}", stage, copy.from, copy.to),
        None => format!("COPY {} {}", copy.from, copy.to),
    }
}

fn account_commands(account: &ServiceAccount) -> Vec<String> {
    vec![
        format!("groupadd --system --gid {} {}", account.uid, account.name),
        format!(
            "useradd --system --uid {uid} --gid {name} --no-create-home --shell {shell} {name}",
            uid = account.uid,
            name = account.name,
            shell = account.shell,
        ),
    ]
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
