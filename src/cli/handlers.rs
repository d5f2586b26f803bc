use std::fmt::Write as _;

use anyhow::{Context, Result};
use cmdgate_config::{GateConfig, ParserBackendPreference};
use cmdgate_core::tool_policy::{format_policy_profile, profile_comparison};
use cmdgate_core::{
    CommandGate, GateVerdict, ParseResult, PolicyAction, ProfileRegistry, ShellParser,
};

use super::{Outcome, ProfilesCommand};

pub fn handle_parse(
    config: &GateConfig,
    command: &str,
    backend: Option<ParserBackendPreference>,
    json: bool,
) -> Result<Outcome> {
    let preference = backend.unwrap_or(config.parser.backend);
    let parser = ShellParser::with_preference(preference, config.parser.max_depth);
    let result = parser.parse(command);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize parse result")?
        );
    } else {
        print!("{}", render_parse(parser.backend_name(), &result));
    }
    Ok(Outcome::Success)
}

pub fn handle_check(
    config: &GateConfig,
    commands: &[String],
    profile: Option<&str>,
    json: bool,
    summary: bool,
) -> Result<Outcome> {
    let mut gate = CommandGate::from_config(config)?;
    let verdicts = commands
        .iter()
        .map(|command| gate.evaluate(command, profile))
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&verdicts).context("Failed to serialize verdicts")?
        );
    } else {
        for verdict in &verdicts {
            print!("{}", render_verdict(verdict));
        }
    }
    if summary {
        println!("{}", gate.audit().format_summary());
    }

    let strictest = verdicts
        .iter()
        .map(|verdict| verdict.action)
        .max()
        .unwrap_or(PolicyAction::Allow);
    Ok(Outcome::Verdict(strictest))
}

pub fn handle_resolve(config: &GateConfig, group: &str, profile: Option<&str>) -> Result<Outcome> {
    let registry = ProfileRegistry::from_config(&config.policy)?;
    let profile = match profile {
        Some(name) => name,
        None => registry.default_profile().name.as_str(),
    };
    let resolution = registry.resolve(profile, group)?;
    let source = match &resolution.matched_rule {
        Some(rule) => format!("rule {}", rule.group),
        None => "profile default".to_string(),
    };
    println!(
        "{} -> {} (profile {profile}, {source})",
        resolution.group, resolution.action
    );
    Ok(Outcome::Success)
}

pub fn handle_profiles(config: &GateConfig, command: ProfilesCommand) -> Result<Outcome> {
    let registry = ProfileRegistry::from_config(&config.policy)?;
    match command {
        ProfilesCommand::List => {
            let default = registry.default_profile().name.as_str();
            for profile in registry.profiles() {
                let marker = if profile.name == default { "*" } else { " " };
                println!("{marker} {:<12} {}", profile.name, profile.description);
            }
        }
        ProfilesCommand::Show { name } => {
            print!("{}", format_policy_profile(registry.profile(&name)?));
        }
        ProfilesCommand::Compare => print!("{}", profile_comparison(&registry)),
    }
    Ok(Outcome::Success)
}

fn render_parse(backend: &str, result: &ParseResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "backend: {backend}");
    for (index, command) in result.commands.iter().enumerate() {
        let connector = command.connector.map_or("", |connector| connector.as_str());
        let _ = write!(out, "{:>3}. {connector:<2} {}", index + 1, command.command);
        for arg in &command.args {
            let _ = write!(out, " {arg:?}");
        }
        if command.is_subshell {
            out.push_str("  [subshell]");
        }
        out.push('\n');
    }
    for warning in &result.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

fn render_verdict(verdict: &GateVerdict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {}", verdict.action, verdict.command);
    let _ = writeln!(out, "  profile: {}", verdict.profile);
    if verdict.danger.dangerous {
        let categories: Vec<&str> = verdict
            .danger
            .categories
            .iter()
            .map(|category| category.label())
            .collect();
        let _ = writeln!(
            out,
            "  dangerous: {} ({})",
            verdict.danger.commands.join(", "),
            categories.join(", ")
        );
    }
    for resolution in &verdict.resolutions {
        let _ = writeln!(out, "  {} -> {}", resolution.group, resolution.action);
    }
    if verdict.escalated {
        out.push_str("  escalated to confirm: command did not parse cleanly\n");
    }
    for warning in &verdict.parse.warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }
    out
}
