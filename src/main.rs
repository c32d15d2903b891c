// Main CLI entry point for vulnpair
// Uses clap for argument parsing

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vulnpair::access::AccessDecisionEngine;
use vulnpair::config::HarnessConfig;
use vulnpair::error::{Error, Result};
use vulnpair::hashing::{Algorithm, HashMode, HashRequest};
use vulnpair::models::{Action, Category, Resource, Sensitivity, Subject, VariantKind};
use vulnpair::probe::{describe, probe_idor, ID_PLACEHOLDER};
use vulnpair::race::compare_counters;
use vulnpair::reporting::{export_csv, export_markdown, ReportRow};
use vulnpair::scenario::{build_registry, Invocation, Scenario, ScenarioRegistry};
use vulnpair::verdict::decide_verdict;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn subject_args() -> [Arg; 3] {
    [
        Arg::new("subject_id")
            .long("subject-id")
            .num_args(1)
            .default_value("2")
            .help("Session subject id used by hardened variants"),
        Arg::new("role")
            .long("role")
            .num_args(1)
            .default_value("user")
            .help("Session subject role: user or admin"),
        Arg::new("invalid_session")
            .long("invalid-session")
            .action(ArgAction::SetTrue)
            .help("Present the session as expired/invalid"),
    ]
}

fn report_args() -> [Arg; 2] {
    [
        Arg::new("csv_report")
            .long("csv-report")
            .action(ArgAction::SetTrue)
            .help("Output CSV report"),
        Arg::new("markdown_report")
            .long("markdown-report")
            .action(ArgAction::SetTrue)
            .help("Output Markdown report"),
    ]
}

fn cli() -> Command {
    Command::new("vulnpair")
        .version(clap::crate_version!())
        .author("Jake Abendroth")
        .about("Paired vulnerable/hardened web security scenarios")
        .after_help("EXAMPLES:\n  vulnpair list --category idor\n  vulnpair run idor/user-profile --input 1 --subject-id 2\n  vulnpair hash hunter2 --mode unsafe-static-salt\n  vulnpair probe idor/order-detail --victim 1002 --subject-id 2\n  vulnpair sweep --csv-report")
        .subcommand_required(true)
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .global(true)
            .num_args(1)
            .help("Path to a JSON configuration file"))
        .arg(Arg::new("log_level")
            .long("log-level")
            .global(true)
            .num_args(1)
            .default_value("warn")
            .help("Log level when RUST_LOG is unset"))
        .subcommand(Command::new("list")
            .about("List registered scenarios")
            .arg(Arg::new("category")
                .long("category")
                .num_args(1)
                .help("Only show one category")))
        .subcommand(Command::new("run")
            .about("Invoke one scenario's variants")
            .arg(Arg::new("scenario").required(true).help("Scenario id"))
            .arg(Arg::new("input")
                .short('i')
                .long("input")
                .num_args(1)
                .help("Raw input (defaults to the scenario's sample)"))
            .arg(Arg::new("variant")
                .long("variant")
                .num_args(1)
                .help("unsafe or safe (default: both)"))
            .args(subject_args()))
        .subcommand(Command::new("hash")
            .about("Hash a secret under the configured policy")
            .arg(Arg::new("secret").required(true))
            .arg(Arg::new("mode")
                .long("mode")
                .num_args(1)
                .default_value("safe")
                .help("safe, unsafe-static-salt or unsafe-low-iteration"))
            .arg(Arg::new("algorithm")
                .long("algorithm")
                .num_args(1)
                .help("pbkdf2-sha256 or bcrypt (overrides the config)"))
            .arg(Arg::new("max_length")
                .long("max-length")
                .num_args(1)
                .help("Per-request input ceiling in bytes")))
        .subcommand(Command::new("decide")
            .about("Ask the access decision engine directly")
            .args(subject_args())
            .arg(Arg::new("owner")
                .long("owner")
                .required(true)
                .num_args(1)
                .help("Owner id of the resource"))
            .arg(Arg::new("resource")
                .long("resource")
                .num_args(1)
                .default_value("resource")
                .help("Resource id"))
            .arg(Arg::new("sensitivity")
                .long("sensitivity")
                .num_args(1)
                .default_value("private")
                .help("public, private or restricted"))
            .arg(Arg::new("action")
                .long("action")
                .num_args(1)
                .default_value("view")
                .help("view, update, delete, role_change or system_log_read")))
        .subcommand(Command::new("probe")
            .about("Probe an access-control scenario around a victim id")
            .arg(Arg::new("scenario").required(true).help("Scenario id"))
            .arg(Arg::new("victim")
                .short('v')
                .long("victim")
                .required(true)
                .num_args(1)
                .help("Victim resource or user id"))
            .arg(Arg::new("template")
                .long("template")
                .num_args(1)
                .default_value(ID_PLACEHOLDER)
                .help("Input template, {id} is replaced by each candidate"))
            .args(subject_args())
            .args(report_args()))
        .subcommand(Command::new("sweep")
            .about("Run every scenario's sample input under both variants")
            .args(subject_args())
            .args(report_args()))
        .subcommand(Command::new("race")
            .about("Compare an unguarded counter with guarded ones")
            .arg(Arg::new("tasks")
                .long("tasks")
                .num_args(1)
                .default_value("2"))
            .arg(Arg::new("iterations")
                .long("iterations")
                .num_args(1)
                .default_value("1000")))
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches
        .get_one::<String>(name)
        .ok_or_else(|| Error::InvalidInput(format!("missing --{}", name)))?;
    raw.parse()
        .map_err(|e| Error::InvalidInput(format!("--{} '{}': {}", name.replace('_', "-"), raw, e)))
}

fn subject_from(matches: &ArgMatches) -> Result<Subject> {
    let subject = Subject::new(parse_arg(matches, "subject_id")?, parse_arg(matches, "role")?);
    Ok(if matches.get_flag("invalid_session") {
        subject.with_invalid_session()
    } else {
        subject
    })
}

fn load_config(matches: &ArgMatches) -> Result<HarnessConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => HarnessConfig::load(path),
        None => Ok(HarnessConfig::default()),
    }
}

/// Identifier an access-control input targets: "3" or the user in "3:ADMIN"
fn target_id(input: &str) -> &str {
    input.split(':').next().unwrap_or(input).trim()
}

fn run_variant(
    scenario: &Scenario,
    kind: VariantKind,
    input: &str,
    subject: &Subject,
) -> ReportRow {
    let invocation = Invocation::new(input).with_session(subject);
    let result = scenario.invoke(kind, &invocation);
    let attacker = subject.id.to_string();
    let verdict = decide_verdict(
        scenario.category,
        input,
        &result,
        Some(attacker.as_str()),
        Some(target_id(input)),
    );
    if let Ok(outcome) = &result {
        info!(scenario = %scenario.id, variant = %kind, side_effect = %outcome.side_effect);
    }
    ReportRow::new(scenario.id.clone(), kind.to_string(), verdict.to_string(), describe(&result))
}

fn print_row(row: &ReportRow) {
    println!("[{}] {} ({}): {}", row.verdict, row.scenario, row.variant, row.detail);
}

fn export_reports(rows: &[ReportRow], matches: &ArgMatches, dir: &Path) -> Result<()> {
    if matches.get_flag("csv_report") {
        println!("CSV report: {}", export_csv(rows, dir)?.display());
    }
    if matches.get_flag("markdown_report") {
        println!("Markdown report: {}", export_markdown(rows, dir)?.display());
    }
    Ok(())
}

fn cmd_list(registry: &ScenarioRegistry, matches: &ArgMatches) -> Result<()> {
    let categories = match matches.get_one::<String>("category") {
        Some(raw) => vec![raw.parse::<Category>()?],
        None => Category::ALL.to_vec(),
    };
    for category in categories {
        for scenario in registry.list_by_category(category) {
            println!("{:<34} {:<16} {}", scenario.id, scenario.category, scenario.title);
        }
    }
    Ok(())
}

fn cmd_run(registry: &ScenarioRegistry, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("scenario")
        .ok_or_else(|| Error::InvalidInput("missing scenario id".to_string()))?;
    let scenario = registry.lookup(id)?;
    let input = matches
        .get_one::<String>("input")
        .cloned()
        .unwrap_or_else(|| scenario.sample_input.clone());
    let subject = subject_from(matches)?;
    let kinds = match matches.get_one::<String>("variant") {
        Some(raw) => vec![raw.parse::<VariantKind>()?],
        None => vec![VariantKind::Unsafe, VariantKind::Safe],
    };
    for kind in kinds {
        print_row(&run_variant(scenario, kind, &input, &subject));
    }
    Ok(())
}

fn cmd_hash(config: &HarnessConfig, matches: &ArgMatches) -> Result<()> {
    let mut policy = config.hash.clone();
    if let Some(raw) = matches.get_one::<String>("algorithm") {
        policy = policy.with_algorithm(raw.parse::<Algorithm>()?);
    }
    let mode: HashMode = parse_arg(matches, "mode")?;
    let secret = matches
        .get_one::<String>("secret")
        .ok_or_else(|| Error::InvalidInput("missing secret".to_string()))?;
    let mut request = HashRequest::new(secret.as_bytes());
    if matches.contains_id("max_length") {
        request = request.with_max_length(parse_arg(matches, "max_length")?);
    }
    let record = policy.compute(&request, mode)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_decide(matches: &ArgMatches) -> Result<()> {
    let subject = subject_from(matches)?;
    let sensitivity: Sensitivity = parse_arg(matches, "sensitivity")?;
    let resource_id: String = parse_arg(matches, "resource")?;
    let resource = Resource::new(resource_id, parse_arg(matches, "owner")?, sensitivity);
    let action: Action = parse_arg(matches, "action")?;

    let decision = AccessDecisionEngine::new().decide(&subject, &resource, action);
    if let Some(reason) = decision.deny_reason() {
        println!("DENY ({:?})", reason);
    } else if let Some(entry) = decision.audit() {
        println!("ALLOW ({})", entry.summary());
    } else {
        println!("ALLOW");
    }
    Ok(())
}

async fn cmd_probe(
    registry: Arc<ScenarioRegistry>,
    config: &HarnessConfig,
    matches: &ArgMatches,
) -> Result<()> {
    let id: String = parse_arg(matches, "scenario")?;
    let victim: String = parse_arg(matches, "victim")?;
    let template: String = parse_arg(matches, "template")?;
    let subject = subject_from(matches)?;

    let findings = probe_idor(registry, &id, subject, &victim, &template).await?;
    let mut rows = Vec::with_capacity(findings.len() * 2);
    for finding in &findings {
        let scenario = format!("{} [{}]", id, finding.input);
        rows.push(ReportRow::new(
            scenario.clone(),
            VariantKind::Unsafe.to_string(),
            finding.unsafe_result.verdict.clone(),
            finding.unsafe_result.detail.clone(),
        ));
        rows.push(ReportRow::new(
            scenario,
            VariantKind::Safe.to_string(),
            finding.safe_result.verdict.clone(),
            finding.safe_result.detail.clone(),
        ));
    }
    rows.iter().for_each(print_row);

    let leaks = findings.iter().filter(|f| f.safe_variant_leaks()).count();
    if leaks > 0 {
        println!("Warning: hardened variant leaked data for {} candidate(s)", leaks);
    }
    export_reports(&rows, matches, &config.report_dir)
}

fn cmd_sweep(registry: &ScenarioRegistry, config: &HarnessConfig, matches: &ArgMatches) -> Result<()> {
    let subject = subject_from(matches)?;
    let mut rows = Vec::new();
    for scenario in registry.iter() {
        for kind in [VariantKind::Unsafe, VariantKind::Safe] {
            let row = run_variant(scenario, kind, &scenario.sample_input, &subject);
            print_row(&row);
            rows.push(row);
        }
    }
    println!("Ran {} scenarios.", registry.len());
    export_reports(&rows, matches, &config.report_dir)
}

async fn cmd_race(matches: &ArgMatches) -> Result<()> {
    let tasks: usize = parse_arg(matches, "tasks")?;
    let iterations: u64 = parse_arg(matches, "iterations")?;
    for report in compare_counters(tasks, iterations).await? {
        println!(
            "{:<10} expected {} observed {} lost {}",
            report.counter,
            report.expected,
            report.observed,
            report.lost_updates()
        );
    }
    Ok(())
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(&matches)?;
    let registry = Arc::new(build_registry(&config.hash)?);

    match matches.subcommand() {
        Some(("list", sub)) => cmd_list(&registry, sub),
        Some(("run", sub)) => cmd_run(&registry, sub),
        Some(("hash", sub)) => cmd_hash(&config, sub),
        Some(("decide", sub)) => cmd_decide(sub),
        Some(("probe", sub)) => cmd_probe(Arc::clone(&registry), &config, sub).await,
        Some(("sweep", sub)) => cmd_sweep(&registry, &config, sub),
        Some(("race", sub)) => cmd_race(sub).await,
        _ => Err(Error::InvalidInput("unknown command".to_string())),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let level = matches
        .get_one::<String>("log_level")
        .map(String::as_str)
        .unwrap_or("warn");
    init_logging(level);

    if let Err(e) = run(matches).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
