//! Headless skill simulator.
//!
//! Loads a content directory, places a caster and a target, then casts one
//! skill (optionally again whenever it is ready) and ticks the world.
//! Run with: `cargo run -p skill-sim -- --skill Fireball --ticks 80`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use logic_graph::{
    AgentEnv, EntityAccess, EntityId, EntityRecord, MemoryEntities, NodeRegistry, Position,
};
use serde::Serialize;
use skill::loaders::ContentLoader;
use skill::{SkillCaster, SpellContext};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const CASTER: EntityId = EntityId(1);
const TARGET: EntityId = EntityId(2);

/// Simulate skill casts against a single target
#[derive(Parser)]
#[command(name = "skill-sim")]
#[command(about = "Headless skill cast simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Content directory holding settings.toml, skills.ron and scripts/
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Name of the skill to cast
    #[arg(short, long, default_value = "Fireball")]
    skill: String,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "60")]
    ticks: u32,

    /// Seconds per tick
    #[arg(long, default_value = "0.1")]
    dt: f32,

    /// Distance between caster and target
    #[arg(long, default_value = "4.0")]
    distance: f32,

    /// Starting health of both entities
    #[arg(long, default_value = "100")]
    health: i32,

    /// Cast again whenever the skill is ready
    #[arg(short, long)]
    repeat: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// JSON report
    Json,
}

/// Outcome of one simulation run.
#[derive(Debug, Serialize)]
struct Report {
    skill: String,
    ticks: u32,
    elapsed: f32,
    casts: u32,
    rejected: u32,
    caster_health: Option<i32>,
    target_health: Option<i32>,
    cooldown_remaining: f32,
    casting: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let report = run(&cli)?;

    match cli.format {
        OutputFormat::Summary => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../skill/data")
}

fn run(cli: &Cli) -> Result<Report> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let registry = NodeRegistry::with_builtins();
    let content = ContentLoader::new(&data_dir)
        .load(&registry)
        .with_context(|| format!("loading content from {}", data_dir.display()))?;

    let skill = content
        .skill(&cli.skill)
        .cloned()
        .with_context(|| format!("no skill named `{}`", cli.skill))?;

    let entities = Arc::new(MemoryEntities::new());
    entities.insert(CASTER, EntityRecord::actor(cli.health, Position::default()));
    entities.insert(
        TARGET,
        EntityRecord::actor(cli.health, Position::new(cli.distance, 0.0)),
    );

    let env = AgentEnv::new(
        Arc::new(registry),
        entities.clone(),
        content.settings.clone(),
    );
    let mut caster = SkillCaster::new(CASTER, env, Arc::new(content.scripts.clone()))
        .with_skill(Arc::clone(&skill));

    info!(skill = %skill.name, ticks = cli.ticks, dt = cli.dt, "simulation started");

    let spell = || SpellContext::new().with_target(TARGET);
    let (mut casts, mut rejected) = (0, 0);
    if caster.spell_skill(skill.id, spell()) {
        casts += 1;
    } else {
        rejected += 1;
    }

    for tick in 1..=cli.ticks {
        caster.update(cli.dt);
        caster.late_update();

        if cli.repeat && !caster.is_casting() && caster.can_spell_skill_at(skill.id, TARGET) {
            if caster.spell_skill(skill.id, spell()) {
                casts += 1;
            } else {
                rejected += 1;
            }
        }
        debug!(
            tick,
            casting = caster.is_casting(),
            target_health = entities.health(TARGET),
            "tick"
        );
    }

    let cooldown_remaining = caster
        .ability(skill.id)
        .map(|ability| ability.cooldown().remaining())
        .unwrap_or_default();

    Ok(Report {
        skill: skill.name.clone(),
        ticks: cli.ticks,
        elapsed: cli.ticks as f32 * cli.dt,
        casts,
        rejected,
        caster_health: entities.health(CASTER),
        target_health: entities.health(TARGET),
        cooldown_remaining,
        casting: caster.is_casting(),
    })
}

fn print_summary(report: &Report) {
    println!("Skill:          {}", report.skill);
    println!("Simulated:      {} ticks ({:.2}s)", report.ticks, report.elapsed);
    println!("Casts:          {} ({} rejected)", report.casts, report.rejected);
    println!("Caster health:  {}", fmt_health(report.caster_health));
    println!("Target health:  {}", fmt_health(report.target_health));
    println!("Cooldown left:  {:.2}s", report.cooldown_remaining);
    if report.casting {
        println!("Still casting when the simulation ended");
    }
}

fn fmt_health(health: Option<i32>) -> String {
    health.map_or_else(|| "gone".to_string(), |h| h.to_string())
}
