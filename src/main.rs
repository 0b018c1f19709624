use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use maze_q_learning::{maze, render, train, Agent, Config};

/// Train a Q-learning agent to walk through a digit-grid maze
#[derive(Parser)]
#[command(name = "maze-rl", version, about, long_about = None)]
struct Cli {
    /// Maze file (one digit 0-7 per cell)
    maze: PathBuf,

    /// TOML file with learning parameters and rewards
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Steps before an episode is abandoned
    #[arg(long)]
    max_steps: Option<usize>,

    /// Exploration rate ε
    #[arg(long)]
    epsilon: Option<f64>,

    /// Learning rate α
    #[arg(long)]
    alpha: Option<f64>,

    /// Discount factor γ
    #[arg(long)]
    gamma: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Never pick the reverse of the previous action unless stuck
    #[arg(long)]
    anti_reversal: bool,

    /// Write one CSV row per training episode
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Print the greedy policy after training
    #[arg(long)]
    show_policy: bool,

    /// Replay the learned behaviour step by step
    #[arg(long)]
    demo: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(epsilon) = self.epsilon {
            config.exploration_rate = epsilon;
        }
        if let Some(alpha) = self.alpha {
            config.learning_rate = alpha;
        }
        if let Some(gamma) = self.gamma {
            config.discount_factor = gamma;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.anti_reversal |= self.anti_reversal;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("maze_q_learning=info,maze_rl=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config().context("invalid configuration")?;
    let grid = maze::load(&cli.maze)
        .with_context(|| format!("failed to load maze {}", cli.maze.display()))?;

    info!(
        "Maze {}x{}, start {}, goal {}",
        grid.size().0,
        grid.size().1,
        grid.start_pos(),
        grid.goal_pos()
    );

    let episodes = config.episodes;
    let mut agent = Agent::new(grid, config)?;
    let report = train(&mut agent, episodes);

    if let Some(path) = &cli.stats {
        report
            .write_csv(path)
            .with_context(|| format!("failed to write stats to {}", path.display()))?;
        info!("Episode stats written to {}", path.display());
    }

    println!(
        "Trained for {} episodes, {} reached the goal",
        report.episodes(),
        report.successes()
    );
    match report.last_success() {
        Some(record) => println!(
            "Last successful episode: {} in {} steps",
            record.episode, record.steps
        ),
        None => warn!("The goal was never reached within the step limit"),
    }
    if let Some(last) = report.last() {
        println!("Final episode: {:?} after {} steps", last.outcome, last.steps);
    }

    if cli.show_policy {
        let policy = agent.q_table().greedy_policy(agent.grid());
        println!("\nGreedy policy:");
        print!("{}", render::render_policy(agent.grid(), &policy));
    }

    if cli.demo {
        let rollout = agent.demonstrate();
        println!("\nDemonstrating learned behaviour:");
        let mut state = agent.state().clone();
        print!("{}", render::render(agent.grid(), &state));
        for (pos, action) in rollout.path.iter().skip(1).zip(&rollout.actions) {
            state.previous_pos = state.pos;
            state.pos = *pos;
            state.last_action = Some(*action);
            let cell = agent.grid().at(*pos);
            if cell.is_buff() || cell.is_debuff() {
                state.collected.insert(*pos);
            }
            println!("{:?}", action);
            print!("{}", render::render(agent.grid(), &state));
        }
        if rollout.reached_goal {
            println!("Goal reached in {} steps", rollout.steps());
        } else {
            println!("Goal not reached after {} steps", rollout.steps());
        }
    }

    Ok(())
}
