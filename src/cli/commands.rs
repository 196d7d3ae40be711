//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::io::{self, BufRead};
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};

use crate::config::MusicConfig;
use crate::engine::{AreaPlayer, VolumeMapper};
use crate::error::{InvalidDangerLevelError, MusicError, Result};
use crate::layers::SynthLoader;
use crate::playback::{Mixer, Playable};

/// Sample rate of the session mixer
pub const SESSION_SAMPLE_RATE: u32 = 48000;

/// Most layers a command will build or map
pub const MAX_LAYERS: usize = 64;

/// Longest render a session step may request
pub const MAX_RENDER_SECS: f64 = 60.0;

/// One presentation-side action
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Select an area, or silence with `None`
    Area(Option<String>),
    /// Set the danger level
    Danger(f64),
}

impl FromStr for Step {
    type Err = MusicError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason: &str| MusicError::InvalidCommand {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (key, value) = input
            .trim()
            .split_once('=')
            .ok_or_else(|| invalid("expected key=value"))?;
        let value = value.trim();

        match key.trim() {
            "area" if value.eq_ignore_ascii_case("none") => Ok(Step::Area(None)),
            "area" if !value.is_empty() => Ok(Step::Area(Some(value.to_string()))),
            "area" => Err(invalid("missing area name")),
            "danger" => value
                .parse::<f64>()
                .map(Step::Danger)
                .map_err(|_| invalid("danger level must be a number")),
            _ => Err(invalid("unknown key, use 'area' or 'danger'")),
        }
    }
}

/// Apply one step to a player
pub fn apply_step<P: Playable>(player: &mut AreaPlayer<P>, step: &Step) -> Result<()> {
    match step {
        Step::Area(area) => player.select_area(area.as_deref())?,
        Step::Danger(level) => player.set_danger_level(*level)?,
    }
    Ok(())
}

fn check_layers(layers: usize) -> Result<()> {
    if layers > MAX_LAYERS {
        return Err(MusicError::InvalidCommand {
            input: format!("--layers {}", layers),
            reason: format!("at most {} layers are supported", MAX_LAYERS),
        });
    }
    Ok(())
}

fn check_render(render: Option<f64>) -> Result<()> {
    match render {
        Some(secs) if !(secs > 0.0 && secs <= MAX_RENDER_SECS) => Err(MusicError::InvalidCommand {
            input: format!("--render {}", secs),
            reason: format!("render length must be in (0, {}] seconds", MAX_RENDER_SECS),
        }),
        _ => Ok(()),
    }
}

/// Load the configuration file, or fall back to the defaults
pub fn load_config(path: Option<&Path>) -> Result<MusicConfig> {
    match path {
        Some(path) => MusicConfig::load(path),
        None => Ok(MusicConfig::default()),
    }
}

/// List configured areas.
pub fn list_areas(config: &MusicConfig) -> Result<()> {
    println!("{:<12} {:>10} {:>10}", "Area", "Lead (s)", "Trail (s)");
    println!("{:-<34}", "");
    for area in config.areas() {
        let trim = area.trim();
        println!(
            "{:<12} {:>10.3} {:>10.3}",
            area.id(),
            trim.lead_secs,
            trim.trail_secs
        );
    }
    println!("{:-<34}", "");
    println!(
        "Max volume: {} | Max danger: {}",
        config.max_audio_vol, config.max_danger_level
    );
    Ok(())
}

/// Print the volume vector for a danger level.
pub fn print_map(config: &MusicConfig, danger: f64, layers: usize) -> Result<()> {
    check_layers(layers)?;
    let mapper = VolumeMapper::from_config(config);
    if !mapper.accepts(danger) {
        return Err(InvalidDangerLevelError {
            level: danger,
            max: mapper.max_danger_level(),
        }
        .into());
    }

    let volumes = mapper.map(danger, layers);
    println!("{}", serde_json::to_string(&volumes)?);
    Ok(())
}

/// Run a player session over synthesized layers.
///
/// Rejected steps are reported and the session keeps going.
pub fn run_session(
    config: &MusicConfig,
    layers: usize,
    render: Option<f64>,
    steps: &[String],
) -> Result<()> {
    check_layers(layers)?;
    check_render(render)?;

    let mixer = Mixer::new(SESSION_SAMPLE_RATE);
    let mut loader = SynthLoader::new(mixer.clone(), layers);
    let mut player = AreaPlayer::load_all(config, &mut loader)?;
    info!(
        "Session ready: {} areas, {} voices",
        player.areas().len(),
        mixer.voice_count()
    );

    let mut run = |line: &str| -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let outcome = line.parse::<Step>().and_then(|step| apply_step(&mut player, &step));
        if let Err(err) = outcome {
            if !err.is_recoverable() {
                return Err(err);
            }
            warn!("{} [{}]", err, err.error_code());
            println!("rejected: {}", err);
            for suggestion in err.recovery_suggestions() {
                println!("  - {}", suggestion);
            }
        }

        println!("{}", serde_json::to_string(&player.snapshot())?);
        if let Some(secs) = render {
            let stats = mixer.render_stats(secs);
            println!(
                "rendered {:.2}s: peak {:.3}, rms {:.3}, {} voices playing",
                secs,
                stats.peak,
                stats.rms,
                mixer.playing_count()
            );
        }
        Ok(())
    };

    if steps.is_empty() {
        for line in io::stdin().lock().lines() {
            run(&line?)?;
        }
    } else {
        for step in steps {
            run(step)?;
        }
    }

    player.select_area(None)?;
    Ok(())
}
