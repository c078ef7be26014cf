use std::path::PathBuf;
use std::process::ExitCode;

use bevy::prelude::*;
use bevy::window::WindowResolution;

use sph2d::{SimulationConfig, SolverKind, SphPlugin};

const USAGE: &str = "usage: sph2d [standard|viscoelastic] [particle-count] [output-file]";

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<SimulationConfig, String> {
    let kind = match args.next() {
        Some(kind) => kind.parse::<SolverKind>()?,
        None => SolverKind::default(),
    };
    let mut config = SimulationConfig::new(kind);
    if let Some(count) = args.next() {
        config.particle_count = count
            .parse()
            .map_err(|e| format!("bad particle count {:?}: {}", count, e))?;
    }
    config.output = args.next().map(PathBuf::from);
    if args.next().is_some() {
        return Err("too many arguments".to_string());
    }
    Ok(config)
}

fn init(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn main() -> ExitCode {
    let config = match parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    let (width, height) = config.window_size();
    let exit = App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: format!("sph2d - {}", config.kind),
                resolution: WindowResolution::new(width, height),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(SphPlugin { config })
        .add_systems(Startup, init)
        .run();

    if exit.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
