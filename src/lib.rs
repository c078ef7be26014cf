use std::path::PathBuf;

use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod math;
pub mod solver;
pub mod trace;

// Public re-exports for clean API
pub use config::{SeedingPolicy, SphParams, ViscoelasticParams};
pub use error::{SphError, SphResult};
pub use solver::{Solver, SolverKind, SphSolver, ViscoelasticSolver, build_solver};
pub use trace::{FrameReader, FrameWriter};

use crate::math::{Point, to_render};

/// What the viewer should simulate.
#[derive(Resource, Clone, Debug)]
pub struct SimulationConfig {
    pub kind: SolverKind,
    pub particle_count: usize,
    pub output: Option<PathBuf>,
}

impl SimulationConfig {
    pub fn new(kind: SolverKind) -> Self {
        let particle_count = match kind {
            SolverKind::Standard => 500,
            SolverKind::Viscoelastic => 2500,
        };
        Self {
            kind,
            particle_count,
            output: None,
        }
    }

    /// Window size the solver's view is laid out for.
    pub fn window_size(&self) -> (u32, u32) {
        match self.kind {
            SolverKind::Standard => {
                let params = SphParams::default();
                (params.window_width, params.window_height)
            }
            SolverKind::Viscoelastic => {
                let params = ViscoelasticParams::default();
                (params.window_width, params.window_height)
            }
        }
    }
}

/// Owns the running solver for the render loop.
#[derive(Resource)]
pub struct SimulationContext {
    solver: Box<dyn Solver>,
    window_size: Vec2,
    failed: bool,
}

impl SimulationContext {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        let (width, height) = solver.window_size();
        Self {
            solver,
            window_size: Vec2::new(width as f32, height as f32),
            failed: false,
        }
    }

    pub fn solver(&self) -> &dyn Solver {
        self.solver.as_ref()
    }

    pub fn solver_mut(&mut self) -> &mut dyn Solver {
        self.solver.as_mut()
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Advance one frame, latching the first failure.
    pub fn step(&mut self) -> SphResult<()> {
        if self.failed {
            return Ok(());
        }
        let result = self.solver.update();
        self.failed = result.is_err();
        result
    }

    /// Map a simulation point onto a centred 2D camera for a window of
    /// `window` pixels.
    pub fn to_screen(&self, point: Point, window: Vec2) -> Vec2 {
        let view = Vec2::new(
            self.solver.view_width() as f32,
            self.solver.view_height() as f32,
        );
        (to_render(point) / view - Vec2::splat(0.5)) * window
    }

    /// Particle radius in pixels for a window of `window` pixels.
    pub fn screen_radius(&self, window: Vec2) -> f32 {
        0.5 * self.solver.point_size() as f32 * window.x / self.window_size.x
    }

    /// Stretch the view height to follow the window aspect ratio.
    pub fn fit_window(&mut self, window: Vec2) -> SphResult<()> {
        if window == self.window_size || window.x <= 0.0 || window.y <= 0.0 {
            return Ok(());
        }
        let width = self.solver.view_width();
        let height = width * window.y as f64 / window.x as f64;
        self.solver.resize_view(width, height)?;
        self.window_size = window;
        Ok(())
    }
}

pub struct SphPlugin {
    pub config: SimulationConfig,
}

impl Plugin for SphPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .add_systems(Startup, setup_simulation)
            .add_systems(
                Update,
                (fit_view_to_window, step_simulation, draw_particles)
                    .chain()
                    .run_if(resource_exists::<SimulationContext>),
            );
    }
}

fn setup_simulation(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    match build_solver(
        config.kind,
        config.particle_count,
        config.output.as_deref(),
    ) {
        Ok(solver) => {
            info!(
                "Running {} solver with {} particles",
                config.kind,
                solver.particle_count()
            );
            commands.insert_resource(SimulationContext::new(solver));
        }
        Err(e) => {
            error!("Failed to build {} solver: {}", config.kind, e);
            exit.write(AppExit::error());
        }
    }
}

fn fit_view_to_window(mut context: ResMut<SimulationContext>, windows: Query<&Window>) {
    let Ok(window) = windows.single() else {
        return;
    };
    if let Err(e) = context.fit_window(Vec2::new(window.width(), window.height())) {
        warn!("Keeping previous view: {}", e);
    }
}

fn step_simulation(mut context: ResMut<SimulationContext>, mut exit: MessageWriter<AppExit>) {
    if context.has_failed() {
        return;
    }
    let start = std::time::Instant::now();
    if let Err(e) = context.step() {
        error!("Simulation step failed: {}", e);
        exit.write(AppExit::error());
        return;
    }
    debug!(
        "update: {:.3}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
}

fn draw_particles(context: Res<SimulationContext>, windows: Query<&Window>, mut gizmos: Gizmos) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = Vec2::new(window.width(), window.height());
    let radius = context.screen_radius(size);
    let color = Color::srgb(0.2, 0.55, 0.95);

    for &position in context.solver().positions() {
        gizmos.circle_2d(context.to_screen(position, size), radius, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_corners_map_to_window_corners() {
        let solver = build_solver(SolverKind::Standard, 10, None).unwrap();
        let context = SimulationContext::new(solver);
        let window = Vec2::new(800.0, 600.0);

        assert_eq!(
            context.to_screen(Point::new(0.0, 0.0), window),
            Vec2::new(-400.0, -300.0)
        );
        assert_eq!(
            context.to_screen(Point::new(1200.0, 900.0), window),
            Vec2::new(400.0, 300.0)
        );
        assert_eq!(context.screen_radius(window), 4.0);
    }

    #[test]
    fn fitting_window_keeps_view_width() {
        let solver = build_solver(SolverKind::Viscoelastic, 16, None).unwrap();
        let mut context = SimulationContext::new(solver);
        context.fit_window(Vec2::new(1000.0, 1000.0)).unwrap();

        assert_eq!(context.solver().view_width(), 12.5);
        assert_eq!(context.solver().view_height(), 12.5);
    }

    #[test]
    fn configured_window_leaves_view_unchanged() {
        for kind in [SolverKind::Standard, SolverKind::Viscoelastic] {
            let config = SimulationConfig::new(kind);
            let solver = build_solver(kind, 16, None).unwrap();
            let (width, height) = (solver.view_width(), solver.view_height());
            let mut context = SimulationContext::new(solver);

            let (x, y) = config.window_size();
            context.fit_window(Vec2::new(x as f32, y as f32)).unwrap();
            assert_eq!(context.solver().view_width(), width);
            assert_eq!(context.solver().view_height(), height);

            // Same aspect at a different scale factor.
            context.fit_window(Vec2::new(x as f32 / 2.0, y as f32 / 2.0)).unwrap();
            assert_eq!(context.solver().view_height(), height);
        }
    }
}
