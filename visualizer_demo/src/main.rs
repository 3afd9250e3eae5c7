//! Headless visualizer demo
//!
//! Spawns a mix of static parcels, moving polygons and ellipses, churns the
//! collection every frame and logs what the batches did. Pass a `.toml` or
//! `.ron` configuration path as the first argument to override defaults.

use rand::{rngs::StdRng, Rng, SeedableRng};
use scene_visualizer::config::{Config, ConfigError, VisualizerConfig};
use scene_visualizer::foundation::logging;
use scene_visualizer::foundation::math::{Color, Point3, Vec3};
use scene_visualizer::foundation::time::{SimTime, TimeInterval, TimeIntervalCollection};
use scene_visualizer::render::HeadlessBackend;
use scene_visualizer::scene::{
    constant, CollectionError, EllipseGraphics, Entity, EntityCollection, MaterialProperty,
    PolygonGraphics, SampledProperty, StripeMaterialProperty,
};
use scene_visualizer::visualizer::{PolygonVisualizer, VisualizerError};
use std::rc::Rc;

const FRAMES: u32 = 600;
const FRAME_SECONDS: f64 = 1.0 / 60.0;
const INITIAL_ENTITIES: usize = 64;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Visualizer(#[from] VisualizerError),
    #[error("{0}")]
    Collection(#[from] CollectionError),
}

/// Creates uniquely named random entities
struct Spawner {
    rng: StdRng,
    next_id: u64,
}

impl Spawner {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_id: 0,
        }
    }

    fn random_center(&mut self) -> Point3 {
        Point3::new(self.rng.gen_range(-500.0..500.0), self.rng.gen_range(-500.0..500.0), 0.0)
    }

    fn random_color(&mut self) -> Color {
        let alpha = if self.rng.gen_bool(0.7) { 1.0 } else { 0.6 };
        Color::new(self.rng.gen(), self.rng.gen(), self.rng.gen(), alpha)
    }

    fn spawn(&mut self, now: SimTime) -> Entity {
        self.next_id += 1;
        let name = format!("entity-{}", self.next_id);
        let center = self.random_center();

        match self.rng.gen_range(0..4) {
            0 => {
                let vertices = self.rng.gen_range(4..9);
                let outline = ring(center, 10.0, vertices);
                let color = self.random_color();
                Entity::new(name)
                    .with_vertex_positions(constant(outline))
                    .with_polygon(PolygonGraphics::new().with_material(MaterialProperty::color(constant(color))))
            }
            1 => {
                let outline = ring(center, 5.0, 4);
                Entity::new(name)
                    .with_vertex_positions(constant(outline))
                    .with_polygon(PolygonGraphics::new().with_height(constant(20.0)))
                    .with_availability(TimeIntervalCollection::from_interval(TimeInterval::closed(
                        now,
                        now.add_seconds(self.rng.gen_range(1.0..4.0)),
                    )))
            }
            2 => {
                let start = ring(center, 8.0, 6);
                let end = ring(center + Vec3::new(40.0, 0.0, 0.0), 8.0, 6);
                let positions = SampledProperty::new()
                    .with_sample(now, start)
                    .with_sample(now.add_seconds(5.0), end);
                Entity::new(name)
                    .with_vertex_positions(Rc::new(positions))
                    .with_polygon(PolygonGraphics::new().with_material(MaterialProperty::Stripe(
                        StripeMaterialProperty {
                            even_color: Some(constant(Color::WHITE)),
                            odd_color: Some(constant(Color::BLACK)),
                            repeat: Some(constant(4.0)),
                        },
                    )))
            }
            _ => {
                let semi_major = SampledProperty::new()
                    .with_sample(now, 5.0_f64)
                    .with_sample(now.add_seconds(3.0), 15.0);
                Entity::new(name)
                    .with_position(constant(center))
                    .with_ellipse(EllipseGraphics::new(Rc::new(semi_major), constant(4.0)))
                    .with_polygon(PolygonGraphics::new())
            }
        }
    }
}

/// Regular polygon in the XY plane
fn ring(center: Point3, radius: f64, vertices: usize) -> Vec<Point3> {
    (0..vertices)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = std::f64::consts::TAU * i as f64 / vertices as f64;
            center + Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect()
}

fn load_config() -> Result<VisualizerConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => VisualizerConfig::load_from_file(path),
        None => Ok(VisualizerConfig::default()),
    }
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);

    let backend = match config.max_backend_primitives {
        Some(max) => HeadlessBackend::with_capacity_limit(max),
        None => HeadlessBackend::new(),
    };
    let collection = Rc::new(EntityCollection::new());
    let mut visualizer = PolygonVisualizer::new(backend, config, Some(Rc::clone(&collection)))?;
    let mut spawner = Spawner::new(0x5eed);

    let mut time = SimTime::EPOCH;
    for _ in 0..INITIAL_ENTITIES {
        collection.add(spawner.spawn(time))?;
    }

    for frame in 0..FRAMES {
        collection.suspend_events();
        if spawner.rng.gen_bool(0.2) {
            let members = collection.entities();
            if !members.is_empty() {
                let victim = &members[spawner.rng.gen_range(0..members.len())];
                collection.remove(victim.id());
            }
        }
        if spawner.rng.gen_bool(0.25) {
            collection.add(spawner.spawn(time))?;
        }
        collection.resume_events();

        visualizer.update(time)?;

        if frame % 120 == 0 {
            let stats = visualizer.stats();
            log::info!(
                "Frame {}: {} entities placed, {} renderables live",
                frame,
                stats.placed_entities(),
                visualizer.backend().renderable_count()
            );
            for (kind, batch) in &stats.batches {
                log::debug!("  {} batch: {:?}", kind, batch);
            }
        }
        time = time.add_seconds(FRAME_SECONDS);
    }

    log::info!("Backend activity: {:?}", visualizer.backend().stats());
    visualizer.destroy()?;
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        logging::init_with_level("info");
        log::error!("Demo failed: {}", error);
        std::process::exit(1);
    }
}
