//! Patrol demo: wires components, systems, and the registry together.
//!
//! Builds a handful of game objects, attaches position/velocity components,
//! registers patrol behaviour under a trait object key (a quicker patrol
//! later takes over the same key), and drives a few movement steps by hand.
//! The loop itself lives here: the registry stores and matches, nothing
//! more.

use anyhow::Result;
use glam::Vec3;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use holdfast::{Component, Filter, Registry, System};

/// A game object identity. Pure id; all state lives in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GameObject(Uuid);

impl GameObject {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GameObject({})", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Position(Vec3);
impl Component for Position {}

#[derive(Debug, Clone, Copy)]
struct Velocity(Vec3);
impl Component for Velocity {}

/// Marker that pins an object in place.
#[derive(Debug, Clone, Copy)]
struct Frozen;
impl Component for Frozen {}

/// Patrol behaviour: moves matching objects along their velocity.
trait Patrol: System<GameObject> {
    /// Velocity multiplier applied per step.
    fn pace(&self) -> f32;
}

struct SlowPatrol {
    filter: Filter,
}

impl SlowPatrol {
    fn new() -> Self {
        Self {
            filter: Filter::new().with::<Position>().with::<Velocity>(),
        }
    }
}

impl System<GameObject> for SlowPatrol {
    fn filter(&self) -> &Filter {
        &self.filter
    }
}

impl Patrol for SlowPatrol {
    fn pace(&self) -> f32 {
        1.0
    }
}

struct QuickPatrol {
    filter: Filter,
}

impl QuickPatrol {
    fn new() -> Self {
        Self {
            filter: Filter::new().with::<Position>().with::<Velocity>(),
        }
    }
}

impl System<GameObject> for QuickPatrol {
    fn filter(&self) -> &Filter {
        &self.filter
    }
}

impl Patrol for QuickPatrol {
    fn pace(&self) -> f32 {
        3.0
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("patrol=info".parse()?))
        .init();

    let mut registry = Registry::<GameObject>::new();

    // World setup: three patrolling objects, one of them frozen.
    let scout = GameObject::new();
    registry.add_component(scout, Position(Vec3::ZERO));
    registry.add_component(scout, Velocity(Vec3::new(1.0, 0.0, 0.0)));

    let guard = GameObject::new();
    registry.add_component(guard, Position(Vec3::new(10.0, 0.0, 0.0)));
    registry.add_component(guard, Velocity(Vec3::new(0.0, 0.0, 1.0)));
    registry.add_component(guard, Frozen);

    let courier = GameObject::new();
    registry.add_component(courier, Position(Vec3::new(-5.0, 0.0, 0.0)));
    registry.add_component(courier, Velocity(Vec3::new(0.5, 0.0, 0.5)));

    info!(holders = registry.holder_count(), "world populated");

    // The slow patrol registers first; the quick one takes over the same
    // key. Exactly one registration survives.
    registry.add_system_as::<dyn Patrol>(Box::new(SlowPatrol::new()));
    registry.add_system_as::<dyn Patrol>(Box::new(QuickPatrol::new()));
    info!(systems = registry.system_count(), "patrol registered");

    for step in 0..3 {
        run_patrol(&mut registry, step);
    }

    // Thaw the guard and let it move once.
    registry.remove_component::<Frozen>(&guard);
    run_patrol(&mut registry, 3);

    let scout_x = registry
        .get_component::<Position>(&scout)
        .map(|position| position.0.x)
        .unwrap_or_default();
    info!(x = f64::from(scout_x), "scout finished");

    registry.remove_holder(&courier);
    info!(holders = registry.holder_count(), "courier retired");

    Ok(())
}

/// One hand-driven step: ask the registry who matches, then integrate.
fn run_patrol(registry: &mut Registry<GameObject>, step: u32) {
    let Some(patrol) = registry.get_system::<dyn Patrol>() else {
        return;
    };
    let pace = patrol.pace();
    let movers: Vec<GameObject> = registry
        .holders_matching(patrol.filter())
        .copied()
        .collect();

    for object in movers {
        if registry.has_component::<Frozen>(&object) {
            continue;
        }
        let Some(velocity) = registry.get_component::<Velocity>(&object).map(|v| v.0) else {
            continue;
        };
        if let Some(position) = registry.get_component_mut::<Position>(&object) {
            position.0 += velocity * pace;
            info!(
                step,
                object = %object,
                x = f64::from(position.0.x),
                z = f64::from(position.0.z),
                "object moved"
            );
        }
    }
}
