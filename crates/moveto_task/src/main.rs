//! Headless демо move tasks
//!
//! Два агента в sandbox'е: первый идёт к точке, второй преследует
//! движущуюся цель (continuous goal tracking) и останавливается по Stop.

use bevy::prelude::*;
use moveto_task::{
    create_headless_app, log_info, GameplayTaskOwner, MoveTaskAction, MoveTaskCommand, MoveTaskCompleted,
    MoveTaskFailed, MoveTaskRestarted, MoveToParams, NavAgent, SandboxPlugin, TaskOwner,
};

/// Цель, которая идёт по прямой
#[derive(Component, Debug)]
struct Drift {
    velocity: Vec3,
}

fn drift_targets(time: Res<Time>, mut targets: Query<(&Drift, &mut NavAgent)>) {
    for (drift, mut agent) in targets.iter_mut() {
        agent.location += drift.velocity * time.delta_secs();
    }
}

fn report_outcomes(
    mut completed: EventReader<MoveTaskCompleted>,
    mut failed: EventReader<MoveTaskFailed>,
    mut restarted: EventReader<MoveTaskRestarted>,
) {
    for event in completed.read() {
        log_info(&format!(
            "✅ {:?}: move finished with {:?} (partial: {})",
            event.agent, event.outcome, event.partial
        ));
    }
    for event in failed.read() {
        log_info(&format!("❌ {:?}: move request failed", event.agent));
    }
    for event in restarted.read() {
        log_info(&format!("🔄 {:?}: move restarted after {:?}", event.agent, event.previous));
    }
}

fn main() {
    let seed = 42;
    println!("Starting MoveTo headless demo (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SandboxPlugin {
        postpone_chance: 0.1,
        ..default()
    })
    .add_systems(FixedUpdate, drift_targets)
    .add_systems(Update, report_outcomes);

    let world = app.world_mut();
    let controller = world.spawn(GameplayTaskOwner::default()).id();
    let walker = world.spawn(NavAgent::at(Vec3::ZERO)).id();
    let chaser = world.spawn(NavAgent::at(Vec3::new(-5.0, 0.0, -5.0))).id();
    let target = world
        .spawn((
            NavAgent::at(Vec3::new(5.0, 0.0, 5.0)),
            Drift {
                velocity: Vec3::new(1.0, 0.0, 0.0),
            },
        ))
        .id();

    app.world_mut().send_event(MoveTaskCommand::new(
        walker,
        MoveTaskAction::Begin {
            owner: TaskOwner::Controller { controller },
            params: MoveToParams::to_location(Vec3::new(10.0, 0.0, 0.0)),
        },
    ));
    app.world_mut().send_event(MoveTaskCommand::new(
        chaser,
        MoveTaskAction::Begin {
            owner: TaskOwner::Controller { controller },
            params: MoveToParams {
                use_continuous_goal_tracking: true,
                ..MoveToParams::to_entity(target)
            },
        },
    ));

    // 600 тиков = 10 секунд симуляции
    for tick in 0..600 {
        app.update();

        if tick == 480 {
            app.world_mut()
                .send_event(MoveTaskCommand::new(chaser, MoveTaskAction::Stop));
        }

        if tick % 100 == 0 {
            let world = app.world();
            let location = |entity: Entity| world.get::<NavAgent>(entity).map(|agent| agent.location);
            println!(
                "Tick {}: walker {:?}, chaser {:?}, target {:?}",
                tick,
                location(walker),
                location(chaser),
                location(target)
            );
        }
    }

    println!("Demo complete!");
}
