use rand::SeedableRng;
use rand_pcg::Pcg64;
use skyrace_shared::*;
use tracing::debug;

use crate::body::{FlightBody, PointMassBody};
use crate::course::CheckpointCourse;
use crate::flight::FlightController;
use crate::policy::Policy;

/// Run one deterministic episode of a policy on a course.
///
/// Per tick: the policy decides (every `decision_period` ticks), the
/// controller steps, the body integrates, then world events are delivered:
/// dropping below the floor is a collision, entering a checkpoint's gate
/// volume is a trigger.
pub fn run_episode(
    course: &CheckpointCourse,
    config: &EpisodeConfig,
    policy: &mut dyn Policy,
) -> EpisodeRecord {
    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut body = PointMassBody::new(config.body);
    let mut ctrl = FlightController::new(course, config.flight);
    ctrl.reset(&mut body, &mut rng, config.agent_index, config.agent_count.max(1));

    let mut frames = vec![FrameSnapshot::from(&ctrl.state(&body))];
    let mut input = ControlInput::none();
    let decision_period = config.decision_period.max(1);

    for tick in 0..config.max_ticks {
        if tick % decision_period == 0 {
            let obs = ctrl.observe(&body);
            input = policy.act(&obs);
        }

        let mut result = ctrl.step(&mut body, input, DT);
        if !result.is_terminal() {
            body.advance(DT);
            result.merge(world_events(&mut ctrl, &body, &config.world));
        }

        if ctrl.tick() % FRAME_INTERVAL == 0 {
            frames.push(FrameSnapshot::from(&ctrl.state(&body)));
        }

        if result.is_terminal() {
            if ctrl.tick() % FRAME_INTERVAL != 0 {
                frames.push(FrameSnapshot::from(&ctrl.state(&body)));
            }
            break;
        }
    }

    let end = match ctrl.phase() {
        FlightPhase::Terminal(end) => Some(end),
        FlightPhase::Flying => None,
    };
    debug!(pilot = %config.pilot, ?end, ticks = ctrl.tick(), "episode finished");

    EpisodeRecord {
        config: config.clone(),
        frames,
        result: EpisodeResult {
            end,
            final_tick: ctrl.tick(),
            cumulative_reward: ctrl.cumulative_reward(),
            checkpoints_reached: ctrl.checkpoints_reached(),
            laps: ctrl.laps(),
            splits: ctrl.splits().to_vec(),
        },
    }
}

fn world_events<B: FlightBody>(
    ctrl: &mut FlightController<'_>,
    body: &B,
    world: &WorldConfig,
) -> TickResult {
    if let Some(floor) = world.floor_altitude {
        if body.position().y < floor {
            return ctrl.on_collision();
        }
    }

    if world.gate_radius > 0.0 {
        let next = ctrl.next_checkpoint();
        let gate = ctrl.course().checkpoint(next).position;
        if body.position().distance(gate) < world.gate_radius {
            return ctrl.on_trigger(Region::Checkpoint(next));
        }
    }

    TickResult::default()
}
