//! Drives PidControllerNode through the scheduler against a simulated plant

use approx::assert_relative_eq;
use std::time::Duration;
use tickpid_core::{NodeState, RuntimeParams, Scheduler};
use tickpid_library::{ErrorSample, PidConfig, PidController, PidControllerNode};

const TICK_NS: u64 = 10_000_000; // 10ms

#[test]
fn closed_loop_converges_on_first_order_plant() {
    let (node, samples, outputs) = PidControllerNode::with_channels(PidConfig::pd(2.0, 0.1));
    let mut scheduler = Scheduler::new().with_name("closed_loop");
    scheduler.add(Box::new(node), 0, None);

    let setpoint = 100.0;
    let mut position = 0.0;

    for tick in 0..2000u64 {
        samples
            .send(ErrorSample::at(setpoint - position, tick * TICK_NS))
            .unwrap();
        scheduler.tick_once().unwrap();

        let output = outputs.try_recv().expect("one output per sample");
        assert_eq!(output.tick, tick + 1);
        position += output.u() * 0.01;
    }

    assert_relative_eq!(position, setpoint, epsilon = 1e-6);
    scheduler.shutdown();
}

#[test]
fn node_output_matches_direct_controller() {
    let errors = [10.0, 6.0, -2.5, 0.0, 7.25, 3.0];
    let config = PidConfig::new(1.0, 0.5, 0.1);

    let (node, samples, outputs) = PidControllerNode::with_channels(config);
    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(node), 0, None);

    for (i, &e) in errors.iter().enumerate() {
        samples.send(ErrorSample::at(e, i as u64 * TICK_NS)).unwrap();
    }
    scheduler.run_ticks(3, Duration::ZERO).unwrap();

    // All queued samples are drained on the first tick
    let node_outputs: Vec<f64> = outputs.try_iter().map(|o| o.u()).collect();
    assert_eq!(node_outputs.len(), errors.len());

    let mut direct = PidController::new(1.0, 0.5, 0.1);
    for (&e, &u) in errors.iter().zip(&node_outputs) {
        assert_eq!(direct.update(e, 0.0).get_u(), u);
    }

    let info = scheduler.node_info("pid_controller").unwrap();
    assert_eq!(info.state(), &NodeState::Stopped);
    assert_eq!(info.metrics().messages_received, errors.len() as u64);
    assert_eq!(info.metrics().successful_ticks, 3);
}

#[test]
fn default_dt_comes_from_shared_params() {
    let params = RuntimeParams::with_defaults();
    params.set("pid_default_dt", 0.05).unwrap();

    let (node, samples, outputs) =
        PidControllerNode::with_channels(PidConfig::from_params(&params).unwrap());
    let mut scheduler = Scheduler::new().with_params(params);
    scheduler.add(Box::new(node), 0, None);

    samples.send(ErrorSample::at(1.0, 0)).unwrap();
    samples.send(ErrorSample::at(1.0, 20_000_000)).unwrap();
    scheduler.tick_once().unwrap();

    let dts: Vec<f64> = outputs.try_iter().map(|o| o.delta_t).collect();
    assert_eq!(dts[0], 0.05);
    assert_relative_eq!(dts[1], 0.02, epsilon = 1e-12);
}

#[test]
fn dropped_output_receiver_stops_only_that_node() {
    let (node, samples, outputs) = PidControllerNode::with_channels(PidConfig::proportional(1.0));
    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(node), 0, None);
    drop(outputs);

    samples.send(ErrorSample::at(1.0, 0)).unwrap();
    scheduler.tick_once().unwrap();
    scheduler.tick_once().unwrap();

    let info = scheduler.node_info("pid_controller").unwrap();
    assert!(matches!(info.state(), NodeState::Error(_)));
    assert_eq!(info.metrics().failed_ticks, 1);
    assert_eq!(scheduler.tick_count(), 2);
}
