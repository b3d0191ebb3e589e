mod util;

use insitu_coproc::prelude::*;
use util::*;

#[test]
fn calls_before_initialize_are_rejected() {
    let mut p: Processor = Processor::new();
    let mut desc = fluid_description(0);
    assert_eq!(
        p.request_data_description(&mut desc),
        Err(CoProcessingError::NotInitialized)
    );
    assert_eq!(p.co_process(&mut desc), Err(CoProcessingError::NotInitialized));
    assert_eq!(p.finalize(), Err(CoProcessingError::NotInitialized));
}

#[test]
fn initialize_twice_is_rejected() {
    let mut p = Processor::serial().unwrap();
    assert_eq!(p.initialize(NoComm), Err(CoProcessingError::AlreadyInitialized));
}

#[test]
fn pipelines_registered_early_are_initialized_once() {
    let mut p: Processor = Processor::new();
    let (stub, rec) = Stub::always("early");
    p.add_pipeline(stub).unwrap();
    assert_eq!(rec.lock().initialized, 0);
    p.initialize(NoComm).unwrap();
    assert_eq!(rec.lock().initialized, 1);

    let (late, late_rec) = Stub::always("late");
    p.add_pipeline(late).unwrap();
    assert_eq!(late_rec.lock().initialized, 1);
    assert_eq!(rec.lock().initialized, 1);
}

#[test]
fn failed_initialization_keeps_processor_unusable() {
    let mut p: Processor = Processor::new();
    let (bad, _) = Stub::always("bad");
    p.add_pipeline(bad.failing_init()).unwrap();
    assert!(matches!(
        p.initialize(NoComm),
        Err(CoProcessingError::PipelineFailed { .. })
    ));
    assert_eq!(p.state(), ProcessorState::Created);
    let mut desc = fluid_description(0);
    assert_eq!(
        p.request_data_description(&mut desc),
        Err(CoProcessingError::NotInitialized)
    );
}

#[test]
fn failed_initialization_finalizes_earlier_pipelines() {
    let mut p: Processor = Processor::new();
    let (good, rec) = Stub::always("good");
    let (bad, _) = Stub::always("bad");
    p.add_pipeline(good).unwrap();
    let bad_id = p.add_pipeline(bad.failing_init()).unwrap();
    assert!(p.initialize(NoComm).is_err());
    {
        let rec = rec.lock();
        assert_eq!((rec.initialized, rec.finalized), (1, 1));
    }

    p.remove_pipeline(bad_id).unwrap();
    p.initialize(NoComm).unwrap();
    {
        let rec = rec.lock();
        assert_eq!((rec.initialized, rec.finalized), (2, 1));
    }
    p.finalize().unwrap();
    assert_eq!(rec.lock().finalized, 2);
}

#[test]
fn late_registration_failure_does_not_register() {
    let mut p = Processor::serial().unwrap();
    let (bad, _) = Stub::always("bad");
    assert!(p.add_pipeline(bad.failing_init()).is_err());
    assert_eq!(p.number_of_pipelines(), 0);
}

#[test]
fn co_process_without_request_is_out_of_phase() {
    let mut p = Processor::serial().unwrap();
    let (stub, rec) = Stub::always("a");
    p.add_pipeline(stub).unwrap();
    let mut desc = fluid_description(0);
    assert!(matches!(
        p.co_process(&mut desc),
        Err(CoProcessingError::OutOfPhase { .. })
    ));
    assert!(rec.lock().co_processed.is_empty());
}

#[test]
fn second_co_process_is_out_of_phase() {
    let mut p = Processor::serial().unwrap();
    let (stub, rec) = Stub::always("a");
    p.add_pipeline(stub).unwrap();
    let mut desc = fluid_description(4);
    p.request_data_description(&mut desc).unwrap();
    p.co_process(&mut desc).unwrap();
    assert!(matches!(
        p.co_process(&mut desc),
        Err(CoProcessingError::OutOfPhase { .. })
    ));
    assert_eq!(rec.lock().co_processed, [4]);
}

#[test]
fn co_process_for_another_step_is_rejected() {
    let mut p = Processor::serial().unwrap();
    let (stub, rec) = Stub::always("a");
    p.add_pipeline(stub).unwrap();
    let mut desc = fluid_description(4);
    p.request_data_description(&mut desc).unwrap();
    desc.set_time_step(5);
    assert_eq!(
        p.co_process(&mut desc),
        Err(CoProcessingError::StepMismatch {
            requested: 4,
            received: 5
        })
    );
    assert!(rec.lock().co_processed.is_empty());
}

#[test]
fn pipeline_added_between_phases_waits_for_next_step() {
    let mut p = Processor::serial().unwrap();
    let (a, _) = Stub::always("a");
    p.add_pipeline(a).unwrap();
    let mut desc = fluid_description(0);
    p.request_data_description(&mut desc).unwrap();

    let (late, late_rec) = Stub::always("late");
    let late_id = p.add_pipeline(late).unwrap();
    assert_eq!(p.phase_of(late_id), Some(PipelinePhase::AwaitingRequest));
    let report = p.co_process(&mut desc).unwrap();
    assert!(!report.was_invoked(late_id));
    assert!(late_rec.lock().co_processed.is_empty());
}

#[test]
fn registry_keeps_registration_order() {
    let mut p = Processor::serial().unwrap();
    let (a, _) = Stub::always("a");
    let (b, _) = Stub::always("b");
    let (dup, _) = Stub::always("a");
    let a_id = p.add_pipeline(a).unwrap();
    let b_id = p.add_pipeline(b).unwrap();
    let dup_id = p.add_pipeline(dup).unwrap();
    assert_eq!(p.pipeline_names(), ["a", "b", "a"]);
    assert_eq!(p.pipeline_ids(), [a_id, b_id, dup_id]);

    let removed = p.remove_pipeline(b_id).unwrap();
    assert_eq!(removed.name(), "b");
    assert!(p.remove_pipeline(b_id).is_none());
    assert_eq!(p.pipeline_names(), ["a", "a"]);

    assert_eq!(p.remove_all_pipelines().len(), 2);
    assert_eq!(p.number_of_pipelines(), 0);
}

#[test]
fn finalize_reaches_every_pipeline_then_closes() {
    let mut p = Processor::serial().unwrap();
    let (a, a_rec) = Stub::always("a");
    let (b, b_rec) = Stub::always("b");
    p.add_pipeline(a).unwrap();
    p.add_pipeline(b).unwrap();
    p.finalize().unwrap();
    assert_eq!(a_rec.lock().finalized, 1);
    assert_eq!(b_rec.lock().finalized, 1);
    assert_eq!(p.state(), ProcessorState::Finalized);

    let mut desc = fluid_description(0);
    assert_eq!(
        p.request_data_description(&mut desc),
        Err(CoProcessingError::Finalized)
    );
    assert_eq!(p.co_process(&mut desc), Err(CoProcessingError::Finalized));
    assert_eq!(p.finalize(), Err(CoProcessingError::Finalized));
    let (c, _) = Stub::always("c");
    assert!(matches!(p.add_pipeline(c), Err(CoProcessingError::Finalized)));
    assert_eq!(a_rec.lock().finalized, 1);
}

#[test]
fn finalize_failure_is_returned_after_every_pipeline_ran() {
    let mut p = Processor::serial().unwrap();
    let (a, a_rec) = Stub::always("a");
    let (b, b_rec) = Stub::always("b");
    let (c, c_rec) = Stub::always("c");
    p.add_pipeline(a.failing_finalize()).unwrap();
    p.add_pipeline(b).unwrap();
    p.add_pipeline(c.failing_finalize()).unwrap();

    match p.finalize() {
        Err(CoProcessingError::PipelineFailed { pipeline, .. }) => assert_eq!(pipeline, "a"),
        other => panic!("expected the first finalize failure, got {other:?}"),
    }
    assert_eq!(a_rec.lock().finalized, 1);
    assert_eq!(b_rec.lock().finalized, 1);
    assert_eq!(c_rec.lock().finalized, 1);
    assert_eq!(p.state(), ProcessorState::Finalized);
    assert_eq!(p.finalize(), Err(CoProcessingError::Finalized));
}
