//! One flow running off the UI thread.

use super::flows::{self, Flow, FlowContext, FlowOutput};
use super::TextGenerator;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use log::{info, warn};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct AnalysisJob {
    flow: Flow,
    started: Instant,
    result_rx: Receiver<Result<FlowOutput>>,
}

impl AnalysisJob {
    /// Start `flow` on a worker thread. Dropping the job discards its result.
    pub fn spawn(generator: Arc<dyn TextGenerator>, flow: Flow, ctx: FlowContext) -> Self {
        let (tx, result_rx) = bounded(1);
        thread::spawn(move || {
            let result = flows::run(generator.as_ref(), flow, &ctx);
            if tx.send(result).is_err() {
                info!("{:?} result arrived after the view closed; dropped", flow);
            }
        });
        Self { flow, started: Instant::now(), result_rx }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The result once the worker has finished.
    pub fn try_result(&self) -> Option<Result<FlowOutput>> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                match &result {
                    Ok(_) => info!("{:?} finished in {:.1?}", self.flow, self.elapsed()),
                    Err(e) => warn!("{:?} failed: {e}", self.flow),
                }
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("{:?} worker exited without sending a result", self.flow);
                Some(Err(Error::WorkerStopped.in_flow(self.flow.name())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::flows::tests::{FakeGenerator, ANALYSIS_REPLY};
    use serde_json::Value;

    struct PanickingGenerator;

    impl TextGenerator for PanickingGenerator {
        fn generate(&self, _prompt: &str, _response_schema: &Value) -> Result<String> {
            panic!("generator blew up");
        }
    }

    fn ctx() -> FlowContext {
        FlowContext { realtime: "[]".into(), historical: "[]".into(), server_configurations: "{}".into() }
    }

    fn poll(job: &AnalysisJob) -> Result<FlowOutput> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = job.try_result() {
                return result;
            }
            assert!(Instant::now() < deadline, "job did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn delivers_result_from_worker() {
        let job = AnalysisJob::spawn(Arc::new(FakeGenerator::answering(ANALYSIS_REPLY)), Flow::Analyze, ctx());
        assert_eq!(job.flow(), Flow::Analyze);
        match poll(&job).unwrap() {
            FlowOutput::Analysis(a) => assert_eq!(a.alerts.len(), 2),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn delivers_failures_too() {
        let job = AnalysisJob::spawn(Arc::new(FakeGenerator::failing()), Flow::Suggest, ctx());
        assert!(matches!(poll(&job), Err(Error::Generation { .. })));
    }

    #[test]
    fn dead_worker_reports_an_error() {
        let job = AnalysisJob::spawn(Arc::new(PanickingGenerator), Flow::Adapt, ctx());
        match poll(&job) {
            Err(Error::Generation { flow, source }) => {
                assert_eq!(flow, Flow::Adapt.name());
                assert!(matches!(*source, Error::WorkerStopped));
            }
            other => panic!("expected a generation error, got {other:?}"),
        }
    }
}
