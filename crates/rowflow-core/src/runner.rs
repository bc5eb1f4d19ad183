//! Pipeline Runner: instantiates each phase, then streams rows from every
//! source through the transform chain into every destination.
use crate::component::{Destination, Hook, Row, Source, Transform};
use crate::context::{Context, RunContext, RunnerOptions};
use crate::definition::{ComponentDefinition, Control};
use crate::error::Result;
use crate::instantiator::{self, materialize};
use crate::report::{DestinationStats, RunReport, SourceStats};
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Drives one job from pre-process hooks to post-process hooks.
///
/// Execution is single-threaded and depth-first: each row is carried to
/// every destination before the next row is pulled, and every row of a
/// source is handled before the next source starts.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunner {
    options: RunnerOptions,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RunnerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Run `control` once.
    pub fn run(&self, control: &Control, ctx: &RunContext) -> Result<RunReport> {
        let span = info_span!("run", job = %ctx.job, run_id = %ctx.run_id);
        let _enter = span.enter();

        let result = self.execute(control, ctx);
        match &result {
            Ok(report) => info!("{}", report.summary()),
            Err(e) => warn!(error = %e, "run aborted"),
        }
        result
    }

    /// Check every definition of every phase without constructing anything.
    pub fn validate(&self, control: &Control) -> Result<()> {
        for context in Context::ALL {
            for definition in control.definitions(context) {
                instantiator::validate(context, definition, context.policy())?;
            }
        }
        Ok(())
    }

    fn execute(&self, control: &Control, ctx: &RunContext) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new(ctx);

        report.pre_processes = run_hooks(Context::PreProcess, &control.pre_processes)?;

        let mut sources: Vec<Box<dyn Source>> =
            materialize(Context::Source, &control.sources, Context::Source.policy())?;
        let mut transforms: Vec<Box<dyn Transform>> =
            materialize(Context::Transform, &control.transforms, Context::Transform.policy())?;
        let mut destinations: Vec<Box<dyn Destination>> = materialize(
            Context::Destination,
            &control.destinations,
            Context::Destination.policy(),
        )?;
        info!(
            sources = sources.len(),
            transforms = transforms.len(),
            destinations = destinations.len(),
            "components ready"
        );

        report.destinations = control
            .destinations
            .iter()
            .map(|d| DestinationStats {
                component: d.identity().to_string(),
                rows_written: 0,
                closed: false,
            })
            .collect();

        self.process_rows(
            &control.sources,
            &mut sources,
            &mut transforms,
            &mut destinations,
            &mut report,
        )?;

        report.post_processes = run_hooks(Context::PostProcess, &control.post_processes)?;
        report.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    fn process_rows(
        &self,
        definitions: &[ComponentDefinition],
        sources: &mut [Box<dyn Source>],
        transforms: &mut [Box<dyn Transform>],
        destinations: &mut [Box<dyn Destination>],
        report: &mut RunReport,
    ) -> Result<()> {
        let progress_every = self.options.progress_every;
        let mut total: u64 = 0;

        for (definition, source) in definitions.iter().zip(sources.iter_mut()) {
            let mut rows_read: u64 = 0;
            debug!(source = definition.identity(), "draining source");

            for row in source.rows() {
                let row = row?;
                rows_read += 1;
                total += 1;
                if progress_every > 0 && total % progress_every == 0 {
                    info!(rows = total, "progress");
                }

                let Some(row) = apply_transforms(transforms, row)? else {
                    report.rows_dropped += 1;
                    continue;
                };

                let stats = report.destinations.iter_mut();
                for (destination, stats) in destinations.iter_mut().zip(stats) {
                    destination.write(&row)?;
                    stats.rows_written += 1;
                }
            }

            report.sources.push(SourceStats {
                component: definition.identity().to_string(),
                rows_read,
            });
        }

        let stats = report.destinations.iter_mut();
        for (destination, stats) in destinations.iter_mut().zip(stats) {
            destination.close()?;
            stats.closed = true;
        }
        Ok(())
    }
}

/// Feed `row` through the chain. The first `None` ends it.
fn apply_transforms(transforms: &mut [Box<dyn Transform>], mut row: Row) -> Result<Option<Row>> {
    for (index, transform) in transforms.iter_mut().enumerate() {
        match transform.process(row)? {
            Some(next) => row = next,
            None => {
                debug!(transform = index, "row dropped");
                return Ok(None);
            }
        }
    }
    Ok(Some(row))
}

fn run_hooks(context: Context, definitions: &[ComponentDefinition]) -> Result<usize> {
    let mut hooks: Vec<Box<dyn Hook>> = materialize(context, definitions, context.policy())?;
    if !hooks.is_empty() {
        info!(%context, count = hooks.len(), "running hooks");
    }
    for hook in hooks.iter_mut() {
        hook.call()?;
    }
    Ok(hooks.len())
}

/// Run `control` once with default options and a fresh context.
pub fn run(control: &Control) -> Result<RunReport> {
    PipelineRunner::new().run(control, &RunContext::default())
}
